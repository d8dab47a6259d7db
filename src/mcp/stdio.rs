//! MCP stdio transport
//!
//! Reads line-delimited JSON-RPC messages and writes one response line per
//! answered message. Messages are handled strictly in arrival order. Stdout
//! carries protocol traffic only; logs go to stderr.

use super::dispatch::Bridge;
use super::models::JsonRpcResponse;
use crate::statuspage::config::StatusPageConfig;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdio transport I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serves the bridge on the process's stdin/stdout until stdin closes.
///
/// There are no request headers on this transport, so every call uses the
/// startup configuration.
pub async fn serve_stdio(bridge: &Bridge) -> Result<(), StdioError> {
    info!("Starting MCP stdio transport");

    let reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();
    let config = bridge.base_config().clone();

    let answered = serve_lines(bridge, &config, reader, &mut writer).await?;
    info!(answered, "stdin closed, stdio transport stopped");
    Ok(())
}

/// Runs the read-dispatch-write loop over any line source and sink.
///
/// Lines are taken as raw bytes, so a line that is not UTF-8 is answered
/// with an Invalid Request error like any other unparseable message.
/// Blank lines are skipped. Returns the number of responses written.
pub async fn serve_lines<R, W>(
    bridge: &Bridge,
    config: &StatusPageConfig,
    mut reader: R,
    writer: &mut W,
) -> Result<usize, StdioError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut answered = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = trim_line(&buf);
        if line.is_empty() {
            continue;
        }

        match bridge.handle_message(line, config).await {
            Some(response) => {
                write_response(writer, &response).await?;
                answered += 1;
            }
            None => debug!("Notification handled, no response"),
        }
    }

    Ok(answered)
}

fn trim_line(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), StdioError>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_vec(response)?;
    json.push(b'\n');
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}
