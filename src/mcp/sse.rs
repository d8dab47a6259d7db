//! SSE session management
//!
//! A GET on the MCP endpoint opens a long-lived event stream used for
//! keep-alive and tool discovery push only; call results always travel on
//! the POST response.
//!
//! Each stream is an [`SseSession`]. It owns its heartbeat timer, registers
//! itself in the [`SessionTracker`] while open, and releases both when it is
//! dropped, which axum does on client disconnect or write failure.

use super::models::{methods, BRIDGE_PROTOCOL_VERSION, JSONRPC_VERSION};
use axum::response::sse::Event;
use dashmap::DashMap;
use futures_util::Stream;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

/// Interval between heartbeat comments
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

// =============================================================================
// Session Tracker
// =============================================================================

pub type SharedSessionTracker = Arc<SessionTracker>;

/// Open SSE sessions, keyed by connection id, plus the server-wide
/// shutdown signal they all listen to.
#[derive(Debug)]
pub struct SessionTracker {
    sessions: DashMap<Uuid, Instant>,
    shutdown: watch::Sender<bool>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            sessions: DashMap::new(),
            shutdown,
        }
    }

    pub fn register(&self) -> Uuid {
        let connection_id = Uuid::new_v4();
        self.sessions.insert(connection_id, Instant::now());
        connection_id
    }

    /// Returns false if the session was not registered.
    pub fn unregister(&self, connection_id: &Uuid) -> bool {
        self.sessions.remove(connection_id).is_some()
    }

    pub fn is_open(&self, connection_id: &Uuid) -> bool {
        self.sessions.contains_key(connection_id)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Time since the session was opened
    pub fn age(&self, connection_id: &Uuid) -> Option<Duration> {
        self.sessions
            .get(connection_id)
            .map(|opened| opened.elapsed())
    }

    /// Ends every open session and any session opened afterwards.
    pub fn shutdown_all(&self) {
        info!(sessions = self.active_count(), "Closing SSE sessions");
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

// =============================================================================
// Events
// =============================================================================

fn keep_alive_event() -> Event {
    Event::default().comment("keep-alive")
}

fn heartbeat_event() -> Event {
    Event::default().comment("heartbeat")
}

fn notification_event(method: &str, params: Value) -> Event {
    let message = json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params,
    });
    Event::default().data(message.to_string())
}

/// `mcp.ready` notification sent when a session opens
pub fn ready_event() -> Event {
    notification_event(methods::READY, json!({ "version": BRIDGE_PROTOCOL_VERSION }))
}

/// `mcp.discover_tools` notification carrying the tool listing
pub fn discovery_event(discovery: Value) -> Event {
    notification_event(methods::DISCOVER_TOOLS, discovery)
}

// =============================================================================
// Session Stream
// =============================================================================

/// One open event stream.
///
/// Yields the opening events first, then a heartbeat comment every
/// interval, until it is cancelled, dropped, or the tracker shuts down.
pub struct SseSession {
    connection_id: Uuid,
    pending: VecDeque<Event>,
    heartbeat: Option<Interval>,
    shutdown: Pin<Box<dyn Future<Output = ()> + Send>>,
    tracker: SharedSessionTracker,
}

impl SseSession {
    /// Registers a new session. `discovery` is pushed after `mcp.ready`
    /// when present.
    pub fn open(
        tracker: SharedSessionTracker,
        heartbeat_interval: Duration,
        discovery: Option<Value>,
    ) -> Self {
        let period = if heartbeat_interval.is_zero() {
            DEFAULT_HEARTBEAT_INTERVAL
        } else {
            heartbeat_interval
        };
        let mut heartbeat = interval_at(tokio::time::Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pending = VecDeque::from([keep_alive_event(), ready_event()]);
        if let Some(discovery) = discovery {
            pending.push_back(discovery_event(discovery));
        }

        let mut signal = tracker.subscribe();
        let shutdown = Box::pin(async move {
            let _ = signal.wait_for(|stop| *stop).await;
        });

        let connection_id = tracker.register();
        info!(%connection_id, heartbeat_ms = period.as_millis() as u64, "SSE session opened");

        Self {
            connection_id,
            pending,
            heartbeat: Some(heartbeat),
            shutdown,
            tracker,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn is_open(&self) -> bool {
        self.heartbeat.is_some()
    }

    /// Stops the heartbeat and unregisters the session. Returns true only
    /// for the call that actually closed it.
    pub fn cancel(&mut self) -> bool {
        if self.heartbeat.take().is_none() {
            return false;
        }
        self.pending.clear();
        let open_ms = self
            .tracker
            .age(&self.connection_id)
            .map(|age| age.as_millis() as u64)
            .unwrap_or_default();
        self.tracker.unregister(&self.connection_id);
        info!(connection_id = %self.connection_id, open_ms, "SSE session closed");
        true
    }
}

impl Stream for SseSession {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.heartbeat.is_none() {
            return Poll::Ready(None);
        }

        if this.shutdown.as_mut().poll(cx).is_ready() {
            debug!(connection_id = %this.connection_id, "Shutdown signalled");
            this.cancel();
            return Poll::Ready(None);
        }

        if let Some(event) = this.pending.pop_front() {
            return Poll::Ready(Some(Ok(event)));
        }

        match this.heartbeat.as_mut() {
            Some(heartbeat) => {
                ready!(heartbeat.poll_tick(cx));
                Poll::Ready(Some(Ok(heartbeat_event())))
            }
            None => Poll::Ready(None),
        }
    }
}

impl Drop for SseSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for SseSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseSession")
            .field("connection_id", &self.connection_id)
            .field("pending", &self.pending.len())
            .field("open", &self.is_open())
            .finish()
    }
}
