//! Status Page Module
//!
//! Everything specific to the upstream status page service:
//! - Configuration (environment defaults, per-request header overrides)
//! - Upstream models and tool inputs
//! - REST client
//! - The tools exposed through the bridge

pub mod client;
pub mod config;
pub mod helpers;
pub mod models;
pub mod tools;

pub use client::{StatusPageClient, StatusPageError};
pub use config::{resolve, StatusPageConfig};
pub use tools::register_statuspage_tools;
