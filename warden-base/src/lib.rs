//! This crate contains the shared pieces every exporter agent is built from:
//! the prometheus registry and scrape orchestration, the HTTP server, and
//! settings and tracing configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod settings;

mod agent;
pub use agent::*;

/// Prometheus metrics and the collector abstraction
pub mod metrics;
pub use metrics::*;

/// The `/metrics` and `/healthz` HTTP server
pub mod server;
pub use server::*;
