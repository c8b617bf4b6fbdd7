//! Metrics registry, status-labelled gauges and scrape orchestration.

pub use self::collector::*;
pub use self::core::*;

mod collector;
mod core;

/// Namespace for the exporter's own operational metrics.
pub const NAMESPACE: &str = "warden_exporter";
