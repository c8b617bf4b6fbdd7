//! Settings shared by every exporter agent.
//!
//! Loading happens in two steps. The loader merges defaults, the process
//! environment, an optional overlay file and command line overrides into a
//! flat [`RawConf`]. A `FromRawConf` implementation then validates it into a
//! typed settings struct, collecting every problem it finds so a bad
//! deployment is reported in one go.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use eyre::{Report, Result};
use itertools::Itertools;
use prometheus::Registry;

use warden_core::ChainResult;
use warden_cosmos::{ConnectionConf, GrpcProvider};

use crate::CoreMetrics;

pub use self::loader::*;
pub use self::parser::RawConf;
pub use self::trace::*;

mod loader;
mod parser;
/// Tracing subscriber management
pub mod trace;

/// A composite error type that allows for compiling multiple errors into a
/// single result. Use `default()` to create an empty error and then push
/// errors into it while parsing.
#[must_use]
#[derive(Debug, Default)]
pub struct ConfigParsingError(Vec<(&'static str, Report)>);

impl ConfigParsingError {
    /// Add a new error for `key`.
    pub fn push(&mut self, key: &'static str, report: Report) {
        self.0.push((key, report));
    }

    /// Merge all the individual errors from two `ConfigParsingError`s.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Number of problems found
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no problem was found
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` if there are no errors.
    pub fn into_result<T>(self, value: T) -> ConfigResult<T> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Display for ConfigParsingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid configuration: {}",
            self.0
                .iter()
                .map(|(key, report)| format!("{}: {report}", key.to_uppercase()))
                .join("; ")
        )
    }
}

impl std::error::Error for ConfigParsingError {}

/// Result of validating raw settings.
pub type ConfigResult<T> = Result<T, ConfigParsingError>;

/// Validate raw settings into a typed struct.
pub trait FromRawConf: Sized {
    /// Parse and validate, collecting every error.
    fn from_config(raw: &RawConf) -> ConfigResult<Self>;
}

/// Default gRPC endpoint
pub const DEFAULT_GRPC_ADDR: &str = "grpc.wardenprotocol.org:443";
/// Default chain id label
pub const DEFAULT_CHAIN_ID: &str = "warden_8765-1";
/// Default bech32 account prefix
pub const DEFAULT_PREFIX: &str = "warden";
/// Default metrics port
pub const DEFAULT_PORT: u16 = 8081;
/// Default per-scrape deadline in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 45;

/// Settings every agent needs: where to serve, how to log, which chain to
/// talk to.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Port to listen for prometheus scrape requests
    pub metrics_port: u16,
    /// The tracing configuration
    pub tracing: TracingConfig,
    /// gRPC connection to the chain node
    pub chain: ConnectionConf,
    /// Chain id used as a label
    pub chain_id: String,
}

impl Settings {
    /// Create the core metrics from the settings given the name of the agent.
    pub fn metrics(&self, name: &str) -> Result<Arc<CoreMetrics>> {
        Ok(Arc::new(CoreMetrics::new(
            name,
            self.metrics_port,
            Registry::new(),
        )?))
    }

    /// Deadline applied to every upstream call of a scrape
    pub fn scrape_timeout(&self) -> Duration {
        self.chain.timeout()
    }

    /// Build a lazily connecting gRPC provider for the configured node.
    pub fn build_grpc_provider(&self) -> ChainResult<GrpcProvider> {
        GrpcProvider::new(self.chain.clone())
    }
}

impl FromRawConf for Settings {
    fn from_config(raw: &RawConf) -> ConfigResult<Self> {
        let mut err = ConfigParsingError::default();

        let metrics_port = raw.parse_or("port", DEFAULT_PORT, &mut err);
        let tracing = TracingConfig::new(
            raw.get("log_format").map(Style::parse).unwrap_or_default(),
            raw.get("log_level").map(Level::parse).unwrap_or_default(),
        );

        let tls = raw.bool_or("grpc_tls_enabled", true, &mut err);
        let timeout = raw.parse_or("grpc_timeout_seconds", DEFAULT_TIMEOUT_SECONDS, &mut err);
        if timeout == 0 {
            err.push("grpc_timeout_seconds", eyre::eyre!("must be positive"));
        }
        let grpc_addr = raw.string_or("grpc_addr", DEFAULT_GRPC_ADDR);
        let grpc_url = match ConnectionConf::parse_grpc_address(&grpc_addr, tls) {
            Ok(url) => Some(url),
            Err(e) => {
                err.push("grpc_addr", Report::new(e));
                None
            }
        };
        let prefix = raw.string_or("prefix", DEFAULT_PREFIX);
        let chain_id = raw.string_or("chain_id", DEFAULT_CHAIN_ID);

        match grpc_url {
            Some(grpc_url) if err.is_empty() => Ok(Self {
                metrics_port,
                tracing,
                chain: ConnectionConf::new(grpc_url, tls, Duration::from_secs(timeout), prefix),
                chain_id,
            }),
            _ => Err(err),
        }
    }
}
