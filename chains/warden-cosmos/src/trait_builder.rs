use std::time::Duration;

use derive_new::new;
use url::Url;

/// Suffix appended to the account prefix to form consensus addresses
pub const VALCONS_SUFFIX: &str = "valcons";

/// Cosmos gRPC connection configuration
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ConnectionConf {
    /// The gRPC url to connect to
    grpc_url: Url,
    /// Whether to negotiate TLS using the system roots
    tls: bool,
    /// Request and connect timeout
    timeout: Duration,
    /// The human readable address prefix for the chain using bech32.
    bech32_prefix: String,
}

/// An error type when parsing a connection configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionConfError {
    /// Invalid `url` for connection configuration
    #[error("Invalid `url` for connection configuration: `{0}` ({1})")]
    InvalidConnectionUrl(String, url::ParseError),
}

impl ConnectionConf {
    /// Turn a `host:port` or full url into a gRPC url. Bare addresses get
    /// `https` when TLS is on and `http` otherwise.
    pub fn parse_grpc_address(addr: &str, tls: bool) -> Result<Url, ConnectionConfError> {
        let with_scheme = if addr.contains("://") {
            addr.to_owned()
        } else {
            let scheme = if tls { "https" } else { "http" };
            format!("{scheme}://{addr}")
        };
        Url::parse(&with_scheme)
            .map_err(|e| ConnectionConfError::InvalidConnectionUrl(addr.to_owned(), e))
    }

    /// The gRPC url
    pub fn grpc_url(&self) -> &Url {
        &self.grpc_url
    }

    /// Whether TLS is enabled
    pub fn tls(&self) -> bool {
        self.tls
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Account bech32 prefix
    pub fn bech32_prefix(&self) -> &str {
        &self.bech32_prefix
    }

    /// Consensus address bech32 prefix, e.g. `wardenvalcons`
    pub fn consensus_prefix(&self) -> String {
        format!("{}{VALCONS_SUFFIX}", self.bech32_prefix)
    }
}
