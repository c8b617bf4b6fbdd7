use reqwest::StatusCode;

/// Errors raised while talking to an HTTP JSON API
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Connection, timeout or body read failure
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    /// The server answered with a non 2xx status
    #[error("{url} responded {status}: {body}")]
    Status {
        /// Requested url
        url: String,
        /// Response status
        status: StatusCode,
        /// Start of the response body
        body: String,
    },
    /// The body was not the JSON shape we expected
    #[error("cannot decode response from {url}: {source}")]
    Decode {
        /// Requested url
        url: String,
        /// Decoder error
        source: serde_json::Error,
    },
    /// A JSON-RPC error object came back
    #[error("json-rpc error {code}: {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },
    /// A JSON-RPC response carried neither result nor error
    #[error("json-rpc response without result")]
    EmptyRpcResponse,
    /// The base url or a path could not be parsed
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// A header name or value is not valid
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}
