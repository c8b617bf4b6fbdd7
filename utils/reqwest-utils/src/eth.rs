use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::{split_custom_headers, Auth, HttpClient, HttpError};

/// A minimal Ethereum JSON-RPC client, enough to read native balances.
#[derive(Debug)]
pub struct EthRpcClient {
    http: HttpClient,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl EthRpcClient {
    /// Client for `rpc_url`. `custom_rpc_header` query parameters become
    /// request headers.
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let (headers, url) = split_custom_headers(&Url::parse(rpc_url)?)?;
        Ok(Self {
            http: HttpClient::with_headers(url, Auth::None, headers, timeout)?,
            next_id: AtomicU64::new(1),
        })
    }

    /// `eth_getBalance` at the latest block, as the hex quantity the node returns.
    pub async fn get_balance(&self, address: &str) -> Result<String, HttpError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_getBalance",
            "params": [address, "latest"],
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });
        let response: RpcResponse = self.http.post_json("", &body).await?;
        match (response.result, response.error) {
            (_, Some(err)) => Err(HttpError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(HttpError::EmptyRpcResponse),
        }
    }
}
