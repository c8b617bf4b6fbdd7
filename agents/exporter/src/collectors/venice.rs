//! Venice account balances and per API key usage.

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use serde::Deserialize;
use tracing::error;

use reqwest_utils::HttpClient;
use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};

/// Venice API root
pub const VENICE_API_URL: &str = "https://api.venice.ai/api/v1";

const SYMBOLS: [&str; 2] = ["DIEM", "USD"];

#[derive(Debug, Deserialize)]
struct RateLimitsResponse {
    data: RateLimitsData,
}

#[derive(Debug, Deserialize)]
struct RateLimitsData {
    balances: Balances,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct Balances {
    #[serde(default)]
    usd: f64,
    #[serde(default)]
    diem: f64,
}

#[derive(Debug, Deserialize)]
struct ApiKeysResponse {
    data: Vec<ApiKey>,
}

#[derive(Debug, Deserialize)]
struct ApiKey {
    id: String,
    #[serde(default)]
    description: String,
    usage: ApiKeyUsage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyUsage {
    trailing_seven_days: TrailingUsage,
}

#[derive(Debug, Deserialize)]
struct TrailingUsage {
    #[serde(default)]
    usd: Option<String>,
    #[serde(default)]
    diem: Option<String>,
}

impl TrailingUsage {
    fn amount(&self, symbol: &str) -> Result<f64> {
        let raw = match symbol {
            "DIEM" => self.diem.as_deref(),
            _ => self.usd.as_deref(),
        };
        match raw.map(str::trim) {
            None | Some("") => Ok(0.0),
            Some(raw) => raw
                .parse()
                .wrap_err_with(|| format!("unreadable {symbol} usage {raw:?}")),
        }
    }
}

/// Exports Venice balances and trailing seven day usage.
#[derive(Debug)]
pub struct VeniceCollector {
    client: HttpClient,
    funds: StatusGauge<1>,
    usage: StatusGauge<3>,
}

impl VeniceCollector {
    /// Register the Venice gauges. `client` must be rooted at the API and
    /// carry the bearer key.
    pub fn new(metrics: &CoreMetrics, client: HttpClient) -> Result<Self> {
        Ok(Self {
            client,
            funds: metrics.new_status_gauge(
                "venice_funds",
                "Returns Venice Billing information",
                ["symbol"],
            )?,
            usage: metrics.new_status_gauge(
                "venice_api_key_usage",
                "Returns Venice API Key usage information",
                ["id", "description", "symbol"],
            )?,
        })
    }

    async fn balances(&self, scrape: &Scrape) -> Result<Balances> {
        let response: RateLimitsResponse = scrape
            .call(self.client.get_json("api_keys/rate_Limits"))
            .await?;
        Ok(response.data.balances)
    }

    async fn api_keys(&self, scrape: &Scrape) -> Result<Vec<ApiKey>> {
        let response: ApiKeysResponse = scrape.call(self.client.get_json("api_keys")).await?;
        Ok(response.data)
    }
}

#[async_trait]
impl MetricsCollector for VeniceCollector {
    fn name(&self) -> &'static str {
        "venice"
    }

    async fn collect(&self, scrape: &Scrape) {
        let (balances, keys) = tokio::join!(self.balances(scrape), self.api_keys(scrape));

        match balances {
            Ok(balances) => {
                self.funds.success(["DIEM"], balances.diem);
                self.funds.success(["USD"], balances.usd);
            }
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to fetch balances");
                for symbol in SYMBOLS {
                    self.funds.error([symbol]);
                }
            }
        }

        match keys {
            Ok(keys) => {
                for key in &keys {
                    for symbol in SYMBOLS {
                        let amount = key.usage.trailing_seven_days.amount(symbol);
                        if let Err(err) = &amount {
                            error!(
                                collector = self.name(),
                                id = %key.id,
                                ?err,
                                "bad usage figure"
                            );
                        }
                        self.usage.record(
                            [key.id.as_str(), key.description.as_str(), symbol],
                            &amount,
                        );
                    }
                }
            }
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to fetch API key usage");
                for symbol in SYMBOLS {
                    self.usage.error(["", "", symbol]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use reqwest_utils::Auth;
    use serde_json::json;

    use super::*;
    use crate::test_utils::{find, samples, test_metrics, test_scrape};

    fn collector(metrics: &CoreMetrics, server: &MockServer) -> VeniceCollector {
        let client = HttpClient::new(
            &server.url("/api/v1"),
            Auth::Bearer("venice-key".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        VeniceCollector::new(metrics, client).unwrap()
    }

    #[tokio::test]
    async fn exports_balances_and_key_usage() {
        let server = MockServer::start_async().await;
        let balances = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/api_keys/rate_Limits")
                    .header("authorization", "Bearer venice-key");
                then.status(200).json_body(json!({
                    "data": {
                        "accessPermitted": true,
                        "balances": { "USD": 41.5, "DIEM": 12.25, "VCU": 0.0 }
                    }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/api_keys");
                then.status(200).json_body(json!({
                    "data": [{
                        "id": "key-1",
                        "description": "agents",
                        "usage": {
                            "trailingSevenDays": { "usd": "3.75", "diem": "1.5", "vcu": "0" }
                        }
                    }]
                }));
            })
            .await;

        let metrics = test_metrics();
        collector(&metrics, &server).collect(&test_scrape()).await;
        balances.assert_async().await;

        let usd = find(&metrics, "venice_funds", &[("symbol", "USD")]);
        assert_eq!(usd.value, 41.5);
        let diem = find(&metrics, "venice_funds", &[("symbol", "DIEM")]);
        assert_eq!(diem.value, 12.25);

        let usd = find(
            &metrics,
            "venice_api_key_usage",
            &[("id", "key-1"), ("symbol", "USD")],
        );
        assert_eq!(usd.value, 3.75);
        assert_eq!(usd.label("description"), "agents");
        assert_eq!(usd.status(), "success");
        let diem = find(
            &metrics,
            "venice_api_key_usage",
            &[("id", "key-1"), ("symbol", "DIEM")],
        );
        assert_eq!(diem.value, 1.5);
    }

    #[tokio::test]
    async fn unauthorised_key_degrades_both_gauges() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(401).json_body(json!({ "error": "Authentication failed" }));
            })
            .await;

        let metrics = test_metrics();
        collector(&metrics, &server).collect(&test_scrape()).await;

        for name in ["venice_funds", "venice_api_key_usage"] {
            let all = samples(&metrics, name);
            assert_eq!(all.len(), 2, "{name}");
            assert!(all.iter().all(|s| s.status() == "error" && s.value == 0.0));
        }
        let usage = find(&metrics, "venice_api_key_usage", &[("symbol", "USD")]);
        assert_eq!(usage.label("id"), "");
    }
}
