//! CoinGecko Pro API key usage.

use async_trait::async_trait;
use eyre::Result;
use serde::Deserialize;
use tracing::error;

use reqwest_utils::HttpClient;
use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};

/// CoinGecko Pro API root
pub const COINGECKO_API_URL: &str = "https://pro-api.coingecko.com/api/v3";
/// Header carrying the Pro API key
pub const COINGECKO_KEY_HEADER: &str = "x-cg-pro-api-key";

#[derive(Debug, Deserialize)]
struct KeyUsage {
    #[serde(default)]
    plan: String,
    rate_limit_request_per_minute: f64,
    monthly_call_credit: f64,
    current_total_monthly_calls: f64,
    current_remaining_monthly_calls: f64,
}

/// Exports the limits and consumption of the configured key.
#[derive(Debug)]
pub struct CoingeckoCollector {
    client: HttpClient,
    rate_limit: StatusGauge<1>,
    monthly_credit: StatusGauge<1>,
    remaining_calls: StatusGauge<1>,
    total_calls: StatusGauge<1>,
}

impl CoingeckoCollector {
    /// Register the CoinGecko gauges. `client` must send the key in
    /// [`COINGECKO_KEY_HEADER`].
    pub fn new(metrics: &CoreMetrics, client: HttpClient) -> Result<Self> {
        Ok(Self {
            client,
            rate_limit: metrics.new_status_gauge(
                "coingecko_rate_limit_per_minute",
                "Returns CoinGecko API Key rate limit per minute",
                ["plan"],
            )?,
            monthly_credit: metrics.new_status_gauge(
                "coingecko_monthly_call_credit",
                "Returns CoinGecko API Key monthly call credit",
                ["plan"],
            )?,
            remaining_calls: metrics.new_status_gauge(
                "coingecko_current_remaining_monthly_calls",
                "Returns CoinGecko API Key remaining monthly calls",
                ["plan"],
            )?,
            total_calls: metrics.new_status_gauge(
                "coingecko_current_total_monthly_calls",
                "Returns CoinGecko API Key current total monthly calls",
                ["plan"],
            )?,
        })
    }

    fn gauges(&self) -> [&StatusGauge<1>; 4] {
        [
            &self.rate_limit,
            &self.monthly_credit,
            &self.remaining_calls,
            &self.total_calls,
        ]
    }
}

#[async_trait]
impl MetricsCollector for CoingeckoCollector {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn collect(&self, scrape: &Scrape) {
        let usage: Result<KeyUsage> = scrape.call(self.client.get_json("key")).await;
        match usage {
            Ok(usage) => {
                let plan = [usage.plan.as_str()];
                self.rate_limit
                    .success(plan, usage.rate_limit_request_per_minute);
                self.monthly_credit.success(plan, usage.monthly_call_credit);
                self.remaining_calls
                    .success(plan, usage.current_remaining_monthly_calls);
                self.total_calls
                    .success(plan, usage.current_total_monthly_calls);
            }
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to fetch key usage");
                for gauge in self.gauges() {
                    gauge.error([""]);
                }
            }
        }
    }
}
