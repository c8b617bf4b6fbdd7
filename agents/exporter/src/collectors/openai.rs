//! OpenAI organisation costs for the current month.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use serde::Deserialize;
use tracing::error;

use reqwest_utils::HttpClient;
use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};

use super::month_start;

/// OpenAI API root
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize)]
struct CostsResponse {
    #[serde(default)]
    data: Vec<CostBucket>,
}

#[derive(Debug, Deserialize)]
struct CostBucket {
    #[serde(default)]
    results: Vec<CostResult>,
}

#[derive(Debug, Deserialize)]
struct CostResult {
    amount: Amount,
}

#[derive(Debug, Deserialize)]
struct Amount {
    value: f64,
}

/// Query window for month-to-date costs: unix start and one daily bucket
/// per started day.
fn cost_window(now: DateTime<Utc>) -> (i64, i64) {
    let start = month_start(now);
    let days = now.signed_duration_since(start).num_days() + 1;
    (start.timestamp(), days)
}

/// Exports month-to-date spend of the organisation owning the admin key.
#[derive(Debug)]
pub struct OpenAiCollector {
    client: HttpClient,
    clock: fn() -> DateTime<Utc>,
    cost: StatusGauge<1>,
}

impl OpenAiCollector {
    /// Register `openai_cost`.
    pub fn new(metrics: &CoreMetrics, client: HttpClient) -> Result<Self> {
        Ok(Self {
            client,
            clock: Utc::now,
            cost: metrics.new_status_gauge(
                "openai_cost",
                "Returns OpenAI API costs",
                ["currency"],
            )?,
        })
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    async fn month_to_date(&self, scrape: &Scrape) -> Result<f64> {
        let (start_time, limit) = cost_window((self.clock)());
        let query = [("start_time", start_time), ("limit", limit)];
        let response: CostsResponse = scrape
            .call(self.client.get_json_with_query("organization/costs", &query))
            .await?;
        Ok(response
            .data
            .iter()
            .flat_map(|bucket| &bucket.results)
            .map(|result| result.amount.value)
            .sum())
    }
}

#[async_trait]
impl MetricsCollector for OpenAiCollector {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn collect(&self, scrape: &Scrape) {
        let cost = self.month_to_date(scrape).await;
        if let Err(err) = &cost {
            error!(collector = self.name(), ?err, "failed to fetch monthly costs");
        }
        self.cost.record(["USD"], &cost);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use httpmock::prelude::*;
    use reqwest_utils::Auth;
    use serde_json::json;

    use super::*;
    use crate::test_utils::{single, test_metrics, test_scrape};

    fn march_17th() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 17, 14, 5, 9).unwrap()
    }

    fn collector(metrics: &CoreMetrics, server: &MockServer) -> OpenAiCollector {
        let client = HttpClient::new(
            &server.url("/v1"),
            Auth::Bearer("sk-admin".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        OpenAiCollector::new(metrics, client)
            .unwrap()
            .with_clock(march_17th)
    }

    #[test]
    fn window_covers_every_started_day() {
        assert_eq!(cost_window(march_17th()), (1_740_787_200, 17));
        let first = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(cost_window(first), (1_740_787_200, 1));
    }

    #[tokio::test]
    async fn sums_every_bucket() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/organization/costs")
                    .query_param("start_time", "1740787200")
                    .query_param("limit", "17")
                    .header("authorization", "Bearer sk-admin");
                then.status(200).json_body(json!({
                    "object": "page",
                    "data": [
                        { "results": [
                            { "amount": { "value": 1.25, "currency": "usd" } },
                            { "amount": { "value": 0.5, "currency": "usd" } }
                        ] },
                        { "results": [] },
                        { "results": [{ "amount": { "value": 2.0, "currency": "usd" } }] }
                    ]
                }));
            })
            .await;

        let metrics = test_metrics();
        collector(&metrics, &server).collect(&test_scrape()).await;
        mock.assert_async().await;

        let cost = single(&metrics, "openai_cost");
        assert_eq!(cost.value, 3.75);
        assert_eq!(cost.label("currency"), "USD");
        assert_eq!(cost.status(), "success");
    }

    #[tokio::test]
    async fn server_error_is_an_error_sample() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500);
            })
            .await;

        let metrics = test_metrics();
        collector(&metrics, &server).collect(&test_scrape()).await;

        let cost = single(&metrics, "openai_cost");
        assert_eq!(cost.status(), "error");
        assert_eq!(cost.value, 0.0);
    }
}
