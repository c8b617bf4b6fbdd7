//! Messari API credit allowance.

use async_trait::async_trait;
use eyre::{bail, Result};
use serde::Deserialize;
use tracing::error;

use reqwest_utils::HttpClient;
use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};

use super::{bool_label, count};

/// Messari API root
pub const MESSARI_API_URL: &str = "https://api.messari.io";

#[derive(Debug, Deserialize)]
struct AllowanceResponse {
    #[serde(default)]
    error: Option<String>,
    data: Option<Allowance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Allowance {
    team_id: u64,
    credits_allocated: u64,
    is_active: bool,
    remaining_credits: u64,
}

/// Exports the remaining credits of the team owning the API key.
#[derive(Debug)]
pub struct MessariCollector {
    client: HttpClient,
    credit: StatusGauge<3>,
}

impl MessariCollector {
    /// Register `messari_credit`.
    pub fn new(metrics: &CoreMetrics, client: HttpClient) -> Result<Self> {
        Ok(Self {
            client,
            credit: metrics.new_status_gauge(
                "messari_credit",
                "Returns Messari API Key credit information",
                ["team_id", "is_active", "credits_allocated"],
            )?,
        })
    }

    async fn allowance(&self, scrape: &Scrape) -> Result<Allowance> {
        let response: AllowanceResponse = scrape
            .call(self.client.get_json("user-management/v1/credits/allowance"))
            .await?;
        match response {
            AllowanceResponse {
                error: Some(message),
                ..
            } if !message.is_empty() => bail!("messari answered with an error: {message}"),
            AllowanceResponse {
                data: Some(allowance),
                ..
            } => Ok(allowance),
            _ => bail!("messari answered without data"),
        }
    }
}

#[async_trait]
impl MetricsCollector for MessariCollector {
    fn name(&self) -> &'static str {
        "messari"
    }

    async fn collect(&self, scrape: &Scrape) {
        match self.allowance(scrape).await {
            Ok(allowance) => {
                let team_id = allowance.team_id.to_string();
                let allocated = allowance.credits_allocated.to_string();
                self.credit.success(
                    [&team_id, bool_label(allowance.is_active), &allocated],
                    count(allowance.remaining_credits),
                );
            }
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to fetch credit allowance");
                self.credit.error(["", "", ""]);
            }
        }
    }
}
