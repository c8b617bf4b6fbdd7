//! xAI team billing: usage, postpaid spending limits and prepaid balance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use reqwest_utils::HttpClient;
use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};

use super::{day_start, month_start};

/// xAI management API root
pub const XAI_API_URL: &str = "https://management-api.x.ai/v1";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Monthly,
    Daily,
}

impl Period {
    const ALL: [Period; 2] = [Period::Monthly, Period::Daily];

    fn label(self) -> &'static str {
        match self {
            Period::Monthly => "monthly",
            Period::Daily => "daily",
        }
    }

    fn time_unit(self) -> &'static str {
        match self {
            Period::Monthly => "TIME_UNIT_MONTH",
            Period::Daily => "TIME_UNIT_DAY",
        }
    }

    fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Monthly => month_start(now),
            Period::Daily => day_start(now),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsageRequest {
    analytics_request: AnalyticsRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsRequest {
    time_range: TimeRange,
    time_unit: &'static str,
    values: Vec<ValueQuery>,
    group_by: Vec<&'static str>,
    filters: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeRange {
    start_time: String,
    end_time: String,
    timezone: &'static str,
}

#[derive(Debug, Serialize)]
struct ValueQuery {
    name: &'static str,
    aggregation: &'static str,
}

impl UsageRequest {
    /// USD spend from the start of `period` until `now`, grouped by description.
    fn new(period: Period, now: DateTime<Utc>) -> Self {
        Self {
            analytics_request: AnalyticsRequest {
                time_range: TimeRange {
                    start_time: period.start(now).format(TIME_FORMAT).to_string(),
                    end_time: now.format(TIME_FORMAT).to_string(),
                    timezone: "Etc/GMT",
                },
                time_unit: period.time_unit(),
                values: vec![ValueQuery {
                    name: "usd",
                    aggregation: "AGGREGATION_SUM",
                }],
                group_by: vec!["description"],
                filters: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageResponse {
    #[serde(default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeSeries {
    #[serde(default)]
    data_points: Vec<DataPoint>,
}

#[derive(Debug, Deserialize)]
struct DataPoint {
    #[serde(default)]
    values: Vec<f64>,
}

impl UsageResponse {
    fn total(&self) -> f64 {
        self.time_series
            .iter()
            .flat_map(|series| &series.data_points)
            .flat_map(|point| &point.values)
            .sum()
    }
}

/// An amount in US cents, sent as a string.
#[derive(Debug, Default, Deserialize)]
struct Cents {
    #[serde(default)]
    val: String,
}

impl Cents {
    /// Dollars; an unset amount counts as zero.
    fn dollars(&self) -> Result<f64> {
        let raw = self.val.trim();
        if raw.is_empty() {
            return Ok(0.0);
        }
        let cents: f64 = raw
            .parse()
            .wrap_err_with(|| format!("unreadable amount {raw:?}"))?;
        Ok(cents / 100.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpendingLimitsResponse {
    spending_limits: SpendingLimits,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpendingLimits {
    #[serde(default)]
    hard_sl_auto: Cents,
    #[serde(default)]
    effective_hard_sl: Cents,
    #[serde(default)]
    soft_sl: Cents,
    #[serde(default)]
    effective_sl: Cents,
}

impl SpendingLimits {
    fn by_type(&self) -> [(&'static str, &Cents); 4] {
        [
            ("hard_sl_auto", &self.hard_sl_auto),
            ("effective_hard_sl", &self.effective_hard_sl),
            ("soft_sl", &self.soft_sl),
            ("effective_sl", &self.effective_sl),
        ]
    }
}

const LIMIT_TYPES: [&str; 4] = ["hard_sl_auto", "effective_hard_sl", "soft_sl", "effective_sl"];

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(default)]
    total: Cents,
}

/// Exports a team's usage, spending limits and prepaid balance.
#[derive(Debug)]
pub struct XaiCollector {
    client: HttpClient,
    team_id: String,
    clock: fn() -> DateTime<Utc>,
    usage: StatusGauge<2>,
    spending_limit: StatusGauge<2>,
    balance: StatusGauge<1>,
}

impl XaiCollector {
    /// Register the xAI gauges for `team_id`.
    pub fn new(metrics: &CoreMetrics, client: HttpClient, team_id: String) -> Result<Self> {
        Ok(Self {
            client,
            team_id,
            clock: Utc::now,
            usage: metrics.new_status_gauge(
                "xai_usage",
                "Returns X.AI API usage cost in USD",
                ["period", "currency"],
            )?,
            spending_limit: metrics.new_status_gauge(
                "xai_postpaid_spending_limit",
                "Returns X.AI postpaid spending limits information",
                ["limit_type", "currency"],
            )?,
            balance: metrics.new_status_gauge(
                "xai_prepaid_balance",
                "Returns X.AI prepaid balance information",
                ["currency"],
            )?,
        })
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn path(&self, rest: &str) -> String {
        format!("billing/teams/{}/{rest}", self.team_id)
    }

    async fn usage(&self, scrape: &Scrape, period: Period) -> Result<f64> {
        let request = UsageRequest::new(period, (self.clock)());
        let response: UsageResponse = scrape
            .call(self.client.post_json(&self.path("usage"), &request))
            .await?;
        Ok(response.total())
    }

    async fn spending_limits(&self, scrape: &Scrape) -> Result<SpendingLimits> {
        let response: SpendingLimitsResponse = scrape
            .call(
                self.client
                    .get_json(&self.path("postpaid/spending-limits")),
            )
            .await?;
        Ok(response.spending_limits)
    }

    async fn balance(&self, scrape: &Scrape) -> Result<f64> {
        let response: BalanceResponse = scrape
            .call(self.client.get_json(&self.path("prepaid/balance")))
            .await?;
        response.total.dollars()
    }
}

#[async_trait]
impl MetricsCollector for XaiCollector {
    fn name(&self) -> &'static str {
        "xai"
    }

    async fn collect(&self, scrape: &Scrape) {
        let (monthly, daily, limits, balance) = tokio::join!(
            self.usage(scrape, Period::Monthly),
            self.usage(scrape, Period::Daily),
            self.spending_limits(scrape),
            self.balance(scrape),
        );

        for (period, usage) in Period::ALL.into_iter().zip([monthly, daily]) {
            if let Err(err) = &usage {
                error!(
                    collector = self.name(),
                    period = period.label(),
                    ?err,
                    "failed to fetch usage"
                );
            }
            self.usage.record([period.label(), CURRENCY], &usage);
        }

        match limits {
            Ok(limits) => {
                for (limit_type, cents) in limits.by_type() {
                    let dollars = cents.dollars();
                    if let Err(err) = &dollars {
                        error!(collector = self.name(), limit_type, ?err, "bad spending limit");
                    }
                    self.spending_limit.record([limit_type, CURRENCY], &dollars);
                }
            }
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to fetch spending limits");
                for limit_type in LIMIT_TYPES {
                    self.spending_limit.error([limit_type, CURRENCY]);
                }
            }
        }

        if let Err(err) = &balance {
            error!(collector = self.name(), ?err, "failed to fetch prepaid balance");
        }
        self.balance.record([CURRENCY], &balance);
    }
}
