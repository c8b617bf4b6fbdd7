//! Intents defined in the legacy intent module.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use tracing::error;

use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};
use warden_core::WardenProvider;

use super::count;

/// Exports the number of intents.
#[derive(Debug)]
pub struct IntentsCollector {
    provider: Arc<dyn WardenProvider>,
    chain_id: String,
    intents: StatusGauge<1>,
}

impl IntentsCollector {
    /// Register `warden_intents`.
    pub fn new(
        metrics: &CoreMetrics,
        provider: Arc<dyn WardenProvider>,
        chain_id: String,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            chain_id,
            intents: metrics.new_status_gauge(
                "warden_intents",
                "Returns the number of Intents existing in chain",
                ["chain_id"],
            )?,
        })
    }
}

#[async_trait]
impl MetricsCollector for IntentsCollector {
    fn name(&self) -> &'static str {
        "intents"
    }

    async fn collect(&self, scrape: &Scrape) {
        let intents = scrape.call(self.provider.intents_total()).await;
        if let Err(err) = &intents {
            error!(collector = self.name(), ?err, "failed to count intents");
        }
        self.intents
            .record([self.chain_id.as_str()], &intents.map(count));
    }
}
