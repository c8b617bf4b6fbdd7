//! Actions and rules of the act module.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use tracing::error;

use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};
use warden_core::WardenProvider;

use super::count;

/// Exports the number of actions and rules.
#[derive(Debug)]
pub struct ActionsCollector {
    provider: Arc<dyn WardenProvider>,
    chain_id: String,
    actions: StatusGauge<1>,
    rules: StatusGauge<1>,
}

impl ActionsCollector {
    /// Register `warden_actions` and `warden_rules`.
    pub fn new(
        metrics: &CoreMetrics,
        provider: Arc<dyn WardenProvider>,
        chain_id: String,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            chain_id,
            actions: metrics.new_status_gauge(
                "warden_actions",
                "Returns the number of actions in the chain",
                ["chain_id"],
            )?,
            rules: metrics.new_status_gauge(
                "warden_rules",
                "Returns the number of Rules existing in chain",
                ["chain_id"],
            )?,
        })
    }
}

#[async_trait]
impl MetricsCollector for ActionsCollector {
    fn name(&self) -> &'static str {
        "actions"
    }

    async fn collect(&self, scrape: &Scrape) {
        let (actions, rules) = tokio::join!(
            scrape.call(self.provider.actions_total()),
            scrape.call(self.provider.rules_total()),
        );
        let labels = [self.chain_id.as_str()];
        for (gauge, total, what) in [
            (&self.actions, actions, "actions"),
            (&self.rules, rules, "rules"),
        ] {
            if let Err(err) = &total {
                error!(collector = self.name(), ?err, "failed to count {what}");
            }
            gauge.record(labels, &total.map(count));
        }
    }
}

#[cfg(test)]
mod tests {
    use warden_core::ChainCommunicationError;

    use super::*;
    use crate::test_utils::{single, test_metrics, test_scrape, MockWarden};

    #[tokio::test]
    async fn rules_fail_independently_of_actions() {
        let metrics = test_metrics();
        let mut warden = MockWarden::new();
        warden.expect_actions_total().returning(|| Ok(7));
        warden
            .expect_rules_total()
            .returning(|| Err(ChainCommunicationError::from_other_str("deadline exceeded")));

        ActionsCollector::new(&metrics, Arc::new(warden), "warden_8765-1".into())
            .unwrap()
            .collect(&test_scrape())
            .await;

        let actions = single(&metrics, "warden_actions");
        assert_eq!(actions.value, 7.0);
        assert_eq!(actions.status(), "success");

        let rules = single(&metrics, "warden_rules");
        assert_eq!(rules.value, 0.0);
        assert_eq!(rules.status(), "error");
    }
}
