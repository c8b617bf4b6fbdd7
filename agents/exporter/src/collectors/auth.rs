//! Accounts known to the auth module.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use tracing::error;

use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};
use warden_core::AuthProvider;

use super::count;

/// Exports the number of accounts.
#[derive(Debug)]
pub struct AuthCollector {
    provider: Arc<dyn AuthProvider>,
    chain_id: String,
    accounts: StatusGauge<1>,
}

impl AuthCollector {
    /// Register `warden_accounts`.
    pub fn new(
        metrics: &CoreMetrics,
        provider: Arc<dyn AuthProvider>,
        chain_id: String,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            chain_id,
            accounts: metrics.new_status_gauge(
                "warden_accounts",
                "Returns the number of accounts existing in chain",
                ["chain_id"],
            )?,
        })
    }
}

#[async_trait]
impl MetricsCollector for AuthCollector {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn collect(&self, scrape: &Scrape) {
        let accounts = scrape.call(self.provider.accounts_total()).await;
        if let Err(err) = &accounts {
            error!(collector = self.name(), ?err, "failed to count accounts");
        }
        self.accounts
            .record([self.chain_id.as_str()], &accounts.map(count));
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{ChainCommunicationError, ChainResult};

    use super::*;
    use crate::test_utils::{single, test_metrics, test_scrape};

    mockall::mock! {
        pub Auth {}

        impl std::fmt::Debug for Auth {
            fn fmt<'a>(&self, f: &mut std::fmt::Formatter<'a>) -> std::fmt::Result;
        }

        #[async_trait]
        impl AuthProvider for Auth {
            async fn accounts_total(&self) -> ChainResult<u64>;
        }
    }

    #[tokio::test]
    async fn counts_accounts() {
        let metrics = test_metrics();
        let mut auth = MockAuth::new();
        auth.expect_accounts_total().returning(|| Ok(31_337));

        AuthCollector::new(&metrics, Arc::new(auth), "warden_8765-1".into())
            .unwrap()
            .collect(&test_scrape())
            .await;

        let accounts = single(&metrics, "warden_accounts");
        assert_eq!(accounts.value, 31_337.0);
        assert_eq!(accounts.status(), "success");
    }

    #[tokio::test]
    async fn failure_is_an_error_sample() {
        let metrics = test_metrics();
        let mut auth = MockAuth::new();
        auth.expect_accounts_total()
            .returning(|| Err(ChainCommunicationError::from_other_str("connection reset")));

        AuthCollector::new(&metrics, Arc::new(auth), "warden_8765-1".into())
            .unwrap()
            .collect(&test_scrape())
            .await;

        let accounts = single(&metrics, "warden_accounts");
        assert_eq!(accounts.status(), "error");
        assert_eq!(accounts.value, 0.0);
    }
}
