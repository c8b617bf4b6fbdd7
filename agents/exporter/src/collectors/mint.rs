//! Inflation, annual provisions and total supply of the staking denom.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use tracing::error;

use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};
use warden_core::{parse_integer_amount, parse_legacy_dec, scale, BankProvider, MintProvider};

/// Exports the mint module parameters and the bank supply.
#[derive(Debug)]
pub struct MintCollector {
    mint: Arc<dyn MintProvider>,
    bank: Arc<dyn BankProvider>,
    chain_id: String,
    denom: String,
    exponent: u32,
    inflation: StatusGauge<1>,
    annual_provisions: StatusGauge<2>,
    total_supply: StatusGauge<2>,
}

impl MintCollector {
    /// Register the mint and supply gauges.
    pub fn new(
        metrics: &CoreMetrics,
        mint: Arc<dyn MintProvider>,
        bank: Arc<dyn BankProvider>,
        chain_id: String,
        denom: String,
        exponent: u32,
    ) -> Result<Self> {
        Ok(Self {
            mint,
            bank,
            chain_id,
            denom,
            exponent,
            inflation: metrics.new_status_gauge(
                "cosmos_mint_inflation",
                "Current inflation rate of the chain",
                ["chain_id"],
            )?,
            annual_provisions: metrics.new_status_gauge(
                "cosmos_mint_annual_provisions",
                "Annual provisions (tokens minted per year)",
                ["chain_id", "denom"],
            )?,
            total_supply: metrics.new_status_gauge(
                "cosmos_bank_total_supply",
                "Total supply of the chain denomination",
                ["chain_id", "denom"],
            )?,
        })
    }

    async fn inflation(&self, scrape: &Scrape) -> Result<f64> {
        let raw = scrape.call(self.mint.inflation()).await?;
        Ok(parse_legacy_dec(&raw)?)
    }

    async fn annual_provisions(&self, scrape: &Scrape) -> Result<f64> {
        let raw = scrape.call(self.mint.annual_provisions()).await?;
        Ok(scale(parse_legacy_dec(&raw)?, self.exponent))
    }

    async fn total_supply(&self, scrape: &Scrape) -> Result<f64> {
        let raw = scrape.call(self.bank.supply_of(&self.denom)).await?;
        Ok(parse_integer_amount(&raw, self.exponent)?)
    }
}

#[async_trait]
impl MetricsCollector for MintCollector {
    fn name(&self) -> &'static str {
        "mint"
    }

    async fn collect(&self, scrape: &Scrape) {
        let (inflation, provisions, supply) = tokio::join!(
            self.inflation(scrape),
            self.annual_provisions(scrape),
            self.total_supply(scrape),
        );

        for (err, what) in [
            (inflation.as_ref().err(), "inflation"),
            (provisions.as_ref().err(), "annual provisions"),
            (supply.as_ref().err(), "total supply"),
        ] {
            if let Some(err) = err {
                error!(collector = self.name(), ?err, "failed to fetch {what}");
            }
        }

        let chain_id = self.chain_id.as_str();
        let denom = self.denom.as_str();
        self.inflation.record([chain_id], &inflation);
        self.annual_provisions.record([chain_id, denom], &provisions);
        self.total_supply.record([chain_id, denom], &supply);
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{ChainCommunicationError, ChainResult};

    use super::*;
    use crate::test_utils::{single, test_metrics, test_scrape, MockBank};

    mockall::mock! {
        pub Mint {}

        impl std::fmt::Debug for Mint {
            fn fmt<'a>(&self, f: &mut std::fmt::Formatter<'a>) -> std::fmt::Result;
        }

        #[async_trait]
        impl MintProvider for Mint {
            async fn inflation(&self) -> ChainResult<Vec<u8>>;
            async fn annual_provisions(&self) -> ChainResult<Vec<u8>>;
        }
    }

    fn collector(metrics: &CoreMetrics, mint: MockMint, bank: MockBank) -> MintCollector {
        MintCollector::new(
            metrics,
            Arc::new(mint),
            Arc::new(bank),
            "warden_8765-1".into(),
            "award".into(),
            18,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn reads_legacy_decimals_and_supply() {
        let metrics = test_metrics();
        let mut mint = MockMint::new();
        // 0.13 and 1_000_000 award as LegacyDec integers
        mint.expect_inflation()
            .returning(|| Ok(b"130000000000000000".to_vec()));
        mint.expect_annual_provisions()
            .returning(|| Ok(b"1000000000000000000000000000000000000000000".to_vec()));
        let mut bank = MockBank::new();
        bank.expect_supply_of()
            .withf(|denom| denom == "award")
            .returning(|_| Ok("500000000000000000000000000".into()));

        collector(&metrics, mint, bank).collect(&test_scrape()).await;

        let inflation = single(&metrics, "cosmos_mint_inflation");
        assert!((inflation.value - 0.13).abs() < 1e-12);
        assert_eq!(inflation.status(), "success");

        let provisions = single(&metrics, "cosmos_mint_annual_provisions");
        assert!((provisions.value - 1_000_000.0).abs() < 1e-6);
        assert_eq!(provisions.label("denom"), "award");

        let supply = single(&metrics, "cosmos_bank_total_supply");
        assert!((supply.value - 500_000_000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn each_figure_degrades_on_its_own() {
        let metrics = test_metrics();
        let mut mint = MockMint::new();
        mint.expect_inflation()
            .returning(|| Ok(b"not a number".to_vec()));
        mint.expect_annual_provisions()
            .returning(|| Err(ChainCommunicationError::from_other_str("unavailable")));
        let mut bank = MockBank::new();
        bank.expect_supply_of().returning(|_| Ok("42000000".into()));

        collector(&metrics, mint, bank).collect(&test_scrape()).await;

        assert_eq!(single(&metrics, "cosmos_mint_inflation").status(), "error");
        assert_eq!(
            single(&metrics, "cosmos_mint_annual_provisions").status(),
            "error"
        );
        let supply = single(&metrics, "cosmos_bank_total_supply");
        assert_eq!(supply.status(), "success");
    }
}
