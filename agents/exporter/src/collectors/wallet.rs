//! Balances of configured accounts in the staking denom.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use futures::future::join_all;
use tracing::error;

use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};
use warden_core::{parse_integer_amount, BankProvider};

/// Decimal exponent of `denom`. The two Warden denoms are fixed, anything
/// else uses `default`.
pub fn denom_exponent(denom: &str, default: u32) -> u32 {
    match denom {
        "award" => 18,
        "uward" => 6,
        _ => default,
    }
}

/// Exports one balance per configured account.
#[derive(Debug)]
pub struct WalletCollector {
    bank: Arc<dyn BankProvider>,
    chain_id: String,
    denom: String,
    exponent: u32,
    addresses: Vec<String>,
    balance: StatusGauge<3>,
}

impl WalletCollector {
    /// Register `cosmos_wallet_balance`.
    pub fn new(
        metrics: &CoreMetrics,
        bank: Arc<dyn BankProvider>,
        chain_id: String,
        denom: String,
        default_exponent: u32,
        addresses: Vec<String>,
    ) -> Result<Self> {
        Ok(Self {
            bank,
            chain_id,
            exponent: denom_exponent(&denom, default_exponent),
            denom,
            addresses,
            balance: metrics.new_status_gauge(
                "cosmos_wallet_balance",
                "Returns the wallet balance of account",
                ["chain_id", "account", "denom"],
            )?,
        })
    }

    async fn balance(&self, scrape: &Scrape, address: &str) -> Result<f64> {
        let raw = scrape.call(self.bank.balance(address, &self.denom)).await?;
        Ok(parse_integer_amount(&raw, self.exponent)?)
    }
}

#[async_trait]
impl MetricsCollector for WalletCollector {
    fn name(&self) -> &'static str {
        "wallet"
    }

    async fn collect(&self, scrape: &Scrape) {
        let balances = join_all(
            self.addresses
                .iter()
                .map(|address| self.balance(scrape, address)),
        )
        .await;

        for (address, balance) in self.addresses.iter().zip(balances) {
            if let Err(err) = &balance {
                error!(
                    collector = self.name(),
                    account = %address,
                    ?err,
                    "failed to fetch balance"
                );
            }
            self.balance.record(
                [self.chain_id.as_str(), address, self.denom.as_str()],
                &balance,
            );
        }
    }
}
