//! Native balances on EVM chains, read with `eth_getBalance`.

use async_trait::async_trait;
use eyre::Result;
use futures::future::join_all;
use tracing::error;

use reqwest_utils::EthRpcClient;
use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};
use warden_core::parse_hex_amount;

/// Decimals of a native EVM coin
const WEI_EXPONENT: u32 = 18;

/// Which EVM chain a balance collector reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmChain {
    /// Collector name
    pub name: &'static str,
    /// Exported metric
    pub metric: &'static str,
    /// Metric help
    pub help: &'static str,
    /// Native coin symbol
    pub symbol: &'static str,
}

impl EvmChain {
    /// Base mainnet
    pub const BASE: EvmChain = EvmChain {
        name: "base",
        metric: "base_wallet_balance",
        help: "Returns the wallet balance on Base blockchain",
        symbol: "ETH",
    };

    /// BNB smart chain
    pub const BNB: EvmChain = EvmChain {
        name: "bnb",
        metric: "bnb_wallet_balance",
        help: "Returns the wallet balance on BNB blockchain",
        symbol: "BNB",
    };
}

/// Exports the native balance of each configured account.
#[derive(Debug)]
pub struct EvmBalanceCollector {
    chain: EvmChain,
    client: EthRpcClient,
    addresses: Vec<String>,
    balance: StatusGauge<2>,
}

impl EvmBalanceCollector {
    /// Register the chain's balance gauge.
    pub fn new(
        metrics: &CoreMetrics,
        chain: EvmChain,
        client: EthRpcClient,
        addresses: Vec<String>,
    ) -> Result<Self> {
        Ok(Self {
            chain,
            client,
            addresses,
            balance: metrics.new_status_gauge(chain.metric, chain.help, ["account", "symbol"])?,
        })
    }

    async fn balance(&self, scrape: &Scrape, address: &str) -> Result<f64> {
        let raw = scrape.call(self.client.get_balance(address)).await?;
        Ok(parse_hex_amount(&raw, WEI_EXPONENT)?)
    }
}

#[async_trait]
impl MetricsCollector for EvmBalanceCollector {
    fn name(&self) -> &'static str {
        self.chain.name
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
            self.balance
                .record([address.as_str(), self.chain.symbol], &balance);
        }
    }
}
