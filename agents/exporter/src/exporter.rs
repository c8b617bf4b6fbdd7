use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use tracing::{info, instrument, warn};

use reqwest_utils::{Auth, EthRpcClient, HttpClient};
use warden_base::{BaseAgent, CoreMetrics, MetricsCollector, Scraper, Server};
use warden_cosmos::warden::WardenQueryClient;

use crate::collectors::{
    ActionsCollector, AuthCollector, CoingeckoCollector, EvmBalanceCollector, EvmChain,
    GrpcConnector, IntentsCollector, MessariCollector, MintCollector, OpenAiCollector,
    ValidatorsCollector, VeniceCollector, WalletCollector, WardenCollector, WarpCollector,
    XaiCollector, COINGECKO_API_URL, COINGECKO_KEY_HEADER, MESSARI_API_URL, OPENAI_API_URL,
    VENICE_API_URL, XAI_API_URL,
};
use crate::settings::{EvmConf, ExporterSettings};

/// The Warden exporter: a set of collectors behind the metrics server.
#[derive(Debug)]
pub struct Exporter {
    scraper: Arc<Scraper>,
    server: Arc<Server>,
}

#[async_trait]
impl BaseAgent for Exporter {
    const AGENT_NAME: &'static str = "warden_exporter";

    type Settings = ExporterSettings;

    #[instrument(skip_all, fields(chain_id = %settings.chain_id))]
    async fn from_settings(settings: Self::Settings, metrics: Arc<CoreMetrics>) -> Result<Self> {
        let collectors = build_collectors(&settings, &metrics)?;
        if collectors.is_empty() {
            warn!("No collector is enabled, /metrics will only carry scrape durations");
        }

        let scraper = collectors.into_iter().fold(
            Scraper::new(metrics, settings.scrape_timeout()),
            Scraper::with_collector,
        );

        let scraper = Arc::new(scraper);
        let server = Arc::new(Server::new(settings.metrics_port, scraper.clone()));
        Ok(Self { scraper, server })
    }

    async fn run(self) -> Result<()> {
        info!(collectors = ?self.scraper.collector_names(), "Serving metrics");
        tokio::select! {
            served = self.server.clone().run() => served,
            signal = tokio::signal::ctrl_c() => {
                signal.wrap_err("Failed to listen for the shutdown signal")?;
                info!("Received shutdown signal");
                Ok(())
            }
        }
    }
}

/// Instantiate every collector the settings switch on.
fn build_collectors(
    settings: &ExporterSettings,
    metrics: &CoreMetrics,
) -> Result<Vec<Arc<dyn MetricsCollector>>> {
    let timeout = settings.scrape_timeout();
    let chain_id = settings.chain_id.clone();
    let mut collectors: Vec<Arc<dyn MetricsCollector>> = Vec::new();

    let grpc = Arc::new(
        settings
            .build_grpc_provider()
            .wrap_err("Failed to build the gRPC provider")?,
    );

    if let Some(conf) = settings.validators {
        collectors.push(Arc::new(ValidatorsCollector::new(
            metrics,
            Arc::new(GrpcConnector::new(settings.chain.clone())),
            chain_id.clone(),
            settings.exponent,
            conf,
        )?));
    }

    if settings.warden_metrics {
        let warden = Arc::new(WardenQueryClient::new(grpc.as_ref().clone()));
        collectors.push(Arc::new(WardenCollector::new(
            metrics,
            warden.clone(),
            chain_id.clone(),
        )?));
        collectors.push(Arc::new(IntentsCollector::new(
            metrics,
            warden.clone(),
            chain_id.clone(),
        )?));
        collectors.push(Arc::new(ActionsCollector::new(
            metrics,
            warden,
            chain_id.clone(),
        )?));
        collectors.push(Arc::new(AuthCollector::new(
            metrics,
            grpc.clone(),
            chain_id.clone(),
        )?));
    }

    if settings.mint_metrics {
        collectors.push(Arc::new(MintCollector::new(
            metrics,
            grpc.clone(),
            grpc.clone(),
            chain_id.clone(),
            settings.denom.clone(),
            settings.exponent,
        )?));
    }

    if !settings.wallet_addresses.is_empty() {
        collectors.push(Arc::new(WalletCollector::new(
            metrics,
            grpc.clone(),
            chain_id.clone(),
            settings.denom.clone(),
            settings.exponent,
            settings.wallet_addresses.clone(),
        )?));
    }

    for (chain, conf) in [
        (EvmChain::BASE, &settings.base_chain),
        (EvmChain::BNB, &settings.bnb),
    ] {
        if let Some(EvmConf { rpc_url, addresses }) = conf {
            let client = EthRpcClient::new(rpc_url, timeout)
                .wrap_err_with(|| format!("Invalid {} RPC url", chain.name))?;
            collectors.push(Arc::new(EvmBalanceCollector::new(
                metrics,
                chain,
                client,
                addresses.clone(),
            )?));
        }
    }

    if let Some(key) = &settings.venice {
        let client = HttpClient::new(
            VENICE_API_URL,
            Auth::Bearer(key.expose().to_owned()),
            timeout,
        )?;
        collectors.push(Arc::new(VeniceCollector::new(metrics, client)?));
    }

    if let Some(key) = &settings.messari {
        let client = HttpClient::new(
            MESSARI_API_URL,
            Auth::Bearer(key.expose().to_owned()),
            timeout,
        )?;
        collectors.push(Arc::new(MessariCollector::new(metrics, client)?));
    }

    if let Some(key) = &settings.coingecko {
        let client = HttpClient::new(
            COINGECKO_API_URL,
            Auth::Header {
                name: COINGECKO_KEY_HEADER,
                value: key.expose().to_owned(),
            },
            timeout,
        )?;
        collectors.push(Arc::new(CoingeckoCollector::new(metrics, client)?));
    }

    if let Some(xai) = &settings.xai {
        let client = HttpClient::new(
            XAI_API_URL,
            Auth::Bearer(xai.api_key.expose().to_owned()),
            timeout,
        )?;
        collectors.push(Arc::new(XaiCollector::new(
            metrics,
            client,
            xai.team_id.clone(),
        )?));
    }

    if let Some(key) = &settings.openai {
        let client = HttpClient::new(
            OPENAI_API_URL,
            Auth::Bearer(key.expose().to_owned()),
            timeout,
        )?;
        collectors.push(Arc::new(OpenAiCollector::new(metrics, client)?));
    }

    if let Some(warp) = &settings.warp {
        collectors.push(Arc::new(WarpCollector::new(
            metrics,
            warp.connection_url()?,
            chain_id,
            timeout,
        )?));
    }

    Ok(collectors)
}

#[cfg(test)]
mod tests {
    use warden_base::settings::{FromRawConf, RawConf};

    use super::*;
    use crate::test_utils::test_metrics;

    async fn exporter(entries: &[(&str, &str)]) -> Exporter {
        let raw = RawConf::new(entries.iter().copied());
        let settings = ExporterSettings::from_config(&raw).unwrap();
        Exporter::from_settings(settings, test_metrics()).await.unwrap()
    }

    #[tokio::test]
    async fn registers_only_the_validators_by_default() {
        let exporter = exporter(&[]).await;
        assert_eq!(exporter.scraper.collector_names(), vec!["validators"]);
    }

    #[tokio::test]
    async fn registers_every_enabled_collector() {
        let exporter = exporter(&[
            ("WARDEN_METRICS", "true"),
            ("MINT_METRICS", "true"),
            ("WALLET_ADDRESSES", "warden1abc"),
            ("BASE_METRICS", "true"),
            ("BASE_RPC_URL", "https://mainnet.base.org"),
            ("BASE_ADDRESSES", "0x0000000000000000000000000000000000000001"),
            ("BNB_METRICS", "true"),
            ("BNB_RPC_URL", "https://bsc-dataseed.bnbchain.org"),
            ("BNB_ADDRESSES", "0x0000000000000000000000000000000000000002"),
            ("VENICE_METRICS", "true"),
            ("VENICE_API_KEY", "venice"),
            ("MESSARI_METRICS", "true"),
            ("MESSARI_API_KEY", "messari"),
            ("COINGECKO_METRICS", "true"),
            ("COINGECKO_API_KEY", "coingecko"),
            ("XAI_METRICS", "true"),
            ("XAI_API_KEY", "xai"),
            ("XAI_TEAM_ID", "team"),
            ("OPENAI_METRICS", "true"),
            ("OPENAI_API_KEY", "openai"),
            ("WARP_METRICS", "true"),
            ("WARP_DB_HOST", "db.internal"),
            ("WARP_DB_USER", "warp"),
            ("WARP_DB_PASS", "secret"),
            ("WARP_DB", "quests"),
        ])
        .await;

        assert_eq!(
            exporter.scraper.collector_names(),
            vec![
                "validators",
                "warden",
                "intents",
                "actions",
                "auth",
                "mint",
                "wallet",
                "base",
                "bnb",
                "venice",
                "messari",
                "coingecko",
                "xai",
                "openai",
                "warp",
            ]
        );
    }

    #[tokio::test]
    async fn disabling_validators_leaves_nothing_registered() {
        let exporter = exporter(&[("VALIDATOR_METRICS", "false")]).await;
        assert!(exporter.scraper.collector_names().is_empty());
    }
}
