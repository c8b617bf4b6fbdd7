//! Validator health: missed blocks, proposals within a trailing window,
//! stake, plus the chain's average block time.
//!
//! Every scrape dials its own connection to the node and drops it once the
//! figures are fetched.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use futures::{future, stream, StreamExt};
use tracing::{debug, error, warn};

use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};
use warden_core::{
    average_block_time_between, join_signing_infos, merge_proposer_counts, parse_integer_amount,
    parse_legacy_dec, scale, tally_proposers, trailing_window, BlockHeader, BlockProvider,
    StakingProvider, Validator,
};
use warden_cosmos::{ConnectionConf, GrpcProvider};

use super::{bool_label, count};
use crate::settings::ValidatorsConf;

/// Blocks fetched at once while tallying proposers
const PROPOSER_SCAN_CONCURRENCY: usize = 10;

const VALIDATOR_LABELS: [&str; 7] = [
    "chain_id",
    "valcons",
    "valoper",
    "moniker",
    "jailed",
    "tombstoned",
    "bond_status",
];

/// The chain queries a single validator scrape runs over.
#[derive(Debug, Clone)]
pub struct ValidatorQueries {
    staking: Arc<dyn StakingProvider>,
    blocks: Arc<dyn BlockProvider>,
}

impl ValidatorQueries {
    /// Bundle the staking and block queries of one connection.
    pub fn new(staking: Arc<dyn StakingProvider>, blocks: Arc<dyn BlockProvider>) -> Self {
        Self { staking, blocks }
    }
}

/// Opens the connection a validator scrape works over.
#[async_trait]
pub trait ValidatorsConnector: Debug + Send + Sync {
    /// Dial the upstream. The connection lives as long as the returned
    /// queries.
    async fn connect(&self) -> Result<ValidatorQueries>;
}

/// Dials the node over gRPC for every scrape.
#[derive(Debug, Clone)]
pub struct GrpcConnector {
    conf: ConnectionConf,
}

impl GrpcConnector {
    /// Connector for the node described by `conf`.
    pub fn new(conf: ConnectionConf) -> Self {
        Self { conf }
    }
}

#[async_trait]
impl ValidatorsConnector for GrpcConnector {
    async fn connect(&self) -> Result<ValidatorQueries> {
        let provider = Arc::new(
            GrpcProvider::connect(self.conf.clone())
                .await
                .wrap_err("connecting to the node")?,
        );
        Ok(ValidatorQueries::new(provider.clone(), provider))
    }
}

/// Figures fetched over one connection.
struct Fetched {
    validators: Result<Vec<Validator>>,
    proposer_counts: HashMap<String, u64>,
    average_block_time: Result<f64>,
}

/// Exports one sample per validator and metric, joined from the slashing
/// and staking modules.
#[derive(Debug)]
pub struct ValidatorsCollector {
    connector: Arc<dyn ValidatorsConnector>,
    chain_id: String,
    exponent: u32,
    conf: ValidatorsConf,
    missed_blocks: StatusGauge<7>,
    blocks_proposed: StatusGauge<7>,
    tokens: StatusGauge<7>,
    delegator_shares: StatusGauge<7>,
    average_block_time: StatusGauge<1>,
}

impl ValidatorsCollector {
    /// Register the validator gauges.
    pub fn new(
        metrics: &CoreMetrics,
        connector: Arc<dyn ValidatorsConnector>,
        chain_id: String,
        exponent: u32,
        conf: ValidatorsConf,
    ) -> Result<Self> {
        Ok(Self {
            connector,
            chain_id,
            exponent,
            conf,
            missed_blocks: metrics.new_status_gauge(
                "cosmos_validator_missed_blocks",
                "Returns missed blocks for a validator.",
                VALIDATOR_LABELS,
            )?,
            blocks_proposed: metrics.new_status_gauge(
                "cosmos_validator_blocks_proposed",
                "Returns the number of blocks proposed by a validator within the block window.",
                VALIDATOR_LABELS,
            )?,
            tokens: metrics.new_status_gauge(
                "cosmos_validator_tokens",
                "Returns the bonded tokens of a validator.",
                VALIDATOR_LABELS,
            )?,
            delegator_shares: metrics.new_status_gauge(
                "cosmos_validator_delegator_shares",
                "Returns the delegator shares of a validator.",
                VALIDATOR_LABELS,
            )?,
            average_block_time: metrics.new_status_gauge(
                "cosmos_average_block_time_seconds",
                "Returns the average block time in seconds.",
                ["chain_id"],
            )?,
        })
    }

    /// Signing infos joined with validator descriptions. Signing infos
    /// without a validator are dropped.
    async fn validators(
        &self,
        scrape: &Scrape,
        queries: &ValidatorQueries,
    ) -> Result<Vec<Validator>> {
        let (infos, descriptors) = tokio::join!(
            scrape.call(queries.staking.signing_infos()),
            scrape.call(queries.staking.validators()),
        );
        let infos = infos.wrap_err("fetching signing infos")?;
        let descriptors = descriptors.wrap_err("fetching validators")?;

        let (validators, skipped) = join_signing_infos(infos, descriptors);
        for valcons in &skipped {
            debug!(%valcons, "signing info has no matching validator, skipping");
        }
        Ok(validators)
    }

    /// Proposals per consensus address over the trailing block window.
    /// Blocks that cannot be read are left out of the tally.
    async fn proposer_counts(
        &self,
        scrape: &Scrape,
        queries: &ValidatorQueries,
        latest: &BlockHeader,
    ) -> HashMap<String, u64> {
        let headers: Vec<BlockHeader> =
            stream::iter(trailing_window(latest.height, self.conf.block_window))
                .map(|height| async move {
                    if scrape.is_expired() {
                        return None;
                    }
                    match scrape.call(queries.blocks.block_by_height(height)).await {
                        Ok(header) => Some(header),
                        Err(err) => {
                            debug!(height, ?err, "skipping unreadable block");
                            None
                        }
                    }
                })
                .buffer_unordered(PROPOSER_SCAN_CONCURRENCY)
                .filter_map(future::ready)
                .collect()
                .await;
        tally_proposers(&headers)
    }

    async fn average_block_time(
        &self,
        scrape: &Scrape,
        queries: &ValidatorQueries,
        latest: &BlockHeader,
    ) -> Result<f64> {
        let start_height = latest
            .height
            .saturating_sub(self.conf.block_time_sample)
            .max(1);
        let start = scrape
            .call(queries.blocks.block_by_height(start_height))
            .await
            .wrap_err_with(|| format!("fetching block {start_height}"))?;
        Ok(average_block_time_between(&start, latest)?)
    }

    async fn fetch(&self, scrape: &Scrape, queries: &ValidatorQueries) -> Fetched {
        let (latest, validators) = tokio::join!(
            scrape.call(queries.blocks.latest_block()),
            self.validators(scrape, queries),
        );

        let (proposer_counts, average_block_time) = match &latest {
            Ok(latest) => {
                tokio::join!(
                    self.proposer_counts(scrape, queries, latest),
                    self.average_block_time(scrape, queries, latest),
                )
            }
            Err(err) => {
                warn!(?err, "latest block unavailable, proposer counts default to zero");
                (HashMap::new(), Err(eyre!("latest block unavailable: {err}")))
            }
        };

        Fetched {
            validators,
            proposer_counts,
            average_block_time,
        }
    }

    fn emit(&self, validator: &Validator) {
        let bond_status = validator.bond_status.label();
        let labels = [
            self.chain_id.as_str(),
            validator.consensus_address.as_str(),
            validator.operator_address.as_str(),
            validator.moniker.as_str(),
            bool_label(validator.jailed),
            bool_label(validator.tombstoned),
            bond_status.as_str(),
        ];

        self.missed_blocks
            .success(labels, count(validator.missed_blocks));
        self.blocks_proposed
            .success(labels, count(validator.blocks_proposed));

        let tokens = parse_integer_amount(&validator.tokens, self.exponent);
        if let Err(err) = &tokens {
            warn!(valoper = %validator.operator_address, ?err, "unreadable validator tokens");
        }
        self.tokens.record(labels, &tokens);

        let shares = parse_legacy_dec(validator.delegator_shares.as_bytes())
            .map(|shares| scale(shares, self.exponent));
        if let Err(err) = &shares {
            warn!(valoper = %validator.operator_address, ?err, "unreadable delegator shares");
        }
        self.delegator_shares.record(labels, &shares);
    }

    fn emit_unavailable(&self) {
        let labels = [self.chain_id.as_str(), "", "", "", "", "", ""];
        self.missed_blocks.error(labels);
        self.blocks_proposed.error(labels);
        self.tokens.error(labels);
        self.delegator_shares.error(labels);
    }
}

#[async_trait]
impl MetricsCollector for ValidatorsCollector {
    fn name(&self) -> &'static str {
        "validators"
    }

    async fn collect(&self, scrape: &Scrape) {
        let queries = match scrape.call(self.connector.connect()).await {
            Ok(queries) => queries,
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to connect to the node");
                self.emit_unavailable();
                self.average_block_time.error([self.chain_id.as_str()]);
                return;
            }
        };
        let Fetched {
            validators,
            proposer_counts,
            average_block_time: average,
        } = self.fetch(scrape, &queries).await;
        drop(queries);

        match validators {
            Ok(mut validators) => {
                merge_proposer_counts(&mut validators, &proposer_counts);
                for validator in &validators {
                    self.emit(validator);
                }
            }
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to collect validators");
                self.emit_unavailable();
            }
        }

        if let Err(err) = &average {
            error!(collector = self.name(), ?err, "failed to compute average block time");
        }
        self.average_block_time
            .record([self.chain_id.as_str()], &average);
    }
}
