//! Warden module objects: spaces, keys, keychains and per-keychain requests.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use futures::{stream, StreamExt};
use tracing::error;

use warden_base::{CoreMetrics, MetricsCollector, Scrape, StatusGauge};
use warden_core::{KeyCounts, Keychain, WardenProvider};

use super::count;

/// Keychains queried at once
const KEYCHAIN_CONCURRENCY: usize = 8;

/// Everything fetched for one keychain. Each part fails independently.
#[derive(Debug)]
struct KeychainReport {
    id: u64,
    keychain: Result<Keychain>,
    key_requests: Result<u64>,
    sign_requests: Result<u64>,
}

/// Exports the warden module's object counts.
#[derive(Debug)]
pub struct WardenCollector {
    provider: Arc<dyn WardenProvider>,
    chain_id: String,
    spaces: StatusGauge<1>,
    keys_ecdsa: StatusGauge<1>,
    keys_eddsa: StatusGauge<1>,
    keys_pending: StatusGauge<1>,
    keychains: StatusGauge<1>,
    keychain_requests: StatusGauge<3>,
    keychain: StatusGauge<6>,
    keychain_signature_requests: StatusGauge<3>,
}

impl WardenCollector {
    /// Register the warden module gauges.
    pub fn new(
        metrics: &CoreMetrics,
        provider: Arc<dyn WardenProvider>,
        chain_id: String,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            chain_id,
            spaces: metrics.new_status_gauge(
                "warden_spaces",
                "Returns the number of Spaces existing in chain",
                ["chain_id"],
            )?,
            keys_ecdsa: metrics.new_status_gauge(
                "warden_keys_ecdsa",
                "Returns the number of ECDSA keys existing in chain",
                ["chain_id"],
            )?,
            keys_eddsa: metrics.new_status_gauge(
                "warden_keys_eddsa",
                "Returns the number of EDDSA keys existing in chain",
                ["chain_id"],
            )?,
            keys_pending: metrics.new_status_gauge(
                "warden_keys_pending",
                "Returns the number of pending KeyRequests existing in chain",
                ["chain_id"],
            )?,
            keychains: metrics.new_status_gauge(
                "warden_keychains",
                "Returns the number of Keychains existing in chain",
                ["chain_id"],
            )?,
            keychain_requests: metrics.new_status_gauge(
                "warden_keychain_requests",
                "Returns the number of Keychain requests per Keychain",
                ["chain_id", "keychain_id", "keychain_name"],
            )?,
            keychain: metrics.new_status_gauge(
                "warden_keychain",
                "Returns keychain information",
                [
                    "chain_id",
                    "keychain_id",
                    "description",
                    "admins",
                    "creator",
                    "fees",
                ],
            )?,
            keychain_signature_requests: metrics.new_status_gauge(
                "warden_keychain_signature_requests",
                "Returns Keychain Signature Requests",
                ["chain_id", "keychain_id", "keychain_name"],
            )?,
        })
    }

    async fn keychain_report(&self, scrape: &Scrape, id: u64) -> KeychainReport {
        let (keychain, key_requests, sign_requests) = tokio::join!(
            scrape.call(self.provider.keychain(id)),
            scrape.call(self.provider.key_requests_total(id)),
            scrape.call(self.provider.sign_requests_total(id)),
        );
        KeychainReport {
            id,
            keychain,
            key_requests,
            sign_requests,
        }
    }

    /// Reports for keychains `1..=total`, in id order.
    async fn keychain_reports(&self, scrape: &Scrape, total: u64) -> Vec<KeychainReport> {
        let mut reports: Vec<KeychainReport> = stream::iter(1..=total)
            .map(|id| self.keychain_report(scrape, id))
            .buffer_unordered(KEYCHAIN_CONCURRENCY)
            .collect()
            .await;
        reports.sort_by_key(|report| report.id);
        reports
    }

    fn emit_keys(&self, keys: &Result<KeyCounts>) {
        let labels = [self.chain_id.as_str()];
        match keys {
            Ok(keys) => {
                self.keys_ecdsa.success(labels, count(keys.ecdsa));
                self.keys_eddsa.success(labels, count(keys.eddsa));
                self.keys_pending.success(labels, count(keys.pending));
            }
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to count keys");
                self.keys_ecdsa.error(labels);
                self.keys_eddsa.error(labels);
                self.keys_pending.error(labels);
            }
        }
    }

    fn emit_keychain(&self, report: &KeychainReport) {
        let chain_id = self.chain_id.as_str();
        let id = report.id.to_string();

        let name = match &report.keychain {
            Ok(keychain) => {
                let admins = keychain.admins.join(",");
                let fees = keychain.fees.to_string();
                self.keychain.success(
                    [
                        chain_id,
                        &id,
                        &keychain.description,
                        &admins,
                        &keychain.creator,
                        &fees,
                    ],
                    0.0,
                );
                keychain.name.as_str()
            }
            Err(err) => {
                error!(
                    collector = self.name(),
                    keychain_id = report.id,
                    ?err,
                    "failed to fetch keychain"
                );
                self.keychain.error([chain_id, &id, "", "", "", ""]);
                ""
            }
        };

        for (gauge, total, what) in [
            (&self.keychain_requests, &report.key_requests, "key requests"),
            (
                &self.keychain_signature_requests,
                &report.sign_requests,
                "sign requests",
            ),
        ] {
            if let Err(err) = total {
                error!(
                    collector = self.name(),
                    keychain_id = report.id,
                    ?err,
                    "failed to count {what}"
                );
            }
            gauge.record([chain_id, &id, name], &total.as_ref().map(|n| count(*n)));
        }
    }

    fn emit_keychains_unavailable(&self) {
        let chain_id = self.chain_id.as_str();
        self.keychains.error([chain_id]);
        self.keychain_requests.error([chain_id, "", ""]);
        self.keychain.error([chain_id, "", "", "", "", ""]);
        self.keychain_signature_requests.error([chain_id, "", ""]);
    }
}

#[async_trait]
impl MetricsCollector for WardenCollector {
    fn name(&self) -> &'static str {
        "warden"
    }

    async fn collect(&self, scrape: &Scrape) {
        let (spaces, keys, keychains) = tokio::join!(
            scrape.call(self.provider.spaces_total()),
            scrape.call(self.provider.key_counts()),
            scrape.call(self.provider.keychains_total()),
        );

        let reports = match &keychains {
            Ok(total) => self.keychain_reports(scrape, *total).await,
            Err(_) => Vec::new(),
        };

        let chain_id = [self.chain_id.as_str()];
        if let Err(err) = &spaces {
            error!(collector = self.name(), ?err, "failed to count spaces");
        }
        self.spaces
            .record(chain_id, &spaces.as_ref().map(|n| count(*n)));
        self.emit_keys(&keys);

        match keychains {
            Ok(total) => {
                self.keychains.success(chain_id, count(total));
                for report in &reports {
                    self.emit_keychain(report);
                }
            }
            Err(err) => {
                error!(collector = self.name(), ?err, "failed to count keychains");
                self.emit_keychains_unavailable();
            }
        }
    }
}
