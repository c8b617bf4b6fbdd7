use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prometheus::Registry;
use warden_base::{CoreMetrics, Scrape};
use warden_core::{BankProvider, ChainResult, KeyCounts, Keychain, WardenProvider};

/// One rendered gauge sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: HashMap<String, String>,
    pub value: f64,
}

impl Sample {
    pub fn label(&self, name: &str) -> &str {
        self.labels.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn status(&self) -> &str {
        self.label("status")
    }
}

pub fn test_metrics() -> Arc<CoreMetrics> {
    Arc::new(CoreMetrics::new("warden_exporter", 0, Registry::new()).unwrap())
}

pub fn test_scrape() -> Scrape {
    Scrape::new(Duration::from_secs(5))
}

/// Every sample of `name` currently in the registry.
pub fn samples(metrics: &CoreMetrics, name: &str) -> Vec<Sample> {
    metrics
        .registry()
        .gather()
        .iter()
        .filter(|family| family.get_name() == name)
        .flat_map(|family| family.get_metric().iter())
        .map(|metric| Sample {
            labels: metric
                .get_label()
                .iter()
                .map(|pair| (pair.get_name().to_owned(), pair.get_value().to_owned()))
                .collect(),
            value: metric.get_gauge().get_value(),
        })
        .collect()
}

/// The only sample of `name`; panics when there is not exactly one.
pub fn single(metrics: &CoreMetrics, name: &str) -> Sample {
    let mut all = samples(metrics, name);
    assert_eq!(all.len(), 1, "expected one sample of {name}, got {all:?}");
    all.remove(0)
}

/// The sample of `name` whose labels include every pair in `labels`.
pub fn find(metrics: &CoreMetrics, name: &str, labels: &[(&str, &str)]) -> Sample {
    samples(metrics, name)
        .into_iter()
        .find(|s| labels.iter().all(|(k, v)| s.label(k) == *v))
        .unwrap_or_else(|| panic!("no sample of {name} with {labels:?}"))
}

mockall::mock! {
    pub Warden {}

    impl std::fmt::Debug for Warden {
        fn fmt<'a>(&self, f: &mut std::fmt::Formatter<'a>) -> std::fmt::Result;
    }

    #[async_trait]
    impl WardenProvider for Warden {
        async fn spaces_total(&self) -> ChainResult<u64>;
        async fn key_counts(&self) -> ChainResult<KeyCounts>;
        async fn keychains_total(&self) -> ChainResult<u64>;
        async fn keychain(&self, id: u64) -> ChainResult<Keychain>;
        async fn key_requests_total(&self, keychain_id: u64) -> ChainResult<u64>;
        async fn sign_requests_total(&self, keychain_id: u64) -> ChainResult<u64>;
        async fn intents_total(&self) -> ChainResult<u64>;
        async fn actions_total(&self) -> ChainResult<u64>;
        async fn rules_total(&self) -> ChainResult<u64>;
    }
}

mockall::mock! {
    pub Bank {}

    impl std::fmt::Debug for Bank {
        fn fmt<'a>(&self, f: &mut std::fmt::Formatter<'a>) -> std::fmt::Result;
    }

    #[async_trait]
    impl BankProvider for Bank {
        async fn balance(&self, address: &str, denom: &str) -> ChainResult<String>;
        async fn supply_of(&self, denom: &str) -> ChainResult<String>;
    }
}
