use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{eyre, Report};
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::CoreMetrics;

/// A source of gauges, evaluated once per scrape.
///
/// Implementations must set a sample for every gauge they own on every call,
/// degrading to status=error rather than returning early.
#[async_trait]
pub trait MetricsCollector: Send + Sync + Debug {
    /// Short name used in logs and in the exporter's own metrics.
    fn name(&self) -> &'static str;

    /// Query the upstream and set this collector's gauges.
    async fn collect(&self, scrape: &Scrape);
}

/// Deadline shared by every upstream call made during one scrape.
#[derive(Debug, Clone, Copy)]
pub struct Scrape {
    deadline: Instant,
    timeout: Duration,
}

impl Scrape {
    /// A scrape whose calls must all finish within `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            timeout,
        }
    }

    /// Run one upstream call, cancelling it when the scrape deadline passes.
    pub async fn call<T, E, F>(&self, future: F) -> eyre::Result<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<Report>,
    {
        match tokio::time::timeout_at(self.deadline, future).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(eyre!(
                "upstream call cancelled at the {:?} scrape deadline",
                self.timeout
            )),
        }
    }

    /// Whether the deadline has passed. Long loops check this between iterations.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Runs every registered collector on demand and renders the registry.
#[derive(Debug)]
pub struct Scraper {
    metrics: Arc<CoreMetrics>,
    collectors: Vec<Arc<dyn MetricsCollector>>,
    timeout: Duration,
    in_flight: Mutex<()>,
}

impl Scraper {
    /// Create a scraper with no collectors.
    pub fn new(metrics: Arc<CoreMetrics>, timeout: Duration) -> Self {
        Self {
            metrics,
            collectors: Vec::new(),
            timeout,
            in_flight: Mutex::new(()),
        }
    }

    /// Register a collector.
    pub fn with_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.collectors.push(collector);
        self
    }

    /// Names of the registered collectors
    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Metrics this scraper renders
    pub fn metrics(&self) -> &Arc<CoreMetrics> {
        &self.metrics
    }

    /// Evaluate every collector and return the encoded registry.
    ///
    /// Scrapes are serialised; a second caller waits for the first to finish
    /// and then runs its own.
    #[instrument(skip(self), fields(collectors = self.collectors.len()))]
    pub async fn scrape(&self) -> prometheus::Result<Vec<u8>> {
        let _guard = self.in_flight.lock().await;
        self.metrics.reset_exported();

        let scrape = Scrape::new(self.timeout);
        join_all(
            self.collectors
                .iter()
                .map(|collector| self.run_collector(collector.as_ref(), &scrape)),
        )
        .await;

        self.metrics.gather()
    }

    async fn run_collector(&self, collector: &dyn MetricsCollector, scrape: &Scrape) {
        let started = Instant::now();
        collector.collect(scrape).await;
        let elapsed = started.elapsed();
        let finished = !scrape.is_expired();
        if finished {
            debug!(collector = collector.name(), ?elapsed, "collector finished");
        } else {
            warn!(
                collector = collector.name(),
                ?elapsed,
                "collector ran into the scrape deadline"
            );
        }
        self.metrics
            .observe_collector(collector.name(), elapsed.as_secs_f64(), finished);
    }
}
