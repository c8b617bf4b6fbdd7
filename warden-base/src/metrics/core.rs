use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use eyre::Result;
use parking_lot::Mutex;
use prometheus::{
    labels, opts, register_gauge_vec_with_registry, Encoder, GaugeVec, Registry,
};

/// Macro to prefix a string with the namespace.
macro_rules! namespaced {
    ($name:expr) => {
        format!("{}_{}", super::NAMESPACE, $name)
    };
}

/// Label appended to every exported gauge.
pub const STATUS_LABEL: &str = "status";

/// Outcome of the upstream call behind a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    /// The upstream answered and the answer was understood
    Success,
    /// The upstream failed, timed out, or answered with something unreadable
    Error,
}

impl Status {
    /// `Success` for `Ok`, `Error` for `Err`.
    pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
        if result.is_ok() {
            Status::Success
        } else {
            Status::Error
        }
    }
}

/// A gauge whose label schema is fixed at construction: `N` caller supplied
/// labels followed by `status`.
///
/// The label count is part of the type, so emitting with the wrong number of
/// labels does not compile.
#[derive(Clone)]
pub struct StatusGauge<const N: usize> {
    name: String,
    inner: GaugeVec,
}

impl<const N: usize> StatusGauge<N> {
    /// Set the sample for `labels` with an explicit status.
    pub fn set(&self, labels: [&str; N], status: Status, value: f64) {
        let mut values: Vec<&str> = Vec::with_capacity(N + 1);
        values.extend_from_slice(&labels);
        values.push(status.as_ref());
        self.inner.with_label_values(&values).set(value);
    }

    /// Set a successful sample.
    pub fn success(&self, labels: [&str; N], value: f64) {
        self.set(labels, Status::Success, value);
    }

    /// Set the degraded sample: value 0 and status=error.
    pub fn error(&self, labels: [&str; N]) {
        self.set(labels, Status::Error, 0.0);
    }

    /// Set the sample from a result, degrading on `Err`.
    pub fn record<E>(&self, labels: [&str; N], result: &std::result::Result<f64, E>) {
        match result {
            Ok(value) => self.success(labels, *value),
            Err(_) => self.error(labels),
        }
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<const N: usize> Debug for StatusGauge<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StatusGauge {{ name: {}, labels: {} }}", self.name, N + 1)
    }
}

/// Metrics for the exporter process.
pub struct CoreMetrics {
    /// Metrics registry for adding new metrics and gathering reports
    registry: Registry,
    const_labels: HashMap<String, String>,
    listen_port: u16,
    agent_name: String,

    /// Every gauge handed out to a collector; cleared at the start of a scrape.
    exported: Mutex<Vec<GaugeVec>>,

    collector_duration: GaugeVec,
    collector_up: GaugeVec,
}

impl CoreMetrics {
    /// Track metrics for a particular agent name.
    ///
    /// - `for_agent` name of the agent these metrics are tracking.
    /// - `listen_port` port to start the HTTP server on.
    /// - `registry` prometheus registry to attach the metrics to
    pub fn new(for_agent: &str, listen_port: u16, registry: Registry) -> prometheus::Result<Self> {
        let const_labels: HashMap<String, String> = labels! {
            namespaced!("version") => env!("CARGO_PKG_VERSION").into(),
            "agent".into() => for_agent.into(),
        };
        let const_labels_ref = const_labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<HashMap<_, _>>();

        let collector_duration = register_gauge_vec_with_registry!(
            opts!(
                namespaced!("collector_duration_seconds"),
                "Wall time the collector spent in the last scrape",
                const_labels_ref
            ),
            &["collector"],
            registry
        )?;

        let collector_up = register_gauge_vec_with_registry!(
            opts!(
                namespaced!("collector_up"),
                "1 if the collector finished within the scrape deadline, 0 otherwise",
                const_labels_ref
            ),
            &["collector"],
            registry
        )?;

        Ok(Self {
            registry,
            const_labels,
            listen_port,
            agent_name: for_agent.into(),
            exported: Mutex::new(Vec::new()),
            collector_duration,
            collector_up,
        })
    }

    /// Get the prometheus registry for this core metrics instance.
    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// Create and register an exported gauge with `N` labels plus `status`.
    ///
    /// Registering a name twice fails, so two collectors can never emit
    /// under the same metric name.
    pub fn new_status_gauge<const N: usize>(
        &self,
        metric_name: &str,
        help: &str,
        labels: [&str; N],
    ) -> Result<StatusGauge<N>> {
        let mut label_names: Vec<&str> = labels.to_vec();
        label_names.push(STATUS_LABEL);
        let inner = register_gauge_vec_with_registry!(
            opts!(metric_name, help),
            &label_names,
            self.registry
        )?;
        self.exported.lock().push(inner.clone());
        Ok(StatusGauge {
            name: metric_name.to_owned(),
            inner,
        })
    }

    /// Drop every label set of every exported gauge, so a scrape only
    /// reports what it observed.
    pub fn reset_exported(&self) {
        for gauge in self.exported.lock().iter() {
            gauge.reset();
        }
    }

    /// Record how a collector fared in the last scrape.
    pub fn observe_collector(&self, collector: &str, seconds: f64, finished: bool) {
        self.collector_duration
            .with_label_values(&[collector])
            .set(seconds);
        self.collector_up
            .with_label_values(&[collector])
            .set(if finished { 1.0 } else { 0.0 });
    }

    /// Gather available metrics into an encoded (plaintext, OpenMetrics format)
    /// report.
    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let collected_metrics = self.registry.gather();
        let mut out_buf = Vec::with_capacity(1024 * 64);
        let encoder = prometheus::TextEncoder::new();
        encoder.encode(&collected_metrics, &mut out_buf)?;
        Ok(out_buf)
    }

    /// Get the name of this agent, e.g. "warden-exporter"
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Port the metrics server listens on
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// Constant labels attached to the exporter's own metrics
    pub fn const_labels(&self) -> &HashMap<String, String> {
        &self.const_labels
    }
}

impl Debug for CoreMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CoreMetrics {{ agent_name: {}, listen_port: {:?} }}",
            self.agent_name, self.listen_port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> CoreMetrics {
        CoreMetrics::new("test", 9090, Registry::new()).unwrap()
    }

    fn sample_labels(registry: &Registry, name: &str) -> Vec<Vec<(String, String)>> {
        registry
            .gather()
            .into_iter()
            .filter(|family| family.get_name() == name)
            .flat_map(|family| family.get_metric().to_vec())
            .map(|metric| {
                metric
                    .get_label()
                    .iter()
                    .map(|l| (l.get_name().to_owned(), l.get_value().to_owned()))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn status_label_is_appended() {
        let metrics = metrics();
        let gauge = metrics
            .new_status_gauge("warden_spaces", "spaces", ["chain_id"])
            .unwrap();
        gauge.success(["warden_8765-1"], 12.0);

        let labels = sample_labels(&metrics.registry(), "warden_spaces");
        assert_eq!(
            labels,
            vec![vec![
                ("chain_id".to_owned(), "warden_8765-1".to_owned()),
                ("status".to_owned(), "success".to_owned()),
            ]]
        );
    }

    #[test]
    fn error_samples_are_zero() {
        let metrics = metrics();
        let gauge = metrics
            .new_status_gauge("warden_keychains", "keychains", ["chain_id"])
            .unwrap();
        gauge.record(["c"], &Err::<f64, ()>(()));

        let families = metrics.registry().gather();
        let family = families
            .iter()
            .find(|f| f.get_name() == "warden_keychains")
            .unwrap();
        let sample = &family.get_metric()[0];
        assert_eq!(sample.get_gauge().get_value(), 0.0);
        assert_eq!(sample.get_label()[1].get_value(), "error");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let metrics = metrics();
        metrics
            .new_status_gauge("warden_actions", "actions", ["chain_id"])
            .unwrap();
        assert!(metrics
            .new_status_gauge("warden_actions", "actions again", ["chain_id"])
            .is_err());
    }

    #[test]
    fn reset_drops_stale_label_sets() {
        let metrics = metrics();
        let gauge = metrics
            .new_status_gauge("cosmos_wallet_balance", "balance", ["account"])
            .unwrap();
        gauge.success(["warden1old"], 1.0);
        metrics.reset_exported();
        gauge.success(["warden1new"], 2.0);

        let labels = sample_labels(&metrics.registry(), "cosmos_wallet_balance");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0][0].1, "warden1new");
    }

    #[test]
    fn gather_renders_text_format() {
        let metrics = metrics();
        let gauge = metrics
            .new_status_gauge("warden_rules", "Returns the number of rules", ["chain_id"])
            .unwrap();
        gauge.success(["c"], 3.0);
        metrics.observe_collector("actions", 0.5, true);

        let text = String::from_utf8(metrics.gather().unwrap()).unwrap();
        assert!(text.contains("# HELP warden_rules Returns the number of rules"));
        assert!(text.contains("warden_rules{chain_id=\"c\",status=\"success\"} 3"));
        assert!(text.contains("warden_exporter_collector_up"));
    }
}
