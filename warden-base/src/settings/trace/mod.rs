use eyre::Result;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    prelude::*,
};

pub use self::fmt::Style;

/// Configure a `tracing_subscriber::fmt` Layer outputting to stdout
pub mod fmt;

/// Logging level. A "higher level" means more will be logged.
#[derive(Default, Debug, Clone, Copy, serde::Deserialize, PartialOrd, Ord, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    /// Off
    Off = 0,
    /// Error
    Error = 1,
    /// Warn
    Warn = 2,
    /// Debug
    Debug = 4,
    /// Trace
    Trace = 5,
    /// Info
    #[serde(other)]
    #[default]
    Info = 3,
}

impl Level {
    /// Parse a level name. Unknown names fall back to `Info`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "off" => Level::Off,
            "error" => Level::Error,
            "warn" | "warning" => Level::Warn,
            "debug" => Level::Debug,
            "trace" => Level::Trace,
            _ => Level::Info,
        }
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
            Level::Info => LevelFilter::INFO,
        }
    }
}

/// Configuration for the tracing subscribers used by exporter agents
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct TracingConfig {
    #[serde(default)]
    fmt: Style,
    #[serde(default)]
    level: Level,
}

impl TracingConfig {
    /// Build from an output style and a level.
    pub fn new(fmt: Style, level: Level) -> Self {
        Self { fmt, level }
    }

    /// The configured level
    pub fn level(&self) -> Level {
        self.level
    }

    /// The configured output style
    pub fn style(&self) -> Style {
        self.fmt
    }

    fn targets(&self) -> Targets {
        let mut target_layer = Targets::new().with_default(self.level);
        if self.level < Level::Trace {
            // only show these debug and trace logs at trace level
            target_layer = target_layer.with_target("hyper", Level::Info);
            target_layer = target_layer.with_target("h2", Level::Info);
            target_layer = target_layer.with_target("tower", Level::Info);
            target_layer = target_layer.with_target("reqwest", Level::Info);

            // only show sqlx query logs at trace level
            target_layer = target_layer.with_target("sqlx::query", Level::Warn);
        }
        target_layer
    }

    /// Attempt to instantiate and register a tracing subscriber setup from
    /// settings.
    pub fn start_tracing(&self) -> Result<()> {
        let err_layer = tracing_error::ErrorLayer::default();

        let subscriber = tracing_subscriber::Registry::default()
            .with(self.targets())
            .with(self.fmt.layer())
            .with(err_layer);

        subscriber.try_init()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(Level::parse("DEBUG"), Level::Debug);
        assert_eq!(Level::parse(" warn "), Level::Warn);
        assert_eq!(Level::parse("verbose"), Level::Info);
        assert_eq!(Level::parse(""), Level::Info);
    }

    #[test]
    fn levels_order_by_verbosity() {
        assert!(Level::Off < Level::Error);
        assert!(Level::Warn < Level::Info);
        assert!(Level::Info < Level::Debug);
        assert!(Level::Debug < Level::Trace);
    }

    #[test]
    fn noisy_targets_are_capped_below_trace() {
        let targets = TracingConfig::new(Style::Json, Level::Debug).targets();
        assert!(targets.would_enable("warden_exporter", &tracing::Level::DEBUG));
        assert!(!targets.would_enable("hyper::proto", &tracing::Level::DEBUG));
        assert!(!targets.would_enable("sqlx::query", &tracing::Level::INFO));

        let targets = TracingConfig::new(Style::Json, Level::Trace).targets();
        assert!(targets.would_enable("hyper::proto", &tracing::Level::TRACE));
    }
}
