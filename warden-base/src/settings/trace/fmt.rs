use serde::Deserialize;
use tracing::Subscriber;
use tracing_subscriber::{registry::LookupSpan, Layer};

/// A boxed formatting layer, so every style shares one subscriber type.
pub type LogOutputLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Basic tracing configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    /// Pretty print
    Pretty,
    /// JSON
    #[default]
    Json,
    /// Compact
    Compact,
    /// Default style
    #[serde(other)]
    Full,
}

impl Style {
    /// Parse a style name. Unknown names fall back to `Json`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pretty" => Style::Pretty,
            "compact" => Style::Compact,
            "full" | "default" | "text" => Style::Full,
            _ => Style::Json,
        }
    }

    /// The stdout formatting layer for this style.
    pub fn layer<S>(self) -> LogOutputLayer<S>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = tracing_subscriber::fmt::layer().with_target(true);
        match self {
            Style::Pretty => layer.pretty().boxed(),
            Style::Full => layer.boxed(),
            Style::Compact => layer.compact().boxed(),
            Style::Json => layer
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .boxed(),
        }
    }
}
