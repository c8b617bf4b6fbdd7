use std::env;

use config::{ConfigError, Map, Source, Value, ValueKind};

/// A `config` source over process environment variables. Keys are flat:
/// `GRPC_ADDR` becomes `grpc_addr`, no nesting is derived from underscores.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct Environment {
    /// Optional prefix that limits the environment to keys beginning with it.
    /// The prefix is stripped from the resulting key.
    prefix: Option<String>,

    /// Ignore empty env values (treat as unset).
    ignore_empty: bool,

    /// Where the values were read from, reported by `config` on type errors.
    origin: Option<String>,

    /// Alternate source for the environment. Tests and `.env` overlays use this
    /// instead of the process environment.
    source: Option<Map<String, String>>,
}

#[allow(unused)]
impl Environment {
    pub fn prefix(mut self, s: &str) -> Self {
        self.prefix = Some(s.into());
        self
    }

    pub fn ignore_empty(mut self, ignore: bool) -> Self {
        self.ignore_empty = ignore;
        self
    }

    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn source<'a, I, S>(mut self, source: I) -> Self
    where
        I: IntoIterator<Item = &'a (S, S)>,
        S: AsRef<str> + 'a,
    {
        self.source = Some(
            source
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
                .collect(),
        );
        self
    }

    /// The variables this source would yield, with keys lower-cased.
    pub fn vars(&self) -> Map<String, String> {
        let prefix_pattern = self.prefix.as_deref().unwrap_or("");

        let mapper = |(key, value): (String, String)| -> Option<(String, String)> {
            let key = if prefix_pattern.is_empty() {
                key
            } else if let Some(key) = key.strip_prefix(prefix_pattern) {
                key.into()
            } else {
                return None;
            };

            // Keys that `config` would read as paths cannot be flat settings
            if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return None;
            }

            // Treat empty environment variables as unset
            if self.ignore_empty && value.trim().is_empty() {
                return None;
            }

            Some((key.to_lowercase(), value))
        };

        if let Some(source) = &self.source {
            source.clone().into_iter().filter_map(mapper).collect()
        } else {
            env::vars().filter_map(mapper).collect()
        }
    }
}

impl Source for Environment {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let uri = self
            .origin
            .clone()
            .unwrap_or_else(|| "program environment".into());

        Ok(self
            .vars()
            .into_iter()
            .map(|(key, value)| (key, Value::new(Some(&uri), ValueKind::String(value))))
            .collect())
    }
}
