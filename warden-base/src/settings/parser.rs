//! Typed reads over the flat key/value map the loader produces.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use eyre::{eyre, Report};

use super::ConfigParsingError;

/// Raw settings: lower-cased keys mapped to the string the environment or
/// overlay file supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConf(HashMap<String, String>);

impl RawConf {
    /// Build from any key/value pairs. Keys are lower-cased.
    pub fn new<K: AsRef<str>, V: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        )
    }

    /// Trimmed value for `key`, `None` when unset or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value for `key` or `default`.
    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_owned()
    }

    /// Value for `key`, recording an error when it is missing.
    pub fn required(&self, key: &'static str, err: &mut ConfigParsingError) -> Option<String> {
        let value = self.get(key).map(str::to_owned);
        if value.is_none() {
            err.push(key, eyre!("is required"));
        }
        value
    }

    /// Parsed value for `key`, or `default` when unset. Parse failures are
    /// recorded and also yield `default`.
    pub fn parse_or<T>(&self, key: &'static str, default: T, err: &mut ConfigParsingError) -> T
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => default,
            Some(raw) => match raw.parse::<T>() {
                Ok(value) => value,
                Err(e) => {
                    err.push(key, eyre!("cannot parse {raw:?}: {e}"));
                    default
                }
            },
        }
    }

    /// Boolean for `key` using the usual spellings (`true`, `1`, `t`, `false`, `0`, `f`).
    pub fn bool_or(&self, key: &'static str, default: bool, err: &mut ConfigParsingError) -> bool {
        match self.get(key) {
            None => default,
            Some(raw) => match parse_bool(raw) {
                Ok(value) => value,
                Err(e) => {
                    err.push(key, e);
                    default
                }
            },
        }
    }

    /// Comma separated list for `key`; blank entries are dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn parse_bool(raw: &str) -> Result<bool, Report> {
    match raw.to_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        _ => Err(eyre!("cannot parse {raw:?} as a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawConf {
        RawConf::new([
            ("PORT", "9100"),
            ("grpc_tls_enabled", "FALSE"),
            ("validator_metrics", "maybe"),
            ("wallet_addresses", " warden1a, ,warden1b "),
            ("chain_id", "   "),
            ("exponent", "eighteen"),
        ])
    }

    #[test]
    fn reads_typed_values() {
        let raw = raw();
        let mut err = ConfigParsingError::default();
        assert_eq!(raw.parse_or::<u16>("port", 8081, &mut err), 9100);
        assert!(!raw.bool_or("grpc_tls_enabled", true, &mut err));
        assert_eq!(raw.string_or("chain_id", "warden_8765-1"), "warden_8765-1");
        assert_eq!(raw.list("wallet_addresses"), vec!["warden1a", "warden1b"]);
        assert!(raw.list("base_addresses").is_empty());
        assert!(err.is_empty());
    }

    #[test]
    fn collects_every_problem() {
        let raw = raw();
        let mut err = ConfigParsingError::default();
        raw.bool_or("validator_metrics", true, &mut err);
        raw.parse_or::<u32>("exponent", 18, &mut err);
        raw.required("venice_api_key", &mut err);

        assert_eq!(err.len(), 3);
        let rendered = err.to_string();
        assert!(rendered.contains("VALIDATOR_METRICS"));
        assert!(rendered.contains("EXPONENT"));
        assert!(rendered.contains("VENICE_API_KEY"));
    }
}
