//! Load a settings object from the config locations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use eyre::{eyre, Context, Result};

use crate::settings::{FromRawConf, RawConf};

pub use self::arguments::CommandLineArguments;
pub use self::environment::Environment;

mod arguments;
mod environment;

/// Extensions `config::File` understands. Anything else is read as a dotenv file.
const STRUCTURED_EXTENSIONS: &[&str] = &["json", "toml", "yaml", "yml", "ini", "ron", "json5"];

/// Deserialize a settings object from the process environment, the optional
/// `ENV_FILE` overlay and the command line.
pub fn load_settings<R: FromRawConf>(args: &CommandLineArguments) -> Result<R> {
    let raw = load_raw_conf(Environment::default().ignore_empty(true), args)?;
    R::from_config(&raw).map_err(Into::into)
}

/// Merge every source into one flat map. Later sources win: environment,
/// then the overlay file, then command line flags.
pub fn load_raw_conf(env: Environment, args: &CommandLineArguments) -> Result<RawConf> {
    let env_file = args
        .env_file
        .clone()
        .or_else(|| env.vars().remove("env_file").map(PathBuf::from));

    let mut builder = Config::builder().add_source(env);

    if let Some(path) = env_file {
        builder = overlay(builder, &path)?;
    }

    for (key, value) in args.overrides() {
        builder = builder
            .set_override(key, value)
            .context("Failed to apply command line override")?;
    }

    let config = builder.build().context("Failed to load config sources")?;
    let flat = config
        .try_deserialize::<HashMap<String, String>>()
        .context("Config deserialization error, settings must be flat key/value pairs")?;

    Ok(RawConf::new(flat))
}

fn overlay(builder: ConfigBuilder<DefaultState>, path: &Path) -> Result<ConfigBuilder<DefaultState>> {
    if !path.is_file() {
        return Err(eyre!("Provided ENV_FILE does not exist or is not a file ({path:?})"));
    }

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if STRUCTURED_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(builder.add_source(File::from(path.to_path_buf()).required(true)));
    }

    let vars = dotenvy::from_path_iter(path)
        .and_then(|iter| iter.collect::<Result<Vec<(String, String)>, _>>())
        .with_context(|| format!("Failed to parse ENV_FILE ({path:?})"))?;
    let origin = path.display().to_string();
    Ok(builder.add_source(
        Environment::default()
            .ignore_empty(true)
            .origin(&origin)
            .source(&vars),
    ))
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        Environment::default().ignore_empty(true).source(vars)
    }

    #[test]
    fn environment_only() {
        let raw = load_raw_conf(
            env(&[("GRPC_ADDR", "node:9090"), ("CHAIN_ID", "")]),
            &CommandLineArguments::default(),
        )
        .unwrap();
        assert_eq!(raw.get("grpc_addr"), Some("node:9090"));
        assert_eq!(raw.get("chain_id"), None);
    }

    #[test]
    fn dotenv_overlay_wins_over_environment() {
        let mut file = tempfile::Builder::new().suffix(".env").tempfile().unwrap();
        writeln!(file, "PORT=9300\nWALLET_ADDRESSES=warden1a,warden1b").unwrap();
        let path = file.path().display().to_string();

        let raw = load_raw_conf(
            env(&[("PORT", "8081"), ("ENV_FILE", &path), ("CHAIN_ID", "warden_1-1")]),
            &CommandLineArguments::default(),
        )
        .unwrap();
        assert_eq!(raw.get("port"), Some("9300"));
        assert_eq!(raw.get("chain_id"), Some("warden_1-1"));
        assert_eq!(raw.list("wallet_addresses"), vec!["warden1a", "warden1b"]);
    }

    #[test]
    fn structured_overlay_and_flags() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"port": 9300, "log_level": "warn", "mint_metrics": true}}"#).unwrap();

        let args = CommandLineArguments {
            port: Some(9400),
            env_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let raw = load_raw_conf(env(&[]), &args).unwrap();
        assert_eq!(raw.get("port"), Some("9400"));
        assert_eq!(raw.get("log_level"), Some("warn"));
        assert_eq!(raw.get("mint_metrics"), Some("true"));
    }

    #[test]
    fn missing_overlay_is_an_error() {
        let args = CommandLineArguments {
            env_file: Some(PathBuf::from("/nonexistent/warden.env")),
            ..Default::default()
        };
        assert!(load_raw_conf(env(&[]), &args).is_err());
    }
}
