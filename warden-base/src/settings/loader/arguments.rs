use std::path::PathBuf;

use clap::Parser;

/// Command line flags accepted by an exporter agent. Every flag overrides
/// the matching environment key.
#[derive(Debug, Default, Clone, Parser)]
#[command(version, about = "Prometheus exporter for the Warden chain")]
pub struct CommandLineArguments {
    /// Port to serve metrics on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level: off, error, warn, info, debug or trace (overrides LOG_LEVEL)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format: pretty, full, compact or json (overrides LOG_FORMAT)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Settings file layered over the environment (overrides ENV_FILE)
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

impl CommandLineArguments {
    /// Flattened `(key, value)` overrides in settings key form.
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = vec![];
        if let Some(port) = self.port {
            overrides.push(("port", port.to_string()));
        }
        if let Some(level) = &self.log_level {
            overrides.push(("log_level", level.clone()));
        }
        if let Some(format) = &self.log_format {
            overrides.push(("log_format", format.clone()));
        }
        overrides
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_and_long_flags() {
        let args = CommandLineArguments::try_parse_from([
            "warden-exporter",
            "-p",
            "9100",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(
            args.overrides(),
            vec![("port", "9100".to_owned()), ("log_level", "debug".to_owned())]
        );
        assert!(args.env_file.is_none());
    }

    #[test]
    fn rejects_bad_port() {
        assert!(CommandLineArguments::try_parse_from(["warden-exporter", "--port", "x"]).is_err());
    }
}
