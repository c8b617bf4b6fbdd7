use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use clap::Parser;
use eyre::Result;
use tracing::info;

use crate::{
    metrics::CoreMetrics,
    settings::{load_settings, CommandLineArguments, FromRawConf, Settings},
};

/// Settings of an agent defined from configuration
pub trait LoadableFromSettings: AsRef<Settings> + FromRawConf {
    /// Create a new instance of these settings by reading the env vars, the
    /// optional overlay file and the command line.
    fn load(args: &CommandLineArguments) -> Result<Self> {
        load_settings(args)
    }
}

/// A fundamental agent which does not make any assumptions about the tools
/// which are used.
#[async_trait]
pub trait BaseAgent: Send + Sync + Debug {
    /// The agent's name
    const AGENT_NAME: &'static str;

    /// The settings object for this agent
    type Settings: LoadableFromSettings;

    /// Instantiate the agent from the standard settings object
    async fn from_settings(settings: Self::Settings, metrics: Arc<CoreMetrics>) -> Result<Self>
    where
        Self: Sized;

    /// Start running this agent. Returns when the server stops.
    async fn run(self) -> Result<()>;
}

/// Call this from `main` to fully initialize and run the agent for its entire
/// lifecycle. This assumes only a single agent is being run. This will
/// initialize the metrics server and tracing as well.
pub async fn agent_main<A: BaseAgent>() -> Result<()> {
    #[cfg(feature = "color-eyre")]
    color_eyre::install()?;

    let args = CommandLineArguments::parse();
    let settings = A::Settings::load(&args)?;
    let core_settings: &Settings = settings.as_ref();

    let metrics = core_settings.metrics(A::AGENT_NAME)?;
    core_settings.tracing.start_tracing()?;
    info!(
        agent = A::AGENT_NAME,
        port = core_settings.metrics_port,
        grpc = %core_settings.chain.grpc_url(),
        chain_id = %core_settings.chain_id,
        "Starting agent"
    );

    let agent = A::from_settings(settings, metrics).await?;
    agent.run().await?;
    info!(agent = A::AGENT_NAME, "Shutting down agent...");
    Ok(())
}
