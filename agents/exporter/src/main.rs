//! The exporter serves chain, wallet and third-party billing figures as
//! Prometheus gauges, querying every upstream on each scrape.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use eyre::Result;

use warden_base::agent_main;

use crate::exporter::Exporter;

mod collectors;
mod exporter;
mod settings;

#[cfg(test)]
mod test_utils;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    // Logging is not initialised at this point, so, using `println!`
    println!("Exporter starting up...");

    agent_main::<Exporter>().await
}
