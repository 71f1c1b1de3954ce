//! BuildRelay binary entrypoint.
//!
//! Reads one build event as JSON on stdin, runs it through the relay and
//! prints the outcome as JSON on stdout. Logs go to stderr.

use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use buildrelay::Relay;
use buildrelay_common::config::RelayConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "build_relay=info,buildrelay=info,buildrelay_poller=info,buildrelay_engine=info,buildrelay_notifier=info",
            )
        }))
        .with_writer(std::io::stderr)
        .json()
        .init();

    // Load configuration
    let config = RelayConfig::from_env()?;
    let relay = Relay::from_config(&config)?;

    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;

    let outcome = relay.handle_json(&raw).await?;

    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}
