//! Palaver node binary
//!
//! Runs live role-played negotiation sessions behind an HTTP API.

use palaver_node::{NodeConfig, PalaverNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palaver_node=info,palaver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Palaver Node");

    let config = NodeConfig::default();

    let node = PalaverNode::new(config)?;
    node.run().await?;

    Ok(())
}
