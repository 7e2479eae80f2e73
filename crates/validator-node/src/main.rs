//! # Security-Leasing Validator Node
//!
//! Leases this validator's main chain stake to subnets: admits and activates
//! pending leases, watches active ones for slashing, and alerts operators.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics
//! 2. Load and validate the YAML config (fatal on error)
//! 3. Build JSON-RPC clients and the alert sink
//! 4. Start the lease manager and monitor loops
//! 5. Run until SIGINT/SIGTERM, then shut down gracefully

use anyhow::{Context, Result};
use clap::Parser;
use sl_telemetry::{init_telemetry, TelemetryConfig};
use std::path::PathBuf;
use tracing::{info, warn};
use validator_node::{NodeConfig, NodeDeps, ValidatorNode};

/// Security-leasing validator node
#[derive(Parser, Debug)]
#[command(name = "validator-node")]
#[command(version, about = "Validator node that leases main chain security to subnets")]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Validate the config and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _telemetry = init_telemetry(TelemetryConfig::from_env()).context("failed to initialize telemetry")?;

    let config = NodeConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    if args.check_config {
        info!(path = %args.config.display(), "Configuration is valid");
        return Ok(());
    }

    let deps = NodeDeps::from_config(&config).context("failed to build adapters")?;
    let node = ValidatorNode::new(config, deps);

    node.run_until(shutdown_signal())
        .await
        .context("validator node did not shut down cleanly")?;

    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
