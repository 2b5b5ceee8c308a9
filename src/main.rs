//! Nexus daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 rpc-nexus                     │
//!   control datagram  │  ┌──────────────┐  SIGIO   ┌──────────────┐  │
//!  ───────────────────┼─▶│ UDP socket   │─────────▶│ main thread  │  │
//!   [0xE5][tid][...]  │  │ O_ASYNC      │ (owner)  │ sigio_handler│  │
//!                     │  └──────────────┘          └──────┬───────┘  │
//!                     │                                   │ route    │
//!                     │                                   ▼          │
//!                     │  ┌────────────┐ ┌────────────┐ ┌────────────┐│
//!                     │  │ endpoint-0 │ │ endpoint-1 │ │ endpoint-N ││
//!                     │  │  Hook(0)   │ │  Hook(1)   │ │  Hook(N)   ││
//!                     │  └────────────┘ └────────────┘ └────────────┘│
//!                     └──────────────────────────────────────────────┘
//! ```
//!
//! The main thread builds the Nexus and then drives a current-thread Tokio
//! runtime, so it never migrates and stays the SIGIO owner.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use rpc_nexus::config::{load_config, NexusConfig};
use rpc_nexus::lifecycle::shutdown::stop_workers;
use rpc_nexus::lifecycle::{fatal, signals, startup, Shutdown};
use rpc_nexus::observability::{logging, metrics, reporter::StatsReporter};

#[derive(Parser)]
#[command(name = "rpc-nexus")]
#[command(about = "Session-management Nexus for RPC endpoint threads", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the control-plane UDP port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path).unwrap_or_else(|e| fatal(format_args!("{}: {}", path.display(), e))),
        None => NexusConfig::default(),
    };
    if let Some(port) = args.port {
        config.nexus.udp_port = port;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("rpc-nexus v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = rpc_nexus::config::validation::validate_config(&config) {
        for e in &errors {
            tracing::error!(error = %e, "Invalid configuration");
        }
        fatal("invalid configuration");
    }

    if config.observability.metrics_enabled {
        // validated above
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let started = startup::start(&config);

    let shutdown = Shutdown::new();
    let reporter = StatsReporter::new(
        started.nexus,
        Duration::from_secs(config.observability.stats_interval_secs),
    );
    let reporter_task = tokio::spawn(reporter.run(shutdown.subscribe()));

    if let Err(e) = signals::wait_for_shutdown_signal().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signals");
    }

    tracing::info!("Shutting down");
    shutdown.trigger();
    let _ = reporter_task.await;

    let events = stop_workers(started.workers);
    tracing::info!(
        events,
        registered_hooks = started.nexus.num_hooks(),
        "Shutdown complete"
    );
}
