//! Provider balancer driver.
//!
//! ```text
//!   config (TOML) ──▶ Balancer ◀── select_one / check_capacity ── driver loop
//!                        │
//!                        ▼
//!                  health checker (tokio task, shared pool lock)
//! ```
//!
//! Registers the configured providers, starts periodic health checking and
//! dispatches requests on a timer until the request budget is spent or
//! Ctrl-C arrives. Prints a JSON report at the end.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use provider_balancer::config::{load_config, BalancerConfig};
use provider_balancer::entropy::{RandomSource, ThreadRandom};
use provider_balancer::health::TracingSink;
use provider_balancer::lifecycle::{signals, Shutdown};
use provider_balancer::load_balancer::QueryPolicy;
use provider_balancer::observability::{logging, metrics};
use provider_balancer::simulation::run_simulation;
use provider_balancer::Balancer;

#[derive(Parser)]
#[command(name = "provider-balancer")]
#[command(about = "Dispatch simulated requests across health-checked providers", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of requests to send.
    #[arg(short, long)]
    requests: Option<u64>,

    /// Override the initial dispatch policy.
    #[arg(short, long, value_enum)]
    policy: Option<QueryPolicy>,

    /// Override the health check interval in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };
    if let Some(requests) = cli.requests {
        config.simulation.requests = requests;
    }
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    if let Some(interval_ms) = cli.interval_ms.filter(|ms| *ms > 0) {
        config.health_check.interval_ms = interval_ms;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("provider-balancer v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let source: Arc<dyn RandomSource> = Arc::new(ThreadRandom);
    let balancer = Balancer::from_config_with(&config, source.clone(), Arc::new(TracingSink))?;

    if config.health_check.enabled && !balancer.start_health_checker() {
        tracing::warn!("Health checker did not start");
    }

    let shutdown = Arc::new(Shutdown::new());
    let driver_stop = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_on_signal(&signal_shutdown).await;
    });

    let report = run_simulation(&balancer, &config.simulation, source.as_ref(), driver_stop).await;

    balancer.shutdown().await;
    println!("{}", serde_json::to_string_pretty(&balancer.snapshot())?);
    println!("{}", serde_json::to_string_pretty(&report)?);

    tracing::info!("Shutdown complete");
    Ok(())
}
