//! Request driver.
//!
//! Issues single requests on a timer, toggles the dispatch policy every few
//! requests and runs a capacity check for a random batch after each request.
//! This sits outside the balancer core and only uses its public surface.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::balancer::Balancer;
use crate::config::SimulationConfig;
use crate::entropy::RandomSource;
use crate::load_balancer::CapacityDecision;

/// Totals collected by a driver run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub requests_sent: u64,
    pub requests_served: u64,
    pub requests_unavailable: u64,
    /// Requests answered per provider.
    pub served_by: BTreeMap<String, u64>,
    pub batches_accepted: u64,
    pub batches_rejected: u64,
    /// Sum of all shortfalls reported by rejected batches.
    pub total_shortfall: u64,
    pub policy_switches: u64,
    /// Whether the run ended early on a stop signal.
    pub interrupted: bool,
}

fn draw_batch(settings: &SimulationConfig, source: &dyn RandomSource) -> u64 {
    let span = settings.max_batch.saturating_sub(settings.min_batch);
    if span == 0 {
        return settings.min_batch;
    }
    let span = usize::try_from(span).unwrap_or(usize::MAX);
    settings.min_batch + source.next_below(span) as u64
}

/// Drive `balancer` until `settings.requests` were sent or `shutdown` fires.
pub async fn run_simulation(
    balancer: &Balancer,
    settings: &SimulationConfig,
    source: &dyn RandomSource,
    mut shutdown: broadcast::Receiver<()>,
) -> SimulationReport {
    let mut report = SimulationReport::default();
    let interval = Duration::from_millis(settings.request_interval_ms);

    for request in 0..settings.requests {
        tracing::info!(request, "Sending request");
        match balancer.select_one() {
            Some(provider) => {
                tracing::info!(request, provider = %provider, "Response received");
                report.requests_served += 1;
                *report.served_by.entry(provider.to_string()).or_default() += 1;
            }
            None => {
                tracing::warn!(request, "No providers currently available, please resend");
                report.requests_unavailable += 1;
            }
        }
        report.requests_sent += 1;

        if settings.policy_switch_every > 0 && report.requests_sent % settings.policy_switch_every == 0 {
            let next = balancer.policy().toggled();
            tracing::info!(policy = %next, "Changing query policy");
            balancer.set_policy(next);
            report.policy_switches += 1;
        }

        let batch = draw_batch(settings, source);
        match balancer.admit(batch) {
            CapacityDecision::Accepted(n) => {
                tracing::info!(requests = n, "Multiple requests processed");
                report.batches_accepted += 1;
            }
            CapacityDecision::Shortfall(missing) => {
                tracing::warn!(requests = batch, shortfall = missing, "Available capacity exceeded");
                report.batches_rejected += 1;
                report.total_shortfall += missing;
            }
        }

        if request + 1 == settings.requests {
            break;
        }
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!(sent = report.requests_sent, "Driver stopping early");
                report.interrupted = true;
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    report
}
