//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_dispatch_total` (counter): dispatch attempts by policy, outcome
//! - `balancer_capacity_checks_total` (counter): admission checks by outcome
//! - `balancer_health_cycles_total` (counter): completed probe passes
//! - `balancer_eligible_providers` (gauge): providers eligible after the last pass
//! - `balancer_provider_health` (gauge): 1=working, 0=excluded, per provider
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless they call [`init_metrics`].

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(policy: &'static str, outcome: &'static str) {
    metrics::counter!("balancer_dispatch_total", "policy" => policy, "outcome" => outcome).increment(1);
}

pub fn record_capacity_check(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "shortfall" };
    metrics::counter!("balancer_capacity_checks_total", "outcome" => outcome).increment(1);
}

pub fn record_health_cycle(eligible: usize) {
    metrics::counter!("balancer_health_cycles_total").increment(1);
    metrics::gauge!("balancer_eligible_providers").set(eligible as f64);
}

pub fn record_provider_health(provider: &str, working: bool) {
    metrics::gauge!("balancer_provider_health", "provider" => provider.to_string())
        .set(if working { 1.0 } else { 0.0 });
}
