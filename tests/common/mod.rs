//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use provider_balancer::config::HealthCheckConfig;
use provider_balancer::entropy::RandomSource;
use provider_balancer::health::NoopSink;
use provider_balancer::{Balancer, QueryPolicy};

/// Probe source that either always passes or always fails, switchable at runtime.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FlakySource {
    failing: AtomicBool,
    draws: AtomicU64,
}

#[allow(dead_code)]
impl FlakySource {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn draws(&self) -> u64 {
        self.draws.load(Ordering::SeqCst)
    }
}

impl RandomSource for FlakySource {
    fn next_below(&self, upper: usize) -> usize {
        self.draws.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            0
        } else {
            upper.saturating_sub(1)
        }
    }
}

/// Health config probing every `interval_ms`.
pub fn fast_health(interval_ms: u64) -> HealthCheckConfig {
    HealthCheckConfig {
        interval_ms,
        ..Default::default()
    }
}

/// Balancer with the given providers registered, exclusions discarded.
pub fn balancer_with(
    ids: &[&str],
    policy: QueryPolicy,
    health: &HealthCheckConfig,
    source: Arc<dyn RandomSource>,
) -> Balancer {
    let balancer = Balancer::with_components(policy, health, source, Arc::new(NoopSink));
    for id in ids {
        balancer.register_provider(*id).unwrap();
    }
    balancer
}
