//! Balancer facade.
//!
//! Owns one provider pool and wires the dispatcher and the health checker to
//! it. Both run under the same pool lock, so dispatch never observes a probe
//! pass half applied.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{BalancerConfig, HealthCheckConfig};
use crate::entropy::{RandomSource, ThreadRandom};
use crate::health::{CheckerState, CycleReport, ExclusionSink, HealthChecker, TracingSink};
use crate::load_balancer::pool::{PoolSnapshot, SharedPool};
use crate::load_balancer::provider::{Provider, ProviderSettings};
use crate::load_balancer::registry::ProviderRegistry;
use crate::load_balancer::{BalancerError, BalancerResult, CapacityDecision, Dispatcher, ProviderId, QueryPolicy};

#[derive(Debug)]
pub struct Balancer {
    pool: SharedPool,
    dispatcher: Dispatcher,
    checker: HealthChecker,
}

impl Default for Balancer {
    fn default() -> Self {
        Self::new()
    }
}

impl Balancer {
    /// Empty balancer: round-robin, thread randomness, exclusions logged.
    pub fn new() -> Self {
        Self::with_components(
            QueryPolicy::default(),
            &HealthCheckConfig::default(),
            Arc::new(ThreadRandom),
            Arc::new(TracingSink),
        )
    }

    pub fn with_components(
        policy: QueryPolicy,
        health: &HealthCheckConfig,
        source: Arc<dyn RandomSource>,
        sink: Arc<dyn ExclusionSink>,
    ) -> Self {
        let pool = SharedPool::new(ProviderRegistry::new());
        Self {
            dispatcher: Dispatcher::new(pool.clone(), policy, source.clone()),
            checker: HealthChecker::new(pool.clone(), source, sink, health),
            pool,
        }
    }

    /// Balancer with the configured policy, checker settings and providers.
    pub fn from_config(config: &BalancerConfig) -> BalancerResult<Self> {
        Self::from_config_with(config, Arc::new(ThreadRandom), Arc::new(TracingSink))
    }

    pub fn from_config_with(
        config: &BalancerConfig,
        source: Arc<dyn RandomSource>,
        sink: Arc<dyn ExclusionSink>,
    ) -> BalancerResult<Self> {
        let balancer = Self::with_components(config.policy, &config.health_check, source, sink);
        for provider in &config.providers {
            balancer.register_with(provider.id.as_str(), provider.settings())?;
        }
        tracing::info!(
            providers = config.providers.len(),
            policy = %config.policy,
            interval_ms = config.health_check.interval_ms,
            "Balancer configured"
        );
        Ok(balancer)
    }

    // --- Registration ---

    /// Register a provider with default settings.
    pub fn register_provider(&self, id: impl Into<ProviderId>) -> BalancerResult<()> {
        self.register_with(id, ProviderSettings::default())
    }

    pub fn register_with(&self, id: impl Into<ProviderId>, settings: ProviderSettings) -> BalancerResult<()> {
        let id = id.into();
        let result = self.pool.lock().registry.register(id.clone(), settings);
        if let Err(e) = &result {
            tracing::warn!(provider = %id, error = %e, "Provider registration rejected");
        }
        result
    }

    pub fn provider_count(&self) -> usize {
        self.pool.lock().registry.len()
    }

    pub fn eligible_count(&self) -> usize {
        self.pool.lock().registry.eligible_count()
    }

    // --- Dispatch ---

    /// Identifier of the provider for the next request, `None` when no
    /// provider is eligible.
    pub fn select_one(&self) -> Option<ProviderId> {
        self.dispatcher.select_one()
    }

    /// See [`Dispatcher::check_capacity`].
    pub fn check_capacity(&self, requests: u64) -> i64 {
        self.dispatcher.check_capacity(requests)
    }

    pub fn admit(&self, requests: u64) -> CapacityDecision {
        self.dispatcher.admit(requests)
    }

    pub fn total_working_capacity(&self) -> u64 {
        self.dispatcher.total_working_capacity()
    }

    pub fn set_policy(&self, policy: QueryPolicy) {
        self.dispatcher.set_policy(policy);
    }

    pub fn policy(&self) -> QueryPolicy {
        self.dispatcher.policy()
    }

    // --- Health checking ---

    /// Returns false if already running.
    pub fn start_health_checker(&self) -> bool {
        self.checker.start()
    }

    pub fn stop_health_checker(&self) -> bool {
        self.checker.stop()
    }

    pub fn health_checker_state(&self) -> CheckerState {
        self.checker.state()
    }

    /// Run a single probe pass now.
    pub fn run_health_check(&self) -> CycleReport {
        self.checker.run_once()
    }

    pub fn health_check_interval(&self) -> Duration {
        self.checker.interval()
    }

    /// Rejects zero; applies from the next start.
    pub fn set_health_check_interval(&self, interval: Duration) -> bool {
        self.checker.set_interval(interval)
    }

    pub fn set_cycle_message(&self, message: impl Into<String>) {
        self.checker.set_cycle_message(message);
    }

    /// Stop the health checker and wait for its loop to exit.
    pub async fn shutdown(&self) {
        self.checker.shutdown().await;
    }

    // --- Per-provider tuning ---

    /// `Ok(false)` when the value is rejected, `Err` for an unknown provider.
    pub fn set_provider_capacity(&self, id: &str, capacity: u32) -> BalancerResult<bool> {
        self.with_provider(id, |p| p.set_capacity(capacity))
    }

    pub fn set_provider_robustness(&self, id: &str, robustness: u32) -> BalancerResult<bool> {
        self.with_provider(id, |p| p.set_robustness(robustness))
    }

    pub fn set_provider_alive_heartbeat_limit(&self, id: &str, limit: u32) -> BalancerResult<bool> {
        self.with_provider(id, |p| p.set_alive_heartbeat_limit(limit))
    }

    fn with_provider<T>(&self, id: &str, f: impl FnOnce(&mut Provider) -> T) -> BalancerResult<T> {
        let mut state = self.pool.lock();
        state
            .registry
            .find_mut(id)
            .map(f)
            .ok_or_else(|| BalancerError::UnknownProvider(ProviderId::from(id)))
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.pool.snapshot(self.dispatcher.policy())
    }
}
