//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! default every field, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::load_balancer::policy::QueryPolicy;
use crate::load_balancer::provider::{
    ProviderSettings, DEFAULT_ALIVE_HEARTBEAT_LIMIT, DEFAULT_CAPACITY, DEFAULT_ROBUSTNESS,
};

/// Root configuration for the balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Initial dispatch policy.
    pub policy: QueryPolicy,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Providers registered at startup, in order.
    pub providers: Vec<ProviderConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Driver loop settings.
    pub simulation: SimulationConfig,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        let capacities = [15, 20, DEFAULT_CAPACITY, DEFAULT_CAPACITY, DEFAULT_CAPACITY];
        Self {
            policy: QueryPolicy::RoundRobin,
            health_check: HealthCheckConfig::default(),
            providers: capacities
                .iter()
                .enumerate()
                .map(|(i, capacity)| ProviderConfig {
                    id: (i + 1).to_string(),
                    capacity: *capacity,
                    ..ProviderConfig::default()
                })
                .collect(),
            observability: ObservabilityConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Start the checker together with the balancer.
    pub enabled: bool,

    /// Time between probe passes in milliseconds.
    pub interval_ms: u64,

    /// Line logged at the start of every pass (empty = none).
    pub cycle_message: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 10_000,
            cycle_message: String::new(),
        }
    }
}

/// Provider definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Unique provider identifier.
    pub id: String,

    /// Requests served concurrently.
    pub capacity: u32,

    /// Inverse failure probability per probe (must be > 1).
    pub robustness: u32,

    /// Consecutive good probes needed to recover.
    pub alive_heartbeat_limit: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            capacity: DEFAULT_CAPACITY,
            robustness: DEFAULT_ROBUSTNESS,
            alive_heartbeat_limit: DEFAULT_ALIVE_HEARTBEAT_LIMIT,
        }
    }
}

impl ProviderConfig {
    pub fn settings(&self) -> ProviderSettings {
        ProviderSettings {
            capacity: self.capacity,
            robustness: self.robustness,
            alive_heartbeat_limit: self.alive_heartbeat_limit,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Driver loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of single requests to dispatch.
    pub requests: u64,

    /// Pause between requests in milliseconds.
    pub request_interval_ms: u64,

    /// Toggle the policy after this many requests (0 = never).
    pub policy_switch_every: u64,

    /// Smallest batch size for capacity checks.
    pub min_batch: u64,

    /// Batch sizes are drawn from `[min_batch, max_batch)`.
    pub max_batch: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            requests: 1000,
            request_interval_ms: 1000,
            policy_switch_every: 10,
            min_batch: 30,
            max_batch: 70,
        }
    }
}
