//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and provider identity.
//! All errors are collected, not just the first.

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::BalancerConfig;
use crate::load_balancer::types::MAX_PROVIDERS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("health_check.interval_ms must be greater than 0")]
    ZeroInterval,

    #[error("{count} providers configured, at most {max} allowed")]
    TooManyProviders { count: usize, max: usize },

    #[error("provider #{index} has an empty id")]
    EmptyProviderId { index: usize },

    #[error("provider id {0} is used more than once")]
    DuplicateProviderId(String),

    #[error("provider {id}: capacity must be greater than 0")]
    InvalidCapacity { id: String },

    #[error("provider {id}: robustness must be greater than 1, got {value}")]
    InvalidRobustness { id: String, value: u32 },

    #[error("provider {id}: alive_heartbeat_limit must be greater than 0")]
    InvalidHeartbeatLimit { id: String },

    #[error("simulation.request_interval_ms must be greater than 0")]
    ZeroRequestInterval,

    #[error("simulation.min_batch ({min}) must not exceed max_batch ({max})")]
    InvalidBatchRange { min: u64, max: u64 },
}

/// Check a parsed configuration.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.health_check.interval_ms == 0 {
        errors.push(ValidationError::ZeroInterval);
    }

    if config.providers.len() > MAX_PROVIDERS {
        errors.push(ValidationError::TooManyProviders {
            count: config.providers.len(),
            max: MAX_PROVIDERS,
        });
    }

    let mut seen = HashSet::new();
    for (index, provider) in config.providers.iter().enumerate() {
        if provider.id.is_empty() {
            errors.push(ValidationError::EmptyProviderId { index });
        } else if !seen.insert(provider.id.as_str()) {
            errors.push(ValidationError::DuplicateProviderId(provider.id.clone()));
        }
        if provider.capacity == 0 {
            errors.push(ValidationError::InvalidCapacity { id: provider.id.clone() });
        }
        if provider.robustness < 2 {
            errors.push(ValidationError::InvalidRobustness {
                id: provider.id.clone(),
                value: provider.robustness,
            });
        }
        if provider.alive_heartbeat_limit == 0 {
            errors.push(ValidationError::InvalidHeartbeatLimit { id: provider.id.clone() });
        }
    }

    let sim = &config.simulation;
    if sim.request_interval_ms == 0 {
        errors.push(ValidationError::ZeroRequestInterval);
    }
    if sim.min_batch > sim.max_batch {
        errors.push(ValidationError::InvalidBatchRange {
            min: sim.min_batch,
            max: sim.max_batch,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
