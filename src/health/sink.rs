//! Exclusion events.
//!
//! After each probe pass the checker reports the providers it excluded.

use std::sync::{Mutex, PoisonError};

use crate::load_balancer::types::ProviderId;

/// Receives the providers excluded by a health pass.
///
/// Called with the pool lock held; implementations must not call back into
/// the balancer.
pub trait ExclusionSink: Send + Sync {
    fn providers_excluded(&self, excluded: &[ProviderId]);
}

/// Logs exclusions through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ExclusionSink for TracingSink {
    fn providers_excluded(&self, excluded: &[ProviderId]) {
        for id in excluded {
            tracing::warn!(provider = %id, "Excluding provider");
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ExclusionSink for NoopSink {
    fn providers_excluded(&self, _excluded: &[ProviderId]) {}
}

/// Keeps every reported batch, one entry per pass with exclusions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<ProviderId>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<ProviderId>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ExclusionSink for RecordingSink {
    fn providers_excluded(&self, excluded: &[ProviderId]) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(excluded.to_vec());
    }
}
