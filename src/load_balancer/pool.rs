//! Shared provider pool.
//!
//! # Responsibilities
//! - Own the single lock that guards the registry, every provider's health
//!   fields and the round-robin cursor
//! - Produce consistent snapshots for status reporting

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::load_balancer::policy::QueryPolicy;
use crate::load_balancer::provider::ProviderSnapshot;
use crate::load_balancer::registry::ProviderRegistry;

/// Everything guarded by the pool lock.
#[derive(Debug, Default)]
pub struct PoolState {
    pub registry: ProviderRegistry,
    /// Index of the provider that answered the last round-robin request.
    pub cursor: usize,
}

/// Cloneable handle to the pool state.
#[derive(Debug, Clone, Default)]
pub struct SharedPool {
    inner: Arc<Mutex<PoolState>>,
}

impl SharedPool {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PoolState {
                registry,
                cursor: 0,
            })),
        }
    }

    /// Acquire the pool lock.
    ///
    /// Never hold the guard across an `.await`. A poisoned lock is recovered:
    /// every mutation under it completes before the guard is released.
    pub fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self, policy: QueryPolicy) -> PoolSnapshot {
        let state = self.lock();
        PoolSnapshot {
            policy,
            eligible: state.registry.eligible_count(),
            cursor: state.cursor,
            total_working_capacity: state.registry.total_working_capacity(),
            providers: state.registry.providers().iter().map(|p| p.snapshot()).collect(),
        }
    }
}

/// Consistent view of the pool taken under one lock acquisition.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub policy: QueryPolicy,
    pub eligible: usize,
    pub cursor: usize,
    pub total_working_capacity: u64,
    pub providers: Vec<ProviderSnapshot>,
}

impl PoolSnapshot {
    pub fn working_count(&self) -> usize {
        self.providers.iter().filter(|p| p.working).count()
    }
}
