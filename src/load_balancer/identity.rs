//! Provider identity bookkeeping.
//!
//! Every identifier handed out stays claimed for the lifetime of the
//! `IdentityRegistry`, even after its provider is dropped.

use std::collections::HashSet;

use crate::load_balancer::provider::{Provider, ProviderSettings};
use crate::load_balancer::types::{BalancerError, BalancerResult, ProviderId};

/// Provider factory backed by the set of identifiers ever claimed.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    claimed: HashSet<ProviderId>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` was already claimed.
    pub fn contains(&self, id: &str) -> bool {
        self.claimed.contains(id)
    }

    /// Claim `id` and build a provider for it.
    pub fn create(&mut self, id: ProviderId, settings: ProviderSettings) -> BalancerResult<Provider> {
        if self.claimed.contains(&id) {
            return Err(BalancerError::DuplicateIdentifier(id));
        }
        self.claimed.insert(id.clone());
        Ok(Provider::new(id, settings))
    }

    /// Number of identifiers ever claimed.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
