//! Provider registry.
//!
//! # Responsibilities
//! - Keep providers in registration order (the round-robin traversal order)
//! - Enforce the size bound and identifier uniqueness
//! - Track how many providers are currently eligible

use crate::load_balancer::identity::IdentityRegistry;
use crate::load_balancer::provider::{Provider, ProviderSettings};
use crate::load_balancer::types::{BalancerError, BalancerResult, ProviderId, MAX_PROVIDERS};

/// Ordered, bounded collection of providers.
#[derive(Debug)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
    identities: IdentityRegistry,
    /// Providers counted healthy at the last registration or health pass.
    eligible: usize,
    max_providers: usize,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::with_limit(MAX_PROVIDERS)
    }

    /// Registry holding at most `max_providers` (capped at `MAX_PROVIDERS`).
    pub fn with_limit(max_providers: usize) -> Self {
        Self {
            providers: Vec::new(),
            identities: IdentityRegistry::new(),
            eligible: 0,
            max_providers: max_providers.min(MAX_PROVIDERS),
        }
    }

    /// Create and append a provider.
    ///
    /// A rejected registration claims no identifier and leaves the registry
    /// unchanged.
    pub fn register(&mut self, id: ProviderId, settings: ProviderSettings) -> BalancerResult<()> {
        if self.providers.len() >= self.max_providers {
            return Err(BalancerError::CapacityExceeded {
                max: self.max_providers,
            });
        }
        let provider = self.identities.create(id, settings)?;
        tracing::debug!(provider = %provider.id(), position = self.providers.len(), "Provider registered");
        self.providers.push(provider);
        // New providers start healthy.
        self.eligible += 1;
        Ok(())
    }

    /// Whether `id` was ever claimed in this registry.
    pub fn was_claimed(&self, id: &str) -> bool {
        self.identities.contains(id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn max_providers(&self) -> usize {
        self.max_providers
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible
    }

    pub(crate) fn set_eligible_count(&mut self, eligible: usize) {
        self.eligible = eligible;
    }

    pub fn get(&self, index: usize) -> Option<&Provider> {
        self.providers.get(index)
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub(crate) fn providers_mut(&mut self) -> &mut [Provider] {
        &mut self.providers
    }

    pub fn find(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id().as_str() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Provider> {
        self.providers.iter_mut().find(|p| p.id().as_str() == id)
    }

    /// Sum of capacities over working providers.
    pub fn total_working_capacity(&self) -> u64 {
        self.providers
            .iter()
            .filter(|p| p.is_working())
            .map(|p| u64::from(p.capacity()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(registry: &mut ProviderRegistry, id: &str) -> BalancerResult<()> {
        registry.register(id.into(), ProviderSettings::default())
    }

    #[test]
    fn test_registration_counts_eligible() {
        let mut registry = ProviderRegistry::new();
        for i in 0..MAX_PROVIDERS {
            register(&mut registry, &i.to_string()).unwrap();
            assert_eq!(registry.eligible_count(), i + 1);
        }
        assert_eq!(registry.len(), MAX_PROVIDERS);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut registry = ProviderRegistry::new();
        for id in ["c", "a", "b"] {
            register(&mut registry, id).unwrap();
        }
        let order: Vec<_> = registry.providers().iter().map(|p| p.id().to_string()).collect();
        assert_eq!(order, ["c", "a", "b"]);
        assert_eq!(registry.get(1).unwrap().id(), "a");
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_full_registry_rejects_and_stays_unchanged() {
        let mut registry = ProviderRegistry::with_limit(2);
        register(&mut registry, "1").unwrap();
        register(&mut registry, "2").unwrap();

        let err = register(&mut registry, "3").unwrap_err();
        assert_eq!(err, BalancerError::CapacityExceeded { max: 2 });
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.eligible_count(), 2);
        // The rejected identifier was not consumed.
        assert!(!registry.was_claimed("3"));
    }

    #[test]
    fn test_duplicate_identifier() {
        let mut registry = ProviderRegistry::new();
        register(&mut registry, "1").unwrap();
        assert_eq!(
            register(&mut registry, "1").unwrap_err(),
            BalancerError::DuplicateIdentifier(ProviderId::from("1"))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_limit_capped_at_max() {
        let registry = ProviderRegistry::with_limit(50);
        assert_eq!(registry.max_providers(), MAX_PROVIDERS);
    }

    #[test]
    fn test_total_working_capacity() {
        let mut registry = ProviderRegistry::new();
        registry
            .register("3".into(), ProviderSettings { capacity: 10, ..Default::default() })
            .unwrap();
        registry
            .register("4".into(), ProviderSettings { capacity: 15, ..Default::default() })
            .unwrap();
        assert_eq!(registry.total_working_capacity(), 25);

        let source = crate::entropy::SequenceSource::constant(0);
        registry.find_mut("4").unwrap().probe(&source);
        assert_eq!(registry.total_working_capacity(), 10);
    }
}
