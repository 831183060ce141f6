//! Random load balancing strategy.

use crate::entropy::RandomSource;
use crate::load_balancer::{provider::Provider, scan_for_working, Selector};

/// Random selector.
/// Draws a uniform start index, then scans forward (wrapping) to the first
/// working provider. Leaves the round-robin cursor untouched.
#[derive(Debug, Default)]
pub struct RandomChoice;

impl RandomChoice {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for RandomChoice {
    fn next_provider(
        &self,
        providers: &[Provider],
        _cursor: &mut usize,
        source: &dyn RandomSource,
    ) -> Option<usize> {
        if providers.is_empty() {
            return None;
        }
        let start = source.next_below(providers.len());
        scan_for_working(providers, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SequenceSource;
    use crate::load_balancer::identity::IdentityRegistry;
    use crate::load_balancer::provider::ProviderSettings;

    fn providers(ids: &[&str]) -> Vec<Provider> {
        let mut identities = IdentityRegistry::new();
        ids.iter()
            .map(|id| identities.create((*id).into(), ProviderSettings::default()).unwrap())
            .collect()
    }

    #[test]
    fn test_random_uses_draw() {
        let lb = RandomChoice::new();
        let nodes = providers(&["a", "b", "c"]);
        let source = SequenceSource::new([2, 0, 1], 0);
        let mut cursor = 0;

        assert_eq!(lb.next_provider(&nodes, &mut cursor, &source), Some(2));
        assert_eq!(lb.next_provider(&nodes, &mut cursor, &source), Some(0));
        assert_eq!(lb.next_provider(&nodes, &mut cursor, &source), Some(1));
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_single_healthy_always_chosen() {
        let lb = RandomChoice::new();
        let mut nodes = providers(&["a", "b", "c", "d"]);
        let fail = SequenceSource::constant(0);
        for idx in [0, 1, 3] {
            nodes[idx].probe(&fail);
        }
        let mut cursor = 0;
        for draw in 0..4 {
            let source = SequenceSource::constant(draw);
            assert_eq!(lb.next_provider(&nodes, &mut cursor, &source), Some(2));
        }
    }
}
