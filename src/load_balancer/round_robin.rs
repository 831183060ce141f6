//! Round-robin load balancing strategy.

use crate::entropy::RandomSource;
use crate::load_balancer::{provider::Provider, scan_for_working, Selector};

/// Round-robin selector.
///
/// Advances the shared cursor by one on every call, then scans forward
/// (wrapping) to the first working provider. The cursor is left on the
/// provider that answered.
#[derive(Debug, Default)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for RoundRobin {
    fn next_provider(
        &self,
        providers: &[Provider],
        cursor: &mut usize,
        _source: &dyn RandomSource,
    ) -> Option<usize> {
        if providers.is_empty() {
            return None;
        }
        let start = (*cursor + 1) % providers.len();
        let found = scan_for_working(providers, start)?;
        *cursor = found;
        Some(found)
    }
}
