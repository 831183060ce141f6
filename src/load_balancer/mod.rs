//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! register(id)
//!     → identity.rs (claim identifier forever, build provider)
//!     → registry.rs (append in order, bump eligible count)
//!
//! select_one()
//!     → pool.rs (take the shared lock)
//!     → eligible count < 1 → no provider
//!     → Apply policy.rs selection:
//!         - round_robin.rs (advance cursor, scan to next working)
//!         - random_choice.rs (random start, scan to next working)
//!     → provider.rs respond() → identifier
//! ```
//!
//! # Design Decisions
//! - One lock guards registry, health fields and cursor together
//! - Policy lives outside the lock in a single atomic byte
//! - Capacity checks are reads, never reservations

pub mod dispatcher;
pub mod identity;
pub mod policy;
pub mod pool;
pub mod provider;
pub mod random_choice;
pub mod registry;
pub mod round_robin;
pub mod types;

use crate::entropy::RandomSource;

pub use dispatcher::Dispatcher;
pub use policy::QueryPolicy;
pub use provider::{Provider, ProviderSettings};
pub use types::{BalancerError, BalancerResult, CapacityDecision, ProviderId, MAX_PROVIDERS};

/// Provider selection strategy.
///
/// Called with the pool lock held. Returns the index of a working provider,
/// or `None` when none is working.
pub trait Selector: Send + Sync {
    fn next_provider(
        &self,
        providers: &[Provider],
        cursor: &mut usize,
        source: &dyn RandomSource,
    ) -> Option<usize>;
}

/// Index of the first working provider at or after `start`, wrapping around.
pub(crate) fn scan_for_working(providers: &[Provider], start: usize) -> Option<usize> {
    let len = providers.len();
    (0..len)
        .map(|offset| (start + offset) % len)
        .find(|&index| providers[index].is_working())
}
