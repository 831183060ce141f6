//! Request dispatch and capacity admission.

use std::sync::Arc;

use crate::entropy::RandomSource;
use crate::load_balancer::policy::{AtomicPolicy, QueryPolicy};
use crate::load_balancer::pool::SharedPool;
use crate::load_balancer::random_choice::RandomChoice;
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::types::{CapacityDecision, ProviderId};
use crate::load_balancer::Selector;
use crate::observability::metrics;

/// Picks an eligible provider per request and answers capacity checks.
pub struct Dispatcher {
    pool: SharedPool,
    policy: AtomicPolicy,
    source: Arc<dyn RandomSource>,
    round_robin: RoundRobin,
    random: RandomChoice,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy.load())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(pool: SharedPool, policy: QueryPolicy, source: Arc<dyn RandomSource>) -> Self {
        Self {
            pool,
            policy: AtomicPolicy::new(policy),
            source,
            round_robin: RoundRobin::new(),
            random: RandomChoice::new(),
        }
    }

    pub fn policy(&self) -> QueryPolicy {
        self.policy.load()
    }

    /// Takes effect on the next `select_one`.
    pub fn set_policy(&self, policy: QueryPolicy) {
        self.policy.store(policy);
    }

    fn selector(&self, policy: QueryPolicy) -> &dyn Selector {
        match policy {
            QueryPolicy::RoundRobin => &self.round_robin,
            QueryPolicy::Random => &self.random,
        }
    }

    /// Identifier of the provider serving the next request.
    ///
    /// `None` means no provider is currently eligible; callers should back
    /// off and retry.
    pub fn select_one(&self) -> Option<ProviderId> {
        let policy = self.policy.load();
        let mut guard = self.pool.lock();
        let state = &mut *guard;

        if state.registry.eligible_count() < 1 {
            metrics::record_dispatch(policy.as_str(), "unavailable");
            tracing::debug!(policy = %policy, "No providers currently available");
            return None;
        }

        let index = self.selector(policy).next_provider(
            state.registry.providers(),
            &mut state.cursor,
            self.source.as_ref(),
        )?;

        match state.registry.get(index).map(|p| p.respond()) {
            Some(Ok(id)) => {
                metrics::record_dispatch(policy.as_str(), "selected");
                tracing::debug!(policy = %policy, provider = %id, "Request dispatched");
                Some(id)
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Selected provider refused the request");
                None
            }
            None => None,
        }
    }

    /// Admission check for `requests` units of work.
    ///
    /// Returns `requests` when current working capacity covers it, otherwise
    /// `capacity - requests` (negative, the shortfall). Best effort: nothing
    /// is reserved and the answer may be stale once the lock is released.
    pub fn check_capacity(&self, requests: u64) -> i64 {
        self.admit(requests).as_signed()
    }

    /// Tagged form of [`check_capacity`](Self::check_capacity).
    pub fn admit(&self, requests: u64) -> CapacityDecision {
        let total = self.pool.lock().registry.total_working_capacity();
        let decision = CapacityDecision::evaluate(total, requests);
        metrics::record_capacity_check(decision.is_accepted());
        if let CapacityDecision::Shortfall(missing) = decision {
            tracing::debug!(requests, capacity = total, shortfall = missing, "Capacity exceeded");
        }
        decision
    }

    /// Sum of capacities over working providers.
    pub fn total_working_capacity(&self) -> u64 {
        self.pool.lock().registry.total_working_capacity()
    }
}
