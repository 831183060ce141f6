//! Provider abstraction.
//!
//! # Responsibilities
//! - Represent a single unit of backend capacity
//! - Run the probe-driven health state machine
//! - Validate per-provider tuning (capacity, robustness, heartbeat limit)
//!
//! # Health hysteresis
//! ```text
//! working ──(failed probe)──▶ not working, streak = 0
//! not working ──(alive_heartbeat_limit consecutive good probes)──▶ working
//! ```

use serde::Serialize;

use crate::entropy::RandomSource;
use crate::load_balancer::types::{BalancerError, BalancerResult, ProviderId};

pub const DEFAULT_CAPACITY: u32 = 10;
pub const DEFAULT_ROBUSTNESS: u32 = 5;
pub const DEFAULT_ALIVE_HEARTBEAT_LIMIT: u32 = 2;

/// Coarse health view derived from the working flag and the probe streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Selectable for dispatch.
    Healthy,
    /// Failed earlier, collecting consecutive good probes.
    Recovering,
    /// Failed its most recent probe.
    Unhealthy,
}

/// Initial tuning for a provider. Invalid values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSettings {
    pub capacity: u32,
    pub robustness: u32,
    pub alive_heartbeat_limit: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            robustness: DEFAULT_ROBUSTNESS,
            alive_heartbeat_limit: DEFAULT_ALIVE_HEARTBEAT_LIMIT,
        }
    }
}

/// A single backend provider.
///
/// Providers are only created through
/// [`IdentityRegistry::create`](crate::load_balancer::identity::IdentityRegistry::create),
/// which guarantees the identifier has never been used before.
#[derive(Debug)]
pub struct Provider {
    id: ProviderId,
    /// Requests the provider can serve concurrently.
    capacity: u32,
    /// A probe fails with probability `1 / robustness`.
    robustness: u32,
    /// Consecutive good probes needed to become working again.
    alive_heartbeat_limit: u32,
    /// Current streak of good probes; reset on failure.
    heartbeat_count: u32,
    working: bool,
}

impl Provider {
    pub(crate) fn new(id: ProviderId, settings: ProviderSettings) -> Self {
        let mut provider = Self {
            id,
            capacity: DEFAULT_CAPACITY,
            robustness: DEFAULT_ROBUSTNESS,
            alive_heartbeat_limit: DEFAULT_ALIVE_HEARTBEAT_LIMIT,
            heartbeat_count: 0,
            working: true,
        };
        provider.set_capacity(settings.capacity);
        provider.set_robustness(settings.robustness);
        provider.set_alive_heartbeat_limit(settings.alive_heartbeat_limit);
        // Fresh providers are healthy by construction.
        provider.heartbeat_count = provider.alive_heartbeat_limit;
        provider
    }

    pub fn id(&self) -> &ProviderId {
        &self.id
    }

    pub fn is_working(&self) -> bool {
        self.working
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn robustness(&self) -> u32 {
        self.robustness
    }

    pub fn alive_heartbeat_limit(&self) -> u32 {
        self.alive_heartbeat_limit
    }

    pub fn heartbeat_count(&self) -> u32 {
        self.heartbeat_count
    }

    pub fn health(&self) -> HealthState {
        match (self.working, self.heartbeat_count) {
            (true, _) => HealthState::Healthy,
            (false, 0) => HealthState::Unhealthy,
            (false, _) => HealthState::Recovering,
        }
    }

    /// Answer a request.
    ///
    /// Callers must have checked eligibility first; asking a provider that is
    /// not working is a programming error and reported as `NotWorking`.
    pub fn respond(&self) -> BalancerResult<ProviderId> {
        if self.working {
            Ok(self.id.clone())
        } else {
            Err(BalancerError::NotWorking(self.id.clone()))
        }
    }

    /// Run one health probe and return whether the provider counts as healthy.
    ///
    /// A draw of 0 out of `[0, robustness)` is a failure.
    pub fn probe(&mut self, source: &dyn RandomSource) -> bool {
        let draw = source.next_below(self.robustness as usize);
        if draw == 0 {
            self.heartbeat_count = 0;
            self.working = false;
            false
        } else if self.heartbeat_count < self.alive_heartbeat_limit.saturating_sub(1) {
            self.heartbeat_count += 1;
            false
        } else {
            self.working = true;
            true
        }
    }

    /// Returns false and keeps the old value unless `capacity > 0`.
    pub fn set_capacity(&mut self, capacity: u32) -> bool {
        if capacity > 0 {
            self.capacity = capacity;
            return true;
        }
        false
    }

    /// Returns false and keeps the old value unless `robustness > 1`.
    pub fn set_robustness(&mut self, robustness: u32) -> bool {
        if robustness > 1 {
            self.robustness = robustness;
            return true;
        }
        false
    }

    /// Returns false and keeps the old value unless `limit > 0`.
    ///
    /// A working provider keeps a full streak under the new limit, so its
    /// next good probe still reports it healthy.
    pub fn set_alive_heartbeat_limit(&mut self, limit: u32) -> bool {
        if limit == 0 {
            return false;
        }
        self.alive_heartbeat_limit = limit;
        if self.working {
            self.heartbeat_count = self.heartbeat_count.max(limit);
        }
        true
    }

    pub fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot {
            id: self.id.clone(),
            capacity: self.capacity,
            robustness: self.robustness,
            alive_heartbeat_limit: self.alive_heartbeat_limit,
            heartbeat_count: self.heartbeat_count,
            working: self.working,
            health: self.health(),
        }
    }
}

/// Point-in-time copy of a provider's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSnapshot {
    pub id: ProviderId,
    pub capacity: u32,
    pub robustness: u32,
    pub alive_heartbeat_limit: u32,
    pub heartbeat_count: u32,
    pub working: bool,
    pub health: HealthState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SequenceSource;

    fn provider(limit: u32) -> Provider {
        Provider::new(
            ProviderId::from("p"),
            ProviderSettings {
                alive_heartbeat_limit: limit,
                ..ProviderSettings::default()
            },
        )
    }

    #[test]
    fn test_new_provider_is_healthy() {
        let p = provider(3);
        assert!(p.is_working());
        assert_eq!(p.heartbeat_count(), 3);
        assert_eq!(p.health(), HealthState::Healthy);
        assert_eq!(p.respond().unwrap(), "p");
    }

    #[test]
    fn test_invalid_settings_fall_back_to_defaults() {
        let p = Provider::new(
            ProviderId::from("p"),
            ProviderSettings {
                capacity: 0,
                robustness: 1,
                alive_heartbeat_limit: 0,
            },
        );
        assert_eq!(p.capacity(), DEFAULT_CAPACITY);
        assert_eq!(p.robustness(), DEFAULT_ROBUSTNESS);
        assert_eq!(p.alive_heartbeat_limit(), DEFAULT_ALIVE_HEARTBEAT_LIMIT);
    }

    #[test]
    fn test_good_probe_keeps_healthy_provider_working() {
        let mut p = provider(2);
        let source = SequenceSource::constant(1);
        assert!(p.probe(&source));
        assert!(p.is_working());
    }

    #[test]
    fn test_failed_probe_marks_not_working() {
        let mut p = provider(2);
        let source = SequenceSource::constant(0);
        assert!(!p.probe(&source));
        assert!(!p.is_working());
        assert_eq!(p.heartbeat_count(), 0);
        assert_eq!(p.health(), HealthState::Unhealthy);
        assert_eq!(
            p.respond(),
            Err(BalancerError::NotWorking(ProviderId::from("p")))
        );
    }

    #[test]
    fn test_recovery_needs_limit_consecutive_probes() {
        let mut p = provider(3);
        let source = SequenceSource::new([0, 1, 1], 1);
        assert!(!p.probe(&source));

        assert!(!p.probe(&source));
        assert_eq!(p.health(), HealthState::Recovering);
        assert!(!p.probe(&source));
        assert!(!p.is_working());

        // Third good probe in a row.
        assert!(p.probe(&source));
        assert!(p.is_working());
    }

    #[test]
    fn test_failure_mid_recovery_restarts_streak() {
        let mut p = provider(2);
        let source = SequenceSource::new([0, 1, 0, 1], 1);
        p.probe(&source);
        p.probe(&source);
        assert_eq!(p.heartbeat_count(), 1);
        p.probe(&source);
        assert_eq!(p.heartbeat_count(), 0);
        assert!(!p.probe(&source));
        assert!(p.probe(&source));
    }

    #[test]
    fn test_limit_of_one_recovers_on_next_good_probe() {
        let mut p = provider(1);
        let source = SequenceSource::new([0], 1);
        assert!(!p.probe(&source));
        assert!(p.probe(&source));
    }

    #[test]
    fn test_setters_validate() {
        let mut p = provider(2);
        assert!(p.set_capacity(15));
        assert!(!p.set_capacity(0));
        assert_eq!(p.capacity(), 15);

        assert!(p.set_robustness(2));
        assert!(!p.set_robustness(1));
        assert_eq!(p.robustness(), 2);

        assert!(p.set_alive_heartbeat_limit(4));
        assert!(!p.set_alive_heartbeat_limit(0));
        assert_eq!(p.alive_heartbeat_limit(), 4);
    }

    #[test]
    fn test_raising_limit_keeps_working_provider_healthy() {
        let mut p = provider(2);
        let source = SequenceSource::new([0, 1, 1], 1);
        p.probe(&source);
        p.probe(&source);
        assert!(p.probe(&source));
        assert_eq!(p.heartbeat_count(), 1);

        assert!(p.set_alive_heartbeat_limit(4));
        assert_eq!(p.heartbeat_count(), 4);
        assert!(p.probe(&source));
        assert!(p.is_working());
    }

    #[test]
    fn test_raising_limit_mid_recovery_extends_it() {
        let mut p = provider(2);
        let source = SequenceSource::new([0, 1], 1);
        p.probe(&source);
        p.probe(&source);
        assert_eq!(p.heartbeat_count(), 1);

        assert!(p.set_alive_heartbeat_limit(3));
        assert_eq!(p.heartbeat_count(), 1);
        assert!(!p.probe(&source));
        assert!(p.probe(&source));
    }
}
