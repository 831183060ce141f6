//! Identifier, error and admission types shared by the load balancing subsystem.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Upper bound on the number of providers a single registry accepts.
pub const MAX_PROVIDERS: usize = 10;

/// Unique provider identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProviderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ProviderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ProviderId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProviderId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Errors raised by registration and provider access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalancerError {
    /// The identifier was claimed before, by this or an earlier provider.
    #[error("provider {0} already exists")]
    DuplicateIdentifier(ProviderId),

    /// The registry already holds the maximum number of providers.
    #[error("max number of allowed providers ({max}) exceeded")]
    CapacityExceeded { max: usize },

    /// A response was requested from a provider that is not healthy.
    #[error("provider {0} not working")]
    NotWorking(ProviderId),

    /// No registered provider carries this identifier.
    #[error("provider {0} is not registered")]
    UnknownProvider(ProviderId),
}

/// Result type for balancer operations.
pub type BalancerResult<T> = Result<T, BalancerError>;

/// Outcome of a capacity admission check.
///
/// This is a read of the aggregate working capacity at one instant. Nothing is
/// reserved, so two concurrent checks may both be accepted against the same
/// capacity, and the answer can be stale as soon as the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "requests", rename_all = "snake_case")]
pub enum CapacityDecision {
    /// All requested units fit into the current working capacity.
    Accepted(u64),
    /// Working capacity falls short by this many units.
    Shortfall(u64),
}

impl CapacityDecision {
    /// Decide from total working capacity and requested volume.
    pub fn evaluate(total_capacity: u64, requested: u64) -> Self {
        if total_capacity < requested {
            CapacityDecision::Shortfall(requested - total_capacity)
        } else {
            CapacityDecision::Accepted(requested)
        }
    }

    /// Signed form: the accepted volume, or the negated shortfall.
    pub fn as_signed(self) -> i64 {
        match self {
            CapacityDecision::Accepted(n) => i64::try_from(n).unwrap_or(i64::MAX),
            CapacityDecision::Shortfall(n) => i64::try_from(n).map(|v| -v).unwrap_or(i64::MIN),
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, CapacityDecision::Accepted(_))
    }
}

impl From<CapacityDecision> for i64 {
    fn from(decision: CapacityDecision) -> Self {
        decision.as_signed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_comparisons() {
        let id = ProviderId::from("5");
        assert_eq!(id, "5");
        assert_eq!(id.as_str(), "5");
        assert_eq!(id.to_string(), "5");
        assert_eq!(ProviderId::new(String::from("5")), id);
    }

    #[test]
    fn test_capacity_decision() {
        assert_eq!(CapacityDecision::evaluate(25, 20), CapacityDecision::Accepted(20));
        assert_eq!(CapacityDecision::evaluate(25, 25), CapacityDecision::Accepted(25));
        assert_eq!(CapacityDecision::evaluate(25, 30), CapacityDecision::Shortfall(5));
        assert_eq!(CapacityDecision::evaluate(25, 30).as_signed(), -5);
        assert_eq!(i64::from(CapacityDecision::evaluate(0, 0)), 0);
        assert!(!CapacityDecision::Shortfall(1).is_accepted());
    }

    #[test]
    fn test_error_display() {
        let err = BalancerError::DuplicateIdentifier(ProviderId::from("1"));
        assert_eq!(err.to_string(), "provider 1 already exists");

        let err = BalancerError::CapacityExceeded { max: MAX_PROVIDERS };
        assert!(err.to_string().contains("10"));
    }
}
