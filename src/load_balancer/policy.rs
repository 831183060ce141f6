//! Dispatch policy selection.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Policy used to pick the provider for the next request.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum QueryPolicy {
    #[default]
    RoundRobin = 0,
    Random = 1,
}

impl QueryPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryPolicy::RoundRobin => "round_robin",
            QueryPolicy::Random => "random",
        }
    }

    /// The other policy.
    pub fn toggled(self) -> Self {
        match self {
            QueryPolicy::RoundRobin => QueryPolicy::Random,
            QueryPolicy::Random => QueryPolicy::RoundRobin,
        }
    }
}

impl From<u8> for QueryPolicy {
    fn from(val: u8) -> Self {
        match val {
            1 => QueryPolicy::Random,
            _ => QueryPolicy::RoundRobin,
        }
    }
}

impl fmt::Display for QueryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy stored as a single atomic byte, readable without the pool lock.
#[derive(Debug, Default)]
pub struct AtomicPolicy(AtomicU8);

impl AtomicPolicy {
    pub fn new(policy: QueryPolicy) -> Self {
        Self(AtomicU8::new(policy as u8))
    }

    pub fn load(&self) -> QueryPolicy {
        QueryPolicy::from(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, policy: QueryPolicy) {
        self.0.store(policy as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_policy_swap() {
        let policy = AtomicPolicy::default();
        assert_eq!(policy.load(), QueryPolicy::RoundRobin);
        policy.store(QueryPolicy::Random);
        assert_eq!(policy.load(), QueryPolicy::Random);
        policy.store(policy.load().toggled());
        assert_eq!(policy.load(), QueryPolicy::RoundRobin);
    }

    #[test]
    fn test_policy_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: QueryPolicy,
        }
        let parsed: Wrapper = toml::from_str("policy = \"random\"").unwrap();
        assert_eq!(parsed.policy, QueryPolicy::Random);
        assert_eq!(parsed.policy.to_string(), "random");
    }
}
