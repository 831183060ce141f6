//! Provider load balancer library.
//!
//! Routes requests across a bounded pool of providers using round-robin or
//! random selection, while a background health checker probes every provider
//! and excludes failing ones. Dispatch and health checking share one lock,
//! so a selection never sees a probe pass half applied.

pub mod balancer;
pub mod config;
pub mod entropy;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod simulation;

pub use balancer::Balancer;
pub use config::BalancerConfig;
pub use load_balancer::{BalancerError, CapacityDecision, ProviderId, QueryPolicy};
