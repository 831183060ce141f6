//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! checker.rs:
//!     Periodic tick (tokio interval)
//!     → Take the pool lock
//!     → Probe every provider (provider.rs state machine)
//!     → Recompute eligible count
//!     → Report exclusions to sink.rs
//!     → Release the lock, wait for next tick or stop signal
//!
//! state.rs:
//!     Stopped ←→ Running
//! ```
//!
//! # Design Decisions
//! - One failed probe excludes a provider immediately
//! - Recovery requires consecutive good probes (hysteresis)
//! - The pass never awaits, so stopping cannot strand the lock

pub mod checker;
pub mod sink;
pub mod state;

pub use checker::{CycleReport, HealthChecker};
pub use sink::{ExclusionSink, NoopSink, RecordingSink, TracingSink};
pub use state::CheckerState;
