//! Health checker lifecycle state.
//!
//! ```text
//! Stopped ──start()──▶ Running ──stop()──▶ Stopped
//! ```
//! A stopped checker can be started again; each start spawns a fresh loop.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckerState {
    #[default]
    Stopped,
    Running,
}

impl fmt::Display for CheckerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckerState::Stopped => f.write_str("stopped"),
            CheckerState::Running => f.write_str("running"),
        }
    }
}
