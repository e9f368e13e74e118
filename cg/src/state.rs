//! Operation state shared by the upload and analysis clients
//!
//! `idle -> in_progress -> {success, error}`. Both outcomes are terminal for
//! one invocation; a new invocation re-enters `in_progress` from any state
//! except `in_progress` itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpState {
    #[default]
    Idle,
    InProgress,
    Success,
    Error,
}

impl OpState {
    pub fn is_terminal(self) -> bool {
        matches!(self, OpState::Success | OpState::Error)
    }

    pub fn is_in_progress(self) -> bool {
        self == OpState::InProgress
    }

    /// Enter `in_progress` for a fresh invocation
    pub(crate) fn begin(&mut self) {
        debug!(from = %self, "OpState::begin");
        *self = OpState::InProgress;
    }

    /// Settle the current invocation
    pub(crate) fn settle(&mut self, success: bool) {
        let next = if success { OpState::Success } else { OpState::Error };
        debug!(from = %self, to = %next, "OpState::settle");
        *self = next;
    }
}

impl fmt::Display for OpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpState::Idle => "idle",
            OpState::InProgress => "in_progress",
            OpState::Success => "success",
            OpState::Error => "error",
        };
        f.write_str(s)
    }
}
