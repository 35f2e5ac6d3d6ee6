// ── Idle gate ──
//
// Tracks whether the node is confirmed idle. Read and Write are only
// permitted while confirmed.

use serde::Serialize;
use strum::Display;
use tracing::{debug, warn};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
pub enum IdleState {
    #[default]
    #[strum(serialize = "not confirmed")]
    NotConfirmed,
    #[strum(serialize = "confirmed")]
    Confirmed,
}

/// Commands that change, or risk changing, the node's operating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StateChangingCommand {
    Connect,
    Reconnect,
    Disconnect,
    Probe,
    CyclePower,
    Sleep,
    StartSampling,
}

#[derive(Debug, Clone, Default)]
pub struct IdleGate {
    state: IdleState,
}

impl IdleGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> IdleState {
        self.state
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == IdleState::Confirmed
    }

    /// Fail fast unless confirmed.
    pub fn require_confirmed(&self) -> Result<(), CoreError> {
        if self.is_confirmed() {
            Ok(())
        } else {
            Err(CoreError::NotIdle)
        }
    }

    /// A successful read: operating-state code 0 confirms idle, anything
    /// else (including an absent code) revokes it.
    pub fn observe_read(&mut self, state_code: Option<i64>) {
        let next = if state_code == Some(0) {
            IdleState::Confirmed
        } else {
            IdleState::NotConfirmed
        };
        self.transition(next, "read");
    }

    pub fn observe_read_failed(&mut self) {
        self.transition(IdleState::NotConfirmed, "read failed");
    }

    pub fn observe_command(&mut self, command: StateChangingCommand) {
        let reason = command.to_string();
        self.transition(IdleState::NotConfirmed, &reason);
    }

    /// Outcome of an explicit set-to-idle. Pending counts as not confirmed.
    pub fn observe_idle_result(&mut self, idle_confirmed: bool) {
        let next = if idle_confirmed {
            IdleState::Confirmed
        } else {
            IdleState::NotConfirmed
        };
        self.transition(next, "set idle");
    }

    /// A stop sends the node an idle command; the gate follows the
    /// reported confirmation, so a pending stop revokes.
    pub fn observe_stop(&mut self, idle_confirmed: bool) {
        let next = if idle_confirmed {
            IdleState::Confirmed
        } else {
            IdleState::NotConfirmed
        };
        self.transition(next, "stop sampling");
    }

    /// A backend or transport failure of a command: the node's true state
    /// is now uncertain.
    pub fn observe_failure(&mut self, operation: &str) {
        if self.is_confirmed() {
            warn!(operation, "idle confirmation revoked after failure");
        }
        self.transition(IdleState::NotConfirmed, operation);
    }

    fn transition(&mut self, next: IdleState, reason: &str) {
        if self.state != next {
            debug!(from = %self.state, to = %next, reason, "idle gate transition");
        }
        self.state = next;
    }
}
