//! Effect instance lifecycle.

use serde::{Deserialize, Serialize};

/// Phase of a running primitive instance.
///
/// State transitions:
/// - one-shot: Waiting -> Completed
/// - timed hold: Waiting -> Active -> Completed
/// - periodic: Setup -> Ticking -> Completed
///
/// `Completed` is entered exactly once, whatever triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Polling the precondition on the retry cadence.
    Waiting,

    /// Timed hold: the action succeeded and the duration timer runs.
    Active,

    /// Periodic: trying to run the setup action.
    Setup,

    /// Periodic: setup done, re-asserting every interval.
    Ticking,

    Completed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed)
    }

    /// Has the instance taken effect (and therefore owes a revert)?
    pub fn is_engaged(self) -> bool {
        matches!(self, Phase::Active | Phase::Ticking)
    }
}

/// Why an instance reached `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// One-shot action succeeded.
    Applied,

    /// Deadline passed before the effect could be applied.
    TimedOut,

    /// Hold or tick duration elapsed naturally.
    Expired,

    /// Stopped out of band by the controller.
    Cancelled,

    /// A newer request in the same group took over.
    Superseded,

    /// A periodic tick failed under `TickFailure::Abort`.
    Aborted,

    /// A newer request in the same group was already active when this one
    /// became ready; it never ran its action.
    Stale,
}

impl Termination {
    pub fn is_success(self) -> bool {
        matches!(self, Termination::Applied | Termination::Expired)
    }
}

/// What asked an instance to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Stopped,
    Superseded,
}

impl From<CancelReason> for Termination {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Stopped => Termination::Cancelled,
            CancelReason::Superseded => Termination::Superseded,
        }
    }
}

/// Snapshot published by an instance on every phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectStatus {
    pub phase: Phase,
    pub termination: Option<Termination>,
    pub hook_ran: bool,
}

impl EffectStatus {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            termination: None,
            hook_ran: false,
        }
    }
}
