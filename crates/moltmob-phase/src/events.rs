//! Immutable audit events
//!
//! Phase transitions and operator control actions are logged as separate
//! event kinds so an auditor can distinguish timer-driven progression from
//! manual intervention at a glance.

use chrono::{DateTime, Utc};
use moltmob_core::{Phase, PodId};
use serde::{Deserialize, Serialize};

/// What triggered a phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// The phase deadline elapsed
    TimerElapsed,
    /// Every required night action arrived before the deadline
    AllActionsIn,
    /// The resolution engine's outcome (tally, win check, boil)
    Resolution,
    /// The lobby filled to quorum
    LobbyQuorum,
    /// A manual operator action; audited distinctly from timers
    Operator,
}

/// One recorded phase transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEvent {
    /// The pod that transitioned
    pub pod_id: PodId,
    /// Phase before the transition
    pub from: Phase,
    /// Phase after the transition
    pub to: Phase,
    /// Round in which the transition happened (after any round bump)
    pub round: u32,
    /// What triggered it
    pub reason: TransitionReason,
    /// When it happened
    pub at: DateTime<Utc>,
}

/// Operator control actions that change status rather than phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Deadline evaluation suspended
    Pause,
    /// Deadline evaluation resumed with the remaining time re-armed
    Resume,
    /// Lobby cancelled; entry fees refunded
    Cancel,
    /// Invariant violation froze the pod pending inspection
    Freeze,
}

/// One recorded control action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlEvent {
    /// The pod acted upon
    pub pod_id: PodId,
    /// The action taken
    pub action: ControlAction,
    /// Phase at the time; unchanged by the action
    pub phase: Phase,
    /// Round at the time; unchanged by the action
    pub round: u32,
    /// When it happened
    pub at: DateTime<Utc>,
}
