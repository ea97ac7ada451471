//! Pod phase state machine for Moltmob
//!
//! Enforces the forward-only cycle `lobby -> night -> day -> vote ->
//! (night | boil | completed)`, logs every transition as an immutable event
//! with its trigger, and handles pause/resume without disturbing phase or
//! round. Deadline evaluation is pure: the caller injects `now`.

pub mod events;
pub mod machine;

pub use events::{ControlAction, ControlEvent, PhaseEvent, TransitionReason};
pub use machine::{is_legal_transition, PhaseMachine};
