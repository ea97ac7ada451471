//! Action resolution and win-condition engine for Moltmob
//!
//! Pure logic: decrypted actions go in, eliminations, boil-meter movement,
//! and public-safe narration come out. No I/O, no clock reads, no crypto;
//! everything is deterministic given the inputs, which is what makes tick
//! replay after a crash safe.

pub mod actions;
pub mod engine;
pub mod narration;

pub use actions::{RoundActions, SubmittedAction, SubmittedVote};
pub use engine::{NightResolution, ResolutionEngine, VoteResolution};
