//! Tick-driven GM orchestrator for Moltmob
//!
//! The orchestrator is the single writer of game state. It reads encrypted
//! agent events from a public feed, resolves phases on a logical tick, moves
//! money through the escrow ledger, and checkpoints after every tick so a
//! crashed process resumes exactly where it died.
//!
//! External systems are collaborator traits: [`Feed`] for the public feed,
//! [`PodStore`] for persistence, and the ledger's payment backend for
//! settlement. Production adapters and in-memory test doubles implement the
//! same traits.

pub mod feed;
pub mod orchestrator;
pub mod store;

pub use feed::{Feed, FeedPost};
pub use orchestrator::Orchestrator;
pub use store::PodStore;
