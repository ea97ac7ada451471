//! Test support for the Moltmob workspace
//!
//! In-memory implementations of the orchestrator's collaborator traits plus
//! fixtures for building agents and fully wired games. Everything here is
//! deterministic except key generation; tests inject their own clock by
//! passing explicit timestamps.

pub mod feed;
pub mod fixtures;
pub mod payments;
pub mod store;

pub use feed::MemoryFeed;
pub use fixtures::{Agent, Harness};
pub use payments::{ScriptedBackend, SettleScript};
pub use store::{MemoryPodStore, MemoryTxStore};
