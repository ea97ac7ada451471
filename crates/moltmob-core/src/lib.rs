//! Core domain types for the Moltmob game-master orchestrator
//!
//! This crate holds the types shared by every other Moltmob crate: newtype
//! identifiers, the pod/player/transaction data model, the unified error
//! type, and game configuration. It carries no I/O and no crypto; those live
//! in the component crates layered on top.

pub mod config;
pub mod errors;
pub mod identifiers;
pub mod phase;
pub mod player;
pub mod pod;
pub mod transaction;

pub use config::{BoilPolicy, GameConfig, SettlementConfig};
pub use errors::{MobError, Result};
pub use identifiers::{MessageId, PlayerId, PodId, TxId};
pub use phase::{Phase, PodStatus, Role, Team};
pub use player::{EliminationCause, Player, PlayerStatus};
pub use pod::{Checkpoint, Pod};
pub use transaction::{Transaction, TxKind, TxStatus, WalletRef};
