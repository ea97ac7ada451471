//! Escrow ledger and idempotent settlement for Moltmob
//!
//! Records money movement as append-only transaction rows and settles them
//! against an external payment backend that is not transactional from this
//! system's point of view: it can time out after actually succeeding. Every
//! retry reuses the same transaction id as its idempotency key, so the
//! backend result can be ambiguous without ever double-paying.
//!
//! Retry is a property of persisted state (`pending -> confirmed | failed`),
//! not of in-memory control flow; a crashed tick resumes settlement simply
//! by reading pending rows.

pub mod backend;
pub mod ledger;
pub mod payout;
pub mod store;

pub use backend::{PaymentBackend, SettleOutcome, VerifyOutcome};
pub use ledger::{Ledger, LedgerConfig, SettlementReport};
pub use payout::split_pot;
pub use store::TransactionStore;
