//! Transaction persistence interface
//!
//! The relational store is the sole shared mutable resource. Implementations
//! must enforce a uniqueness constraint on `external_reference` among
//! confirmed rows, which is what makes concurrent confirm retries safe.

use async_trait::async_trait;
use moltmob_core::{PodId, Result, Transaction, TxId};

/// Persistence for ledger rows
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Append a new row
    async fn append(&self, tx: Transaction) -> Result<()>;

    /// Load a row by id
    async fn get(&self, id: TxId) -> Result<Option<Transaction>>;

    /// Overwrite an existing row
    async fn update(&self, tx: Transaction) -> Result<()>;

    /// All rows for one pod, in append order
    async fn by_pod(&self, pod_id: PodId) -> Result<Vec<Transaction>>;

    /// The confirmed row holding this settlement reference, if any
    async fn find_confirmed_by_reference(&self, reference: &str) -> Result<Option<Transaction>>;
}
