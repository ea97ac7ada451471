//! Ledger transaction records
//!
//! Transactions are append-only: a row is mutable only while `Pending`, and
//! the `pending -> confirmed | failed` transition is one-way. Resumability
//! after an ambiguous settlement result is a property of this persisted
//! state machine, not of any in-memory retry loop.

use crate::errors::{MobError, Result};
use crate::identifiers::{PodId, TxId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a ledger row moves money for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// A player's buy-in
    EntryFee,
    /// A winner's share of the pot
    PayoutWinner,
    /// Refund of an entry fee (cancelled lobby or operator reconciliation)
    PayoutRefund,
    /// The platform's cut
    Rake,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EntryFee => "entry_fee",
            Self::PayoutWinner => "payout_winner",
            Self::PayoutRefund => "payout_refund",
            Self::Rake => "rake",
        };
        write!(f, "{s}")
    }
}

/// Settlement status of a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Recorded but not yet settled against the payment backend
    Pending,
    /// Settled; immutable
    Confirmed,
    /// Settlement abandoned; immutable
    Failed,
}

/// An external wallet reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletRef(pub String);

impl WalletRef {
    /// Create a wallet reference
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Get the inner address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WalletRef {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

impl From<String> for WalletRef {
    fn from(addr: String) -> Self {
        Self(addr)
    }
}

/// One append-only ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier; retries reuse it
    pub id: TxId,
    /// The pod this row belongs to
    pub pod_id: PodId,
    /// What the row moves money for
    pub kind: TxKind,
    /// Amount in the smallest currency unit
    pub amount: u64,
    /// Source wallet
    pub from_wallet: WalletRef,
    /// Destination wallet
    pub to_wallet: WalletRef,
    /// Settlement status
    pub status: TxStatus,
    /// Settlement proof from the payment backend, set on confirmation
    pub external_reference: Option<String>,
    /// Round the row was recorded in
    pub round: u32,
    /// Settlement attempts made so far
    pub attempts: u32,
    /// Reason recorded when the row failed
    pub failure_reason: Option<String>,
    /// When the row was appended
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Append a new pending row
    pub fn pending(
        pod_id: PodId,
        kind: TxKind,
        amount: u64,
        from_wallet: WalletRef,
        to_wallet: WalletRef,
        round: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TxId::new(),
            pod_id,
            kind,
            amount,
            from_wallet,
            to_wallet,
            status: TxStatus::Pending,
            external_reference: None,
            round,
            attempts: 0,
            failure_reason: None,
            created_at: now,
        }
    }

    /// Whether the row can still change
    pub fn is_settled(&self) -> bool {
        matches!(self.status, TxStatus::Confirmed | TxStatus::Failed)
    }

    /// Transition `pending -> confirmed`
    ///
    /// Confirming an already-confirmed row is a no-op so that retries after
    /// an ambiguous network result are safe. Confirming a failed row is an
    /// invariant violation.
    pub fn confirm(&mut self, external_reference: impl Into<String>) -> Result<()> {
        match self.status {
            TxStatus::Pending => {
                self.status = TxStatus::Confirmed;
                self.external_reference = Some(external_reference.into());
                Ok(())
            }
            TxStatus::Confirmed => Ok(()),
            TxStatus::Failed => Err(MobError::invariant(format!(
                "cannot confirm failed transaction {}",
                self.id
            ))),
        }
    }

    /// Transition `pending -> failed`; terminal
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        match self.status {
            TxStatus::Pending => {
                self.status = TxStatus::Failed;
                self.failure_reason = Some(reason.into());
                Ok(())
            }
            TxStatus::Failed => Ok(()),
            TxStatus::Confirmed => Err(MobError::invariant(format!(
                "cannot fail confirmed transaction {}",
                self.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn pending_tx() -> Transaction {
        Transaction::pending(
            PodId::new(),
            TxKind::EntryFee,
            100,
            WalletRef::from("agent-wallet"),
            WalletRef::from("escrow"),
            0,
            Utc::now(),
        )
    }

    #[test]
    fn confirm_is_idempotent() {
        let mut tx = pending_tx();
        tx.confirm("sig-1").unwrap();
        tx.confirm("sig-2").unwrap();
        // The first reference wins; the retry is a no-op.
        assert_eq!(tx.external_reference.as_deref(), Some("sig-1"));
        assert_eq!(tx.status, TxStatus::Confirmed);
    }

    #[test]
    fn settled_rows_are_immutable() {
        let mut tx = pending_tx();
        tx.fail("backend rejected").unwrap();
        assert_matches!(tx.confirm("sig"), Err(MobError::Invariant { .. }));

        let mut tx = pending_tx();
        tx.confirm("sig").unwrap();
        assert_matches!(tx.fail("oops"), Err(MobError::Invariant { .. }));
    }
}
