//! Payment backend interface
//!
//! The concrete blockchain is pluggable; the ledger only needs "verify
//! payment" and "submit transfer". Outcomes are data, not exceptions, so the
//! caller can distinguish a definite rejection from an ambiguous failure.

use async_trait::async_trait;
use moltmob_core::Result;
use serde::{Deserialize, Serialize};

/// Result of verifying a payment authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    /// Whether the authorization is valid and covers the amount
    pub valid: bool,
    /// Backend-provided rejection detail
    pub error: Option<String>,
}

/// Result of submitting a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleOutcome {
    /// Whether the transfer landed
    pub success: bool,
    /// Settlement proof (e.g. a transaction signature) on success
    pub external_reference: Option<String>,
    /// Backend-provided failure detail
    pub error: Option<String>,
}

/// External settlement collaborator
///
/// Calls may hang; the ledger bounds them with a timeout and treats the
/// elapsed case as ambiguous (the transfer may have landed anyway). The
/// settle payload carries the ledger transaction id as an idempotency key so
/// a retried submission returns the original reference instead of paying
/// twice.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    /// Verify a payment authorization without moving money
    async fn verify(&self, authorization: &str, payload: &str, network: &str)
        -> Result<VerifyOutcome>;

    /// Submit a transfer
    async fn settle(&self, authorization: &str, payload: &str, network: &str)
        -> Result<SettleOutcome>;
}
