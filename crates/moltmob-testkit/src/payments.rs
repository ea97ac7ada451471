//! Scriptable payment backend
//!
//! Models the one property of real settlement rails that matters to the
//! ledger: a transfer can land even when the response is lost. Landed
//! transfers are keyed by the caller's `tx_id` idempotency key, so a retry
//! returns the original reference instead of moving money twice.

use async_trait::async_trait;
use moltmob_core::{MobError, Result};
use moltmob_ledger::{PaymentBackend, SettleOutcome, VerifyOutcome};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// What the next settle call should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleScript {
    /// Land the transfer and return its reference
    Succeed,
    /// Land the transfer but lose the response (transient error)
    SilentSuccess,
    /// Reject the transfer without landing it
    Reject,
    /// Fail transiently without landing the transfer
    FailTransient,
}

/// A payment backend driven by a script of settle behaviors
///
/// Settle calls pop scripts in order; an empty script means `Succeed`.
/// Verification outcomes are controlled by a single flag.
#[derive(Default)]
pub struct ScriptedBackend {
    reject_verifications: AtomicBool,
    scripts: Mutex<VecDeque<SettleScript>>,
    transfers: Mutex<HashMap<String, String>>,
    verify_calls: AtomicUsize,
    settle_calls: AtomicUsize,
}

impl ScriptedBackend {
    /// A backend that verifies and settles everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue behaviors for upcoming settle calls
    pub fn script(&self, behaviors: impl IntoIterator<Item = SettleScript>) {
        self.scripts.lock().extend(behaviors);
    }

    /// Make subsequent verifications fail
    pub fn reject_verifications(&self, reject: bool) {
        self.reject_verifications.store(reject, Ordering::SeqCst);
    }

    /// Transfers that actually landed, regardless of what the caller saw
    pub fn landed_transfers(&self) -> usize {
        self.transfers.lock().len()
    }

    /// Number of verify calls made
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Number of settle calls made
    pub fn settle_calls(&self) -> usize {
        self.settle_calls.load(Ordering::SeqCst)
    }

    fn land(&self, tx_id: &str) -> String {
        self.transfers
            .lock()
            .entry(tx_id.to_string())
            .or_insert_with(|| format!("ref-{tx_id}"))
            .clone()
    }
}

#[async_trait]
impl PaymentBackend for ScriptedBackend {
    async fn verify(
        &self,
        _authorization: &str,
        _payload: &str,
        _network: &str,
    ) -> Result<VerifyOutcome> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_verifications.load(Ordering::SeqCst) {
            Ok(VerifyOutcome {
                valid: false,
                error: Some("authorization rejected".into()),
            })
        } else {
            Ok(VerifyOutcome {
                valid: true,
                error: None,
            })
        }
    }

    async fn settle(
        &self,
        _authorization: &str,
        payload: &str,
        _network: &str,
    ) -> Result<SettleOutcome> {
        self.settle_calls.fetch_add(1, Ordering::SeqCst);
        let parsed: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| MobError::internal(format!("settle payload is not JSON: {e}")))?;
        let tx_id = parsed["tx_id"]
            .as_str()
            .ok_or_else(|| MobError::internal("settle payload missing tx_id"))?
            .to_string();

        // A transfer that already landed replays its original reference.
        if let Some(reference) = self.transfers.lock().get(&tx_id).cloned() {
            return Ok(SettleOutcome {
                success: true,
                external_reference: Some(reference),
                error: None,
            });
        }

        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or(SettleScript::Succeed);
        match script {
            SettleScript::Succeed => Ok(SettleOutcome {
                success: true,
                external_reference: Some(self.land(&tx_id)),
                error: None,
            }),
            SettleScript::SilentSuccess => {
                self.land(&tx_id);
                Err(MobError::transient("connection dropped mid-settlement"))
            }
            SettleScript::Reject => Ok(SettleOutcome {
                success: false,
                external_reference: None,
                error: Some("insufficient escrow balance".into()),
            }),
            SettleScript::FailTransient => Err(MobError::transient("backend unavailable")),
        }
    }
}
