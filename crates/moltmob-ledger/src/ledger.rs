//! The escrow ledger
//!
//! All money movement goes through here. Rows are appended `Pending`,
//! settled against the payment backend under a bounded timeout, and
//! confirmed with the backend's settlement proof. An ambiguous result (a
//! timeout that may have landed) leaves the row pending; the next tick
//! retries with the same transaction id, so the backend's idempotency
//! handling returns the original proof instead of paying twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moltmob_core::{
    MobError, PodId, Result, SettlementConfig, Transaction, TxId, TxKind, TxStatus, WalletRef,
};
use tracing::{debug, info, warn};

use crate::backend::{PaymentBackend, VerifyOutcome};
use crate::payout::{rake_amount, split_pot};
use crate::store::TransactionStore;

/// Ledger wiring: wallets, network, and settlement behavior
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// The escrow wallet holding collected entry fees
    pub escrow_wallet: WalletRef,
    /// Destination for the platform's rake
    pub rake_wallet: WalletRef,
    /// Settlement network identifier passed to the backend
    pub network: String,
    /// Authorization material for escrow transfers
    pub authorization: String,
    /// Timeout and retry ceiling
    pub settlement: SettlementConfig,
}

/// What one settlement pass accomplished
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Rows confirmed during this pass
    pub confirmed: Vec<TxId>,
    /// Rows still pending (ambiguous or transient backend results)
    pub still_pending: Vec<TxId>,
    /// Rows that exhausted their retry ceiling this pass
    pub failed: Vec<TxId>,
}

impl SettlementReport {
    /// Whether every row reached a terminal status
    pub fn fully_resolved(&self) -> bool {
        self.still_pending.is_empty()
    }
}

/// Append-only transaction ledger with exactly-once settlement
pub struct Ledger {
    store: Arc<dyn TransactionStore>,
    backend: Arc<dyn PaymentBackend>,
    config: LedgerConfig,
}

impl Ledger {
    /// Create a ledger over a transaction store and payment backend
    pub fn new(
        store: Arc<dyn TransactionStore>,
        backend: Arc<dyn PaymentBackend>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            backend,
            config,
        }
    }

    /// Append a pending row; always succeeds if the pod exists
    pub async fn record_pending(
        &self,
        pod_id: PodId,
        kind: TxKind,
        amount: u64,
        from: WalletRef,
        to: WalletRef,
        round: u32,
        now: DateTime<Utc>,
    ) -> Result<TxId> {
        let tx = Transaction::pending(pod_id, kind, amount, from, to, round, now);
        let id = tx.id;
        debug!(%id, %kind, amount, round, "recording pending transaction");
        self.store.append(tx).await?;
        Ok(id)
    }

    /// Transition `pending -> confirmed`
    ///
    /// Confirming an already-confirmed row is a no-op returning the existing
    /// row. A reference already held by a *different* confirmed row is an
    /// invariant violation (the uniqueness constraint caught a double
    /// credit).
    pub async fn confirm(&self, id: TxId, reference: &str) -> Result<Transaction> {
        let mut tx = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| MobError::not_found(format!("transaction {id}")))?;

        if tx.status == TxStatus::Confirmed {
            return Ok(tx);
        }

        if let Some(existing) = self.store.find_confirmed_by_reference(reference).await? {
            if existing.id != id {
                return Err(MobError::invariant(format!(
                    "settlement reference {reference} already confirmed as {}",
                    existing.id
                )));
            }
        }

        tx.confirm(reference)?;
        self.store.update(tx.clone()).await?;
        info!(%id, reference, "transaction confirmed");
        Ok(tx)
    }

    /// Transition `pending -> failed`; terminal
    pub async fn fail(&self, id: TxId, reason: &str) -> Result<Transaction> {
        let mut tx = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| MobError::not_found(format!("transaction {id}")))?;
        tx.fail(reason)?;
        self.store.update(tx.clone()).await?;
        warn!(%id, reason, "transaction failed");
        Ok(tx)
    }

    /// Sum of confirmed entry fees - the only source of truth for pot size
    pub async fn compute_pot(&self, pod_id: PodId) -> Result<u64> {
        let rows = self.store.by_pod(pod_id).await?;
        Ok(rows
            .iter()
            .filter(|tx| tx.kind == TxKind::EntryFee && tx.status == TxStatus::Confirmed)
            .map(|tx| tx.amount)
            .sum())
    }

    /// Verify an entry-fee authorization with the backend, without settling
    pub async fn verify_entry_fee(
        &self,
        authorization: &str,
        wallet: &WalletRef,
        amount: u64,
    ) -> Result<VerifyOutcome> {
        let payload = serde_json::json!({
            "wallet": wallet.as_str(),
            "amount": amount,
        })
        .to_string();
        self.backend
            .verify(authorization, &payload, &self.config.network)
            .await
    }

    /// Whether winner payout or rake rows exist for the pod
    ///
    /// Outbound rows imply a decided game, which is how a crash between
    /// recording payouts and the completing phase transition is healed.
    pub async fn has_outbound(&self, pod_id: PodId) -> Result<bool> {
        let rows = self.store.by_pod(pod_id).await?;
        Ok(rows
            .iter()
            .any(|tx| matches!(tx.kind, TxKind::PayoutWinner | TxKind::Rake)))
    }

    /// Verify and collect one entry fee
    ///
    /// Returns `None` when the backend rejects the authorization or when the
    /// same authorization was already credited, so a replayed join cannot
    /// grow the pot twice.
    pub async fn collect_entry_fee(
        &self,
        pod_id: PodId,
        wallet: &WalletRef,
        amount: u64,
        authorization: &str,
        round: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<TxId>> {
        let outcome = self.verify_entry_fee(authorization, wallet, amount).await?;
        if !outcome.valid {
            warn!(%pod_id, wallet = %wallet, error = ?outcome.error, "entry fee rejected");
            return Ok(None);
        }
        if self
            .store
            .find_confirmed_by_reference(authorization)
            .await?
            .is_some()
        {
            warn!(%pod_id, wallet = %wallet, "entry fee authorization already credited");
            return Ok(None);
        }

        let id = self
            .record_pending(
                pod_id,
                TxKind::EntryFee,
                amount,
                wallet.clone(),
                self.config.escrow_wallet.clone(),
                round,
                now,
            )
            .await?;
        // The authorization doubles as the settlement reference.
        self.confirm(id, authorization).await?;
        Ok(Some(id))
    }

    /// Record winner payouts plus the rake row, then attempt settlement
    ///
    /// Idempotent across ticks: if outbound rows for this pod already exist
    /// they are reused, so calling this again after a crash or an ambiguous
    /// backend result never creates duplicate rows. Winners are sorted for
    /// deterministic largest-remainder assignment.
    pub async fn settle_payouts(
        &self,
        pod_id: PodId,
        winners: &[WalletRef],
        rake_bps: u16,
        round: u32,
        now: DateTime<Utc>,
    ) -> Result<SettlementReport> {
        if !self.has_outbound(pod_id).await? {
            let pot = self.compute_pot(pod_id).await?;
            let rake = rake_amount(pot, rake_bps);
            let net = pot - rake;

            let mut ordered: Vec<WalletRef> = winners.to_vec();
            ordered.sort();
            let shares = split_pot(net, ordered.len());

            info!(%pod_id, pot, rake, winners = ordered.len(), "recording payouts");
            for (wallet, share) in ordered.iter().zip(shares) {
                self.record_pending(
                    pod_id,
                    TxKind::PayoutWinner,
                    share,
                    self.config.escrow_wallet.clone(),
                    wallet.clone(),
                    round,
                    now,
                )
                .await?;
            }
            self.record_pending(
                pod_id,
                TxKind::Rake,
                rake,
                self.config.escrow_wallet.clone(),
                self.config.rake_wallet.clone(),
                round,
                now,
            )
            .await?;
        }

        self.settle_pending(pod_id).await
    }

    /// Record refund rows for every confirmed entry fee
    ///
    /// Used when a lobby cancels. Idempotent: refunds are only created once.
    pub async fn record_refunds(
        &self,
        pod_id: PodId,
        round: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<TxId>> {
        let rows = self.store.by_pod(pod_id).await?;
        if rows.iter().any(|tx| tx.kind == TxKind::PayoutRefund) {
            return Ok(rows
                .iter()
                .filter(|tx| tx.kind == TxKind::PayoutRefund)
                .map(|tx| tx.id)
                .collect());
        }

        let mut refund_ids = Vec::new();
        for fee in rows
            .iter()
            .filter(|tx| tx.kind == TxKind::EntryFee && tx.status == TxStatus::Confirmed)
        {
            let id = self
                .record_pending(
                    pod_id,
                    TxKind::PayoutRefund,
                    fee.amount,
                    self.config.escrow_wallet.clone(),
                    fee.from_wallet.clone(),
                    round,
                    now,
                )
                .await?;
            refund_ids.push(id);
        }
        info!(%pod_id, refunds = refund_ids.len(), "recorded refunds");
        Ok(refund_ids)
    }

    /// Drive every pending outbound row one settlement attempt forward
    pub async fn settle_pending(&self, pod_id: PodId) -> Result<SettlementReport> {
        let mut report = SettlementReport::default();
        let rows = self.store.by_pod(pod_id).await?;

        for tx in rows.into_iter().filter(|tx| {
            tx.status == TxStatus::Pending
                && matches!(
                    tx.kind,
                    TxKind::PayoutWinner | TxKind::PayoutRefund | TxKind::Rake
                )
        }) {
            match self.settle_row(tx).await? {
                RowOutcome::Confirmed(id) => report.confirmed.push(id),
                RowOutcome::StillPending(id) => report.still_pending.push(id),
                RowOutcome::Failed(id) => report.failed.push(id),
            }
        }
        Ok(report)
    }

    /// Whether every outbound row for the pod is confirmed or failed
    ///
    /// A pod may not advance to completed until this holds.
    pub async fn all_payouts_resolved(&self, pod_id: PodId) -> Result<bool> {
        let rows = self.store.by_pod(pod_id).await?;
        Ok(rows.iter().all(|tx| {
            tx.kind == TxKind::EntryFee || tx.status != TxStatus::Pending
        }))
    }

    /// Rows whose settlement was abandoned, for incident narration
    pub async fn failed_payouts(&self, pod_id: PodId) -> Result<Vec<Transaction>> {
        let rows = self.store.by_pod(pod_id).await?;
        Ok(rows
            .into_iter()
            .filter(|tx| tx.kind != TxKind::EntryFee && tx.status == TxStatus::Failed)
            .collect())
    }

    async fn settle_row(&self, mut tx: Transaction) -> Result<RowOutcome> {
        let id = tx.id;

        // Zero-amount rows (e.g. a zero rake) need no backend transfer.
        if tx.amount == 0 {
            tx.confirm(format!("zero:{id}"))?;
            self.store.update(tx).await?;
            return Ok(RowOutcome::Confirmed(id));
        }

        tx.attempts += 1;
        let payload = serde_json::json!({
            // The ledger row id doubles as the backend idempotency key.
            "tx_id": id.to_string(),
            "from": tx.from_wallet.as_str(),
            "to": tx.to_wallet.as_str(),
            "amount": tx.amount,
        })
        .to_string();

        let call = self
            .backend
            .settle(&self.config.authorization, &payload, &self.config.network);
        let outcome = match tokio::time::timeout(
            Duration::from_millis(self.config.settlement.timeout_ms),
            call,
        )
        .await
        {
            Err(_) => {
                warn!(%id, attempts = tx.attempts, "settlement timed out; result ambiguous");
                return self.park_or_fail(tx, "settlement timeout").await;
            }
            Ok(Err(err)) if err.is_transient() => {
                warn!(%id, attempts = tx.attempts, %err, "transient settlement failure");
                return self.park_or_fail(tx, "transient backend failure").await;
            }
            Ok(Err(err)) => return Err(err),
            Ok(Ok(outcome)) => outcome,
        };

        if outcome.success {
            let reference = outcome.external_reference.ok_or_else(|| {
                MobError::internal(format!("backend confirmed {id} without a reference"))
            })?;
            if let Some(existing) = self.store.find_confirmed_by_reference(&reference).await? {
                if existing.id != id {
                    return Err(MobError::invariant(format!(
                        "settlement reference {reference} already confirmed as {}",
                        existing.id
                    )));
                }
            }
            tx.confirm(&reference)?;
            self.store.update(tx).await?;
            info!(%id, reference, "settlement confirmed");
            Ok(RowOutcome::Confirmed(id))
        } else {
            let detail = outcome.error.unwrap_or_else(|| "backend rejected".into());
            warn!(%id, attempts = tx.attempts, detail, "settlement rejected");
            self.park_or_fail(tx, &detail).await
        }
    }

    /// Keep a row pending for the next tick, or fail it at the retry ceiling
    async fn park_or_fail(&self, mut tx: Transaction, detail: &str) -> Result<RowOutcome> {
        let id = tx.id;
        if tx.attempts >= self.config.settlement.max_attempts {
            tx.fail(format!(
                "retries exhausted after {} attempts: {detail}",
                tx.attempts
            ))?;
            self.store.update(tx).await?;
            warn!(%id, "settlement abandoned");
            Ok(RowOutcome::Failed(id))
        } else {
            self.store.update(tx).await?;
            Ok(RowOutcome::StillPending(id))
        }
    }
}

enum RowOutcome {
    Confirmed(TxId),
    StillPending(TxId),
    Failed(TxId),
}
