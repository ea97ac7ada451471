//! In-memory pod and transaction stores

use async_trait::async_trait;
use moltmob_core::{
    Checkpoint, MobError, Player, PlayerId, Pod, PodId, Result, Transaction, TxId, TxStatus,
};
use moltmob_ledger::TransactionStore;
use moltmob_orchestrator::PodStore;
use moltmob_phase::{ControlEvent, PhaseEvent};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Pod persistence backed by hash maps
///
/// `update_pod` enforces the optimistic version guard the way a relational
/// row would: the write succeeds only when the caller saw the latest
/// version.
#[derive(Default)]
pub struct MemoryPodStore {
    pods: Mutex<HashMap<PodId, Pod>>,
    players: Mutex<HashMap<PodId, Vec<Player>>>,
    checkpoints: Mutex<HashMap<PodId, Checkpoint>>,
    phase_events: Mutex<Vec<PhaseEvent>>,
    control_events: Mutex<Vec<ControlEvent>>,
}

impl MemoryPodStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PodStore for MemoryPodStore {
    async fn insert_pod(&self, pod: Pod) -> Result<()> {
        self.pods.lock().insert(pod.id, pod);
        Ok(())
    }

    async fn get_pod(&self, id: PodId) -> Result<Option<Pod>> {
        Ok(self.pods.lock().get(&id).cloned())
    }

    async fn update_pod(&self, pod: Pod) -> Result<Pod> {
        let mut pods = self.pods.lock();
        let stored = pods
            .get_mut(&pod.id)
            .ok_or_else(|| MobError::not_found(format!("pod {}", pod.id)))?;
        if stored.version != pod.version {
            return Err(MobError::storage(format!(
                "stale write for pod {}: stored version {}, caller saw {}",
                pod.id, stored.version, pod.version
            )));
        }
        let mut updated = pod;
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn list_pods(&self) -> Result<Vec<PodId>> {
        let mut ids: Vec<(u64, PodId)> = self
            .pods
            .lock()
            .values()
            .map(|pod| (pod.seq, pod.id))
            .collect();
        ids.sort();
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn insert_player(&self, player: Player) -> Result<()> {
        self.players
            .lock()
            .entry(player.pod_id)
            .or_default()
            .push(player);
        Ok(())
    }

    async fn players(&self, pod_id: PodId) -> Result<Vec<Player>> {
        Ok(self.players.lock().get(&pod_id).cloned().unwrap_or_default())
    }

    async fn update_player(&self, player: Player) -> Result<()> {
        let mut players = self.players.lock();
        let pod_players = players
            .get_mut(&player.pod_id)
            .ok_or_else(|| MobError::not_found(format!("pod {}", player.pod_id)))?;
        let slot = pod_players
            .iter_mut()
            .find(|p| p.id == player.id)
            .ok_or_else(|| MobError::not_found(format!("player {}", player.id)))?;
        *slot = player;
        Ok(())
    }

    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>> {
        Ok(self
            .players
            .lock()
            .values()
            .flatten()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn get_checkpoint(&self, pod_id: PodId) -> Result<Option<Checkpoint>> {
        Ok(self.checkpoints.lock().get(&pod_id).cloned())
    }

    async fn put_checkpoint(&self, checkpoint: Checkpoint) -> Result<()> {
        self.checkpoints.lock().insert(checkpoint.pod_id, checkpoint);
        Ok(())
    }

    async fn record_phase_event(&self, event: PhaseEvent) -> Result<()> {
        self.phase_events.lock().push(event);
        Ok(())
    }

    async fn record_control_event(&self, event: ControlEvent) -> Result<()> {
        self.control_events.lock().push(event);
        Ok(())
    }

    async fn phase_events(&self, pod_id: PodId) -> Result<Vec<PhaseEvent>> {
        Ok(self
            .phase_events
            .lock()
            .iter()
            .filter(|e| e.pod_id == pod_id)
            .cloned()
            .collect())
    }

    async fn control_events(&self, pod_id: PodId) -> Result<Vec<ControlEvent>> {
        Ok(self
            .control_events
            .lock()
            .iter()
            .filter(|e| e.pod_id == pod_id)
            .cloned()
            .collect())
    }
}

/// Transaction persistence backed by a vector, append order preserved
#[derive(Default)]
pub struct MemoryTxStore {
    rows: Mutex<Vec<Transaction>>,
}

impl MemoryTxStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row, for test assertions
    pub fn all_rows(&self) -> Vec<Transaction> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl TransactionStore for MemoryTxStore {
    async fn append(&self, tx: Transaction) -> Result<()> {
        self.rows.lock().push(tx);
        Ok(())
    }

    async fn get(&self, id: TxId) -> Result<Option<Transaction>> {
        Ok(self.rows.lock().iter().find(|tx| tx.id == id).cloned())
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        let mut rows = self.rows.lock();
        let slot = rows
            .iter_mut()
            .find(|row| row.id == tx.id)
            .ok_or_else(|| MobError::not_found(format!("transaction {}", tx.id)))?;
        *slot = tx;
        Ok(())
    }

    async fn by_pod(&self, pod_id: PodId) -> Result<Vec<Transaction>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|tx| tx.pod_id == pod_id)
            .cloned()
            .collect())
    }

    async fn find_confirmed_by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|tx| {
                tx.status == TxStatus::Confirmed
                    && tx.external_reference.as_deref() == Some(reference)
            })
            .cloned())
    }
}
