//! Pod persistence collaborator
//!
//! Pods, players, checkpoints, and the audit log live behind this trait.
//! `update_pod` carries an optimistic version guard: the write succeeds only
//! when the caller's `version` matches the stored row, so two orchestrator
//! processes can never both apply a tick to the same pod.

use async_trait::async_trait;
use moltmob_core::{Checkpoint, Player, PlayerId, Pod, PodId, Result};
use moltmob_phase::{ControlEvent, PhaseEvent};

/// Persistence for pods and their audit trail
#[async_trait]
pub trait PodStore: Send + Sync {
    /// Insert a newly created pod
    async fn insert_pod(&self, pod: Pod) -> Result<()>;

    /// Load a pod by id
    async fn get_pod(&self, id: PodId) -> Result<Option<Pod>>;

    /// Write a pod back, guarded by its version
    ///
    /// Fails with a storage error when the stored version differs from
    /// `pod.version`; on success the stored version is bumped.
    async fn update_pod(&self, pod: Pod) -> Result<Pod>;

    /// Every pod id known to the store
    async fn list_pods(&self) -> Result<Vec<PodId>>;

    /// Insert a player joining a pod
    async fn insert_player(&self, player: Player) -> Result<()>;

    /// All players of a pod, in join order
    async fn players(&self, pod_id: PodId) -> Result<Vec<Player>>;

    /// Write a player back (role deal, elimination)
    async fn update_player(&self, player: Player) -> Result<()>;

    /// Load one player
    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>>;

    /// The pod's recovery checkpoint, if one was ever written
    async fn get_checkpoint(&self, pod_id: PodId) -> Result<Option<Checkpoint>>;

    /// Overwrite the pod's checkpoint
    async fn put_checkpoint(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Append a phase transition to the audit log
    async fn record_phase_event(&self, event: PhaseEvent) -> Result<()>;

    /// Append an operator control action to the audit log
    async fn record_control_event(&self, event: ControlEvent) -> Result<()>;

    /// The pod's phase transitions, in order
    async fn phase_events(&self, pod_id: PodId) -> Result<Vec<PhaseEvent>>;

    /// The pod's control actions, in order
    async fn control_events(&self, pod_id: PodId) -> Result<Vec<ControlEvent>>;
}
