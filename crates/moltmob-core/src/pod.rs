//! Pod records and checkpoints
//!
//! A pod is one game instance. The orchestrator process is the only writer
//! of pod state; agents influence it exclusively through encrypted events on
//! the public feed.

use crate::identifiers::{MessageId, PodId};
use crate::phase::{Phase, PodStatus, Team};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One game instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    /// Pod identifier
    pub id: PodId,
    /// Monotonic sequence number assigned at creation
    pub seq: u64,
    /// Lifecycle status
    pub status: PodStatus,
    /// Current game phase
    pub phase: Phase,
    /// Current round, starting at 0 in the lobby
    pub round: u32,
    /// Escalation counter; non-decreasing until the round wraps
    pub boil_meter: u32,
    /// Buy-in amount in the smallest currency unit
    pub entry_fee: u64,
    /// Cached sum of confirmed entry fees
    ///
    /// The ledger's `compute_pot` is the source of truth; this field is
    /// refreshed from it after every confirmation and exists so narration
    /// and win checks never re-derive it from the player count.
    pub pot: u64,
    /// When the current phase times out
    pub phase_deadline: Option<DateTime<Utc>>,
    /// Wall-clock moment the pod was paused, if paused
    ///
    /// Resume re-arms `phase_deadline` with the remaining time captured
    /// here, so a pause does not eat into the phase budget.
    pub paused_at: Option<DateTime<Utc>>,
    /// Winning side, set exactly once when the game completes
    pub winning_side: Option<Team>,
    /// Set when an invariant violation froze the pod
    ///
    /// A frozen pod takes no further automatic transitions until an
    /// operator clears it.
    pub frozen: bool,
    /// Row version for optimistic per-pod locking in the store
    pub version: u64,
    /// When the pod was created
    pub created_at: DateTime<Utc>,
}

impl Pod {
    /// Create a new lobby pod
    pub fn new(seq: u64, entry_fee: u64, lobby_deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: PodId::new(),
            seq,
            status: PodStatus::Lobby,
            phase: Phase::Lobby,
            round: 0,
            boil_meter: 0,
            entry_fee,
            pot: 0,
            phase_deadline: Some(lobby_deadline),
            paused_at: None,
            winning_side: None,
            frozen: false,
            version: 0,
            created_at: now,
        }
    }

    /// Whether the pod permits any further mutation
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the tick loop should skip this pod
    pub fn is_inert(&self) -> bool {
        self.is_terminal() || self.status == PodStatus::Paused || self.frozen
    }

    /// Whether the phase deadline has elapsed at `now`
    ///
    /// Paused pods never report an elapsed deadline.
    pub fn deadline_elapsed(&self, now: DateTime<Utc>) -> bool {
        if self.status == PodStatus::Paused {
            return false;
        }
        match self.phase_deadline {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

/// Per-pod crash-recovery marker
///
/// Overwritten each tick. Read only by the recovery path: a stale
/// `in_flight_since` means a tick started but never finished, and the pod is
/// re-entered from `last_message` rather than skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The pod this checkpoint belongs to
    pub pod_id: PodId,
    /// Last feed message fully processed, if any
    pub last_message: Option<MessageId>,
    /// Bincode snapshot of the resolved per-round action state
    pub snapshot: Vec<u8>,
    /// Set while a tick is running; cleared when it checkpoints
    pub in_flight_since: Option<DateTime<Utc>>,
    /// When this checkpoint was last written
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// A fresh checkpoint for a new pod
    pub fn new(pod_id: PodId, now: DateTime<Utc>) -> Self {
        Self {
            pod_id,
            last_message: None,
            snapshot: Vec::new(),
            in_flight_since: None,
            updated_at: now,
        }
    }

    /// Whether a previous tick died mid-flight
    pub fn is_stale_in_flight(&self, now: DateTime<Utc>, stale_after_secs: i64) -> bool {
        match self.in_flight_since {
            Some(started) => (now - started).num_seconds() >= stale_after_secs,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn paused_pod_never_times_out() {
        let now = Utc::now();
        let mut pod = Pod::new(1, 100, now - Duration::seconds(10), now);
        assert!(pod.deadline_elapsed(now));
        pod.status = PodStatus::Paused;
        pod.paused_at = Some(now);
        assert!(!pod.deadline_elapsed(now));
    }

    #[test]
    fn stale_in_flight_detection() {
        let now = Utc::now();
        let mut cp = Checkpoint::new(PodId::new(), now);
        assert!(!cp.is_stale_in_flight(now, 60));
        cp.in_flight_since = Some(now - Duration::seconds(120));
        assert!(cp.is_stale_in_flight(now, 60));
        assert!(!cp.is_stale_in_flight(now, 300));
    }
}
