//! Player records
//!
//! A player is an agent's membership in exactly one pod. Elimination is
//! one-way: once `status` is `Eliminated` it never reverts, and the
//! `eliminated_by` / `eliminated_round` pair is set exactly once.

use crate::errors::{MobError, Result};
use crate::identifiers::{PlayerId, PodId};
use crate::phase::{Role, Team};
use crate::transaction::WalletRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alive/eliminated status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Still in the game
    Alive,
    /// Removed from the game; role is now public
    Eliminated,
}

/// What removed a player from the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationCause {
    /// The minority team's night action
    NightAction,
    /// A day-phase plurality vote
    Vote,
    /// Manual operator intervention
    Operator,
}

/// A participant's membership in one pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier
    pub id: PlayerId,
    /// The pod this player belongs to
    pub pod_id: PodId,
    /// Hex-encoded ed25519 verifying key of the agent's wallet
    pub agent_key: String,
    /// Wallet address for fee collection and payouts
    pub wallet: WalletRef,
    /// Secret role, dealt at game start
    ///
    /// Provisional (loyalist) until the deal when the lobby starts.
    pub role: Role,
    /// Alive or eliminated
    pub status: PlayerStatus,
    /// Set once on elimination
    pub eliminated_by: Option<EliminationCause>,
    /// Round in which the player was eliminated
    pub eliminated_round: Option<u32>,
    /// When the player joined the lobby
    pub joined_at: DateTime<Utc>,
}

impl Player {
    /// Create a new living player
    pub fn new(
        pod_id: PodId,
        agent_key: impl Into<String>,
        wallet: impl Into<WalletRef>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PlayerId::new(),
            pod_id,
            agent_key: agent_key.into(),
            wallet: wallet.into(),
            role,
            status: PlayerStatus::Alive,
            eliminated_by: None,
            eliminated_round: None,
            joined_at: now,
        }
    }

    /// The team this player is on
    pub fn team(&self) -> Team {
        self.role.team()
    }

    /// Whether the player is still in the game
    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    /// Eliminate the player
    ///
    /// Eliminating an already-eliminated player is an invariant violation.
    pub fn eliminate(&mut self, cause: EliminationCause, round: u32) -> Result<()> {
        if self.status == PlayerStatus::Eliminated {
            return Err(MobError::invariant(format!(
                "player {} is already eliminated",
                self.id
            )));
        }
        self.status = PlayerStatus::Eliminated;
        self.eliminated_by = Some(cause);
        self.eliminated_round = Some(round);
        Ok(())
    }

    /// Whether this player's role may appear in public narration
    ///
    /// Roles are revealed on death and never before.
    pub fn role_revealed(&self) -> bool {
        self.status == PlayerStatus::Eliminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn test_player() -> Player {
        Player::new(
            PodId::new(),
            "aa".repeat(32),
            "wallet-1",
            Role::Loyalist,
            Utc::now(),
        )
    }

    #[test]
    fn elimination_is_one_way() {
        let mut player = test_player();
        player.eliminate(EliminationCause::Vote, 2).unwrap();
        assert_eq!(player.eliminated_round, Some(2));
        assert_matches!(
            player.eliminate(EliminationCause::NightAction, 3),
            Err(MobError::Invariant { .. })
        );
        // The original cause survives the failed second attempt.
        assert_eq!(player.eliminated_by, Some(EliminationCause::Vote));
    }

    #[test]
    fn role_hidden_until_death() {
        let mut player = test_player();
        assert!(!player.role_revealed());
        player.eliminate(EliminationCause::NightAction, 1).unwrap();
        assert!(player.role_revealed());
    }
}
