//! Accumulated per-round action state
//!
//! The orchestrator records decrypted actions here as it ingests feed
//! messages; the whole structure is the checkpoint snapshot, so a resumed
//! tick continues from exactly the actions already seen. Last-writer-wins
//! is applied at record time: a later submission from the same player
//! replaces the earlier one, which is logged and discarded.

use chrono::{DateTime, Utc};
use moltmob_core::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One night-action submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAction {
    /// The role-holder who submitted
    pub actor: PlayerId,
    /// The elimination target
    pub target: PlayerId,
    /// Feed timestamp of the submission
    pub at: DateTime<Utc>,
}

/// One vote submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedVote {
    /// The voter
    pub voter: PlayerId,
    /// The player voted against
    pub target: PlayerId,
    /// Feed timestamp of the submission
    pub at: DateTime<Utc>,
}

/// Everything submitted so far in the current round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundActions {
    /// Latest night action per actor
    pub night_actions: BTreeMap<PlayerId, SubmittedAction>,
    /// Latest vote per voter
    pub votes: BTreeMap<PlayerId, SubmittedVote>,
}

impl RoundActions {
    /// Record a night action; a later submission replaces an earlier one
    pub fn record_night_action(&mut self, action: SubmittedAction) {
        if let Some(previous) = self.night_actions.get(&action.actor) {
            if previous.at > action.at {
                warn!(
                    actor = %action.actor,
                    "discarding night action older than the one already recorded"
                );
                return;
            }
            warn!(
                actor = %action.actor,
                old_target = %previous.target,
                new_target = %action.target,
                "conflicting night actions; latest submission wins"
            );
        }
        self.night_actions.insert(action.actor, action);
    }

    /// Record a vote; a later submission replaces an earlier one
    pub fn record_vote(&mut self, vote: SubmittedVote) {
        if let Some(previous) = self.votes.get(&vote.voter) {
            if previous.at > vote.at {
                warn!(voter = %vote.voter, "discarding vote older than the one already recorded");
                return;
            }
            warn!(
                voter = %vote.voter,
                old_target = %previous.target,
                new_target = %vote.target,
                "vote changed; latest submission wins"
            );
        }
        self.votes.insert(vote.voter, vote);
    }

    /// Clear everything for a new round
    pub fn reset(&mut self) {
        self.night_actions.clear();
        self.votes.clear();
    }

    /// Actors who have submitted a night action
    pub fn night_actors(&self) -> impl Iterator<Item = &PlayerId> {
        self.night_actions.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn later_night_action_replaces_earlier() {
        let now = Utc::now();
        let actor = PlayerId::new();
        let first_target = PlayerId::new();
        let second_target = PlayerId::new();

        let mut actions = RoundActions::default();
        actions.record_night_action(SubmittedAction {
            actor,
            target: first_target,
            at: now,
        });
        actions.record_night_action(SubmittedAction {
            actor,
            target: second_target,
            at: now + Duration::seconds(5),
        });

        assert_eq!(actions.night_actions[&actor].target, second_target);
    }

    #[test]
    fn stale_replay_does_not_clobber_newer_action() {
        let now = Utc::now();
        let actor = PlayerId::new();
        let newer = PlayerId::new();
        let older = PlayerId::new();

        let mut actions = RoundActions::default();
        actions.record_night_action(SubmittedAction {
            actor,
            target: newer,
            at: now,
        });
        // A replayed older message must not win.
        actions.record_night_action(SubmittedAction {
            actor,
            target: older,
            at: now - Duration::seconds(30),
        });

        assert_eq!(actions.night_actions[&actor].target, newer);
    }

    #[test]
    fn one_latest_vote_per_voter() {
        let now = Utc::now();
        let voter = PlayerId::new();
        let a = PlayerId::new();
        let b = PlayerId::new();

        let mut actions = RoundActions::default();
        actions.record_vote(SubmittedVote {
            voter,
            target: a,
            at: now,
        });
        actions.record_vote(SubmittedVote {
            voter,
            target: b,
            at: now + Duration::seconds(1),
        });

        assert_eq!(actions.votes.len(), 1);
        assert_eq!(actions.votes[&voter].target, b);
    }
}
