//! Night, vote, and win-condition resolution
//!
//! The engine turns a round's recorded actions into eliminations and
//! boil-meter movement. Eliminations are applied to the player set in
//! place; every outcome carries a public-safe narration string.

use moltmob_core::{BoilPolicy, EliminationCause, MobError, Player, PlayerId, Result, Team};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::actions::RoundActions;
use crate::narration;

/// Outcome of one night's resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightResolution {
    /// Player eliminated by the minority action, if any
    pub eliminated: Option<PlayerId>,
    /// How much the boil meter moved
    pub boil_increment: u32,
    /// Public narration with reveal-on-death applied
    pub narration: String,
}

/// Outcome of one vote tally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteResolution {
    /// Player eliminated by strict plurality, if any
    pub eliminated: Option<PlayerId>,
    /// Whether the tally ended in an exact tie
    pub tied: bool,
    /// How much the boil meter moved
    pub boil_increment: u32,
    /// Public narration with reveal-on-death applied
    pub narration: String,
}

/// Deterministic resolution over a pod's player set
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    boil: BoilPolicy,
}

/// Whether a player counts as living for a resolution of `round`
///
/// A replayed resolution can find its own elimination already persisted; a
/// player removed by this same cause in this same round still counts as
/// living, so the rerun tallies exactly what the first run did.
fn living_for(players: &[Player], id: PlayerId, cause: EliminationCause, round: u32) -> bool {
    players.iter().any(|p| {
        p.id == id
            && (p.is_alive()
                || (p.eliminated_by == Some(cause) && p.eliminated_round == Some(round)))
    })
}

impl ResolutionEngine {
    /// Create an engine with the given boil policy
    pub fn new(boil: BoilPolicy) -> Self {
        Self { boil }
    }

    /// The configured boil policy
    pub fn boil_policy(&self) -> &BoilPolicy {
        &self.boil
    }

    /// Resolve the night: apply the minority team's designated action
    ///
    /// Among actions submitted by living minority role-holders, the latest
    /// by feed timestamp is the team's designated action. Absent actions
    /// resolve to "no action" and move the boil meter instead.
    pub fn resolve_night(
        &self,
        players: &mut [Player],
        actions: &RoundActions,
        round: u32,
    ) -> Result<NightResolution> {
        let designated = actions
            .night_actions
            .values()
            .filter(|action| {
                players
                    .iter()
                    .any(|p| p.id == action.actor && p.team() == Team::Moltbreaker)
                    && living_for(players, action.actor, EliminationCause::NightAction, round)
            })
            .max_by_key(|action| (action.at, action.actor));

        let Some(action) = designated else {
            debug!(round, "night passed without a designated action");
            return Ok(NightResolution {
                eliminated: None,
                boil_increment: self.boil.on_quiet_night,
                narration: narration::quiet_night(round),
            });
        };

        // The target is agent-supplied: an unknown or already-dead target
        // wastes the action rather than aborting the resolution.
        let Some(target) = players.iter_mut().find(|p| p.id == action.target) else {
            warn!(target = %action.target, round, "night action targets an unknown player; wasted");
            return Ok(NightResolution {
                eliminated: None,
                boil_increment: self.boil.on_quiet_night,
                narration: narration::quiet_night(round),
            });
        };
        if !target.is_alive() {
            if target.eliminated_by == Some(EliminationCause::NightAction)
                && target.eliminated_round == Some(round)
            {
                // Replay of a resolution whose elimination already landed.
                let text = narration::night_elimination(target, round);
                return Ok(NightResolution {
                    eliminated: Some(action.target),
                    boil_increment: 0,
                    narration: text,
                });
            }
            warn!(target = %action.target, round, "night action targets an eliminated player; wasted");
            return Ok(NightResolution {
                eliminated: None,
                boil_increment: self.boil.on_quiet_night,
                narration: narration::quiet_night(round),
            });
        }
        target.eliminate(EliminationCause::NightAction, round)?;
        let text = narration::night_elimination(target, round);

        Ok(NightResolution {
            eliminated: Some(action.target),
            boil_increment: 0,
            narration: text,
        })
    }

    /// Tally the vote: strict plurality eliminates, exact ties spare
    ///
    /// One vote per living player (last-writer already applied at record
    /// time); votes from eliminated players or non-players are discarded
    /// with a warning. No quorum beyond a single cast vote.
    pub fn resolve_vote(
        &self,
        players: &mut [Player],
        actions: &RoundActions,
        round: u32,
    ) -> Result<VoteResolution> {
        let mut counts: BTreeMap<PlayerId, u32> = BTreeMap::new();
        for vote in actions.votes.values() {
            if !living_for(players, vote.voter, EliminationCause::Vote, round) {
                warn!(voter = %vote.voter, "discarding vote from non-living voter");
                continue;
            }
            // Votes for names that are not living players of this pod are
            // agent-supplied garbage; they carry no weight.
            if !living_for(players, vote.target, EliminationCause::Vote, round) {
                warn!(voter = %vote.voter, target = %vote.target, "discarding vote for an invalid target");
                continue;
            }
            *counts.entry(vote.target).or_insert(0) += 1;
        }

        if counts.is_empty() {
            return Ok(VoteResolution {
                eliminated: None,
                tied: false,
                boil_increment: 0,
                narration: narration::no_votes(round),
            });
        }

        let top = counts.values().max().copied().unwrap_or(0);
        let leaders: Vec<PlayerId> = counts
            .iter()
            .filter(|(_, &count)| count == top)
            .map(|(&id, _)| id)
            .collect();

        if leaders.len() > 1 {
            debug!(round, leaders = leaders.len(), "vote tied; nobody eliminated");
            return Ok(VoteResolution {
                eliminated: None,
                tied: true,
                boil_increment: self.boil.on_tie,
                narration: narration::tied_vote(round, leaders.len()),
            });
        }

        let target_id = leaders[0];
        let target = players
            .iter_mut()
            .find(|p| p.id == target_id)
            .ok_or_else(|| {
                MobError::invariant(format!("vote targets unknown player {target_id}"))
            })?;
        if !target.is_alive() {
            // Replay of a tally whose elimination already landed; the target
            // passed the living-for filter, so cause and round match.
            let text = narration::vote_elimination(target, round, top);
            return Ok(VoteResolution {
                eliminated: Some(target_id),
                tied: false,
                boil_increment: 0,
                narration: text,
            });
        }
        target.eliminate(EliminationCause::Vote, round)?;
        let text = narration::vote_elimination(target, round, top);

        Ok(VoteResolution {
            eliminated: Some(target_id),
            tied: false,
            boil_increment: 0,
            narration: text,
        })
    }

    /// Evaluate win conditions
    ///
    /// Checked after every elimination and boil increment. The minority
    /// wins on parity (`minority_alive >= majority_alive`) or when the boil
    /// threshold is met; the majority wins when the minority is gone.
    pub fn check_win(&self, players: &[Player], boil_meter: u32) -> Option<Team> {
        let minority_alive = players
            .iter()
            .filter(|p| p.is_alive() && p.team() == Team::Moltbreaker)
            .count();
        let majority_alive = players
            .iter()
            .filter(|p| p.is_alive() && p.team() == Team::Loyalist)
            .count();

        if minority_alive == 0 {
            return Some(Team::Loyalist);
        }
        if minority_alive >= majority_alive || boil_meter >= self.boil.threshold {
            return Some(Team::Moltbreaker);
        }
        None
    }

    /// Whether every living minority role-holder has acted this night
    pub fn all_night_actions_in(&self, players: &[Player], actions: &RoundActions) -> bool {
        players
            .iter()
            .filter(|p| p.is_alive() && p.team() == Team::Moltbreaker)
            .all(|p| actions.night_actions.contains_key(&p.id))
    }

    /// Whether every living player has voted
    pub fn all_votes_in(&self, players: &[Player], actions: &RoundActions) -> bool {
        players
            .iter()
            .filter(|p| p.is_alive())
            .all(|p| actions.votes.contains_key(&p.id))
    }
}
