//! Public-safe narration
//!
//! Everything published to the feed goes through here. Role information is
//! stripped unless the subject is already eliminated (reveal-on-death);
//! internal errors surface only as a stalled phase, never as detail text.

use moltmob_core::{Player, Team};

/// A night elimination announcement; the victim's role is revealed
pub fn night_elimination(victim: &Player, round: u32) -> String {
    format!(
        "Round {round}: dawn breaks and {} has been dragged beneath the surface. They were a {}.",
        victim.id,
        victim.role
    )
}

/// A night that produced no elimination
pub fn quiet_night(round: u32) -> String {
    format!("Round {round}: the night passes quietly. Nobody was taken. The water grows warmer.")
}

/// A vote elimination announcement; the victim's role is revealed
pub fn vote_elimination(victim: &Player, round: u32, votes: u32) -> String {
    format!(
        "Round {round}: by {votes} votes, {} has been cast out of the pod. They were a {}.",
        victim.id,
        victim.role
    )
}

/// An exactly tied vote
pub fn tied_vote(round: u32, leaders: usize) -> String {
    format!(
        "Round {round}: the vote split evenly across {leaders} names. Nobody is cast out. The water grows warmer."
    )
}

/// A vote phase in which nobody voted
pub fn no_votes(round: u32) -> String {
    format!("Round {round}: silence. No votes were cast.")
}

/// The game-over announcement
pub fn game_over(winner: Team, pot: u64) -> String {
    match winner {
        Team::Moltbreaker => format!(
            "The molt is complete. The moltbreakers have taken the pod and split the pot of {pot}."
        ),
        Team::Loyalist => format!(
            "The pod holds. Every moltbreaker has been cast out; the loyalists split the pot of {pot}."
        ),
    }
}

/// The boil threshold forced a resolution
pub fn boil_over(round: u32) -> String {
    format!("Round {round}: the water boils over. The pod can wait no longer.")
}

/// A lobby that failed to fill
pub fn lobby_cancelled() -> String {
    "The pod never formed. Entry fees are being returned.".to_string()
}

/// A public incident notice for a failed payout
pub fn payout_incident(count: usize) -> String {
    format!(
        "Settlement incident: {count} payout(s) could not be completed and await operator review."
    )
}
