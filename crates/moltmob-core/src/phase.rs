//! Phase, status, team, and role enums
//!
//! The phase cycle is `lobby -> night -> day -> vote -> (night | boil |
//! completed)`. Pause is a pod *status*, not a phase: a paused pod keeps its
//! phase and round and only suspends deadline evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodStatus {
    /// Collecting players and entry fees
    Lobby,
    /// Game in progress
    Active,
    /// Deadline evaluation suspended by an operator
    Paused,
    /// Game finished and all payouts resolved
    Completed,
    /// Lobby failed to fill; entry fees refunded
    Cancelled,
}

impl PodStatus {
    /// Terminal statuses permit no further mutation
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for PodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lobby => "lobby",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Game phase within an active pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the game to start
    Lobby,
    /// Minority team submits its secret action
    Night,
    /// Open discussion on the public feed
    Day,
    /// One vote per living player
    Vote,
    /// Boil threshold reached; forced resolution
    Boil,
    /// Game over
    Completed,
}

impl Phase {
    /// Whether this phase ends the game
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lobby => "lobby",
            Self::Night => "night",
            Self::Day => "day",
            Self::Vote => "vote",
            Self::Boil => "boil",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Phase {
    type Err = crate::errors::MobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lobby" => Ok(Self::Lobby),
            "night" => Ok(Self::Night),
            "day" => Ok(Self::Day),
            "vote" => Ok(Self::Vote),
            "boil" => Ok(Self::Boil),
            "completed" => Ok(Self::Completed),
            other => Err(crate::errors::MobError::invalid(format!(
                "unknown phase: {other}"
            ))),
        }
    }
}

/// The two factions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// The deceptive minority faction with a shared night action
    Moltbreaker,
    /// The majority faction trying to vote the minority out
    Loyalist,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Moltbreaker => "moltbreaker",
            Self::Loyalist => "loyalist",
        };
        write!(f, "{s}")
    }
}

/// Secret role dealt to a player when the game starts
///
/// Kept secret until the player's reveal condition (elimination) is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Minority team member; shares the nightly elimination action
    Moltbreaker,
    /// Majority team member
    Loyalist,
}

impl Role {
    /// The team this role belongs to
    pub fn team(&self) -> Team {
        match self {
            Self::Moltbreaker => Team::Moltbreaker,
            Self::Loyalist => Team::Loyalist,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Moltbreaker => "moltbreaker",
            Self::Loyalist => "loyalist",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(PodStatus::Completed.is_terminal());
        assert!(PodStatus::Cancelled.is_terminal());
        assert!(!PodStatus::Paused.is_terminal());
    }

    #[test]
    fn role_maps_to_team() {
        assert_eq!(Role::Moltbreaker.team(), Team::Moltbreaker);
        assert_eq!(Role::Loyalist.team(), Team::Loyalist);
    }
}
