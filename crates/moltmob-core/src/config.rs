//! Game configuration
//!
//! Operator-supplied tunables, loadable from TOML. Every duration is in
//! seconds; amounts are in the smallest currency unit.

use crate::errors::{MobError, Result};
use serde::{Deserialize, Serialize};

/// Boil-meter escalation policy
///
/// The exact increment triggers behind the "50% Boil Rule" are a product
/// placeholder; both increments and the threshold are configurable rather
/// than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoilPolicy {
    /// Increment applied when a vote ends in an exact tie
    #[serde(default = "default_boil_increment")]
    pub on_tie: u32,
    /// Increment applied when a night produces no elimination
    #[serde(default = "default_boil_increment")]
    pub on_quiet_night: u32,
    /// Meter value that forces resolution in favor of the minority team
    #[serde(default = "default_boil_threshold")]
    pub threshold: u32,
}

fn default_boil_increment() -> u32 {
    1
}

fn default_boil_threshold() -> u32 {
    3
}

impl Default for BoilPolicy {
    fn default() -> Self {
        Self {
            on_tie: default_boil_increment(),
            on_quiet_night: default_boil_increment(),
            threshold: default_boil_threshold(),
        }
    }
}

/// External settlement behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Upper bound on a single backend call, in milliseconds
    #[serde(default = "default_settle_timeout_ms")]
    pub timeout_ms: u64,
    /// Attempts before a pending transaction is marked failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_settle_timeout_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_settle_timeout_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Full orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Minimum players required to leave the lobby
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    /// Buy-in per player
    #[serde(default = "default_entry_fee")]
    pub entry_fee: u64,
    /// Platform cut of payouts, in basis points
    #[serde(default = "default_rake_bps")]
    pub rake_bps: u16,
    /// Lobby window before start-or-cancel
    #[serde(default = "default_lobby_secs")]
    pub lobby_duration_secs: i64,
    /// Night phase length
    #[serde(default = "default_night_secs")]
    pub night_duration_secs: i64,
    /// Day discussion length
    #[serde(default = "default_day_secs")]
    pub day_duration_secs: i64,
    /// Vote window length
    #[serde(default = "default_vote_secs")]
    pub vote_duration_secs: i64,
    /// A tick in flight longer than this is treated as crashed
    #[serde(default = "default_tick_stale_secs")]
    pub tick_stale_secs: i64,
    /// Boil-meter escalation policy
    #[serde(default)]
    pub boil: BoilPolicy,
    /// Settlement timeouts and retry ceiling
    #[serde(default)]
    pub settlement: SettlementConfig,
}

fn default_min_players() -> usize {
    4
}

fn default_entry_fee() -> u64 {
    100
}

fn default_rake_bps() -> u16 {
    500
}

fn default_lobby_secs() -> i64 {
    3_600
}

fn default_night_secs() -> i64 {
    1_800
}

fn default_day_secs() -> i64 {
    3_600
}

fn default_vote_secs() -> i64 {
    1_800
}

fn default_tick_stale_secs() -> i64 {
    300
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: default_min_players(),
            entry_fee: default_entry_fee(),
            rake_bps: default_rake_bps(),
            lobby_duration_secs: default_lobby_secs(),
            night_duration_secs: default_night_secs(),
            day_duration_secs: default_day_secs(),
            vote_duration_secs: default_vote_secs(),
            tick_stale_secs: default_tick_stale_secs(),
            boil: BoilPolicy::default(),
            settlement: SettlementConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| MobError::invalid(format!("config parse failed: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot run a game
    pub fn validate(&self) -> Result<()> {
        if self.min_players < 3 {
            return Err(MobError::invalid(
                "min_players must be at least 3 (two teams plus a swing vote)",
            ));
        }
        if self.rake_bps >= 10_000 {
            return Err(MobError::invalid("rake_bps must be below 10000"));
        }
        if self.boil.threshold == 0 {
            return Err(MobError::invalid("boil threshold must be positive"));
        }
        if self.settlement.max_attempts == 0 {
            return Err(MobError::invalid("settlement max_attempts must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            min_players = 6
            entry_fee = 250

            [boil]
            threshold = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.min_players, 6);
        assert_eq!(config.entry_fee, 250);
        assert_eq!(config.boil.threshold, 4);
        assert_eq!(config.boil.on_tie, 1);
        assert_eq!(config.rake_bps, 500);
    }

    #[test]
    fn excessive_rake_rejected() {
        let mut config = GameConfig::default();
        config.rake_bps = 10_000;
        assert!(config.validate().is_err());
    }
}
