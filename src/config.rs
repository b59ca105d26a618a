// Configuration module for reading Snake.toml
// Every tunable of the move policy and the server lives here

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub policy: PolicyConfig,
    pub appearance: AppearanceConfig,
    pub debug: DebugConfig,
}

/// Response deadline handling
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Move policy thresholds and weights
///
/// Hungrier or shorter means more cautious and more food-seeking; the exact
/// cutoffs are tuning knobs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PolicyConfig {
    /// Below this health we forage regardless of length
    pub hungry_health_threshold: i32,
    /// Manhattan radius at which the reach of an opponent at least as long
    /// as us becomes a hazard (equal-length collisions kill both snakes)
    pub threat_radius_unless_longer: i32,
    /// Radius used against opponents we strictly outgrow
    pub threat_radius_when_longer: i32,
    /// Extra cells beyond the opponent's length still counted as a trap
    pub trap_margin: usize,
    pub trap_enabled: bool,
    /// Weight of the opponent's remaining space in the local tie-break
    pub opponent_space_weight: f64,
}

impl PolicyConfig {
    /// Threat radius to apply against an opponent of `their_length`
    pub fn threat_radius(&self, my_length: i32, their_length: i32) -> i32 {
        if my_length <= their_length {
            self.threat_radius_unless_longer
        } else {
            self.threat_radius_when_longer
        }
    }

    /// Hungry when low on health or not longer than the opponent
    pub fn is_hungry(&self, health: i32, my_length: i32, their_length: i32) -> bool {
        my_length <= their_length || health < self.hungry_health_threshold
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            hungry_health_threshold: 30,
            threat_radius_unless_longer: 2,
            threat_radius_when_longer: 0,
            trap_margin: 3,
            trap_enabled: true,
            opponent_space_weight: 1.5,
        }
    }
}

/// Snake metadata for GET / and the shout text attached to moves
#[derive(Debug, Deserialize, Clone)]
pub struct AppearanceConfig {
    pub author: String,
    pub color: String,
    pub head: String,
    pub tail: String,
    pub shout: String,
    pub trapped_shout: String,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&contents)?)
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 400,
                network_overhead_ms: 50,
            },
            policy: PolicyConfig::default(),
            appearance: AppearanceConfig {
                author: "open-space".to_string(),
                color: "#8600b3".to_string(),
                head: "all-seeing".to_string(),
                tail: "freckled".to_string(),
                shout: "Badger, badger, badger, mushroom!".to_string(),
                trapped_shout: "Oh bugger.".to_string(),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "battlesnake_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
