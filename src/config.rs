use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSettings,
    pub snapshot: SnapshotConfig,
    pub round_log: RoundLogConfig,
    pub monitoring: MonitoringConfig,
}

/// Live per-session knobs. A copy of these travels into each engine, so a
/// deployment default never leaks changes across sessions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Multipliers at or above this value are recorded as pink events.
    pub pink_threshold: f64,
    /// Smallest multiplier accepted as an observation.
    pub min_multiplier: f64,
    /// What happens to finite submissions below the minimum.
    pub out_of_range: OutOfRangePolicy,
    /// Rounds shown by the presentation layer. Never consulted by the
    /// danger rule, which always works on fixed 5-round windows.
    pub display_window: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pink_threshold: 10.0,
            min_multiplier: 1.0,
            out_of_range: OutOfRangePolicy::Reject,
            display_window: 5,
        }
    }
}

/// Policy for finite multipliers below the configured minimum.
/// Non-finite input is always rejected regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangePolicy {
    Reject,
    Clamp,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub enabled: bool,
    pub path: String,
    /// Background autosave cadence.
    pub autosave_secs: u64,
    /// Synchronous save after this many accepted rounds.
    pub save_every_rounds: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "data/session.json".to_string(),
            autosave_secs: 30,
            save_every_rounds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoundLogConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for RoundLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "data/rounds.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default() -> Result<Self> {
        // Try config.toml first, then config.example.toml
        Self::load("config.toml")
            .or_else(|_| Self::load("config.example.toml"))
            .context("Failed to load configuration")
    }

    pub fn validate(&self) -> Result<()> {
        if !self.engine.pink_threshold.is_finite() || self.engine.pink_threshold <= 0.0 {
            bail!(
                "engine.pink_threshold must be a positive finite number, got {}",
                self.engine.pink_threshold
            );
        }
        if !self.engine.min_multiplier.is_finite() || self.engine.min_multiplier <= 0.0 {
            bail!(
                "engine.min_multiplier must be a positive finite number, got {}",
                self.engine.min_multiplier
            );
        }
        if self.engine.display_window == 0 {
            bail!("engine.display_window must be at least 1");
        }
        if self.snapshot.enabled {
            if self.snapshot.path.is_empty() {
                bail!("snapshot.path must not be empty when snapshots are enabled");
            }
            if self.snapshot.autosave_secs == 0 {
                bail!("snapshot.autosave_secs must be at least 1");
            }
            if self.snapshot.save_every_rounds == 0 {
                bail!("snapshot.save_every_rounds must be at least 1");
            }
        }
        if self.round_log.enabled && self.round_log.path.is_empty() {
            bail!("round_log.path must not be empty when the round log is enabled");
        }
        Ok(())
    }
}
