//! 💾 Session Snapshot
//!
//! JSON persistence for a whole session. Saves go through a temp file plus
//! rename so a crash mid-write never corrupts the previous snapshot.
//! Loading runs one explicit repair pass: fields added after the first
//! release default to empty and get backfilled, so old snapshot files keep
//! working across upgrades.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::EngineSettings;
use crate::engine::RoundEngine;
use crate::momentum::MomentumSeries;
use crate::types::{PinkEvent, QuickEntry};

/// Current snapshot schema version. Bump when a field is added.
pub const SNAPSHOT_VERSION: u32 = 2;

fn legacy_version() -> u32 {
    // Version field itself postdates the first release.
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub saved_at: i64,
    #[serde(default)]
    pub rounds: Vec<f64>,
    #[serde(default)]
    pub momentum: Vec<f64>,
    #[serde(default)]
    pub pink_zones: Vec<PinkEvent>,
    #[serde(default)]
    pub danger_zones: Vec<usize>,
    #[serde(default)]
    pub quick_entries: Vec<QuickEntry>,
}

impl SessionSnapshot {
    /// Capture the current engine state.
    pub fn from_engine(engine: &RoundEngine) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: chrono::Utc::now().timestamp(),
            rounds: engine.rounds().to_vec(),
            momentum: engine.momentum().to_vec(),
            pink_zones: engine.pink_zones().to_vec(),
            danger_zones: engine.danger_zones().to_vec(),
            quick_entries: engine.quick_entries().to_vec(),
        }
    }

    /// Load a snapshot from file, returns None if the file doesn't exist.
    ///
    /// Legacy snapshots are repaired in place before they are returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        if !path.as_ref().exists() {
            info!("No snapshot found at {:?}, starting fresh", path.as_ref());
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).context("Failed to read snapshot file")?;

        let mut snapshot: SessionSnapshot =
            serde_json::from_str(&contents).context("Failed to parse snapshot file")?;

        snapshot.repair();

        info!(
            "✅ Loaded snapshot: {} rounds, {} pinks (saved at {})",
            snapshot.rounds.len(),
            snapshot.pink_zones.len(),
            snapshot.saved_at
        );
        Ok(Some(snapshot))
    }

    /// Save the snapshot to file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create snapshot directory")?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;

        // Write to temp file first, then rename (atomic operation)
        let temp_path = path.as_ref().with_extension("tmp");
        fs::write(&temp_path, contents).context("Failed to write temp snapshot file")?;

        fs::rename(&temp_path, &path).context("Failed to rename snapshot file")?;

        Ok(())
    }

    /// One-shot migration for snapshots written by older releases.
    ///
    /// Missing collections already deserialized to empty via serde
    /// defaults; this backfills the momentum baseline, stamps the current
    /// version, and logs what it touched. Present-but-odd data is kept and
    /// reported rather than rewritten.
    pub fn repair(&mut self) {
        let from_version = self.version;

        if self.momentum.is_empty() {
            self.momentum.push(0.0);
            warn!("🔧 Snapshot repair: momentum series backfilled with baseline");
        }
        if self.momentum.len() != self.rounds.len() + 1 {
            warn!(
                "🔧 Snapshot has {} momentum points for {} rounds (expected {}), keeping as-is",
                self.momentum.len(),
                self.rounds.len(),
                self.rounds.len() + 1
            );
        }

        if from_version < SNAPSHOT_VERSION {
            self.version = SNAPSHOT_VERSION;
            info!(
                "🔧 Snapshot migrated: v{} → v{}",
                from_version, SNAPSHOT_VERSION
            );
        }
    }

    /// Rebuild an engine from this snapshot with the given settings.
    pub fn into_engine(self, settings: EngineSettings) -> RoundEngine {
        RoundEngine::from_parts(
            settings,
            self.rounds,
            MomentumSeries::from_values(self.momentum),
            self.pink_zones,
            self.danger_zones,
            self.quick_entries,
        )
    }
}
