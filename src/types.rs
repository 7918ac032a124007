//! Shared data types for the session engine.

use serde::{Deserialize, Serialize};

/// A round that met the pink threshold at submission time.
///
/// Recorded once and never re-evaluated: changing the threshold later
/// affects only future rounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinkEvent {
    /// The winning multiplier.
    pub multiplier: f64,
    /// Position of the round in history, assigned after append (0-based).
    pub index: usize,
}

/// Category for one-tap quick entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickCategory {
    /// Low round, below 2x.
    Blue,
    /// Mid round, 2x territory.
    Purple,
    /// High round at the pink threshold.
    Pink,
}

impl QuickCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuickCategory::Blue => "blue",
            QuickCategory::Purple => "purple",
            QuickCategory::Pink => "pink",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Some(QuickCategory::Blue),
            "purple" => Some(QuickCategory::Purple),
            "pink" => Some(QuickCategory::Pink),
            _ => None,
        }
    }

    /// Representative multiplier synthesized for this category. Pink uses
    /// whatever the threshold is at call time.
    pub fn multiplier(&self, pink_threshold: f64) -> f64 {
        match self {
            QuickCategory::Blue => 1.5,
            QuickCategory::Purple => 2.0,
            QuickCategory::Pink => pink_threshold,
        }
    }

    /// Precomputed integer score for this category. Not derived from the
    /// scoring curve; quick entries are coarse tallies.
    pub fn score(&self) -> i8 {
        match self {
            QuickCategory::Blue => -1,
            QuickCategory::Purple => 1,
            QuickCategory::Pink => 2,
        }
    }
}

/// One quick-entry submission. Lives in its own log, never merged into
/// round history or any derived series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickEntry {
    pub category: QuickCategory,
    pub multiplier: f64,
    pub score: i8,
    /// Unix timestamp at submission.
    pub recorded_at: i64,
}

/// Session lifecycle. Empty until the first accepted observation, Active
/// from then until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Active,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Empty => "empty",
            SessionPhase::Active => "active",
        }
    }
}

/// Owned view of the full engine state, handed to display layers after
/// every mutation. Detached from the engine: holding one never blocks
/// further submissions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineState {
    pub rounds: Vec<f64>,
    pub momentum: Vec<f64>,
    pub smoothed_momentum: Vec<f64>,
    pub pink_zones: Vec<PinkEvent>,
    pub danger_zones: Vec<usize>,
    pub quick_entries: Vec<QuickEntry>,
}

impl EngineState {
    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn pink_count(&self) -> usize {
        self.pink_zones.len()
    }

    /// Danger level for the HUD: 20 points per active danger window,
    /// capped at 100.
    pub fn danger_level_pct(&self) -> u8 {
        (self.danger_zones.len() * 20).min(100) as u8
    }

    /// True whenever at least one danger window is active.
    pub fn danger_alert(&self) -> bool {
        !self.danger_zones.is_empty()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.rounds.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Active
        }
    }
}
