//! 🎰 Session Engine
//!
//! One `RoundEngine` per session. Owns the full state: round history,
//! momentum series, pink and danger sets, quick-entry log, and the live
//! settings. Submissions are synchronous; every accepted round runs the
//! whole pipeline (score → append → pink check → danger rescan) before
//! the call returns, so readers always see a consistent state.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{EngineSettings, OutOfRangePolicy};
use crate::detector;
use crate::momentum::MomentumSeries;
use crate::scorer::score_round;
use crate::types::{EngineState, PinkEvent, QuickCategory, QuickEntry, SessionPhase};

/// Rejected observation. The engine state is untouched when these come back.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidObservation {
    #[error("multiplier must be finite, got {value}")]
    NonFinite { value: f64 },
    #[error("multiplier {value} is below the minimum {min}")]
    BelowMinimum { value: f64, min: f64 },
}

/// Incremental analytics over one session of manually entered rounds.
pub struct RoundEngine {
    /// Every accepted multiplier, in submission order.
    rounds: Vec<f64>,
    /// Cumulative scores, seeded with 0 (always rounds.len() + 1 points).
    momentum: MomentumSeries,
    /// Pink events in detection order.
    pink_zones: Vec<PinkEvent>,
    /// Flagged end-indices from the latest danger rescan.
    danger_zones: Vec<usize>,
    /// Quick entries, separate from round history.
    quick_entries: Vec<QuickEntry>,
    settings: EngineSettings,
}

impl RoundEngine {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            rounds: Vec::new(),
            momentum: MomentumSeries::new(),
            pink_zones: Vec::new(),
            danger_zones: Vec::new(),
            quick_entries: Vec::new(),
            settings,
        }
    }

    /// Rebuild an engine from persisted state.
    pub(crate) fn from_parts(
        settings: EngineSettings,
        rounds: Vec<f64>,
        momentum: MomentumSeries,
        pink_zones: Vec<PinkEvent>,
        danger_zones: Vec<usize>,
        quick_entries: Vec<QuickEntry>,
    ) -> Self {
        Self {
            rounds,
            momentum,
            pink_zones,
            danger_zones,
            quick_entries,
            settings,
        }
    }

    /// Submit one completed round.
    ///
    /// Runs the full pipeline and returns the fresh state. On a rejected
    /// multiplier nothing is appended and the previous state stands.
    pub fn submit(&mut self, multiplier: f64) -> Result<EngineState, InvalidObservation> {
        let multiplier = self.check_observation(multiplier)?;

        let score = score_round(multiplier);
        self.rounds.push(multiplier);
        self.momentum.push_score(score);

        let index = self.rounds.len() - 1;
        if let Some(event) = detector::pink_event(multiplier, self.settings.pink_threshold, index) {
            info!(
                "🌸 Pink round: {:.2}x at index {} ({} total)",
                event.multiplier,
                event.index,
                self.pink_zones.len() + 1
            );
            self.pink_zones.push(event);
        }

        let previous = self.danger_zones.len();
        self.danger_zones = detector::scan_danger_zones(&self.rounds);
        if self.danger_zones.len() > previous {
            warn!(
                "⚡ Danger window at index {} ({} active)",
                index,
                self.danger_zones.len()
            );
        }

        debug!(
            "📊 Round {}: {:.2}x → score {:+.3}, momentum {:.3}",
            index,
            multiplier,
            score,
            self.momentum.last()
        );

        Ok(self.state())
    }

    /// Validate a raw multiplier, applying the out-of-range policy.
    fn check_observation(&self, multiplier: f64) -> Result<f64, InvalidObservation> {
        if !multiplier.is_finite() {
            return Err(InvalidObservation::NonFinite { value: multiplier });
        }
        let min = self.settings.min_multiplier;
        if multiplier < min {
            return match self.settings.out_of_range {
                OutOfRangePolicy::Reject => Err(InvalidObservation::BelowMinimum {
                    value: multiplier,
                    min,
                }),
                OutOfRangePolicy::Clamp => {
                    debug!("📏 Clamped {:.4} up to minimum {:.2}", multiplier, min);
                    Ok(min)
                }
            };
        }
        Ok(multiplier)
    }

    /// Record a one-tap quick entry.
    ///
    /// Quick entries keep their own log and never touch round history or
    /// any derived series. Pink synthesizes the threshold current right now.
    pub fn submit_quick(&mut self, category: QuickCategory) -> EngineState {
        let entry = QuickEntry {
            category,
            multiplier: category.multiplier(self.settings.pink_threshold),
            score: category.score(),
            recorded_at: Utc::now().timestamp(),
        };
        debug!(
            "⚡ Quick entry: {} ({:.1}x, score {:+})",
            category.as_str(),
            entry.multiplier,
            entry.score
        );
        self.quick_entries.push(entry);
        self.state()
    }

    /// Wipe the session back to its seeded empty state.
    ///
    /// Only observation data goes; settings survive so the next round
    /// scores against the same threshold and policy.
    pub fn reset(&mut self) -> EngineState {
        let dropped = self.rounds.len();
        self.rounds.clear();
        self.momentum.reset();
        self.pink_zones.clear();
        self.danger_zones.clear();
        self.quick_entries.clear();
        info!("🔄 Session reset ({} rounds dropped)", dropped);
        self.state()
    }

    /// Change the pink threshold for future rounds. Recorded pink events
    /// are never re-evaluated.
    pub fn set_pink_threshold(&mut self, value: f64) {
        info!(
            "🌸 Pink threshold {:.2} → {:.2}",
            self.settings.pink_threshold, value
        );
        self.settings.pink_threshold = value;
    }

    /// Display window for the presentation layer. The danger rule ignores
    /// this and keeps its fixed 5-round windows.
    pub fn set_display_window(&mut self, value: usize) {
        self.settings.display_window = value;
    }

    pub fn rounds(&self) -> &[f64] {
        &self.rounds
    }

    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn momentum(&self) -> &[f64] {
        self.momentum.values()
    }

    pub fn smoothed_momentum(&self) -> Vec<f64> {
        self.momentum.smoothed()
    }

    pub fn pink_zones(&self) -> &[PinkEvent] {
        &self.pink_zones
    }

    pub fn danger_zones(&self) -> &[usize] {
        &self.danger_zones
    }

    pub fn quick_entries(&self) -> &[QuickEntry] {
        &self.quick_entries
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn phase(&self) -> SessionPhase {
        if self.rounds.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Active
        }
    }

    /// HUD danger level: 20 points per active window, capped at 100.
    pub fn danger_level_pct(&self) -> u8 {
        (self.danger_zones.len() * 20).min(100) as u8
    }

    pub fn danger_alert(&self) -> bool {
        !self.danger_zones.is_empty()
    }

    /// Owned copy of the full state for display layers.
    pub fn state(&self) -> EngineState {
        EngineState {
            rounds: self.rounds.clone(),
            momentum: self.momentum.values().to_vec(),
            smoothed_momentum: self.momentum.smoothed(),
            pink_zones: self.pink_zones.clone(),
            danger_zones: self.danger_zones.clone(),
            quick_entries: self.quick_entries.clone(),
        }
    }
}

impl Default for RoundEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit_all(engine: &mut RoundEngine, multipliers: &[f64]) {
        for &m in multipliers {
            engine.submit(m).unwrap();
        }
    }

    #[test]
    fn test_empty_engine_state() {
        let engine = RoundEngine::new();
        assert_eq!(engine.phase(), SessionPhase::Empty);
        assert!(engine.rounds().is_empty());
        assert_eq!(engine.momentum(), &[0.0]);
        assert!(engine.pink_zones().is_empty());
        assert!(engine.danger_zones().is_empty());
        assert_eq!(engine.danger_level_pct(), 0);
    }

    #[test]
    fn test_submit_runs_full_pipeline() {
        let mut engine = RoundEngine::new();
        let state = engine.submit(2.0).unwrap();

        assert_eq!(state.rounds, vec![2.0]);
        // score(2.0) = 1.0, momentum [0.0, 1.0]
        assert_eq!(state.momentum.len(), 2);
        assert!((state.momentum[1] - 1.0).abs() < 1e-12);
        assert_eq!(state.smoothed_momentum.len(), 2);
        assert_eq!(engine.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_momentum_end_to_end() {
        let mut engine = RoundEngine::new();
        submit_all(&mut engine, &[1.2, 1.8, 1.9, 1.5, 1.3]);

        // scores: -1.5, 0.2, 0.6, -1.0, -1.5
        // cumulative: [0, -1.5, -1.3, -0.7, -1.7, -3.2]
        let momentum = engine.momentum();
        let expected = [0.0, -1.5, -1.3, -0.7, -1.7, -3.2];
        assert_eq!(momentum.len(), expected.len());
        for (got, want) in momentum.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9, "got {} want {}", got, want);
        }
    }

    #[test]
    fn test_momentum_has_one_more_point_than_history() {
        let mut engine = RoundEngine::new();
        submit_all(&mut engine, &[2.0, 3.0, 1.1, 8.0]);
        assert_eq!(engine.momentum().len(), engine.total_rounds() + 1);
    }

    #[test]
    fn test_pink_detection_at_threshold() {
        let mut engine = RoundEngine::new();
        submit_all(&mut engine, &[9.99, 10.0, 25.0]);

        let pinks = engine.pink_zones();
        assert_eq!(pinks.len(), 2);
        assert_eq!(pinks[0].index, 1);
        assert_eq!(pinks[0].multiplier, 10.0);
        assert_eq!(pinks[1].index, 2);
    }

    #[test]
    fn test_threshold_change_affects_future_only() {
        let mut engine = RoundEngine::new();
        engine.submit(12.0).unwrap();
        assert_eq!(engine.pink_zones().len(), 1);

        // Raising the bar does not erase the recorded event.
        engine.set_pink_threshold(20.0);
        assert_eq!(engine.pink_zones().len(), 1);

        // And 12x no longer qualifies going forward.
        engine.submit(12.0).unwrap();
        assert_eq!(engine.pink_zones().len(), 1);

        engine.submit(20.0).unwrap();
        assert_eq!(engine.pink_zones().len(), 2);
    }

    #[test]
    fn test_danger_appears_on_fifth_low_round() {
        let mut engine = RoundEngine::new();
        submit_all(&mut engine, &[1.2, 1.8, 1.9, 1.5]);
        assert!(engine.danger_zones().is_empty());
        assert!(!engine.danger_alert());

        engine.submit(1.3).unwrap();
        assert_eq!(engine.danger_zones(), &[4]);
        assert!(engine.danger_alert());
        assert_eq!(engine.danger_level_pct(), 20);
    }

    #[test]
    fn test_danger_level_scales_with_windows() {
        let mut engine = RoundEngine::new();
        submit_all(&mut engine, &[1.0; 10]);
        // Windows end at 4..=9: six flags, capped at 100.
        assert_eq!(engine.danger_zones().len(), 6);
        assert_eq!(engine.danger_level_pct(), 100);
    }

    #[test]
    fn test_rejected_submission_is_a_no_op() {
        let mut engine = RoundEngine::new();
        engine.submit(5.0).unwrap();
        let before = engine.state();

        let err = engine.submit(f64::NAN).unwrap_err();
        assert!(matches!(err, InvalidObservation::NonFinite { .. }));
        let err = engine.submit(0.5).unwrap_err();
        assert!(matches!(err, InvalidObservation::BelowMinimum { .. }));

        assert_eq!(engine.state(), before);
    }

    #[test]
    fn test_clamp_policy_accepts_low_values() {
        let mut settings = EngineSettings::default();
        settings.out_of_range = OutOfRangePolicy::Clamp;
        let mut engine = RoundEngine::with_settings(settings);

        let state = engine.submit(0.5).unwrap();
        assert_eq!(state.rounds, vec![1.0]);

        // Non-finite input is rejected even under clamp.
        assert!(engine.submit(f64::INFINITY).is_err());
        assert!(engine.submit(f64::NAN).is_err());
    }

    #[test]
    fn test_quick_entries_do_not_touch_history() {
        let mut engine = RoundEngine::new();
        engine.submit(2.0).unwrap();

        let state = engine.submit_quick(QuickCategory::Pink);
        assert_eq!(state.quick_entries.len(), 1);
        assert_eq!(state.quick_entries[0].multiplier, 10.0);
        assert_eq!(state.quick_entries[0].score, 2);

        // History and derived series unchanged.
        assert_eq!(state.rounds, vec![2.0]);
        assert_eq!(state.momentum.len(), 2);
        assert!(state.pink_zones.is_empty());
    }

    #[test]
    fn test_quick_pink_uses_live_threshold() {
        let mut engine = RoundEngine::new();
        engine.set_pink_threshold(15.0);
        let state = engine.submit_quick(QuickCategory::Pink);
        assert_eq!(state.quick_entries[0].multiplier, 15.0);
    }

    #[test]
    fn test_reset_clears_data_keeps_settings() {
        let mut engine = RoundEngine::new();
        engine.set_pink_threshold(12.0);
        submit_all(&mut engine, &[1.0, 1.0, 1.0, 1.0, 1.0, 13.0]);
        engine.submit_quick(QuickCategory::Blue);
        assert!(engine.danger_alert());
        assert_eq!(engine.pink_zones().len(), 1);

        let state = engine.reset();
        assert!(state.rounds.is_empty());
        assert_eq!(state.momentum, vec![0.0]);
        assert!(state.pink_zones.is_empty());
        assert!(state.danger_zones.is_empty());
        assert!(state.quick_entries.is_empty());
        assert_eq!(engine.phase(), SessionPhase::Empty);

        // Threshold survived the reset.
        assert_eq!(engine.settings().pink_threshold, 12.0);
        engine.submit(12.5).unwrap();
        assert_eq!(engine.pink_zones().len(), 1);
    }

    #[test]
    fn test_state_copies_are_detached() {
        let mut engine = RoundEngine::new();
        engine.submit(3.0).unwrap();
        let state = engine.state();

        engine.submit(4.0).unwrap();
        assert_eq!(state.rounds.len(), 1);
        assert_eq!(engine.total_rounds(), 2);
    }

    #[test]
    fn test_display_window_does_not_change_danger_rule() {
        let mut engine = RoundEngine::new();
        engine.set_display_window(3);
        submit_all(&mut engine, &[1.0, 1.0, 1.0, 1.0, 1.0]);
        // Still the fixed 5-round window, flagged once.
        assert_eq!(engine.danger_zones(), &[4]);
        assert_eq!(engine.settings().display_window, 3);
    }
}
