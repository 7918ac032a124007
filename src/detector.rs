//! 🔍 Pattern Detection
//!
//! Two detectors run on every accepted round:
//! - pink: the single round just appended is checked against the threshold
//! - danger: the full history is rescanned for windows of low rounds
//!
//! The danger rescan is whole-history: the returned set always reflects the
//! complete current sequence and replaces the previous set outright; nothing
//! is merged incrementally. Interactive sessions stay in the hundreds of
//! rounds, so the scan is linear over a short vector.

use crate::types::PinkEvent;

/// Consecutive rounds examined per danger window.
pub const DANGER_WINDOW: usize = 5;
/// Low rounds required within a window to flag it.
pub const DANGER_TRIGGER: usize = 4;
/// Rounds strictly below this multiplier count as low.
pub const LOW_ROUND_CUTOFF: f64 = 2.0;

/// Classify a just-appended round against the pink threshold.
///
/// `index` is the round's position in history after the append. Returns the
/// event to record, or None when the multiplier stays below the threshold.
pub fn pink_event(multiplier: f64, threshold: f64, index: usize) -> Option<PinkEvent> {
    if multiplier >= threshold {
        Some(PinkEvent { multiplier, index })
    } else {
        None
    }
}

/// Scan the full round history for danger windows.
///
/// Index `i` is flagged when at least [`DANGER_TRIGGER`] of the
/// [`DANGER_WINDOW`] rounds ending at `i` are below [`LOW_ROUND_CUTOFF`].
/// Histories shorter than one window produce no flags.
pub fn scan_danger_zones(rounds: &[f64]) -> Vec<usize> {
    if rounds.len() < DANGER_WINDOW {
        return Vec::new();
    }

    let mut zones = Vec::new();
    for i in (DANGER_WINDOW - 1)..rounds.len() {
        let window = &rounds[i + 1 - DANGER_WINDOW..=i];
        let low = window.iter().filter(|&&m| m < LOW_ROUND_CUTOFF).count();
        if low >= DANGER_TRIGGER {
            zones.push(i);
        }
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pink_requires_threshold() {
        assert!(pink_event(9.99, 10.0, 0).is_none());
        let event = pink_event(10.0, 10.0, 3).unwrap();
        assert_eq!(event.multiplier, 10.0);
        assert_eq!(event.index, 3);
        assert!(pink_event(42.0, 10.0, 7).is_some());
    }

    #[test]
    fn test_pink_respects_custom_threshold() {
        assert!(pink_event(12.0, 15.0, 0).is_none());
        assert!(pink_event(15.0, 15.0, 0).is_some());
    }

    #[test]
    fn test_short_history_has_no_danger() {
        assert!(scan_danger_zones(&[]).is_empty());
        assert!(scan_danger_zones(&[1.0, 1.0, 1.0, 1.0]).is_empty());
    }

    #[test]
    fn test_four_low_in_window_flags() {
        // Four low + one high in the first window.
        let rounds = [1.2, 1.8, 1.9, 1.5, 1.3];
        assert_eq!(scan_danger_zones(&rounds), vec![4]);

        let rounds = [1.2, 5.0, 1.9, 1.5, 1.3];
        assert_eq!(scan_danger_zones(&rounds), vec![4]);
    }

    #[test]
    fn test_three_low_does_not_flag() {
        let rounds = [1.2, 5.0, 3.0, 1.5, 1.3];
        assert!(scan_danger_zones(&rounds).is_empty());
    }

    #[test]
    fn test_cutoff_is_strict() {
        // Exactly 2.0 is not low; only three rounds qualify.
        let rounds = [1.2, 2.0, 1.9, 1.5, 2.0];
        assert!(scan_danger_zones(&rounds).is_empty());

        let rounds = [1.2, 1.99, 1.9, 1.5, 2.0];
        assert_eq!(scan_danger_zones(&rounds), vec![4]);
    }

    #[test]
    fn test_overlapping_windows_all_flag() {
        let rounds = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        assert_eq!(scan_danger_zones(&rounds), vec![4, 5, 6]);
    }

    #[test]
    fn test_recovery_needs_two_high_rounds() {
        // One high still leaves four lows in the window ending at 5; the
        // second high finally drops the count to three at index 6.
        let rounds = [1.0, 1.0, 1.0, 1.0, 1.0, 8.0, 8.0];
        assert_eq!(scan_danger_zones(&rounds), vec![4, 5]);
    }

    #[test]
    fn test_rescan_is_stateless() {
        let rounds = [1.0, 1.0, 1.0, 1.0, 1.0];
        assert_eq!(scan_danger_zones(&rounds), scan_danger_zones(&rounds));
    }
}
