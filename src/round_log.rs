//! 📝 Round Audit Log
//!
//! Append-only CSV of every accepted round: multiplier, score, running
//! momentum and the flags raised at submission time. One file per
//! deployment, reopened in append mode across restarts so history is never
//! truncated.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::engine::RoundEngine;
use crate::scorer::score_round;

/// One accepted round, flattened for the CSV.
#[derive(Debug, Clone)]
pub struct RoundLogEntry {
    pub round_index: usize,
    pub multiplier: f64,
    pub score: f64,
    /// Cumulative momentum after this round.
    pub momentum: f64,
    pub pink: bool,
    /// Active danger windows after this round's rescan.
    pub danger_count: usize,
    pub recorded_at: i64,
}

impl RoundLogEntry {
    /// Capture the most recently accepted round. None on an empty session.
    pub fn latest(engine: &RoundEngine) -> Option<Self> {
        let round_index = engine.total_rounds().checked_sub(1)?;
        let multiplier = engine.rounds()[round_index];
        let pink = engine
            .pink_zones()
            .last()
            .map(|p| p.index == round_index)
            .unwrap_or(false);

        Some(Self {
            round_index,
            multiplier,
            score: score_round(multiplier),
            momentum: engine.momentum().last().copied().unwrap_or(0.0),
            pink,
            danger_count: engine.danger_zones().len(),
            recorded_at: chrono::Utc::now().timestamp(),
        })
    }

    /// Convert to CSV row
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{:.4},{:.4},{:.4},{},{},{},{}",
            self.round_index,
            self.multiplier,
            self.score,
            self.momentum,
            self.pink as u8,
            self.danger_count,
            self.recorded_at,
            chrono::DateTime::from_timestamp(self.recorded_at, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default()
        )
    }

    /// CSV header
    pub fn csv_header() -> &'static str {
        "round_index,multiplier,score,momentum,pink,danger_count,recorded_at,datetime"
    }
}

/// Round logger that appends to a CSV file.
pub struct RoundLogger {
    log_file: File,
    entries_logged: u64,
}

impl RoundLogger {
    /// Create new round logger
    ///
    /// If the log file doesn't exist, it will be created with a CSV header.
    /// If it exists, new entries will be appended.
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self> {
        let path = log_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create round log directory")?;
            }
        }
        let file_exists = path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(format!("Failed to open round log: {:?}", path))?;

        if !file_exists {
            writeln!(file, "{}", RoundLogEntry::csv_header())
                .context("Failed to write CSV header")?;
            file.flush()?;
            info!("📝 Created new round log: {:?}", path);
        } else {
            info!("📝 Opened existing round log: {:?}", path);
        }

        Ok(Self {
            log_file: file,
            entries_logged: 0,
        })
    }

    /// Append one accepted round.
    pub fn log_round(&mut self, entry: &RoundLogEntry) -> Result<()> {
        writeln!(self.log_file, "{}", entry.to_csv_row())
            .context("Failed to write round log entry")?;
        self.log_file.flush()?;
        self.entries_logged += 1;
        Ok(())
    }

    /// Entries written by this logger instance.
    pub fn entries_logged(&self) -> u64 {
        self.entries_logged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_csv_header() {
        let header = RoundLogEntry::csv_header();
        assert!(header.contains("round_index"));
        assert!(header.contains("momentum"));
        assert!(header.contains("danger_count"));
    }

    #[test]
    fn test_latest_captures_submission() {
        let mut engine = RoundEngine::new();
        assert!(RoundLogEntry::latest(&engine).is_none());

        engine.submit(12.0).unwrap();
        let entry = RoundLogEntry::latest(&engine).unwrap();
        assert_eq!(entry.round_index, 0);
        assert_eq!(entry.multiplier, 12.0);
        // score(12.0) = 2.2
        assert!((entry.score - 2.2).abs() < 1e-12);
        assert!((entry.momentum - 2.2).abs() < 1e-12);
        assert!(entry.pink);
        assert_eq!(entry.danger_count, 0);
    }

    #[test]
    fn test_latest_pink_flag_tracks_current_round() {
        let mut engine = RoundEngine::new();
        engine.submit(15.0).unwrap();
        engine.submit(2.0).unwrap();

        // The old pink event must not mark the new round.
        let entry = RoundLogEntry::latest(&engine).unwrap();
        assert_eq!(entry.round_index, 1);
        assert!(!entry.pink);
    }

    #[test]
    fn test_csv_row_format() {
        let entry = RoundLogEntry {
            round_index: 7,
            multiplier: 3.5,
            score: 1.25,
            momentum: -0.25,
            pink: false,
            danger_count: 2,
            recorded_at: 1_700_000_000,
        };

        let row = entry.to_csv_row();
        assert!(row.starts_with("7,3.5000,1.2500,-0.2500,0,2,1700000000,"));
        assert!(row.contains("2023-11-14"));
    }

    #[test]
    fn test_logger_creates_file_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rounds.csv");

        let logger = RoundLogger::new(&path).unwrap();
        assert_eq!(logger.entries_logged(), 0);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("round_index,multiplier"));
    }

    #[test]
    fn test_logger_appends_without_duplicate_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rounds.csv");

        let mut engine = RoundEngine::new();
        {
            let mut logger = RoundLogger::new(&path).unwrap();
            engine.submit(2.0).unwrap();
            logger
                .log_round(&RoundLogEntry::latest(&engine).unwrap())
                .unwrap();
            assert_eq!(logger.entries_logged(), 1);
        }

        // Reopen and append a second row.
        {
            let mut logger = RoundLogger::new(&path).unwrap();
            engine.submit(5.0).unwrap();
            logger
                .log_round(&RoundLogEntry::latest(&engine).unwrap())
                .unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3); // Header + 2 entries
        assert_eq!(
            content.matches("round_index,multiplier").count(),
            1,
            "header written once"
        );
    }
}
