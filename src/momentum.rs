//! 📈 Momentum Series
//!
//! Cumulative sum of round scores, seeded with a 0 baseline so the series
//! always has one more point than the round history. A smoothed view for
//! display is derived on demand and never stored.

use tracing::debug;

/// Smoothing factor for the exponentially weighted display view.
pub const SMOOTHING_ALPHA: f64 = 0.75;

/// Running cumulative score series.
///
/// Invariant: never empty. Starts as `[0.0]`, grows by one point per
/// accepted round, and reset reseeds the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumSeries {
    values: Vec<f64>,
}

impl MomentumSeries {
    pub fn new() -> Self {
        Self { values: vec![0.0] }
    }

    /// Rebuild from persisted values. An empty vector reseeds the baseline
    /// so the invariant holds even for repaired legacy snapshots.
    pub fn from_values(values: Vec<f64>) -> Self {
        if values.is_empty() {
            debug!("📈 Empty momentum series restored, reseeding baseline");
            Self::new()
        } else {
            Self { values }
        }
    }

    /// Append the next cumulative point: previous total plus this score.
    pub fn push_score(&mut self, score: f64) {
        let next = self.last() + score;
        self.values.push(next);
    }

    /// Most recent cumulative value.
    pub fn last(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smoothed display view over the raw series.
    ///
    /// Recursive blend: `out[0] = values[0]`, then
    /// `out[i] = ALPHA * values[i] + (1 - ALPHA) * out[i-1]`.
    /// Derived fresh from the raw values on every call, so repeated calls
    /// with unchanged state return identical vectors.
    pub fn smoothed(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.values.len());
        let mut prev = match self.values.first() {
            Some(&v) => v,
            None => return out,
        };
        out.push(prev);
        for &v in &self.values[1..] {
            prev = SMOOTHING_ALPHA * v + (1.0 - SMOOTHING_ALPHA) * prev;
            out.push(prev);
        }
        out
    }

    /// Drop all points and reseed the 0 baseline.
    pub fn reset(&mut self) {
        self.values.clear();
        self.values.push(0.0);
    }

    /// Consume the series for persistence.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl Default for MomentumSeries {
    fn default() -> Self {
        Self::new()
    }
}
