//! 📊 Round Scoring
//!
//! Maps a round multiplier onto a signed score via a fixed piecewise-linear
//! curve:
//! - below 1.5x the round busted: flat -1.5 penalty
//! - from 1.5x to 20x: linear between control points
//! - above 20x: clamped at 3.0
//!
//! Scores are raw f64 values. No rounding anywhere, so the same multiplier
//! always produces the bit-identical score that downstream momentum sums
//! depend on.

/// Penalty applied to any round that busted below the first control point.
pub const BUST_PENALTY: f64 = -1.5;

/// Control points of the multiplier → score curve.
const CURVE_X: [f64; 5] = [1.5, 2.0, 5.0, 10.0, 20.0];
const CURVE_Y: [f64; 5] = [-1.0, 1.0, 1.5, 2.0, 3.0];

/// Score a single round multiplier.
pub fn score_round(multiplier: f64) -> f64 {
    if multiplier < CURVE_X[0] {
        return BUST_PENALTY;
    }
    interp(multiplier, &CURVE_X, &CURVE_Y)
}

/// Linear interpolation over sorted control points, clamped at both ends.
///
/// Slope form `y0 + (x - x0) * (y1 - y0) / (x1 - x0)`. Keep it in this
/// form: persisted momentum series are rebuilt from these values and must
/// reproduce exactly.
fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    for i in 0..last {
        if x <= xs[i + 1] {
            let slope = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]);
            return ys[i] + slope * (x - xs[i]);
        }
    }
    ys[last]
}
