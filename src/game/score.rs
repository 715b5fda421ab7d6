//! Scoring and time display

use crate::consts::MAX_SCORE;

/// `floor(10000 / (moves + time_secs / 10))`, or `MAX_SCORE` when both are zero.
///
/// Evaluated as `floor(100000 / (10 * moves + time_secs))` so no float
/// rounding creeps in.
pub fn compute_score(moves: u32, time_secs: u32) -> u32 {
    let denominator = 10 * u64::from(moves) + u64::from(time_secs);
    if denominator == 0 {
        return MAX_SCORE;
    }
    // At most 10 * MAX_SCORE, so it fits
    (10 * u64::from(MAX_SCORE) / denominator) as u32
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
