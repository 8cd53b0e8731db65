//! Per-tag mastery tracking.
//!
//! Maintains an exponentially smoothed mastery estimate per tag from
//! graded attempts. The update is deliberately attempt-by-attempt:
//! when one submission touches the same tag several times, each
//! attempt recomputes the empirical success rate and nudges the score
//! again, so repeated misses within a batch compound instead of
//! collapsing into a single step.

use std::collections::HashMap;

use crate::types::{AttemptResult, WeaknessRecord};

/// Default smoothing factor for the mastery update.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Apply a batch of graded attempts to the current mastery records.
///
/// Returns only the records that were touched. Records are
/// default-initialized to `{score: 0.5, 0, 0}` on first sight of a
/// tag. Results with an empty tag list contribute nothing. The score
/// moves toward the running success rate by `learning_rate` per
/// attempt and stays inside [0, 1].
pub fn update_weaknesses(
    current: &HashMap<String, WeaknessRecord>,
    results: &[AttemptResult],
    learning_rate: f64,
) -> HashMap<String, WeaknessRecord> {
    let mut updated: HashMap<String, WeaknessRecord> = HashMap::new();

    for result in results {
        for tag in &result.tags {
            let record = updated
                .entry(tag.clone())
                .or_insert_with(|| current.get(tag).cloned().unwrap_or_default());

            record.total_attempts += 1;
            if result.is_correct {
                record.correct_count += 1;
            }

            let success_rate = record.correct_count as f64 / record.total_attempts as f64;
            record.score += learning_rate * (success_rate - record.score);
            record.score = record.score.clamp(0.0, 1.0);
        }
    }

    updated
}
