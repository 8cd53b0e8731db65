//! SM-2 derived spaced repetition scheduler.
//!
//! Three pure operations: map an observed answer to a 0-5 recall
//! quality, advance the scheduling state, and turn an interval into a
//! calendar date. Persistence belongs to the caller.

use chrono::{Duration, NaiveDate};

use crate::types::ReviewState;

/// Minimum easiness factor, per SM-2.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Quality below which a review counts as a lapse.
pub const LAPSE_THRESHOLD: u8 = 3;

/// Derive a 0-5 recall quality from correctness and response time.
///
/// A wrong answer is always quality 0. A correct answer grades down
/// as the response time stretches past the expected time: at or under
/// 1x expected is 5, under 1.5x is 4, under 2x is 3, slower is 2.
/// Band boundaries are inclusive on the fast side.
pub fn quality_from_performance(is_correct: bool, time_spent_ms: u32, expected_time_ms: u32) -> u8 {
    if !is_correct {
        return 0;
    }

    // Content rows with a missing expected time come through as 0.
    let expected = expected_time_ms.max(1);
    let ratio = time_spent_ms as f64 / expected as f64;

    if ratio <= 1.0 {
        5
    } else if ratio <= 1.5 {
        4
    } else if ratio <= 2.0 {
        3
    } else {
        2
    }
}

/// Advance the scheduling state by one review of the given quality.
///
/// The easiness factor is always updated first (SM-2 formula, floored
/// at [`MIN_EASE_FACTOR`]); a lapse resets the repetition streak and
/// the interval but never the EF. On success the interval follows the
/// SM-2 ladder: 1 day, 6 days, then the previous interval scaled by
/// the new EF.
pub fn next_review_state(prev: &ReviewState, quality: u8) -> ReviewState {
    let quality = quality.min(5);

    let miss = (5 - quality) as f64;
    let ease_factor = (prev.ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR);

    if quality < LAPSE_THRESHOLD {
        return ReviewState {
            ease_factor,
            interval_days: 1,
            repetition: 0,
        };
    }

    let repetition = prev.repetition + 1;
    let interval_days = match repetition {
        1 => 1,
        2 => 6,
        // Grows from the interval that was actually waited, scaled by
        // the freshly updated EF.
        _ => ((prev.interval_days as f64 * ease_factor).round() as u32).max(1),
    };

    ReviewState {
        ease_factor,
        interval_days,
        repetition,
    }
}

/// Calendar date of the next review.
pub fn next_review_date(from: NaiveDate, interval_days: u32) -> NaiveDate {
    from + Duration::days(interval_days as i64)
}
