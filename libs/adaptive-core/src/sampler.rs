//! Weighted question selection.
//!
//! Turns mastery and recent-error signals into per-question selection
//! weights, then draws a duplicate-free subset by roulette-wheel
//! sampling. Both steps are pure; the caller supplies the RNG so
//! tests can seed it.

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use crate::types::{BlendWeights, Question};

/// Floor applied to every computed weight so no question is ever
/// starved out of the wheel.
pub const MIN_WEIGHT: f64 = 0.01;

/// Mastery assumed for tags with no record yet.
const DEFAULT_MASTERY: f64 = 0.5;

/// Compute a selection weight for each candidate question.
///
/// Per question, averaged over its tags:
/// - weakness term: `1 - mastery` (mastery defaults to 0.5), so weak
///   tags pull harder;
/// - difficulty term: peaks at difficulty 0.5, zero at the extremes;
/// - error term: recent wrong rate (defaults to 0).
///
/// The three terms are blended with `blend` and floored at
/// [`MIN_WEIGHT`]. Untagged questions use the tag defaults.
pub fn compute_weights(
    questions: &[Question],
    weaknesses: &HashMap<String, f64>,
    recent_wrong_rates: &HashMap<String, f64>,
    blend: &BlendWeights,
) -> HashMap<Uuid, f64> {
    questions
        .iter()
        .map(|question| {
            let (weakness_term, error_term) = if question.tags.is_empty() {
                (1.0 - DEFAULT_MASTERY, 0.0)
            } else {
                let n = question.tags.len() as f64;
                let weakness_sum: f64 = question
                    .tags
                    .iter()
                    .map(|tag| 1.0 - weaknesses.get(tag).copied().unwrap_or(DEFAULT_MASTERY))
                    .sum();
                let error_sum: f64 = question
                    .tags
                    .iter()
                    .map(|tag| recent_wrong_rates.get(tag).copied().unwrap_or(0.0))
                    .sum();
                (weakness_sum / n, error_sum / n)
            };

            let difficulty_term = 1.0 - (0.5 - question.difficulty).abs() * 2.0;

            let weight = blend.alpha * weakness_term
                + blend.beta * difficulty_term
                + blend.gamma * error_term;

            (question.id, weight.max(MIN_WEIGHT))
        })
        .collect()
}

/// Draw up to `count` distinct questions, probability proportional to
/// weight.
///
/// Each round draws `r ~ Uniform(0, total)`, walks the remaining
/// candidates in order subtracting weights until `r` goes
/// non-positive, removes the selected question, and re-totals.
/// Returns questions in selection order; an empty pool yields an
/// empty vec, and `count > pool` yields the whole pool.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    questions: &[Question],
    weights: &HashMap<Uuid, f64>,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut pool: Vec<&Question> = questions.iter().collect();
    let mut selected = Vec::with_capacity(count.min(pool.len()));

    while selected.len() < count && !pool.is_empty() {
        let total: f64 = pool
            .iter()
            .map(|q| weights.get(&q.id).copied().unwrap_or(MIN_WEIGHT))
            .sum();

        // Weights out of compute_weights are floored, but guard the
        // degenerate all-zero case anyway and fall back to pool order.
        let mut r = if total > 0.0 {
            rng.gen_range(0.0..total)
        } else {
            0.0
        };
        let mut chosen = pool.len() - 1;
        for (i, q) in pool.iter().enumerate() {
            r -= weights.get(&q.id).copied().unwrap_or(MIN_WEIGHT);
            if r <= 0.0 {
                chosen = i;
                break;
            }
        }

        selected.push(pool.remove(chosen).clone());
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn question(tags: &[&str], difficulty: f64) -> Question {
        Question {
            id: Uuid::new_v4(),
            difficulty,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn weights_are_deterministic() {
        let questions = vec![question(&["grammar"], 0.4), question(&["vocab"], 0.7)];
        let weaknesses = HashMap::from([("grammar".to_string(), 0.3)]);
        let errors = HashMap::from([("vocab".to_string(), 0.25)]);
        let blend = BlendWeights::default();

        let a = compute_weights(&questions, &weaknesses, &errors, &blend);
        let b = compute_weights(&questions, &weaknesses, &errors, &blend);
        assert_eq!(a, b);
    }

    #[test]
    fn weak_tag_outweighs_equal_difficulty_peer() {
        let grammar = question(&["grammar"], 0.5);
        let listening = question(&["listening"], 0.5);
        let weaknesses = HashMap::from([("grammar".to_string(), 0.3)]);

        let weights = compute_weights(
            &[grammar.clone(), listening.clone()],
            &weaknesses,
            &HashMap::new(),
            &BlendWeights::default(),
        );

        assert!(weights[&grammar.id] > weights[&listening.id]);
    }

    #[test]
    fn difficulty_term_peaks_at_moderate() {
        let moderate = question(&["t"], 0.5);
        let extreme = question(&["t"], 1.0);

        let weights = compute_weights(
            &[moderate.clone(), extreme.clone()],
            &HashMap::new(),
            &HashMap::new(),
            &BlendWeights::default(),
        );

        // Same tag signals, so the gap is exactly beta * 1.0.
        let gap = weights[&moderate.id] - weights[&extreme.id];
        assert!((gap - 0.3).abs() < 1e-9);
    }

    #[test]
    fn recent_errors_raise_the_weight() {
        let q = question(&["vocab"], 0.5);
        let base = compute_weights(
            std::slice::from_ref(&q),
            &HashMap::new(),
            &HashMap::new(),
            &BlendWeights::default(),
        );
        let with_errors = compute_weights(
            std::slice::from_ref(&q),
            &HashMap::new(),
            &HashMap::from([("vocab".to_string(), 0.8)]),
            &BlendWeights::default(),
        );
        assert!(with_errors[&q.id] > base[&q.id]);
    }

    #[test]
    fn fully_mastered_question_keeps_floor_weight() {
        let q = question(&["t"], 1.0);
        let weaknesses = HashMap::from([("t".to_string(), 1.0)]);
        let weights = compute_weights(
            std::slice::from_ref(&q),
            &weaknesses,
            &HashMap::new(),
            &BlendWeights {
                alpha: 1.0,
                beta: 0.0,
                gamma: 0.0,
            },
        );
        assert_eq!(weights[&q.id], MIN_WEIGHT);
    }

    #[test]
    fn untagged_question_gets_default_terms() {
        let tagged = question(&["t"], 0.5);
        let untagged = question(&[], 0.5);
        let weights = compute_weights(
            &[tagged.clone(), untagged.clone()],
            &HashMap::new(),
            &HashMap::new(),
            &BlendWeights::default(),
        );
        assert_eq!(weights[&tagged.id], weights[&untagged.id]);
    }

    #[test]
    fn sample_returns_distinct_questions() {
        let questions: Vec<Question> = (0..20).map(|_| question(&["t"], 0.5)).collect();
        let weights = compute_weights(
            &questions,
            &HashMap::new(),
            &HashMap::new(),
            &BlendWeights::default(),
        );

        let picked = sample_without_replacement(&questions, &weights, 12, &mut rng());
        assert_eq!(picked.len(), 12);

        let ids: HashSet<Uuid> = picked.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn oversized_request_drains_the_pool() {
        let questions: Vec<Question> = (0..5).map(|_| question(&["t"], 0.5)).collect();
        let weights = compute_weights(
            &questions,
            &HashMap::new(),
            &HashMap::new(),
            &BlendWeights::default(),
        );

        let picked = sample_without_replacement(&questions, &weights, 50, &mut rng());
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn empty_pool_yields_empty_result() {
        let picked = sample_without_replacement(&[], &HashMap::new(), 10, &mut rng());
        assert!(picked.is_empty());
    }

    #[test]
    fn selection_frequency_tracks_weights() {
        let heavy = question(&["t"], 0.5);
        let light = question(&["t"], 0.5);
        let questions = vec![heavy.clone(), light.clone()];
        let weights = HashMap::from([(heavy.id, 0.9), (light.id, 0.1)]);

        let mut rng = rng();
        let mut heavy_first = 0u32;
        let trials = 10_000;
        for _ in 0..trials {
            let picked = sample_without_replacement(&questions, &weights, 1, &mut rng);
            if picked[0].id == heavy.id {
                heavy_first += 1;
            }
        }

        // Expected 9000 first draws for the heavy question; allow a
        // generous band for sampling noise.
        let share = heavy_first as f64 / trials as f64;
        assert!(share > 0.87 && share < 0.93, "share was {share}");
    }
}
