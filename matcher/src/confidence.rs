//! The identity confidence-score formula.
//!
//! `confidence_score = clamp(avg(found_source_scores) * min(count / 10, 1.5), 0, 1)`.
//!
//! More corroborating sources raise confidence (the `min(count/10, 1.5)`
//! term), but the boost saturates at 1.5x once ten sources have weighed in,
//! so a flood of low-quality matches can't run away with the score.

/// Compute the aggregate confidence score for a set of per-source scores,
/// each expected in `[0, 1]`.
#[must_use]
pub fn aggregate_confidence(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    let count_boost = (scores.len() as f64 / 10.0).min(1.5);
    (avg * count_boost).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scores_yield_zero_confidence() {
        assert_eq!(aggregate_confidence(&[]), 0.0);
    }

    #[test]
    fn single_high_confidence_source_is_damped_by_the_count_boost() {
        // avg=1.0, count_boost=min(1/10, 1.5)=0.1 -> 0.1
        let score = aggregate_confidence(&[1.0]);
        assert!((score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn many_sources_saturate_the_count_boost_at_one_point_five() {
        let scores = vec![0.8; 20];
        // avg=0.8, count_boost=min(20/10, 1.5)=1.5 -> 1.2 clamped to 1.0
        let score = aggregate_confidence(&scores);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_always_within_bounds() {
        for score in &[aggregate_confidence(&[0.0]), aggregate_confidence(&[1.0; 50])] {
            assert!(*score >= 0.0 && *score <= 1.0);
        }
    }
}
