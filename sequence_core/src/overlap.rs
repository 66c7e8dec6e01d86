//! Muscle overlap evaluation between consecutive movements.
//!
//! Overlap is asymmetric: it measures how much of the *later* movement's work
//! was already done by the earlier one.

use crate::{Movement, OverlapPair};

/// Overlap percentage at or above which a pair fails
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 50.0;

/// Evaluate a pair against the default 50% threshold
pub fn evaluate(a: &Movement, b: &Movement) -> OverlapPair {
    evaluate_with_threshold(a, b, DEFAULT_OVERLAP_THRESHOLD)
}

/// Evaluate a pair against a configured threshold
///
/// The denominator is `b`'s muscle count; an empty set on `b` yields 0%.
/// Passing requires strictly less than `threshold`.
pub fn evaluate_with_threshold(a: &Movement, b: &Movement, threshold: f64) -> OverlapPair {
    let shared: std::collections::BTreeSet<String> = a
        .muscle_groups
        .intersection(&b.muscle_groups)
        .cloned()
        .collect();
    let overlap_count = shared.len();
    let overlap_percentage = overlap_percentage(overlap_count, b.muscle_groups.len());

    OverlapPair {
        first_id: a.id.clone(),
        first_name: a.name.clone(),
        second_id: b.id.clone(),
        second_name: b.name.clone(),
        shared,
        overlap_count,
        overlap_percentage,
        passed: overlap_percentage < threshold,
    }
}

/// Evaluate every adjacent pair of a sequence, in order
pub fn consecutive_pairs(sequence: &[Movement], threshold: f64) -> Vec<OverlapPair> {
    sequence
        .windows(2)
        .map(|w| evaluate_with_threshold(&w[0], &w[1], threshold))
        .collect()
}

/// Percentage without building a pair; used by the builder's greedy scan
pub(crate) fn percentage_between(a: &Movement, b: &Movement) -> f64 {
    let count = a.muscle_groups.intersection(&b.muscle_groups).count();
    overlap_percentage(count, b.muscle_groups.len())
}

fn overlap_percentage(shared: usize, later_total: usize) -> f64 {
    if later_total == 0 {
        0.0
    } else {
        shared as f64 / later_total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DifficultyTier;

    fn movement(id: &str, groups: &[&str]) -> Movement {
        Movement {
            id: id.into(),
            name: id.to_uppercase(),
            difficulty: DifficultyTier::Beginner,
            muscle_groups: groups.iter().map(|g| g.to_string()).collect(),
            pattern: None,
            duration_seconds: 60,
            focus_areas: Default::default(),
        }
    }

    #[test]
    fn test_three_of_four_shared_fails() {
        let a = movement("a", &["abs", "obliques", "hip_flexors", "glutes"]);
        let b = movement("b", &["abs", "obliques", "hip_flexors", "quads"]);

        let pair = evaluate(&a, &b);

        assert_eq!(pair.overlap_count, 3);
        assert_eq!(pair.overlap_percentage, 75.0);
        assert!(!pair.passed);
        assert_eq!(pair.first_name, "A");
        assert_eq!(pair.second_name, "B");
    }

    #[test]
    fn test_exactly_half_fails() {
        let a = movement("a", &["abs", "obliques"]);
        let b = movement("b", &["abs", "glutes"]);

        let pair = evaluate(&a, &b);

        assert_eq!(pair.overlap_percentage, 50.0);
        assert!(!pair.passed);
    }

    #[test]
    fn test_denominator_is_later_movement() {
        let a = movement("a", &["abs"]);
        let b = movement("b", &["abs", "glutes", "hamstrings", "back"]);

        assert_eq!(evaluate(&a, &b).overlap_percentage, 25.0);
        assert_eq!(evaluate(&b, &a).overlap_percentage, 100.0);
    }

    #[test]
    fn test_empty_later_movement_is_zero() {
        let a = movement("a", &["abs"]);
        let b = movement("b", &[]);

        let pair = evaluate(&a, &b);

        assert_eq!(pair.overlap_count, 0);
        assert_eq!(pair.overlap_percentage, 0.0);
        assert!(pair.passed);
    }

    #[test]
    fn test_formula_holds_across_pairs() {
        let moves = vec![
            movement("a", &["abs", "obliques", "back"]),
            movement("b", &["back", "glutes"]),
            movement("c", &["glutes", "hamstrings", "back"]),
            movement("d", &[]),
        ];

        for a in &moves {
            for b in &moves {
                let pair = evaluate(a, b);
                let expected = if b.muscle_groups.is_empty() {
                    0.0
                } else {
                    a.muscle_groups.intersection(&b.muscle_groups).count() as f64
                        / b.muscle_groups.len() as f64
                        * 100.0
                };
                assert_eq!(pair.overlap_percentage, expected);
                assert_eq!(pair.overlap_percentage, percentage_between(a, b));
            }
        }
    }

    #[test]
    fn test_consecutive_pairs_in_order() {
        let moves = vec![
            movement("a", &["abs"]),
            movement("b", &["back"]),
            movement("c", &["back", "glutes"]),
        ];

        let pairs = consecutive_pairs(&moves, DEFAULT_OVERLAP_THRESHOLD);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].first_id, "a");
        assert_eq!(pairs[1].second_id, "c");
        assert_eq!(pairs[1].overlap_percentage, 50.0);
        assert!(consecutive_pairs(&moves[..1], DEFAULT_OVERLAP_THRESHOLD).is_empty());
    }

    #[test]
    fn test_custom_threshold() {
        let a = movement("a", &["abs", "obliques"]);
        let b = movement("b", &["abs", "glutes"]);

        assert!(evaluate_with_threshold(&a, &b, 60.0).passed);
    }

    // Property-based tests using proptest
    use proptest::prelude::*;

    const GROUPS: [&str; 8] = [
        "abs", "back", "glutes", "hamstrings", "obliques", "shoulders", "neck", "hip_flexors",
    ];

    fn groups() -> impl Strategy<Value = Vec<&'static str>> {
        proptest::sample::subsequence(GROUPS.to_vec(), 0..=GROUPS.len())
    }

    proptest! {
        #[test]
        fn test_overlap_formula_properties(
            first in groups(),
            second in groups(),
            threshold in 1.0f64..=100.0
        ) {
            let a = movement("a", &first);
            let b = movement("b", &second);

            let pair = evaluate_with_threshold(&a, &b, threshold);

            let shared = a.muscle_groups.intersection(&b.muscle_groups).count();
            prop_assert_eq!(pair.overlap_count, shared);
            prop_assert_eq!(pair.shared.len(), shared);
            if second.is_empty() {
                prop_assert_eq!(pair.overlap_percentage, 0.0);
            } else {
                prop_assert_eq!(
                    pair.overlap_percentage,
                    shared as f64 / second.len() as f64 * 100.0
                );
            }
            prop_assert!(pair.overlap_percentage >= 0.0 && pair.overlap_percentage <= 100.0);
            prop_assert_eq!(pair.passed, pair.overlap_percentage < threshold);
        }
    }
}
