//! Biomechanical progression validation.
//!
//! Flexion work opens the session; extension work, which loads the spine
//! more, must not come before the mandatory flexion movements:
//! - Mandatory flexion = the first `min_flexion_count` flexion movements
//! - Every extension before the last mandatory flexion is a violation
//! - No flexion in the sequence means no ordering constraint applies

use crate::{Movement, Violation};
use serde::{Deserialize, Serialize};

/// Ordering policy applied by the validator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressionPolicy {
    /// Number of flexion movements that must precede any extension work.
    /// Zero disables the check.
    pub min_flexion_count: usize,
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self {
            min_flexion_count: 1,
        }
    }
}

/// Validate a sequence with the default policy
pub fn validate(sequence: &[Movement]) -> Vec<Violation> {
    validate_with_policy(sequence, &ProgressionPolicy::default())
}

/// Validate a sequence against an explicit policy
///
/// Returns one violation per offending extension movement, in plan order.
/// The sequence is never modified.
pub fn validate_with_policy(sequence: &[Movement], policy: &ProgressionPolicy) -> Vec<Violation> {
    let Some(gate) = flexion_gate(sequence, policy.min_flexion_count) else {
        tracing::debug!("No flexion gate in sequence, progression check not applicable");
        return Vec::new();
    };

    let gate_id = &sequence[gate].id;

    sequence[..gate]
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_extension())
        .map(|(position, m)| Violation {
            position,
            movement_id: m.id.clone(),
            reason: format!(
                "extension movement '{}' at position {} precedes mandatory flexion '{}' at position {}",
                m.id, position, gate_id, gate
            ),
        })
        .collect()
}

/// Index of the last mandatory flexion movement, if the policy applies
pub(crate) fn flexion_gate(sequence: &[Movement], min_flexion_count: usize) -> Option<usize> {
    if min_flexion_count == 0 {
        return None;
    }

    sequence
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_flexion())
        .take(min_flexion_count)
        .map(|(i, _)| i)
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DifficultyTier, MovementPattern};

    fn movement(id: &str, pattern: Option<MovementPattern>) -> Movement {
        Movement {
            id: id.into(),
            name: id.into(),
            difficulty: DifficultyTier::Beginner,
            muscle_groups: Default::default(),
            pattern,
            duration_seconds: 60,
            focus_areas: Default::default(),
        }
    }

    fn flexion(id: &str) -> Movement {
        movement(id, Some(MovementPattern::Flexion))
    }

    fn extension(id: &str) -> Movement {
        movement(id, Some(MovementPattern::Extension))
    }

    fn rotation(id: &str) -> Movement {
        movement(id, Some(MovementPattern::Rotation))
    }

    #[test]
    fn test_extension_before_only_flexion() {
        let seq = vec![rotation("saw"), extension("swan"), flexion("hundred")];

        let violations = validate(&seq);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].position, 1);
        assert_eq!(violations[0].movement_id, "swan");
    }

    #[test]
    fn test_flexion_first_is_clean() {
        let seq = vec![flexion("hundred"), extension("swan"), rotation("saw")];
        assert!(validate(&seq).is_empty());
    }

    #[test]
    fn test_no_flexion_means_no_constraint() {
        let seq = vec![extension("swan"), extension("swimming"), rotation("saw")];
        assert!(validate(&seq).is_empty());
    }

    #[test]
    fn test_empty_sequence() {
        assert!(validate(&[]).is_empty());
    }

    #[test]
    fn test_missing_pattern_is_neutral() {
        let seq = vec![movement("unknown", None), flexion("hundred")];
        assert!(validate(&seq).is_empty());
    }

    #[test]
    fn test_min_flexion_count_moves_gate() {
        let seq = vec![
            flexion("hundred"),
            extension("swan"),
            flexion("roll_up"),
            extension("swimming"),
        ];
        let policy = ProgressionPolicy {
            min_flexion_count: 2,
        };

        let violations = validate_with_policy(&seq, &policy);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].movement_id, "swan");
        assert!(validate(&seq).is_empty());
    }

    #[test]
    fn test_policy_larger_than_flexion_count_uses_last_flexion() {
        let seq = vec![extension("swan"), flexion("hundred"), extension("swimming")];
        let policy = ProgressionPolicy {
            min_flexion_count: 3,
        };

        let violations = validate_with_policy(&seq, &policy);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].position, 0);
    }

    #[test]
    fn test_zero_policy_disables_check() {
        let seq = vec![extension("swan"), flexion("hundred")];
        let policy = ProgressionPolicy {
            min_flexion_count: 0,
        };

        assert!(validate_with_policy(&seq, &policy).is_empty());
    }

    #[test]
    fn test_multiple_violations_in_order() {
        let seq = vec![
            extension("swan"),
            rotation("saw"),
            extension("swimming"),
            flexion("hundred"),
        ];

        let positions: Vec<usize> = validate(&seq).iter().map(|v| v.position).collect();

        assert_eq!(positions, vec![0, 2]);
    }
}
