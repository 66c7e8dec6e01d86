//! Candidate pool filters.
//!
//! Each constraint is a separate filter applied before any selection work.
//! Catalog order is preserved by every filter.

use crate::{DifficultyTier, Movement, SequenceRequest};
use std::collections::BTreeSet;

/// Drop every movement whose id is excluded
pub fn without_excluded(movements: Vec<Movement>, excluded: &BTreeSet<String>) -> Vec<Movement> {
    if excluded.is_empty() {
        return movements;
    }
    let before = movements.len();
    let kept: Vec<Movement> = movements
        .into_iter()
        .filter(|m| !excluded.contains(&m.id))
        .collect();
    tracing::debug!("Exclusion filter removed {} movements", before - kept.len());
    kept
}

/// Keep movements at or below the requested tier
pub fn by_difficulty(movements: Vec<Movement>, difficulty: DifficultyTier) -> Vec<Movement> {
    movements
        .into_iter()
        .filter(|m| m.difficulty <= difficulty)
        .collect()
}

/// Drop movements already placed in the plan
pub fn without_used<'a>(
    movements: impl IntoIterator<Item = &'a Movement>,
    used: &BTreeSet<String>,
) -> Vec<&'a Movement> {
    movements
        .into_iter()
        .filter(|m| !used.contains(&m.id))
        .collect()
}

/// Keep only the first movement for each id, in catalog order
pub fn unique_ids(movements: Vec<Movement>) -> Vec<Movement> {
    let mut seen = BTreeSet::new();
    movements
        .into_iter()
        .filter(|m| {
            let first = seen.insert(m.id.clone());
            if !first {
                tracing::warn!("Catalog snapshot repeats movement '{}'; keeping the first", m.id);
            }
            first
        })
        .collect()
}

/// Apply the request's hard constraints in pipeline order: repeated ids,
/// exclusion, then difficulty
///
/// Focus areas are not a filter; they only weight selection.
pub fn candidate_pool(snapshot: Vec<Movement>, request: &SequenceRequest) -> Vec<Movement> {
    let pool = unique_ids(snapshot);
    let pool = without_excluded(pool, &request.excluded_movements);
    by_difficulty(pool, request.difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(id: &str, difficulty: DifficultyTier) -> Movement {
        Movement {
            id: id.into(),
            name: id.into(),
            difficulty,
            muscle_groups: Default::default(),
            pattern: None,
            duration_seconds: 60,
            focus_areas: Default::default(),
        }
    }

    fn ids(movements: &[Movement]) -> Vec<&str> {
        movements.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_without_excluded() {
        let moves = vec![
            movement("M1", DifficultyTier::Beginner),
            movement("M2", DifficultyTier::Beginner),
            movement("M3", DifficultyTier::Beginner),
        ];
        let excluded: BTreeSet<String> = ["M2".to_string()].into();

        assert_eq!(ids(&without_excluded(moves, &excluded)), vec!["M1", "M3"]);
    }

    #[test]
    fn test_by_difficulty_includes_easier_tiers() {
        let moves = vec![
            movement("easy", DifficultyTier::Beginner),
            movement("hard", DifficultyTier::Advanced),
            movement("mid", DifficultyTier::Intermediate),
        ];

        assert_eq!(
            ids(&by_difficulty(moves.clone(), DifficultyTier::Beginner)),
            vec!["easy"]
        );
        assert_eq!(
            ids(&by_difficulty(moves.clone(), DifficultyTier::Intermediate)),
            vec!["easy", "mid"]
        );
        assert_eq!(
            ids(&by_difficulty(moves, DifficultyTier::Advanced)),
            vec!["easy", "hard", "mid"]
        );
    }

    #[test]
    fn test_without_used() {
        let moves = vec![
            movement("M1", DifficultyTier::Beginner),
            movement("M2", DifficultyTier::Beginner),
        ];
        let used: BTreeSet<String> = ["M1".to_string()].into();

        let remaining = without_used(&moves, &used);

        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "M2");
    }

    #[test]
    fn test_unique_ids_keeps_first_occurrence() {
        let mut late = movement("M1", DifficultyTier::Beginner);
        late.name = "second copy".into();
        let moves = vec![
            movement("M1", DifficultyTier::Beginner),
            movement("M2", DifficultyTier::Beginner),
            late,
        ];

        let unique = unique_ids(moves);

        assert_eq!(ids(&unique), vec!["M1", "M2"]);
        assert_eq!(unique[0].name, "M1");
    }

    #[test]
    fn test_candidate_pool_applies_both() {
        let moves = vec![
            movement("M1", DifficultyTier::Beginner),
            movement("M2", DifficultyTier::Beginner),
            movement("M3", DifficultyTier::Advanced),
        ];
        let mut request = SequenceRequest::new(30, DifficultyTier::Beginner);
        request.excluded_movements.insert("M2".into());

        assert_eq!(ids(&candidate_pool(moves, &request)), vec!["M1"]);
    }
}
