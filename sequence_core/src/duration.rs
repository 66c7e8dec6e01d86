//! Duration fitting for the movement portion of a session.
//!
//! Fixed sections (preparation, warm-up, cool-down, meditation, home care) are
//! owned by external providers and queried once per request. The fitter only
//! turns the remaining time into a movement count estimate; the builder then
//! re-verifies against the real durations it selected.

use crate::{DifficultyTier, Error, Movement, Result};

/// A fixed session section owned outside the sequencing engine
pub trait SectionProvider {
    fn name(&self) -> &str;

    /// Seconds this section occupies for the given tier and class length
    fn duration_seconds(&self, difficulty: DifficultyTier, target_minutes: u32) -> u32;

    /// True for a cool-down section that planned cooldown movements stand in for
    fn replaced_by_cooldown_movements(&self) -> bool {
        false
    }
}

/// Sum the overhead of all section providers for one request
///
/// With `cooldown_movements > 0` the plan carries its own cooldown, so
/// sections replaced by it are left out.
pub fn total_overhead(
    sections: &[&dyn SectionProvider],
    difficulty: DifficultyTier,
    target_minutes: u32,
    cooldown_movements: usize,
) -> u32 {
    sections
        .iter()
        .filter(|section| {
            let replaced = cooldown_movements > 0 && section.replaced_by_cooldown_movements();
            if replaced {
                tracing::debug!(
                    "Section '{}' replaced by {} cooldown movement(s)",
                    section.name(),
                    cooldown_movements
                );
            }
            !replaced
        })
        .map(|section| {
            let seconds = section.duration_seconds(difficulty, target_minutes);
            tracing::debug!("Section '{}' takes {}s", section.name(), seconds);
            seconds
        })
        .fold(0u32, u32::saturating_add)
}

/// Seconds left for movements once fixed overhead is taken out
///
/// Fails with [`Error::DurationTooShort`] when nothing is left; the error names
/// the first whole-minute class length that leaves room after the overhead.
pub fn available_seconds(target_minutes: u32, fixed_overhead_seconds: u32) -> Result<u32> {
    let target_seconds = target_minutes.saturating_mul(60);
    if target_seconds <= fixed_overhead_seconds {
        tracing::warn!(
            "Requested {} min cannot hold {}s of fixed overhead",
            target_minutes,
            fixed_overhead_seconds
        );
        return Err(Error::DurationTooShort {
            requested_minutes: target_minutes,
            minimum_minutes: fixed_overhead_seconds / 60 + 1,
        });
    }
    Ok(target_seconds - fixed_overhead_seconds)
}

/// Estimate how many movements fit in the time left after fixed overhead
///
/// This is `floor(available / avg)`, an estimate only: real movement lengths
/// vary, so callers must re-check the duration they actually selected.
pub fn fit(
    target_minutes: u32,
    fixed_overhead_seconds: u32,
    avg_movement_seconds: f64,
) -> Result<usize> {
    if !(avg_movement_seconds > 0.0) {
        return Err(Error::InvalidRequest(format!(
            "average movement duration must be positive, got {}",
            avg_movement_seconds
        )));
    }

    let available = available_seconds(target_minutes, fixed_overhead_seconds)?;
    let count = (f64::from(available) / avg_movement_seconds).floor() as usize;
    tracing::debug!(
        "Fitted {} movements into {}s (avg {:.1}s)",
        count,
        available,
        avg_movement_seconds
    );
    Ok(count)
}

/// Mean duration of a candidate pool, `None` for an empty pool
pub fn average_duration(movements: &[Movement]) -> Option<f64> {
    if movements.is_empty() {
        return None;
    }
    let total: u64 = movements.iter().map(|m| u64::from(m.duration_seconds)).sum();
    Some(total as f64 / movements.len() as f64)
}

/// Lower and upper bound in seconds of the accepted window around `target`
pub fn tolerance_bounds(target_seconds: u32, tolerance_percent: f64) -> (f64, f64) {
    let target = f64::from(target_seconds);
    let slack = target * tolerance_percent / 100.0;
    (target - slack, target + slack)
}

/// Signed deviation of `actual` from `target`, as a percentage of target
pub fn deviation_percent(actual_seconds: u32, target_seconds: u32) -> f64 {
    if target_seconds == 0 {
        return 0.0;
    }
    (f64::from(actual_seconds) - f64::from(target_seconds)) / f64::from(target_seconds) * 100.0
}

pub fn within_tolerance(actual_seconds: u32, target_seconds: u32, tolerance_percent: f64) -> bool {
    let (lower, upper) = tolerance_bounds(target_seconds, tolerance_percent);
    let actual = f64::from(actual_seconds);
    actual >= lower && actual <= upper
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, u32);

    impl SectionProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn duration_seconds(&self, _difficulty: DifficultyTier, _target_minutes: u32) -> u32 {
            self.1
        }

        fn replaced_by_cooldown_movements(&self) -> bool {
            self.0 == "cool_down"
        }
    }

    #[test]
    fn test_fit_uses_remaining_time() {
        // 60 min class, 11 min overhead, 150s movements → 2940 / 150 = 19.6
        let count = fit(60, 660, 150.0).unwrap();
        assert_eq!(count, 19);
    }

    #[test]
    fn test_fit_too_short() {
        let err = fit(10, 660, 120.0).unwrap_err();
        match err {
            Error::DurationTooShort {
                requested_minutes,
                minimum_minutes,
            } => {
                assert_eq!(requested_minutes, 10);
                assert_eq!(minimum_minutes, 12);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_fit_exact_overhead_is_too_short() {
        assert!(matches!(
            fit(11, 660, 60.0),
            Err(Error::DurationTooShort { .. })
        ));
    }

    #[test]
    fn test_fit_rejects_zero_average() {
        assert!(matches!(fit(30, 0, 0.0), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_total_overhead_sums_providers() {
        let prep = Fixed("preparation", 120);
        let warmup = Fixed("warm_up", 240);
        let cooldown = Fixed("cool_down", 180);
        let sections: Vec<&dyn SectionProvider> = vec![&prep, &warmup, &cooldown];

        assert_eq!(total_overhead(&sections, DifficultyTier::Beginner, 60, 0), 540);
        assert_eq!(total_overhead(&[], DifficultyTier::Beginner, 60, 0), 0);
    }

    #[test]
    fn test_cooldown_movements_replace_cool_down_section() {
        let prep = Fixed("preparation", 120);
        let cooldown = Fixed("cool_down", 180);
        let sections: Vec<&dyn SectionProvider> = vec![&prep, &cooldown];

        assert_eq!(total_overhead(&sections, DifficultyTier::Beginner, 60, 0), 300);
        assert_eq!(total_overhead(&sections, DifficultyTier::Beginner, 60, 2), 120);
    }

    #[test]
    fn test_total_overhead_saturates() {
        let huge = Fixed("huge", u32::MAX);
        let more = Fixed("more", 60);
        let sections: Vec<&dyn SectionProvider> = vec![&huge, &more];

        assert_eq!(
            total_overhead(&sections, DifficultyTier::Beginner, 60, 0),
            u32::MAX
        );
    }

    #[test]
    fn test_available_seconds() {
        assert_eq!(available_seconds(60, 660).unwrap(), 2940);
        assert!(matches!(
            available_seconds(5, 300),
            Err(Error::DurationTooShort {
                minimum_minutes: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_average_duration() {
        assert_eq!(average_duration(&[]), None);

        let make = |seconds: u32| Movement {
            id: format!("m{}", seconds),
            name: "m".into(),
            difficulty: DifficultyTier::Beginner,
            muscle_groups: Default::default(),
            pattern: None,
            duration_seconds: seconds,
            focus_areas: Default::default(),
        };
        assert_eq!(average_duration(&[make(120), make(180)]), Some(150.0));
    }

    #[test]
    fn test_tolerance_window() {
        assert!(within_tolerance(3600, 3600, 10.0));
        assert!(within_tolerance(3240, 3600, 10.0));
        assert!(within_tolerance(3960, 3600, 10.0));
        assert!(!within_tolerance(3239, 3600, 10.0));
        assert!(!within_tolerance(2040, 3600, 10.0));
    }

    #[test]
    fn test_deviation_percent() {
        assert_eq!(deviation_percent(3960, 3600), 10.0);
        assert_eq!(deviation_percent(1800, 3600), -50.0);
        assert_eq!(deviation_percent(10, 0), 0.0);
    }
}
