//! Sequence builder for planning one session.
//!
//! Pipeline, in fixed order:
//! 1. Validate the request (no catalog access yet)
//! 2. Sum fixed section overhead and check there is time left
//! 3. Fetch one catalog snapshot, then apply exclusion and difficulty filters
//! 4. Place required movements, then fill greedily by lowest overlap
//! 5. Re-check the achieved duration against real movement lengths
//! 6. Append the cooldown segment from movements not yet used
//! 7. Validate progression and repair with a bounded number of swaps
//!
//! Selection is deterministic: ties go to focus weight, then catalog order.

use crate::catalog::CatalogView;
use crate::config::{PlannerConfig, ViolationPolicy};
use crate::duration::{self, SectionProvider};
use crate::progression::{self, ProgressionPolicy};
use crate::{filter, overlap};
use crate::{
    DataGap, DurationWarning, Error, MissingField, Movement, PlannedMovement, Result, Segment,
    SequencePlan, SequenceRequest,
};
use std::collections::BTreeSet;

/// Plan a session against a catalog view and the fixed-section providers
///
/// Request errors are raised before the catalog is queried.
pub fn build_sequence(
    request: &SequenceRequest,
    catalog: &dyn CatalogView,
    sections: &[&dyn SectionProvider],
    config: &PlannerConfig,
) -> Result<SequencePlan> {
    request.validate()?;

    let overhead = duration::total_overhead(
        sections,
        request.difficulty,
        request.target_duration_minutes,
        request.cooldown_movements,
    );
    duration::available_seconds(request.target_duration_minutes, overhead)?;

    tracing::info!(
        "Planning {} min {} session ({}s fixed overhead)",
        request.target_duration_minutes,
        request.difficulty,
        overhead
    );

    let snapshot = catalog.fetch(&request.catalog_filter())?;
    build_from_snapshot(request, snapshot, overhead, config)
}

/// Plan a session from an already fetched catalog snapshot
pub fn build_from_snapshot(
    request: &SequenceRequest,
    snapshot: Vec<Movement>,
    overhead_seconds: u32,
    config: &PlannerConfig,
) -> Result<SequencePlan> {
    request.validate()?;
    duration::available_seconds(request.target_duration_minutes, overhead_seconds)?;

    let pool = filter::candidate_pool(snapshot, request);
    tracing::info!("Candidate pool holds {} movements", pool.len());

    let required = resolve_required(&pool, request)?;
    let recovery_tags: BTreeSet<String> = config.recovery_tags.iter().cloned().collect();
    let cooldown_count = request.cooldown_movements;

    let Some(avg) = duration::average_duration(&pool) else {
        let needed = required.len().max(1).saturating_add(cooldown_count);
        return Err(Error::InsufficientCandidates {
            needed,
            available: 0,
            shortfall: needed,
        });
    };

    // Required and cooldown movements alone must fit in the pool before any
    // time is reserved for them
    let reserved_count = required.len().saturating_add(cooldown_count);
    if pool.len() < reserved_count {
        tracing::warn!(
            "Pool of {} cannot hold {} required and {} cooldown movements",
            pool.len(),
            required.len(),
            cooldown_count
        );
        return Err(Error::InsufficientCandidates {
            needed: reserved_count,
            available: pool.len(),
            shortfall: reserved_count - pool.len(),
        });
    }

    let reserve = cooldown_reserve(&pool, cooldown_count, &recovery_tags);
    let fixed_seconds = overhead_seconds.saturating_add(reserve);
    let fitted = duration::fit(request.target_duration_minutes, fixed_seconds, avg)?;
    let main_count = fitted.max(required.len());
    let needed = main_count.saturating_add(cooldown_count);
    if pool.len() < needed {
        tracing::warn!(
            "Pool of {} cannot supply {} movements",
            pool.len(),
            needed
        );
        return Err(Error::InsufficientCandidates {
            needed,
            available: pool.len(),
            shortfall: needed - pool.len(),
        });
    }

    // Main segment
    let mut selector = Selector::new(&pool, &request.focus_areas, config.overlap_threshold);
    let mut main: Vec<usize> = Vec::with_capacity(main_count);
    for &idx in &required {
        selector.take(idx);
        main.push(idx);
    }
    while main.len() < main_count {
        match selector.next_after(main.last().copied()) {
            Some(idx) => {
                selector.take(idx);
                main.push(idx);
            }
            None => break,
        }
    }

    // The count is only an estimate: check against the real durations
    let target_seconds = request.target_seconds();
    let (lower, upper) =
        duration::tolerance_bounds(target_seconds, config.duration_tolerance_percent);
    let planned_total = |main: &[usize]| {
        f64::from(fixed_seconds) + f64::from(seconds_of(main.iter().map(|&i| &pool[i])))
    };

    while planned_total(&main) < lower && selector.remaining() > cooldown_count {
        match selector.next_after(main.last().copied()) {
            Some(idx) => {
                tracing::debug!("Topping up with '{}'", pool[idx].id);
                selector.take(idx);
                main.push(idx);
            }
            None => break,
        }
    }
    while planned_total(&main) > upper {
        match main.last().copied() {
            Some(idx)
                if !required.contains(&idx)
                    && planned_total(&main) - f64::from(pool[idx].duration_seconds) >= lower =>
            {
                tracing::debug!("Trimming '{}'", pool[idx].id);
                main.pop();
                selector.release(idx);
            }
            _ => break,
        }
    }

    let mut sequence: Vec<Movement> = main.iter().map(|&i| pool[i].clone()).collect();
    let mut segments = vec![Segment::Main; sequence.len()];

    // Cooldown never sees movements already placed
    let cooldown = select_cooldown(
        &pool,
        &sequence,
        cooldown_count,
        &recovery_tags,
        config.overlap_threshold,
    );
    segments.extend(std::iter::repeat(Segment::Cooldown).take(cooldown.len()));
    sequence.extend(cooldown);

    // Progression check always runs; repair is bounded
    let policy = config.progression_policy();
    let swaps = repair_progression(&mut sequence, &segments, &policy, config.repair_budget);
    if swaps > 0 {
        tracing::info!("Progression repair applied {} swap(s)", swaps);
    }
    let violations = progression::validate_with_policy(&sequence, &policy);
    if !violations.is_empty() {
        tracing::warn!(
            "{} progression violation(s) survived repair",
            violations.len()
        );
    }

    let overlap_failures = overlap::consecutive_pairs(&sequence, config.overlap_threshold)
        .iter()
        .filter(|p| !p.passed)
        .count();
    if overlap_failures > 0 {
        tracing::warn!("{} consecutive pair(s) exceed the overlap threshold", overlap_failures);
    }

    let rejected_overlap =
        config.overlap_violations == ViolationPolicy::Reject && overlap_failures > 0;
    let rejected_progression =
        config.progression_violations == ViolationPolicy::Reject && !violations.is_empty();
    if rejected_overlap || rejected_progression {
        return Err(Error::UnsafePlan {
            overlap_failures,
            progression_violations: violations.len(),
        });
    }

    let movement_seconds = seconds_of(sequence.iter());
    let actual = movement_seconds.saturating_add(overhead_seconds);
    let duration_warning =
        if duration::within_tolerance(actual, target_seconds, config.duration_tolerance_percent) {
            None
        } else {
            let deviation = duration::deviation_percent(actual, target_seconds);
            tracing::warn!(
                "Achieved {}s is {:.1}% off the {}s target",
                actual,
                deviation,
                target_seconds
            );
            Some(DurationWarning {
                target_seconds,
                actual_seconds: actual,
                tolerance_percent: config.duration_tolerance_percent,
                deviation_percent: deviation,
            })
        };

    let data_gaps = data_gaps(&sequence);
    if !data_gaps.is_empty() {
        tracing::warn!(
            "{} planned movement field(s) missing; checks ran on incomplete data",
            data_gaps.len()
        );
    }

    let movements: Vec<PlannedMovement> = sequence
        .into_iter()
        .zip(segments)
        .enumerate()
        .map(|(position, (movement, segment))| PlannedMovement {
            position,
            segment,
            movement,
        })
        .collect();

    tracing::info!(
        "Planned {} movements, {}s of movement + {}s overhead",
        movements.len(),
        movement_seconds,
        overhead_seconds
    );

    Ok(SequencePlan {
        movements,
        target_seconds,
        movement_seconds,
        overhead_seconds,
        violations,
        duration_warning,
        data_gaps,
    })
}

/// Pool indices of required movements, in request order
fn resolve_required(pool: &[Movement], request: &SequenceRequest) -> Result<Vec<usize>> {
    request
        .required_movements
        .iter()
        .map(|id| {
            pool.iter().position(|m| &m.id == id).ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "required movement '{}' is not available at {} difficulty",
                    id, request.difficulty
                ))
            })
        })
        .collect()
}

fn seconds_of<'a>(movements: impl Iterator<Item = &'a Movement>) -> u32 {
    movements
        .map(|m| m.duration_seconds)
        .fold(0, u32::saturating_add)
}

fn is_recovery(movement: &Movement, recovery_tags: &BTreeSet<String>) -> bool {
    !movement.focus_areas.is_disjoint(recovery_tags)
}

/// Seconds set aside for the cooldown before the main segment is fitted
fn cooldown_reserve(pool: &[Movement], count: usize, recovery_tags: &BTreeSet<String>) -> u32 {
    if count == 0 {
        return 0;
    }
    let recovery: Vec<Movement> = pool
        .iter()
        .filter(|m| is_recovery(m, recovery_tags))
        .cloned()
        .collect();
    let basis = if recovery.len() >= count {
        &recovery[..]
    } else {
        pool
    };
    let avg = duration::average_duration(basis).unwrap_or(0.0);
    (avg * count as f64).round() as u32
}

/// Greedy picker over the candidate pool
struct Selector<'a> {
    pool: &'a [Movement],
    weights: Vec<usize>,
    used: Vec<bool>,
    threshold: f64,
}

impl<'a> Selector<'a> {
    fn new(pool: &'a [Movement], focus_areas: &BTreeSet<String>, threshold: f64) -> Self {
        Self {
            pool,
            weights: pool.iter().map(|m| m.focus_weight(focus_areas)).collect(),
            used: vec![false; pool.len()],
            threshold,
        }
    }

    fn take(&mut self, idx: usize) {
        self.used[idx] = true;
    }

    fn release(&mut self, idx: usize) {
        self.used[idx] = false;
    }

    fn remaining(&self) -> usize {
        self.used.iter().filter(|u| !**u).count()
    }

    /// Lowest overlap against the last placed movement, then highest focus
    /// weight, then catalog order
    fn next_after(&self, last: Option<usize>) -> Option<usize> {
        let last = last.map(|i| &self.pool[i]);
        let (idx, pct) = self
            .pool
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.used[*i])
            .map(|(i, m)| (i, last.map_or(0.0, |l| overlap::percentage_between(l, m))))
            .min_by(|(ia, pa), (ib, pb)| {
                pa.total_cmp(pb)
                    .then_with(|| self.weights[*ib].cmp(&self.weights[*ia]))
                    .then_with(|| ia.cmp(ib))
            })?;

        if pct >= self.threshold {
            if let Some(last) = last {
                tracing::warn!(
                    "No candidate below {}% overlap after '{}'; accepting '{}' at {:.1}%",
                    self.threshold,
                    last.id,
                    self.pool[idx].id,
                    pct
                );
            }
        }
        Some(idx)
    }
}

/// Pick cooldown movements from the pool minus everything already placed
///
/// Recovery-tagged movements come first, then lowest overlap against the
/// previous movement, then catalog order.
fn select_cooldown(
    pool: &[Movement],
    placed: &[Movement],
    count: usize,
    recovery_tags: &BTreeSet<String>,
    threshold: f64,
) -> Vec<Movement> {
    if count == 0 {
        return Vec::new();
    }

    let used: BTreeSet<String> = placed.iter().map(|m| m.id.clone()).collect();
    let mut candidates = filter::without_used(pool, &used);
    let mut chosen: Vec<Movement> = Vec::with_capacity(count);

    while chosen.len() < count {
        let last = chosen.last().or_else(|| placed.last());
        let best = candidates
            .iter()
            .enumerate()
            .map(|(pos, m)| {
                let pct = last.map_or(0.0, |l| overlap::percentage_between(l, m));
                (pos, !is_recovery(m, recovery_tags), pct)
            })
            .min_by(|(pa, ra, oa), (pb, rb, ob)| {
                ra.cmp(rb)
                    .then_with(|| oa.total_cmp(ob))
                    .then_with(|| pa.cmp(pb))
            });

        let Some((pos, not_recovery, pct)) = best else {
            tracing::warn!(
                "Cooldown short by {} movement(s): pool exhausted",
                count - chosen.len()
            );
            break;
        };
        let movement = candidates.remove(pos);
        if not_recovery {
            tracing::debug!("No recovery movement left; cooldown uses '{}'", movement.id);
        }
        if pct >= threshold {
            tracing::debug!("Cooldown '{}' overlaps {:.1}%", movement.id, pct);
        }
        chosen.push(movement.clone());
    }

    chosen
}

/// Swap offending extension movements later until the validator is satisfied
///
/// Each attempt swaps the earliest violation with the first later flexion
/// movement in the same segment, or failing that the first later
/// non-extension one. Returns the number of swaps made.
fn repair_progression(
    sequence: &mut [Movement],
    segments: &[Segment],
    policy: &ProgressionPolicy,
    budget: usize,
) -> usize {
    let mut swaps = 0;
    for _ in 0..budget {
        let violations = progression::validate_with_policy(sequence, policy);
        let Some(first) = violations.first() else {
            break;
        };
        let p = first.position;
        let later = |pred: fn(&Movement) -> bool| {
            (p + 1..sequence.len()).find(|&q| segments[q] == segments[p] && pred(&sequence[q]))
        };
        let target = later(Movement::is_flexion).or_else(|| later(|m| !m.is_extension()));

        match target {
            Some(q) => {
                tracing::debug!(
                    "Swapping '{}' (position {}) with '{}' (position {})",
                    sequence[p].id,
                    p,
                    sequence[q].id,
                    q
                );
                sequence.swap(p, q);
                swaps += 1;
            }
            None => {
                tracing::warn!("No eligible swap for '{}' at position {}", sequence[p].id, p);
                break;
            }
        }
    }
    swaps
}

fn data_gaps(sequence: &[Movement]) -> Vec<DataGap> {
    let mut gaps = Vec::new();
    for movement in sequence {
        if movement.muscle_groups.is_empty() {
            gaps.push(DataGap {
                movement_id: movement.id.clone(),
                missing: MissingField::MuscleGroups,
            });
        }
        if movement.pattern.is_none() {
            gaps.push(DataGap {
                movement_id: movement.id.clone(),
                missing: MissingField::Pattern,
            });
        }
    }
    gaps
}
