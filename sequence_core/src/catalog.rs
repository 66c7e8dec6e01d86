//! Movement catalog: built-in default, JSON loading and the catalog view seam.
//!
//! The sequencing engine never owns catalog storage. It reads a point-in-time
//! snapshot through [`CatalogView`].

use crate::filter;
use crate::types::*;
use crate::Result;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Source of candidate movements for one request
pub trait CatalogView {
    /// Fetch a snapshot of movements matching the filter, in catalog order
    fn fetch(&self, filter: &CatalogFilter) -> Result<Vec<Movement>>;
}

impl CatalogView for Catalog {
    fn fetch(&self, catalog_filter: &CatalogFilter) -> Result<Vec<Movement>> {
        let snapshot = filter::by_difficulty(self.movements.clone(), catalog_filter.difficulty);
        tracing::debug!(
            "Catalog snapshot: {} of {} movements at or below {}",
            snapshot.len(),
            self.movements.len(),
            catalog_filter.difficulty
        );
        Ok(snapshot)
    }
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of mat movements
///
/// **Note**: prefer `get_default_catalog()` outside of tests.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn entry(
    id: &str,
    name: &str,
    difficulty: DifficultyTier,
    pattern: MovementPattern,
    duration_seconds: u32,
    muscles: &[&str],
    focus: &[&str],
) -> Movement {
    Movement {
        id: id.into(),
        name: name.into(),
        difficulty,
        muscle_groups: muscles.iter().map(|m| m.to_string()).collect(),
        pattern: Some(pattern),
        duration_seconds,
        focus_areas: focus.iter().map(|f| f.to_string()).collect(),
    }
}

fn build_default_catalog_internal() -> Catalog {
    use DifficultyTier::*;
    use MovementPattern::*;

    let movements = vec![
        // ====================================================================
        // Beginner
        // ====================================================================
        entry("hundred", "The Hundred", Beginner, Flexion, 180,
            &["abs", "hip_flexors", "shoulders"], &["core", "endurance"]),
        entry("roll_up", "Roll Up", Beginner, Flexion, 150,
            &["abs", "hamstrings", "spine_flexors"], &["core", "flexibility"]),
        entry("single_leg_circles", "Single Leg Circles", Beginner, Rotation, 180,
            &["hip_flexors", "adductors", "quads"], &["hips", "mobility"]),
        entry("rolling_like_a_ball", "Rolling Like a Ball", Beginner, Flexion, 120,
            &["abs", "back_extensors"], &["core", "balance"]),
        entry("single_leg_stretch", "Single Leg Stretch", Beginner, Flexion, 180,
            &["abs", "quads", "glutes"], &["core"]),
        entry("double_leg_stretch", "Double Leg Stretch", Beginner, Flexion, 180,
            &["abs", "shoulders", "adductors"], &["core", "endurance"]),
        entry("spine_stretch_forward", "Spine Stretch Forward", Beginner, Flexion, 180,
            &["hamstrings", "back_extensors"], &["flexibility", "stretch"]),
        entry("saw", "The Saw", Beginner, Rotation, 180,
            &["obliques", "hamstrings", "lats"], &["flexibility", "stretch"]),
        entry("swan_prep", "Swan Prep", Beginner, Extension, 180,
            &["back_extensors", "glutes", "shoulders"], &["posture"]),
        entry("single_leg_kick", "Single Leg Kick", Beginner, Extension, 150,
            &["hamstrings", "glutes", "back_extensors"], &["posture", "strength"]),
        entry("side_kick_front_back", "Side Kick Front/Back", Beginner, Lateral, 210,
            &["abductors", "obliques", "quads"], &["hips", "balance"]),
        entry("side_kick_up_down", "Side Kick Up/Down", Beginner, Lateral, 180,
            &["abductors", "adductors"], &["hips"]),
        entry("pelvic_curl", "Pelvic Curl", Beginner, Extension, 210,
            &["glutes", "hamstrings", "back_extensors"], &["posture", "strength"]),
        entry("cat_cow", "Cat-Cow", Beginner, Flexion, 150,
            &["back_extensors", "abs", "neck"], &["mobility", "recovery"]),
        entry("chest_lift", "Chest Lift", Beginner, Flexion, 150,
            &["abs", "neck"], &["core"]),
        entry("swimming_prep", "Swimming Prep", Beginner, Balance, 210,
            &["back_extensors", "glutes", "shoulders"], &["balance", "posture"]),
        entry("mermaid", "Mermaid", Beginner, Lateral, 180,
            &["obliques", "lats"], &["flexibility", "stretch"]),
        entry("childs_pose", "Child's Pose", Beginner, Flexion, 150,
            &["back_extensors", "lats"], &["recovery", "stretch"]),
        entry("spine_twist", "Spine Twist", Beginner, Rotation, 180,
            &["obliques", "back_extensors"], &["core", "mobility"]),
        entry("seal", "The Seal", Beginner, Flexion, 150,
            &["abs", "adductors"], &["core", "balance"]),
        // ====================================================================
        // Intermediate
        // ====================================================================
        entry("open_leg_rocker", "Open Leg Rocker", Intermediate, Flexion, 150,
            &["abs", "hamstrings", "hip_flexors"], &["core", "balance"]),
        entry("corkscrew", "Corkscrew", Intermediate, Rotation, 180,
            &["obliques", "abs", "hip_flexors"], &["core"]),
        entry("criss_cross", "Criss Cross", Intermediate, Rotation, 150,
            &["obliques", "abs"], &["core"]),
        entry("double_leg_kick", "Double Leg Kick", Intermediate, Extension, 180,
            &["back_extensors", "hamstrings", "chest"], &["posture", "strength"]),
        entry("neck_pull", "Neck Pull", Intermediate, Flexion, 180,
            &["abs", "spine_flexors", "hamstrings"], &["core"]),
        entry("shoulder_bridge", "Shoulder Bridge", Intermediate, Extension, 210,
            &["glutes", "hamstrings", "abs"], &["strength", "posture"]),
        entry("side_bend", "Side Bend", Intermediate, Lateral, 150,
            &["obliques", "shoulders", "triceps"], &["strength", "balance"]),
        entry("swimming", "Swimming", Intermediate, Extension, 150,
            &["back_extensors", "glutes", "shoulders"], &["posture", "endurance"]),
        entry("leg_pull_front", "Leg Pull Front", Intermediate, Balance, 180,
            &["shoulders", "triceps", "abs", "glutes"], &["strength", "balance"]),
        // ====================================================================
        // Advanced
        // ====================================================================
        entry("teaser", "Teaser", Advanced, Flexion, 180,
            &["abs", "hip_flexors", "spine_flexors"], &["core", "balance"]),
        entry("jackknife", "Jackknife", Advanced, Flexion, 150,
            &["abs", "back_extensors", "shoulders"], &["core", "strength"]),
        entry("swan_dive", "Swan Dive", Advanced, Extension, 180,
            &["back_extensors", "glutes", "chest"], &["posture"]),
        entry("boomerang", "Boomerang", Advanced, Flexion, 210,
            &["abs", "hamstrings", "triceps"], &["core", "flexibility"]),
        entry("control_balance", "Control Balance", Advanced, Balance, 180,
            &["abs", "glutes", "hamstrings", "shoulders"], &["balance", "strength"]),
    ];

    Catalog { movements }
}

impl Catalog {
    /// Load a catalog from a JSON file of the form `{"movements": [...]}`
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&contents)?;
        tracing::info!(
            "Loaded catalog with {} movements from {:?}",
            catalog.movements.len(),
            path
        );
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Movement> {
        self.movements.iter().find(|m| m.id == id)
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for movement in &self.movements {
            if movement.id.is_empty() {
                errors.push("Movement has empty ID".to_string());
                continue;
            }
            if !seen.insert(movement.id.as_str()) {
                errors.push(format!("Duplicate movement ID '{}'", movement.id));
            }
            if movement.name.is_empty() {
                errors.push(format!("Movement '{}' has empty name", movement.id));
            }
            if movement.duration_seconds == 0 {
                errors.push(format!("Movement '{}' has zero duration", movement.id));
            }
        }

        errors
    }

    /// Movements whose overlap or progression checks would run on missing data
    pub fn incomplete(&self) -> Vec<DataGap> {
        let mut gaps = Vec::new();
        for movement in &self.movements {
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
}
