//! Core domain types for the session sequencing engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Movements and their biomechanical properties
//! - Sequence requests (typed, unknown fields rejected)
//! - Planned sessions, overlap statistics and safety findings

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// Movement Types
// ============================================================================

/// Difficulty tier of a movement or a requested class
///
/// Tiers are ordered: a request at a given tier may use movements at that tier
/// or any easier one.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    #[serde(alias = "Beginner")]
    Beginner,
    #[serde(alias = "Intermediate")]
    Intermediate,
    #[serde(alias = "Advanced")]
    Advanced,
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DifficultyTier::Beginner => "Beginner",
            DifficultyTier::Intermediate => "Intermediate",
            DifficultyTier::Advanced => "Advanced",
        };
        f.write_str(label)
    }
}

impl FromStr for DifficultyTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(DifficultyTier::Beginner),
            "intermediate" => Ok(DifficultyTier::Intermediate),
            "advanced" => Ok(DifficultyTier::Advanced),
            other => Err(Error::InvalidRequest(format!(
                "unknown difficulty level '{}'",
                other
            ))),
        }
    }
}

/// Biomechanical category of a movement
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    Flexion,
    Extension,
    Rotation,
    Lateral,
    Balance,
}

impl fmt::Display for MovementPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MovementPattern::Flexion => "flexion",
            MovementPattern::Extension => "extension",
            MovementPattern::Rotation => "rotation",
            MovementPattern::Lateral => "lateral",
            MovementPattern::Balance => "balance",
        };
        f.write_str(label)
    }
}

/// A catalogued movement (e.g., "The Hundred")
///
/// `muscle_groups` and `pattern` default to empty/absent when a catalog record
/// omits them. The builder reports such records as data gaps instead of
/// treating them as safe.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Movement {
    pub id: String,
    pub name: String,
    pub difficulty: DifficultyTier,
    #[serde(default)]
    pub muscle_groups: BTreeSet<String>,
    #[serde(default)]
    pub pattern: Option<MovementPattern>,
    pub duration_seconds: u32,
    #[serde(default)]
    pub focus_areas: BTreeSet<String>,
}

impl Movement {
    pub fn is_flexion(&self) -> bool {
        self.pattern == Some(MovementPattern::Flexion)
    }

    pub fn is_extension(&self) -> bool {
        self.pattern == Some(MovementPattern::Extension)
    }

    /// Number of requested focus areas this movement covers
    pub fn focus_weight(&self, focus_areas: &BTreeSet<String>) -> usize {
        self.focus_areas.intersection(focus_areas).count()
    }
}

/// The complete movement catalog, in catalog order
///
/// Order matters: it is the final tie-break of the sequence builder.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub movements: Vec<Movement>,
}

/// Filter handed to a catalog view when fetching candidates
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogFilter {
    pub difficulty: DifficultyTier,
    pub focus_areas: BTreeSet<String>,
}

// ============================================================================
// Request Types
// ============================================================================

/// A request to plan one session
///
/// Unknown fields are rejected when deserializing so a misspelled constraint
/// can never be silently ignored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SequenceRequest {
    pub target_duration_minutes: u32,
    #[serde(alias = "difficulty_level")]
    pub difficulty: DifficultyTier,
    #[serde(default)]
    pub focus_areas: BTreeSet<String>,
    #[serde(default)]
    pub required_movements: Vec<String>,
    #[serde(default)]
    pub excluded_movements: BTreeSet<String>,
    /// Number of recovery movements appended by the engine itself
    #[serde(default)]
    pub cooldown_movements: usize,
}

impl SequenceRequest {
    pub fn new(target_duration_minutes: u32, difficulty: DifficultyTier) -> Self {
        Self {
            target_duration_minutes,
            difficulty,
            focus_areas: BTreeSet::new(),
            required_movements: Vec::new(),
            excluded_movements: BTreeSet::new(),
            cooldown_movements: 0,
        }
    }

    /// Load a request from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let request: SequenceRequest = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded sequence request from {:?}", path);
        Ok(request)
    }

    /// Structural checks that need no catalog access
    pub fn validate(&self) -> Result<()> {
        if self.target_duration_minutes == 0 {
            return Err(Error::InvalidRequest(
                "target duration must be positive".into(),
            ));
        }

        let conflicting: Vec<&str> = self
            .required_movements
            .iter()
            .filter(|id| self.excluded_movements.contains(*id))
            .map(String::as_str)
            .collect();
        if !conflicting.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "movements both required and excluded: {}",
                conflicting.join(", ")
            )));
        }

        let mut seen = BTreeSet::new();
        for id in &self.required_movements {
            if !seen.insert(id) {
                return Err(Error::InvalidRequest(format!(
                    "movement '{}' is required more than once",
                    id
                )));
            }
        }

        Ok(())
    }

    pub fn target_seconds(&self) -> u32 {
        self.target_duration_minutes * 60
    }

    pub fn catalog_filter(&self) -> CatalogFilter {
        CatalogFilter {
            difficulty: self.difficulty,
            focus_areas: self.focus_areas.clone(),
        }
    }
}

// ============================================================================
// Plan and Finding Types
// ============================================================================

/// Statistics for one ordered pair of movements
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OverlapPair {
    pub first_id: String,
    pub first_name: String,
    pub second_id: String,
    pub second_name: String,
    pub shared: BTreeSet<String>,
    pub overlap_count: usize,
    pub overlap_percentage: f64,
    pub passed: bool,
}

/// An ordering finding from the progression validator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub position: usize,
    pub movement_id: String,
    pub reason: String,
}

/// Achieved duration fell outside the accepted window
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DurationWarning {
    pub target_seconds: u32,
    pub actual_seconds: u32,
    pub tolerance_percent: f64,
    pub deviation_percent: f64,
}

/// Catalog field missing on a planned movement
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    MuscleGroups,
    Pattern,
}

/// A planned movement whose checks could not run on complete data
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataGap {
    pub movement_id: String,
    pub missing: MissingField,
}

/// Part of the session a planned movement belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Main,
    Cooldown,
}

/// A movement placed at a position in the plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlannedMovement {
    pub position: usize,
    pub segment: Segment,
    pub movement: Movement,
}

/// The ordered session produced by the sequence builder
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SequencePlan {
    pub movements: Vec<PlannedMovement>,
    pub target_seconds: u32,
    pub movement_seconds: u32,
    pub overhead_seconds: u32,
    pub violations: Vec<Violation>,
    pub duration_warning: Option<DurationWarning>,
    pub data_gaps: Vec<DataGap>,
}

impl SequencePlan {
    /// Movement time plus external section overhead
    pub fn total_seconds(&self) -> u32 {
        self.movement_seconds.saturating_add(self.overhead_seconds)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.movements
            .iter()
            .map(|p| p.movement.id.as_str())
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.movements.iter().any(|p| p.movement.id == id)
    }

    /// Movements in plan order, without placement metadata
    pub fn sequence(&self) -> Vec<Movement> {
        self.movements.iter().map(|p| p.movement.clone()).collect()
    }

    pub fn segment(&self, segment: Segment) -> impl Iterator<Item = &PlannedMovement> {
        self.movements.iter().filter(move |p| p.segment == segment)
    }
}
