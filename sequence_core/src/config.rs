//! Configuration file support for seqplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/seqplan/config.toml`.

use crate::progression::ProgressionPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default = "default_sections")]
    pub sections: Vec<SectionConfig>,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            sections: default_sections(),
            catalog: CatalogConfig::default(),
        }
    }
}

/// How surviving safety findings are treated
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    /// Return the plan and list the findings in the QA report
    Report,
    /// Fail the request with `Error::UnsafePlan`
    Reject,
}

/// Sequence builder parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f64,

    #[serde(default = "default_duration_tolerance_percent")]
    pub duration_tolerance_percent: f64,

    #[serde(default = "default_repair_budget")]
    pub repair_budget: usize,

    #[serde(default = "default_min_flexion_count")]
    pub min_flexion_count: usize,

    #[serde(default = "default_violation_policy")]
    pub overlap_violations: ViolationPolicy,

    #[serde(default = "default_violation_policy")]
    pub progression_violations: ViolationPolicy,

    /// Focus labels that mark a movement as suitable for the cooldown segment
    #[serde(default = "default_recovery_tags")]
    pub recovery_tags: Vec<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: default_overlap_threshold(),
            duration_tolerance_percent: default_duration_tolerance_percent(),
            repair_budget: default_repair_budget(),
            min_flexion_count: default_min_flexion_count(),
            overlap_violations: default_violation_policy(),
            progression_violations: default_violation_policy(),
            recovery_tags: default_recovery_tags(),
        }
    }
}

impl PlannerConfig {
    pub fn progression_policy(&self) -> ProgressionPolicy {
        ProgressionPolicy {
            min_flexion_count: self.min_flexion_count,
        }
    }
}

/// Fixed session section with per-tier durations
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SectionConfig {
    pub name: String,
    pub beginner_seconds: u32,
    pub intermediate_seconds: u32,
    pub advanced_seconds: u32,
    /// Classes shorter than this skip the section entirely
    #[serde(default)]
    pub min_class_minutes: Option<u32>,
    /// Dropped from the overhead when the plan appends its own cooldown movements
    #[serde(default)]
    pub replaced_by_cooldown_movements: bool,
}

/// Catalog source configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// JSON catalog file; the built-in catalog is used when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_overlap_threshold() -> f64 {
    crate::overlap::DEFAULT_OVERLAP_THRESHOLD
}

fn default_duration_tolerance_percent() -> f64 {
    10.0
}

fn default_repair_budget() -> usize {
    8
}

fn default_min_flexion_count() -> usize {
    1
}

fn default_violation_policy() -> ViolationPolicy {
    ViolationPolicy::Report
}

fn default_recovery_tags() -> Vec<String> {
    vec!["recovery".into(), "stretch".into()]
}

fn section(name: &str, beginner: u32, intermediate: u32, advanced: u32) -> SectionConfig {
    SectionConfig {
        name: name.into(),
        beginner_seconds: beginner,
        intermediate_seconds: intermediate,
        advanced_seconds: advanced,
        min_class_minutes: None,
        replaced_by_cooldown_movements: false,
    }
}

fn default_sections() -> Vec<SectionConfig> {
    vec![
        section("preparation", 120, 120, 90),
        section("warm_up", 240, 240, 180),
        SectionConfig {
            replaced_by_cooldown_movements: true,
            ..section("cool_down", 180, 180, 120)
        },
        SectionConfig {
            min_class_minutes: Some(31),
            ..section("meditation", 300, 300, 300)
        },
        section("home_care", 120, 120, 120),
    ]
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        base.join("seqplan").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let planner = &self.planner;
        if !(planner.overlap_threshold > 0.0 && planner.overlap_threshold <= 100.0) {
            return Err(Error::Config(format!(
                "overlap_threshold must be in (0, 100], got {}",
                planner.overlap_threshold
            )));
        }
        if !(planner.duration_tolerance_percent >= 0.0) {
            return Err(Error::Config(format!(
                "duration_tolerance_percent must be non-negative, got {}",
                planner.duration_tolerance_percent
            )));
        }

        let mut names = HashSet::new();
        for section in &self.sections {
            if section.name.is_empty() {
                return Err(Error::Config("section with empty name".into()));
            }
            if !names.insert(section.name.as_str()) {
                return Err(Error::Config(format!(
                    "section '{}' configured twice",
                    section.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.planner.overlap_threshold, 50.0);
        assert_eq!(config.planner.duration_tolerance_percent, 10.0);
        assert_eq!(config.planner.min_flexion_count, 1);
        assert_eq!(config.planner.overlap_violations, ViolationPolicy::Report);
        assert_eq!(config.sections.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.planner.progression_violations = ViolationPolicy::Reject;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(
            loaded.planner.progression_violations,
            ViolationPolicy::Reject
        );
        assert_eq!(loaded.sections, config.sections);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[planner]
repair_budget = 3
overlap_violations = "reject"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.planner.repair_budget, 3);
        assert_eq!(config.planner.overlap_violations, ViolationPolicy::Reject);
        assert_eq!(config.planner.min_flexion_count, 1); // default
        assert_eq!(config.sections.len(), 5); // default
    }

    #[test]
    fn test_custom_sections_replace_defaults() {
        let toml_str = r#"
[[sections]]
name = "preparation"
beginner_seconds = 60
intermediate_seconds = 60
advanced_seconds = 60
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sections.len(), 1);
        assert_eq!(config.sections[0].min_class_minutes, None);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.planner.overlap_threshold = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_sections() {
        let mut config = Config::default();
        let copy = config.sections[0].clone();
        config.sections.push(copy);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
