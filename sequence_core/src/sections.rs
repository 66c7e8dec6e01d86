//! Section providers backed by configuration.
//!
//! The real section owners (preparation, warm-up, cool-down, meditation,
//! home care) live outside the engine. These adapters expose their configured
//! durations through [`SectionProvider`].

use crate::config::SectionConfig;
use crate::duration::SectionProvider;
use crate::DifficultyTier;

/// Section whose duration comes from the `[[sections]]` config table
#[derive(Clone, Debug)]
pub struct ConfiguredSection {
    config: SectionConfig,
}

impl ConfiguredSection {
    pub fn new(config: SectionConfig) -> Self {
        Self { config }
    }

    /// One provider per configured section, in config order
    pub fn from_configs(configs: &[SectionConfig]) -> Vec<Self> {
        configs.iter().cloned().map(Self::new).collect()
    }
}

impl SectionProvider for ConfiguredSection {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn duration_seconds(&self, difficulty: DifficultyTier, target_minutes: u32) -> u32 {
        if let Some(min) = self.config.min_class_minutes {
            if target_minutes < min {
                return 0;
            }
        }
        match difficulty {
            DifficultyTier::Beginner => self.config.beginner_seconds,
            DifficultyTier::Intermediate => self.config.intermediate_seconds,
            DifficultyTier::Advanced => self.config.advanced_seconds,
        }
    }

    fn replaced_by_cooldown_movements(&self) -> bool {
        self.config.replaced_by_cooldown_movements
    }
}

/// Section with a single known duration, whatever the tier
#[derive(Clone, Debug)]
pub struct FixedSection {
    name: String,
    seconds: u32,
}

impl FixedSection {
    pub fn new(name: impl Into<String>, seconds: u32) -> Self {
        Self {
            name: name.into(),
            seconds,
        }
    }
}

impl SectionProvider for FixedSection {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration_seconds(&self, _difficulty: DifficultyTier, _target_minutes: u32) -> u32 {
        self.seconds
    }
}
