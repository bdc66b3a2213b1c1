//! Shared configuration for Lightbake
//!
//! This crate is the single source of truth for the settings a lightmap run
//! consumes: how atlases are sized, how objects are grouped, how the lightmap
//! UV channel is packed and what the renderer is asked to bake.

mod bake;
mod resolution;
mod unwrap;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use bake::*;
pub use resolution::*;
pub use unwrap::*;

/// Color-space tag written onto every created atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
    NonColor,
}

/// How selected objects are partitioned into bake groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// One group per material
    #[default]
    Automatic,
    /// Every selected object in one group sharing one atlas
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub policy: GroupingPolicy,
    /// Plan each material's atlas over every object in the scene using it
    pub factor_shared_materials: bool,
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A value `validate` had to change.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigAdjustment {
    pub field: &'static str,
    pub from: String,
    pub to: String,
}

/// Complete configuration for a lightmap run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightmapConfig {
    pub resolution: ResolutionPolicy,
    pub grouping: GroupingConfig,
    pub unwrap: UnwrapSettings,
    pub bake: BakeSettings,
    pub color_space: ColorSpace,
}

impl LightmapConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp bake and unwrap values into their valid ranges.
    ///
    /// Resolution bounds are sanitized by the planner itself, so only the
    /// renderer-facing values are checked here.
    pub fn validate(&mut self) -> Vec<ConfigAdjustment> {
        let mut adjustments = Vec::new();

        if self.bake.samples == 0 {
            adjustments.push(adjust("bake.samples", &self.bake.samples, &1));
            self.bake.samples = 1;
        }

        let threshold = self.bake.adaptive_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            let fixed = if threshold.is_finite() {
                threshold.clamp(0.0, 1.0)
            } else {
                BakeSettings::default().adaptive_threshold
            };
            adjustments.push(adjust("bake.adaptive_threshold", &threshold, &fixed));
            self.bake.adaptive_threshold = fixed;
        }

        if self.bake.adaptive_min_samples > self.bake.samples {
            adjustments.push(adjust(
                "bake.adaptive_min_samples",
                &self.bake.adaptive_min_samples,
                &self.bake.samples,
            ));
            self.bake.adaptive_min_samples = self.bake.samples;
        }

        let margin = self.unwrap.margin;
        if !margin.is_finite() || !(0.0..=1.0).contains(&margin) {
            let fixed = if margin.is_finite() {
                margin.clamp(0.0, 1.0)
            } else {
                UnwrapSettings::default().margin
            };
            adjustments.push(adjust("unwrap.margin", &margin, &fixed));
            self.unwrap.margin = fixed;
        }

        if let PackStrategy::AtlasPack { box_divisions } = &mut self.unwrap.strategy {
            if *box_divisions == 0 {
                adjustments.push(adjust("unwrap.strategy.box_divisions", &*box_divisions, &1));
                *box_divisions = 1;
            }
        }

        for adjustment in &adjustments {
            warn!(
                "Config value {} out of range ({} -> {})",
                adjustment.field, adjustment.from, adjustment.to
            );
        }

        adjustments
    }
}

fn adjust(field: &'static str, from: &impl ToString, to: &impl ToString) -> ConfigAdjustment {
    ConfigAdjustment {
        field,
        from: from.to_string(),
        to: to.to_string(),
    }
}
