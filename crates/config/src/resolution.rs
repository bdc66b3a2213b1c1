//! Atlas resolution policies.

use serde::{Deserialize, Serialize};

/// Default texel density (texels per world unit squared).
pub const DEFAULT_TEXEL_DENSITY: f32 = 16.0;

/// Default lower bound for a planned atlas dimension.
pub const DEFAULT_MIN_RESOLUTION: u32 = 128;

/// Default upper bound for a planned atlas dimension (before grouped doubling).
pub const DEFAULT_MAX_RESOLUTION: u32 = 8192;

/// How the grouped doubling and the aspect doubling interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoublingPolicy {
    /// Grouped mode doubles both axes and suppresses the aspect doubling.
    #[default]
    Exclusive,
    /// Both doublings apply; each axis is still capped at `max_resolution * 2`.
    Compound,
}

/// Surface-area driven sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityPolicy {
    /// Texels per world unit squared
    pub texel_density: f32,
    /// Smallest allowed dimension (power of two)
    pub min_resolution: u32,
    /// Largest allowed dimension before grouped doubling (power of two)
    pub max_resolution: u32,
    pub doubling: DoublingPolicy,
}

impl Default for DensityPolicy {
    fn default() -> Self {
        Self {
            texel_density: DEFAULT_TEXEL_DENSITY,
            min_resolution: DEFAULT_MIN_RESOLUTION,
            max_resolution: DEFAULT_MAX_RESOLUTION,
            doubling: DoublingPolicy::Exclusive,
        }
    }
}

/// Fixed square sizes picked by how many objects share the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieredPolicy {
    pub resolution_single: u32,
    pub resolution_small: u32,
    pub resolution_large: u32,
    /// Groups with fewer objects than this use `resolution_single`
    pub small_threshold: usize,
    /// Groups with fewer objects than this use `resolution_small`
    pub large_threshold: usize,
}

impl Default for TieredPolicy {
    fn default() -> Self {
        Self {
            resolution_single: 1024,
            resolution_small: 2048,
            resolution_large: 4096,
            small_threshold: 2,
            large_threshold: 7,
        }
    }
}

impl TieredPolicy {
    /// Pick the tier for a group of `object_count` objects.
    pub fn resolution_for(&self, object_count: usize) -> u32 {
        if object_count < self.small_threshold {
            self.resolution_single
        } else if object_count < self.large_threshold {
            self.resolution_small
        } else {
            self.resolution_large
        }
    }
}

/// Resolution policy handed to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolutionPolicy {
    Density(DensityPolicy),
    Tiered(TieredPolicy),
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        ResolutionPolicy::Density(DensityPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_selection() {
        let tiers = TieredPolicy::default();
        assert_eq!(tiers.resolution_for(1), 1024);
        assert_eq!(tiers.resolution_for(2), 2048);
        assert_eq!(tiers.resolution_for(6), 2048);
        assert_eq!(tiers.resolution_for(7), 4096);
    }

    #[test]
    fn test_policy_json_tag() {
        let json = serde_json::to_string(&ResolutionPolicy::default()).unwrap();
        assert!(json.contains("\"mode\":\"density\""));
    }
}
