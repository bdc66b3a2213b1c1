//! Lightmap UV packing settings.

use serde::{Deserialize, Serialize};

/// Packing strategy and its tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PackStrategy {
    /// Box-projected faces packed into a grid of `box_divisions` cells per axis
    AtlasPack { box_divisions: u32 },
    /// Angle-limited projection followed by island packing
    SmartProject {
        angle_limit_deg: f32,
        island_margin: f32,
        area_weight: f32,
    },
    /// Conformal unwrap of each island
    AngleBasedUnwrap { fill_holes: bool, correct_aspect: bool },
}

impl Default for PackStrategy {
    fn default() -> Self {
        PackStrategy::AtlasPack { box_divisions: 12 }
    }
}

impl PackStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            PackStrategy::AtlasPack { .. } => "atlas-pack",
            PackStrategy::SmartProject { .. } => "smart-project",
            PackStrategy::AngleBasedUnwrap { .. } => "angle-based-unwrap",
        }
    }

    pub fn smart_project() -> Self {
        PackStrategy::SmartProject {
            angle_limit_deg: 66.0,
            island_margin: 0.0,
            area_weight: 0.0,
        }
    }

    pub fn angle_based() -> Self {
        PackStrategy::AngleBasedUnwrap {
            fill_holes: true,
            correct_aspect: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnwrapSettings {
    pub strategy: PackStrategy,
    /// Space between islands as a fraction of the packing cell (0-1)
    pub margin: f32,
}

impl Default for UnwrapSettings {
    fn default() -> Self {
        Self {
            strategy: PackStrategy::default(),
            margin: 0.2,
        }
    }
}
