//! Atlas resolution planning
//!
//! Converts a group's surface area into power-of-two atlas dimensions. Larger
//! surfaces receive super-linearly more texels; grouped atlases are doubled and
//! elongated footprints get a doubled long axis.

use glam::Vec3;
use lightbake_config::{DensityPolicy, DoublingPolicy, ResolutionPolicy, TieredPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{
    ASPECT_DOUBLING_THRESHOLD, MAX_POLICY_RESOLUTION, MAX_SUPPORTED_RESOLUTION,
};
use crate::scene::Aabb;

/// Whether the atlas serves one object's material group or a manual group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanMode {
    Single,
    Grouped,
}

/// Planned atlas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasSpec {
    pub width: u32,
    pub height: u32,
}

impl AtlasSpec {
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }
}

/// Recoverable planning problems. The planner always produces a valid spec;
/// these report what it had to correct.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanningError {
    #[error("Degenerate surface area {area}, using the minimum resolution")]
    DegenerateArea { area: f32 },

    #[error("Invalid texel density {density}, using {fallback}")]
    InvalidDensity { density: f32, fallback: f32 },

    #[error("Resolution {value} is not a usable power of two, using {corrected}")]
    InvalidResolution { value: u32, corrected: u32 },

    #[error("Minimum resolution {min} exceeds maximum {max}, bounds swapped")]
    InvertedRange { min: u32, max: u32 },
}

/// Result of planning one atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub spec: AtlasSpec,
    pub warnings: Vec<PlanningError>,
}

fn sanitize_dimension(value: u32, limit: u32, warnings: &mut Vec<PlanningError>) -> u32 {
    let corrected = value.clamp(1, limit).next_power_of_two().min(limit);
    if corrected != value {
        warnings.push(PlanningError::InvalidResolution { value, corrected });
    }
    corrected
}

/// Bring a density policy into range: positive finite density, power-of-two
/// bounds no larger than half the supported atlas size, and `min <= max`.
pub fn sanitize_policy(policy: &DensityPolicy) -> (DensityPolicy, Vec<PlanningError>) {
    let mut warnings = Vec::new();
    let mut sanitized = *policy;

    if !sanitized.texel_density.is_finite() || sanitized.texel_density <= 0.0 {
        let fallback = DensityPolicy::default().texel_density;
        warnings.push(PlanningError::InvalidDensity {
            density: sanitized.texel_density,
            fallback,
        });
        sanitized.texel_density = fallback;
    }

    sanitized.min_resolution =
        sanitize_dimension(sanitized.min_resolution, MAX_POLICY_RESOLUTION, &mut warnings);
    sanitized.max_resolution =
        sanitize_dimension(sanitized.max_resolution, MAX_POLICY_RESOLUTION, &mut warnings);

    if sanitized.min_resolution > sanitized.max_resolution {
        warnings.push(PlanningError::InvertedRange {
            min: sanitized.min_resolution,
            max: sanitized.max_resolution,
        });
        std::mem::swap(&mut sanitized.min_resolution, &mut sanitized.max_resolution);
    }

    (sanitized, warnings)
}

/// Square resolution for `area` before any doubling.
///
/// `base = sqrt(area * density)`, scaled by `log2(max(base, 2))`, rounded up to
/// a power of two and clamped to `[min, max]`. Bounds must already be sanitized.
pub fn base_resolution(area: f32, density: f32, min: u32, max: u32) -> u32 {
    let base = (area * density).sqrt();
    if !base.is_finite() || base <= 0.0 {
        return min;
    }
    let scaled = base * base.max(2.0).log2();
    let resolution = if scaled >= max as f32 {
        max
    } else {
        (scaled.ceil() as u32).max(1).next_power_of_two()
    };
    resolution.clamp(min, max)
}

/// The two dominant extents of a bounding box, in x/y/z axis order.
pub fn footprint(bounds: &Aabb) -> (f32, f32) {
    let extents: Vec3 = bounds.extents().abs();
    let axes = [extents.x, extents.y, extents.z];
    // Drop the smallest axis; on ties the later axis is dropped.
    let mut smallest = 2;
    for axis in (0..2).rev() {
        if axes[axis] < axes[smallest] {
            smallest = axis;
        }
    }
    let mut kept = (0..3).filter(|axis| *axis != smallest).map(|axis| axes[axis]);
    let width = kept.next().unwrap_or(0.0);
    let height = kept.next().unwrap_or(0.0);
    (width, height)
}

/// Plan an atlas from surface area with the density policy.
pub fn plan_resolution(
    area: f32,
    policy: &DensityPolicy,
    mode: PlanMode,
    footprint: Option<(f32, f32)>,
) -> Plan {
    let (policy, mut warnings) = sanitize_policy(policy);

    let area = if area.is_finite() && area > 0.0 {
        area
    } else {
        warnings.push(PlanningError::DegenerateArea { area });
        0.0
    };

    let resolution = base_resolution(
        area,
        policy.texel_density,
        policy.min_resolution,
        policy.max_resolution,
    );

    let mut spec = AtlasSpec::square(resolution);
    if mode == PlanMode::Grouped {
        spec.width *= 2;
        spec.height *= 2;
    }

    let aspect_applies = mode == PlanMode::Single || policy.doubling == DoublingPolicy::Compound;
    if let (true, Some((width, height))) = (aspect_applies, footprint) {
        if width > height * ASPECT_DOUBLING_THRESHOLD {
            spec.width *= 2;
        } else if height > width * ASPECT_DOUBLING_THRESHOLD {
            spec.height *= 2;
        }
    }

    let cap = policy.max_resolution * 2;
    spec.width = spec.width.min(cap);
    spec.height = spec.height.min(cap);

    debug!(
        "Planned {}x{} atlas for area {:.3} ({:?}, base {})",
        spec.width, spec.height, area, mode, resolution
    );

    Plan { spec, warnings }
}

/// Plan a square atlas by how many objects share it.
pub fn plan_tiered(object_count: usize, policy: &TieredPolicy) -> Plan {
    let mut warnings = Vec::new();
    let size = sanitize_dimension(
        policy.resolution_for(object_count),
        MAX_SUPPORTED_RESOLUTION,
        &mut warnings,
    );
    debug!("Planned {size}x{size} tiered atlas for {object_count} objects");
    Plan {
        spec: AtlasSpec::square(size),
        warnings,
    }
}

/// Plan an atlas with whichever policy is configured.
pub fn plan_group(
    area: f32,
    object_count: usize,
    policy: &ResolutionPolicy,
    mode: PlanMode,
    footprint: Option<(f32, f32)>,
) -> Plan {
    let plan = match policy {
        ResolutionPolicy::Density(density) => plan_resolution(area, density, mode, footprint),
        ResolutionPolicy::Tiered(tiers) => plan_tiered(object_count, tiers),
    };
    for warning in &plan.warnings {
        warn!("Resolution planning: {warning}");
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_policy() -> DensityPolicy {
        DensityPolicy::default()
    }

    #[test]
    fn test_two_cubes_example() {
        let plan = plan_resolution(12.0, &default_policy(), PlanMode::Single, Some((1.0, 1.0)));
        assert_eq!(plan.spec, AtlasSpec::square(128));
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_base_resolution_growth() {
        // sqrt(1000 * 16) = 126.5, * log2(126.5) = 883 -> 1024
        assert_eq!(base_resolution(1000.0, 16.0, 128, 8192), 1024);
        assert_eq!(base_resolution(1.0e9, 16.0, 128, 8192), 8192);
        assert_eq!(base_resolution(0.0, 16.0, 128, 8192), 128);
    }

    #[test]
    fn test_monotonic_in_area() {
        let policy = default_policy();
        let mut previous = 0;
        let mut area = 0.01;
        while area < 1.0e8 {
            let plan = plan_resolution(area, &policy, PlanMode::Single, None);
            assert!(plan.spec.width >= previous, "area {area}");
            previous = plan.spec.width;
            area *= 1.37;
        }
    }

    #[test]
    fn test_power_of_two_within_bounds() {
        let footprints = [None, Some((1.0, 1.0)), Some((10.0, 1.0)), Some((1.0, 10.0))];
        for doubling in [DoublingPolicy::Exclusive, DoublingPolicy::Compound] {
            let policy = DensityPolicy {
                doubling,
                ..default_policy()
            };
            for mode in [PlanMode::Single, PlanMode::Grouped] {
                for footprint in footprints {
                    for area in [0.0, 0.5, 6.0, 120.0, 5.0e3, 1.0e7] {
                        let spec = plan_resolution(area, &policy, mode, footprint).spec;
                        for dim in [spec.width, spec.height] {
                            assert!(dim.is_power_of_two());
                            assert!(dim >= policy.min_resolution);
                            assert!(dim <= policy.max_resolution * 2);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_grouped_doubles_both_axes() {
        let plan = plan_resolution(12.0, &default_policy(), PlanMode::Grouped, Some((4.0, 1.0)));
        assert_eq!(plan.spec, AtlasSpec::square(256));
    }

    #[test]
    fn test_compound_doubling_applies_aspect() {
        let policy = DensityPolicy {
            doubling: DoublingPolicy::Compound,
            ..default_policy()
        };
        let plan = plan_resolution(12.0, &policy, PlanMode::Grouped, Some((4.0, 1.0)));
        assert_eq!(plan.spec, AtlasSpec { width: 512, height: 256 });
    }

    #[test]
    fn test_aspect_doubling_long_axis() {
        let policy = default_policy();
        let wide = plan_resolution(12.0, &policy, PlanMode::Single, Some((3.0, 1.0))).spec;
        assert_eq!(wide, AtlasSpec { width: 256, height: 128 });
        let tall = plan_resolution(12.0, &policy, PlanMode::Single, Some((1.0, 1.6))).spec;
        assert_eq!(tall, AtlasSpec { width: 128, height: 256 });
        let near_square = plan_resolution(12.0, &policy, PlanMode::Single, Some((1.4, 1.0))).spec;
        assert_eq!(near_square, AtlasSpec::square(128));
    }

    #[test]
    fn test_degenerate_area_warns() {
        let plan = plan_resolution(f32::NAN, &default_policy(), PlanMode::Single, None);
        assert_eq!(plan.spec, AtlasSpec::square(128));
        assert!(matches!(plan.warnings[0], PlanningError::DegenerateArea { .. }));
    }

    #[test]
    fn test_sanitize_policy() {
        let policy = DensityPolicy {
            texel_density: -1.0,
            min_resolution: 4096,
            max_resolution: 1000,
            doubling: DoublingPolicy::Exclusive,
        };
        let (sanitized, warnings) = sanitize_policy(&policy);
        assert_eq!(sanitized.texel_density, 16.0);
        assert_eq!(sanitized.min_resolution, 1024);
        assert_eq!(sanitized.max_resolution, 4096);
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_largest_bound_leaves_room_for_doubling() {
        let policy = DensityPolicy {
            max_resolution: MAX_SUPPORTED_RESOLUTION,
            ..default_policy()
        };
        let plan = plan_resolution(1.0e9, &policy, PlanMode::Grouped, Some((1.0, 1.0)));
        assert_eq!(plan.spec, AtlasSpec::square(MAX_SUPPORTED_RESOLUTION));
        assert_eq!(
            plan.warnings,
            vec![PlanningError::InvalidResolution {
                value: MAX_SUPPORTED_RESOLUTION,
                corrected: MAX_POLICY_RESOLUTION,
            }]
        );

        let compound = DensityPolicy {
            doubling: DoublingPolicy::Compound,
            ..policy
        };
        let spec = plan_resolution(1.0e9, &compound, PlanMode::Grouped, Some((8.0, 1.0))).spec;
        assert!(spec.width <= MAX_SUPPORTED_RESOLUTION);
        assert!(spec.height <= MAX_SUPPORTED_RESOLUTION);
    }

    #[test]
    fn test_footprint_uses_dominant_axes() {
        let flat = Aabb {
            min: Vec3::ZERO,
            max: Vec3::new(4.0, 0.1, 2.0),
        };
        assert_eq!(footprint(&flat), (4.0, 2.0));
        let cube = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        assert_eq!(footprint(&cube), (1.0, 1.0));
    }

    #[test]
    fn test_tiered_plan() {
        let tiers = TieredPolicy::default();
        assert_eq!(plan_tiered(1, &tiers).spec, AtlasSpec::square(1024));
        assert_eq!(plan_tiered(3, &tiers).spec, AtlasSpec::square(2048));
        let odd = TieredPolicy {
            resolution_single: 1000,
            ..tiers
        };
        let plan = plan_tiered(1, &odd);
        assert_eq!(plan.spec, AtlasSpec::square(1024));
        assert_eq!(plan.warnings.len(), 1);
    }
}
