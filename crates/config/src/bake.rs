//! Renderer bake settings.

use serde::{Deserialize, Serialize};

/// What the renderer writes into the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BakeType {
    #[default]
    Diffuse,
}

/// Light contributions included in the bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassFilter {
    pub direct: bool,
    pub indirect: bool,
    /// Multiply in the surface albedo (off for pure lightmaps)
    pub color: bool,
}

impl Default for PassFilter {
    fn default() -> Self {
        Self {
            direct: true,
            indirect: true,
            color: false,
        }
    }
}

impl PassFilter {
    /// True when no pass is selected, which makes the bake write nothing.
    pub fn is_empty(&self) -> bool {
        !self.direct && !self.indirect && !self.color
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denoiser {
    #[default]
    Optix,
    OpenImageDenoise,
}

/// Auxiliary passes fed to the denoiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenoisingPasses {
    #[default]
    Albedo,
    AlbedoNormal,
}

/// OpenImageDenoise prefilter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenoisePrefilter {
    #[default]
    Accurate,
    Fast,
    None,
}

/// OpenImageDenoise quality mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenoiseQuality {
    #[default]
    High,
    Balanced,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseSettings {
    pub enabled: bool,
    pub denoiser: Denoiser,
    pub input_passes: DenoisingPasses,
    /// Only read by OpenImageDenoise
    pub prefilter: DenoisePrefilter,
    /// Only read by OpenImageDenoise
    pub quality: DenoiseQuality,
}

impl Default for DenoiseSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            denoiser: Denoiser::Optix,
            input_passes: DenoisingPasses::Albedo,
            prefilter: DenoisePrefilter::Accurate,
            quality: DenoiseQuality::High,
        }
    }
}

/// Settings applied to the renderer before each group's bake call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeSettings {
    pub bake_type: BakeType,
    pub passes: PassFilter,
    /// Clear the target image before baking
    pub use_clear: bool,
    /// Maximum samples per texel
    pub samples: u32,
    pub adaptive_sampling: bool,
    /// Noise threshold for adaptive sampling (0-1)
    pub adaptive_threshold: f32,
    /// Minimum samples before adaptive sampling may stop (0 = renderer default)
    pub adaptive_min_samples: u32,
    pub denoise: DenoiseSettings,
    /// Dilation margin around UV islands in pixels
    pub margin_px: u32,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            bake_type: BakeType::Diffuse,
            passes: PassFilter::default(),
            use_clear: false,
            samples: 1024,
            adaptive_sampling: true,
            adaptive_threshold: 0.01,
            adaptive_min_samples: 0,
            denoise: DenoiseSettings::default(),
            margin_px: 16,
        }
    }
}
