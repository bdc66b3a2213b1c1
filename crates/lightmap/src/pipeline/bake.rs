//! One bake call per group.

use lightbake_config::BakeSettings;
use tracing::{debug, info};

use crate::atlas::AtlasBinding;
use crate::constants::LIGHTMAP_UV_CHANNEL;
use crate::grouping::BakeGroup;
use crate::renderer::{BakeError, BakeRequest, BakeTarget, LightmapRenderer};
use crate::scene::SceneContext;
use crate::types::LightId;

fn log_settings(settings: &BakeSettings) {
    info!(
        "Bake settings: type {:?}, direct {}, indirect {}, color {}, clear {}",
        settings.bake_type,
        settings.passes.direct,
        settings.passes.indirect,
        settings.passes.color,
        settings.use_clear
    );
    info!(
        "Sampling: {} samples, adaptive {} (threshold {}, min samples {}), margin {} px",
        settings.samples,
        settings.adaptive_sampling,
        settings.adaptive_threshold,
        settings.adaptive_min_samples,
        settings.margin_px
    );
    let denoise = &settings.denoise;
    info!(
        "Denoising: enabled {}, {:?}, passes {:?}, prefilter {:?}, quality {:?}",
        denoise.enabled, denoise.denoiser, denoise.input_passes, denoise.prefilter, denoise.quality
    );
}

/// Configure the renderer, bake the group's polygons and write the result
/// into the bound atlas. Nothing is written unless the whole buffer is valid.
pub(crate) fn bake_group<R: LightmapRenderer + ?Sized>(
    scene: &mut SceneContext,
    renderer: &mut R,
    group: &BakeGroup,
    binding: &AtlasBinding,
    settings: &BakeSettings,
) -> Result<(), BakeError> {
    if settings.passes.is_empty() {
        return Err(BakeError::NoPasses);
    }

    log_settings(settings);
    renderer.configure(settings)?;

    let targets: Vec<BakeTarget> = group
        .objects
        .iter()
        .map(|id| BakeTarget {
            object: *id,
            polygons: group.polygons_for(scene, *id),
        })
        .filter(|target| !target.polygons.is_empty())
        .collect();
    let lights: Vec<LightId> = scene
        .lights()
        .filter(|light| light.visible)
        .map(|light| light.id)
        .collect();

    let request = BakeRequest {
        scene: &*scene,
        targets: &targets,
        lights: &lights,
        image: binding.image,
        width: binding.spec.width,
        height: binding.spec.height,
        uv_channel: LIGHTMAP_UV_CHANNEL,
        settings,
    };
    let pixels = renderer.bake(&request)?;

    let expected = binding.spec.width as usize * binding.spec.height as usize;
    if pixels.len() != expected {
        return Err(BakeError::PixelCount {
            expected,
            actual: pixels.len(),
        });
    }
    if let Some(index) = pixels
        .iter()
        .position(|pixel| pixel.iter().any(|channel| !channel.is_finite()))
    {
        return Err(BakeError::NonFinite(index));
    }

    let atlas = scene
        .image_mut(binding.image)
        .map_err(|_| BakeError::MissingAtlas(binding.image))?;
    atlas
        .write_pixels(&pixels)
        .map_err(|err| BakeError::Failed(err.to_string()))?;

    debug!(
        "Baked {} objects into {}x{} atlas {}",
        targets.len(),
        binding.spec.width,
        binding.spec.height,
        binding.image
    );
    Ok(())
}
