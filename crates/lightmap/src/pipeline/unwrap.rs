//! Packing a group's polygons into the lightmap UV channel.

use glam::Vec2;
use lightbake_config::UnwrapSettings;
use tracing::debug;

use crate::constants::{LIGHTMAP_UV_CHANNEL, UV_EPSILON};
use crate::grouping::BakeGroup;
use crate::renderer::{LightmapRenderer, PackError, PackPolygon, PackRequest, PackSurface, PackedSurface};
use crate::scene::SceneContext;
use crate::types::ObjectId;

/// Lightmap channel coordinates of the group's objects, taken before packing.
pub(crate) type LightmapCoords = Vec<(ObjectId, Vec<Vec2>)>;

pub(crate) fn capture_lightmap_coords(scene: &SceneContext, group: &BakeGroup) -> LightmapCoords {
    group
        .objects
        .iter()
        .filter_map(|id| {
            let layer = scene.object(*id).ok()?.mesh.uv.get(LIGHTMAP_UV_CHANNEL)?;
            Some((*id, layer.coords.clone()))
        })
        .collect()
}

pub(crate) fn restore_lightmap_coords(scene: &mut SceneContext, coords: LightmapCoords) {
    for (id, coords) in coords {
        if let Some(layer) = scene
            .object_mut(id)
            .ok()
            .and_then(|object| object.mesh.uv.get_mut(LIGHTMAP_UV_CHANNEL))
        {
            layer.coords = coords;
        }
    }
}

fn pack_surfaces(scene: &SceneContext, group: &BakeGroup) -> Vec<PackSurface> {
    group
        .objects
        .iter()
        .filter_map(|id| scene.object(*id).ok())
        .map(|object| PackSurface {
            object: object.id,
            polygons: group
                .polygons_for(scene, object.id)
                .into_iter()
                .map(|index| PackPolygon {
                    index,
                    positions: object
                        .mesh
                        .polygon_positions(index)
                        .into_iter()
                        .map(|p| object.transform.transform_point3(p))
                        .collect(),
                })
                .collect(),
        })
        .filter(|surface| !surface.polygons.is_empty())
        .collect()
}

fn in_unit_square(uv: Vec2) -> bool {
    uv.is_finite()
        && uv.x >= -UV_EPSILON
        && uv.y >= -UV_EPSILON
        && uv.x <= 1.0 + UV_EPSILON
        && uv.y <= 1.0 + UV_EPSILON
}

/// Check a packer result against the request, pairing each surface with its layout.
fn validate<'a>(
    surfaces: &'a [PackSurface],
    packed: &'a [PackedSurface],
) -> Result<Vec<(&'a PackSurface, &'a PackedSurface)>, PackError> {
    surfaces
        .iter()
        .map(|surface| {
            let layout = packed
                .iter()
                .find(|layout| layout.object == surface.object)
                .ok_or(PackError::MissingSurface(surface.object))?;
            if layout.polygons.len() != surface.polygons.len() {
                return Err(PackError::PolygonCount {
                    object: surface.object,
                    expected: surface.polygons.len(),
                    actual: layout.polygons.len(),
                });
            }
            for (polygon, uvs) in surface.polygons.iter().zip(&layout.polygons) {
                if uvs.len() != polygon.positions.len() {
                    return Err(PackError::CornerCount {
                        object: surface.object,
                        polygon: polygon.index,
                        expected: polygon.positions.len(),
                        actual: uvs.len(),
                    });
                }
                if !uvs.iter().all(|uv| in_unit_square(*uv)) {
                    return Err(PackError::OutOfRange {
                        object: surface.object,
                        polygon: polygon.index,
                    });
                }
            }
            Ok((surface, layout))
        })
        .collect()
}

/// Pack every polygon of the group into the lightmap channel as one domain.
///
/// The packer result is validated in full before any coordinate is written,
/// so a failed pack leaves the channel untouched. Returns the packed polygon
/// count.
pub(crate) fn unwrap_group<R: LightmapRenderer + ?Sized>(
    scene: &mut SceneContext,
    renderer: &mut R,
    group: &BakeGroup,
    settings: &UnwrapSettings,
) -> Result<usize, PackError> {
    let surfaces = pack_surfaces(scene, group);
    if surfaces.is_empty() {
        return Err(PackError::EmptyGroup);
    }

    let request = PackRequest {
        surfaces: &surfaces,
        uv_channel: LIGHTMAP_UV_CHANNEL,
        strategy: settings.strategy,
        margin: settings.margin,
    };
    let packed = renderer.pack(&request)?;
    let pairs = validate(&surfaces, &packed)?;

    let mut polygon_count = 0;
    for (surface, layout) in pairs {
        let object = scene
            .object_mut(surface.object)
            .map_err(|_| PackError::MissingSurface(surface.object))?;
        let starts = object.mesh.loop_starts();
        let layer = object
            .mesh
            .uv
            .get_mut(LIGHTMAP_UV_CHANNEL)
            .ok_or(PackError::MissingChannel(surface.object))?;
        for (polygon, uvs) in surface.polygons.iter().zip(&layout.polygons) {
            let Some(start) = starts.get(polygon.index) else {
                continue;
            };
            for (corner, uv) in uvs.iter().enumerate() {
                if let Some(slot) = layer.coords.get_mut(start + corner) {
                    *slot = uv.clamp(Vec2::ZERO, Vec2::ONE);
                }
            }
            polygon_count += 1;
        }
    }

    debug!(
        "Packed {polygon_count} polygons of {} objects with {}",
        surfaces.len(),
        settings.strategy.name()
    );
    Ok(polygon_count)
}
