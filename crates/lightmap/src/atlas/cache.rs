//! Per-run atlas and sampling node cache
//!
//! One atlas image and one bound sampling node per material (or one shared
//! atlas for a manual group). Existing bindings are reused as-is, never resized.

use std::collections::HashMap;

use lightbake_config::ColorSpace;
use tracing::{debug, warn};

use super::AtlasError;
use crate::constants::{LIGHTMAP_NODE_LABEL, LIGHTMAP_UV_CHANNEL};
use crate::grouping::GroupKey;
use crate::resolution::AtlasSpec;
use crate::scene::{SceneContext, SceneError};
use crate::shading::{ShadingNode, SourceKind, SourceNode};
use crate::types::{ImageId, MaterialId, NodeId};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Atlas(#[from] AtlasError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Group has no materials to bind an atlas to")]
    NoMaterials,
}

/// What `acquire` changed, so a failed group can be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasBinding {
    pub image: ImageId,
    /// Dimensions of the bound image (an existing atlas keeps its own size)
    pub spec: AtlasSpec,
    /// The image was created by this acquisition
    pub created: bool,
    new_nodes: Vec<(MaterialId, NodeId)>,
    /// Sampling nodes pointed at `image`, with the image they read before
    rebound: Vec<(MaterialId, NodeId, ImageId)>,
}

/// Atlases handed out during one pipeline run.
#[derive(Debug, Default)]
pub struct AtlasCache {
    by_material: HashMap<MaterialId, ImageId>,
    manual: Option<ImageId>,
}

fn sampling_node(image: ImageId) -> ShadingNode {
    ShadingNode::Source(SourceNode {
        label: LIGHTMAP_NODE_LABEL.to_string(),
        kind: SourceKind::Image {
            image,
            uv_channel: Some(LIGHTMAP_UV_CHANNEL.to_string()),
        },
    })
}

impl AtlasCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cached(&self, key: &GroupKey) -> Option<ImageId> {
        match key {
            GroupKey::Material(material) => self.by_material.get(material).copied(),
            GroupKey::Manual => self.manual,
        }
    }

    /// Atlas bound to the first material that already has a live one.
    fn existing(scene: &SceneContext, materials: &[MaterialId]) -> Option<ImageId> {
        materials.iter().find_map(|id| {
            let image = scene.materials.get(id)?.graph.lightmap_image()?;
            scene.images.contains_key(&image).then_some(image)
        })
    }

    /// Find or create the atlas for a group and make sure every material in
    /// `materials` has exactly one sampling node bound to it.
    pub fn acquire(
        &mut self,
        scene: &mut SceneContext,
        key: &GroupKey,
        materials: &[MaterialId],
        planned: AtlasSpec,
        color_space: ColorSpace,
    ) -> Result<AtlasBinding, CacheError> {
        let lead = *materials.first().ok_or(CacheError::NoMaterials)?;
        for id in materials {
            scene.material(*id)?;
        }

        let reused = self
            .cached(key)
            .filter(|image| scene.images.contains_key(image))
            .or_else(|| Self::existing(scene, materials));

        let (image, created) = match reused {
            Some(image) => {
                debug!("Reusing atlas {image} for {key:?}");
                (image, false)
            }
            None => {
                let name = match key {
                    GroupKey::Material(_) => format!("Lightmap_{}", scene.material(lead)?.name),
                    GroupKey::Manual => "Lightmap_Group".to_string(),
                };
                let image =
                    scene.create_atlas(name, planned.width, planned.height, color_space)?;
                debug!(
                    "Created {}x{} atlas {image} for {key:?}",
                    planned.width, planned.height
                );
                (image, true)
            }
        };

        let mut binding = AtlasBinding {
            image,
            spec: planned,
            created,
            new_nodes: Vec::new(),
            rebound: Vec::new(),
        };
        let atlas = scene.image(image)?;
        binding.spec = AtlasSpec {
            width: atlas.width,
            height: atlas.height,
        };
        if !created && binding.spec != planned {
            debug!(
                "Existing atlas {image} kept at {}x{} (planned {}x{})",
                binding.spec.width, binding.spec.height, planned.width, planned.height
            );
        }

        for id in materials {
            let graph = &mut scene.material_mut(*id)?.graph;
            match graph.lightmap_node() {
                Some(node) => {
                    if let Some(ShadingNode::Source(SourceNode {
                        kind: SourceKind::Image { image: current, .. },
                        ..
                    })) = graph.node_mut(node)
                    {
                        if *current != image {
                            binding.rebound.push((*id, node, *current));
                            *current = image;
                        }
                    }
                }
                None => {
                    if let Some(stale) = graph.lightmap_binding() {
                        warn!("Material {id} had a dangling lightmap binding to node {stale}");
                    }
                    let node = graph.add_node(sampling_node(image));
                    graph.bind_lightmap(node);
                    binding.new_nodes.push((*id, node));
                }
            }
            if let GroupKey::Material(_) = key {
                self.by_material.insert(*id, image);
            }
        }
        if let GroupKey::Manual = key {
            self.manual = Some(image);
        }

        Ok(binding)
    }

    /// Undo everything `acquire` did for a failed group.
    pub fn rollback(&mut self, scene: &mut SceneContext, binding: &AtlasBinding) {
        for (material, node) in &binding.new_nodes {
            if let Some(material) = scene.materials.get_mut(material) {
                material.graph.unbind_lightmap();
                if let Err(err) = material.graph.remove_node(*node) {
                    warn!("Could not remove sampling node from {}: {err}", material.id);
                }
            }
        }
        for (material, node, previous) in &binding.rebound {
            if let Some(ShadingNode::Source(SourceNode {
                kind: SourceKind::Image { image, .. },
                ..
            })) = scene
                .materials
                .get_mut(material)
                .and_then(|material| material.graph.node_mut(*node))
            {
                *image = *previous;
            }
        }
        if binding.created {
            scene.remove_image(binding.image);
            self.by_material.retain(|_, image| *image != binding.image);
            if self.manual == Some(binding.image) {
                self.manual = None;
            }
        }
        debug!("Rolled back atlas {}", binding.image);
    }
}
