//! Lightmap registry and clearing
//!
//! The registry maps each `LightmapId` to its atlas image and the objects
//! tagged with it. It accumulates across runs: re-baking into an atlas that is
//! already registered extends that entry instead of creating a new one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::LIGHTMAP_UV_CHANNEL;
use crate::scene::{LightmapTag, SceneContext};
use crate::shading::ViewError;
use crate::types::{ImageId, LightmapId, MaterialId, ObjectId};
use crate::uv_layers::remove_lightmap_layer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub image: ImageId,
    pub objects: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightmapRegistry {
    entries: BTreeMap<LightmapId, RegistryEntry>,
    next_sequence: u64,
}

impl LightmapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` for `objects`, merging into an existing entry for the
    /// same image. Returns the entry's id.
    pub fn register(&mut self, image: ImageId, objects: &[ObjectId]) -> LightmapId {
        let id = match self.id_for_image(image) {
            Some(id) => id,
            None => {
                let id = loop {
                    self.next_sequence += 1;
                    let candidate = LightmapId::from_sequence(self.next_sequence);
                    if !self.entries.contains_key(&candidate) {
                        break candidate;
                    }
                };
                self.entries.insert(
                    id.clone(),
                    RegistryEntry {
                        image,
                        objects: Vec::new(),
                    },
                );
                id
            }
        };
        if let Some(entry) = self.entries.get_mut(&id) {
            for object in objects {
                if !entry.objects.contains(object) {
                    entry.objects.push(*object);
                }
            }
        }
        id
    }

    pub fn get(&self, id: &LightmapId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn id_for_image(&self, image: ImageId) -> Option<LightmapId> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.image == image)
            .map(|(id, _)| id.clone())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&LightmapId, &RegistryEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn remove(&mut self, id: &LightmapId) -> Option<RegistryEntry> {
        self.entries.remove(id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// What `clear_lightmap` removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub lightmap: LightmapId,
    pub objects_untagged: Vec<ObjectId>,
    pub uv_channels_removed: usize,
    pub materials_unbound: Vec<MaterialId>,
    pub image_removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClearError {
    #[error("Unknown lightmap {0}")]
    UnknownLightmap(LightmapId),

    #[error(transparent)]
    View(#[from] ViewError),
}

impl SceneContext {
    /// Tag `objects` with `id`, skipping objects that already carry it.
    pub(crate) fn tag_objects(&mut self, id: &LightmapId, objects: &[ObjectId]) {
        for object in objects {
            let Ok(object) = self.object_mut(*object) else {
                continue;
            };
            if !object.has_tag(id) {
                object.lightmap_tags.push(LightmapTag {
                    lightmap_id: id.clone(),
                    uv_channel: LIGHTMAP_UV_CHANNEL.to_string(),
                });
            }
        }
    }

    /// Remove a lightmap: untag its objects, unbind its sampling nodes and
    /// delete its atlas. Other lightmaps are left untouched.
    ///
    /// The lightmap UV channel is only removed from objects that carry no
    /// other lightmap tag.
    pub fn clear_lightmap(&mut self, id: &LightmapId) -> Result<ClearReport, ClearError> {
        let entry = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| ClearError::UnknownLightmap(id.clone()))?;

        let bound: Vec<MaterialId> = self
            .materials
            .values()
            .filter(|material| material.graph.lightmap_image() == Some(entry.image))
            .map(|material| material.id)
            .collect();

        // Baked graphs go back to their authoring form first so removing the
        // sampling node leaves the original topology.
        for material in &bound {
            self.restore_material_view(*material)?;
        }
        for material in &bound {
            if let Ok(material) = self.material_mut(*material) {
                if let Some(node) = material.graph.lightmap_node() {
                    if let Err(err) = material.graph.remove_node(node) {
                        warn!("Could not remove sampling node from {}: {err}", material.id);
                    }
                }
                material.graph.unbind_lightmap();
            }
        }

        let mut objects_untagged = Vec::new();
        let mut uv_channels_removed = 0;
        for object in self.objects.values_mut() {
            if !object.has_tag(id) {
                continue;
            }
            object.lightmap_tags.retain(|tag| &tag.lightmap_id != id);
            objects_untagged.push(object.id);
            if object.lightmap_tags.is_empty() && remove_lightmap_layer(&mut object.mesh) {
                uv_channels_removed += 1;
            }
        }

        let image_removed = self.remove_image(entry.image).is_some();
        self.registry.remove(id);
        self.settle_view();

        info!(
            "Cleared lightmap {id}: {} objects untagged, {} materials unbound",
            objects_untagged.len(),
            bound.len()
        );

        Ok(ClearReport {
            lightmap: id.clone(),
            objects_untagged,
            uv_channels_removed,
            materials_unbound: bound,
            image_removed,
        })
    }

    /// Replace the registry with a persisted one. Entries whose atlas image no
    /// longer exists are dropped. Returns the number of entries kept.
    pub fn load_registry(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let mut registry = LightmapRegistry::from_json(json)?;
        registry.entries.retain(|id, entry| {
            let alive = self.images.contains_key(&entry.image);
            if !alive {
                warn!("Dropping lightmap {id}: atlas {} is missing", entry.image);
            }
            alive
        });
        let kept = registry.len();
        self.registry = registry;
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = LightmapRegistry::new();
        let a = registry.register(ImageId(10), &[ObjectId(1)]);
        let b = registry.register(ImageId(11), &[ObjectId(2)]);
        assert_eq!(a.as_str(), "lightmap_0001");
        assert_eq!(b.as_str(), "lightmap_0002");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_same_image_merges() {
        let mut registry = LightmapRegistry::new();
        let a = registry.register(ImageId(10), &[ObjectId(1)]);
        let again = registry.register(ImageId(10), &[ObjectId(1), ObjectId(3)]);
        assert_eq!(a, again);
        assert_eq!(
            registry.get(&a).unwrap().objects,
            vec![ObjectId(1), ObjectId(3)]
        );
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let mut registry = LightmapRegistry::new();
        let a = registry.register(ImageId(10), &[]);
        registry.remove(&a);
        let b = registry.register(ImageId(11), &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut registry = LightmapRegistry::new();
        registry.register(ImageId(4), &[ObjectId(1), ObjectId(2)]);
        let json = registry.to_json().unwrap();
        let parsed = LightmapRegistry::from_json(&json).unwrap();
        assert_eq!(parsed, registry);
        assert!(json.contains("lightmap_0001"));
    }

    #[test]
    fn test_load_registry_drops_missing_atlases() {
        let mut registry = LightmapRegistry::new();
        registry.register(ImageId(4), &[ObjectId(1)]);
        let json = registry.to_json().unwrap();

        let mut scene = SceneContext::new();
        assert_eq!(scene.load_registry(&json).unwrap(), 0);
        assert!(scene.registry().is_empty());
        assert!(scene.load_registry("not json").is_err());
    }
}
