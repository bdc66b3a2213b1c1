//! Host scene model
//!
//! `SceneContext` owns every object, material, image and light the pipeline
//! touches, plus the lightmap registry and the current view state. All
//! pipeline operations take it by `&mut` for the duration of one call.

mod mesh;
mod object;
mod uv;

use std::collections::BTreeMap;

use glam::Affine3A;
use lightbake_config::ColorSpace;

use crate::atlas::AtlasTexture;
use crate::registry::LightmapRegistry;
use crate::shading::{ShadingGraph, ViewMode, ViewState};
use crate::types::{ImageId, LightId, MaterialId, ObjectId};

pub use mesh::{Aabb, Mesh, Polygon};
pub use object::{Light, LightKind, LightmapTag, Material, MeshObject};
pub use uv::{UvChannels, UvLayer};

/// Errors for lookups of scene entities that do not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("Unknown object {0}")]
    UnknownObject(ObjectId),

    #[error("Unknown material {0}")]
    UnknownMaterial(MaterialId),

    #[error("Unknown image {0}")]
    UnknownImage(ImageId),
}

/// The scene the lightmap pipeline reads and annotates.
#[derive(Debug, Default)]
pub struct SceneContext {
    pub(crate) objects: BTreeMap<ObjectId, MeshObject>,
    pub(crate) materials: BTreeMap<MaterialId, Material>,
    pub(crate) images: BTreeMap<ImageId, AtlasTexture>,
    pub(crate) lights: BTreeMap<LightId, Light>,
    pub(crate) registry: LightmapRegistry,
    pub(crate) view: ViewState,
    next_id: u32,
}

impl SceneContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Add a material with a plain base color and no texture inputs.
    pub fn add_material(&mut self, name: impl Into<String>, base_color: [f32; 4]) -> MaterialId {
        self.add_material_with_graph(name, ShadingGraph::new(base_color))
    }

    pub fn add_material_with_graph(
        &mut self,
        name: impl Into<String>,
        graph: ShadingGraph,
    ) -> MaterialId {
        let id = MaterialId(self.allocate_id());
        self.materials.insert(
            id,
            Material {
                id,
                name: name.into(),
                graph,
            },
        );
        id
    }

    /// Add a visible mesh object.
    pub fn add_object(
        &mut self,
        name: impl Into<String>,
        mesh: Mesh,
        transform: Affine3A,
        material_slots: Vec<Option<MaterialId>>,
    ) -> ObjectId {
        let id = ObjectId(self.allocate_id());
        self.objects.insert(
            id,
            MeshObject {
                id,
                name: name.into(),
                transform,
                mesh,
                material_slots,
                visible: true,
                lightmap_tags: Vec::new(),
            },
        );
        id
    }

    pub fn add_light(&mut self, name: impl Into<String>, kind: LightKind) -> LightId {
        let id = LightId(self.allocate_id());
        self.lights.insert(
            id,
            Light {
                id,
                name: name.into(),
                kind,
                visible: true,
            },
        );
        id
    }

    pub fn add_image(&mut self, image: AtlasTexture) -> ImageId {
        let id = ImageId(self.allocate_id());
        self.images.insert(id, image);
        id
    }

    pub fn remove_image(&mut self, id: ImageId) -> Option<AtlasTexture> {
        self.images.remove(&id)
    }

    pub fn object(&self, id: ObjectId) -> Result<&MeshObject, SceneError> {
        self.objects.get(&id).ok_or(SceneError::UnknownObject(id))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut MeshObject, SceneError> {
        self.objects.get_mut(&id).ok_or(SceneError::UnknownObject(id))
    }

    pub fn material(&self, id: MaterialId) -> Result<&Material, SceneError> {
        self.materials.get(&id).ok_or(SceneError::UnknownMaterial(id))
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Result<&mut Material, SceneError> {
        self.materials
            .get_mut(&id)
            .ok_or(SceneError::UnknownMaterial(id))
    }

    pub fn image(&self, id: ImageId) -> Result<&AtlasTexture, SceneError> {
        self.images.get(&id).ok_or(SceneError::UnknownImage(id))
    }

    pub fn image_mut(&mut self, id: ImageId) -> Result<&mut AtlasTexture, SceneError> {
        self.images.get_mut(&id).ok_or(SceneError::UnknownImage(id))
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(&id)
    }

    pub fn set_object_visible(&mut self, id: ObjectId, visible: bool) -> Result<(), SceneError> {
        self.object_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn objects(&self) -> impl Iterator<Item = &MeshObject> {
        self.objects.values()
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    pub fn images(&self) -> impl Iterator<Item = (ImageId, &AtlasTexture)> {
        self.images.iter().map(|(id, image)| (*id, image))
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.values()
    }

    /// Every object with a slot referencing `material`, in id order.
    pub fn objects_using_material(&self, material: MaterialId) -> Vec<ObjectId> {
        self.objects
            .values()
            .filter(|object| object.uses_material(material))
            .map(|object| object.id)
            .collect()
    }

    /// Create an empty atlas image and return its id.
    pub(crate) fn create_atlas(
        &mut self,
        name: String,
        width: u32,
        height: u32,
        color_space: ColorSpace,
    ) -> Result<ImageId, crate::atlas::AtlasError> {
        let texture = AtlasTexture::new(name, width, height, color_space)?;
        Ok(self.add_image(texture))
    }

    pub fn registry(&self) -> &LightmapRegistry {
        &self.registry
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view.mode
    }
}
