//! Mesh objects, materials and lights owned by the scene.

use glam::Affine3A;
use serde::{Deserialize, Serialize};

use super::mesh::{Aabb, Mesh};
use crate::shading::ShadingGraph;
use crate::types::{LightId, LightmapId, MaterialId, ObjectId};

/// Reference from a mesh object to a registered lightmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightmapTag {
    #[serde(rename = "lightmapId")]
    pub lightmap_id: LightmapId,
    #[serde(rename = "lightmapUVChannel")]
    pub uv_channel: String,
}

/// A mesh instance placed in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshObject {
    pub id: ObjectId,
    pub name: String,
    pub transform: Affine3A,
    pub mesh: Mesh,
    /// Material per slot; polygons select a slot through `material_index`
    pub material_slots: Vec<Option<MaterialId>>,
    pub visible: bool,
    pub lightmap_tags: Vec<LightmapTag>,
}

impl MeshObject {
    pub fn material_at(&self, slot: u32) -> Option<MaterialId> {
        self.material_slots.get(slot as usize).copied().flatten()
    }

    /// Distinct materials in slot order.
    pub fn materials(&self) -> Vec<MaterialId> {
        let mut materials = Vec::new();
        for material in self.material_slots.iter().flatten() {
            if !materials.contains(material) {
                materials.push(*material);
            }
        }
        materials
    }

    pub fn uses_material(&self, material: MaterialId) -> bool {
        self.material_slots.contains(&Some(material))
    }

    /// Indices of the polygons rendered with `material`.
    pub fn polygons_with_material(&self, material: MaterialId) -> Vec<usize> {
        self.mesh
            .polygons
            .iter()
            .enumerate()
            .filter(|(_, polygon)| self.material_at(polygon.material_index) == Some(material))
            .map(|(index, _)| index)
            .collect()
    }

    /// Bounding box of the mesh in world space.
    pub fn world_bounds(&self) -> Option<Aabb> {
        Aabb::from_points(
            self.mesh
                .positions
                .iter()
                .map(|p| self.transform.transform_point3(*p)),
        )
    }

    pub fn has_tag(&self, id: &LightmapId) -> bool {
        self.lightmap_tags.iter().any(|tag| &tag.lightmap_id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Sun,
    Point,
    Spot,
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub id: LightId,
    pub name: String,
    pub kind: LightKind,
    pub visible: bool,
}

impl Light {
    /// Local lights are already accounted for by baked lightmaps.
    pub fn is_hidden_by_baked_view(&self) -> bool {
        !matches!(self.kind, LightKind::Sun)
    }
}

/// A material and its shading graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub graph: ShadingGraph,
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene::mesh::Polygon;

    fn two_material_object() -> MeshObject {
        let mut mesh = Mesh::cube();
        mesh.polygons[0].material_index = 1;
        mesh.polygons.push(Polygon::with_material(vec![0, 1, 2], 2));
        MeshObject {
            id: ObjectId(1),
            name: "Crate".into(),
            transform: Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            mesh,
            material_slots: vec![Some(MaterialId(5)), Some(MaterialId(6)), None],
            visible: true,
            lightmap_tags: Vec::new(),
        }
    }

    #[test]
    fn test_polygons_with_material() {
        let object = two_material_object();
        assert_eq!(object.polygons_with_material(MaterialId(6)), vec![0]);
        assert_eq!(object.polygons_with_material(MaterialId(5)).len(), 5);
        assert_eq!(object.materials(), vec![MaterialId(5), MaterialId(6)]);
    }

    #[test]
    fn test_world_bounds_applies_transform() {
        let object = two_material_object();
        let bounds = object.world_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(9.5, -0.5, -0.5));
        assert_eq!(bounds.max, Vec3::new(10.5, 0.5, 0.5));
    }

    #[test]
    fn test_tag_serializes_with_original_keys() {
        let tag = LightmapTag {
            lightmap_id: LightmapId::new("lightmap_0001"),
            uv_channel: "lightmap".into(),
        };
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(
            json,
            r#"{"lightmapId":"lightmap_0001","lightmapUVChannel":"lightmap"}"#
        );
    }

    #[test]
    fn test_sun_stays_visible_in_baked_view() {
        let sun = Light {
            id: LightId(1),
            name: "Sun".into(),
            kind: LightKind::Sun,
            visible: true,
        };
        assert!(!sun.is_hidden_by_baked_view());
        let lamp = Light {
            kind: LightKind::Point,
            ..sun
        };
        assert!(lamp.is_hidden_by_baked_view());
    }
}
