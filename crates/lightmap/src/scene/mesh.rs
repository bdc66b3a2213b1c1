//! Polygon mesh geometry with per-loop UV channels.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::uv::{UvChannels, UvLayer};
use crate::constants::DEFAULT_UV_CHANNEL;

/// A polygon referencing mesh vertices. Each corner is one loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<u32>,
    /// Index into the owning object's material slots
    pub material_index: u32,
}

impl Polygon {
    pub fn new(vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            material_index: 0,
        }
    }

    pub fn with_material(vertices: Vec<u32>, material_index: u32) -> Self {
        Self {
            vertices,
            material_index,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Bounds of a point set, or None if it is empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Aabb {
            min: first,
            max: first,
        };
        for point in iter {
            bounds.min = bounds.min.min(point);
            bounds.max = bounds.max.max(point);
        }
        Some(bounds)
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Mesh geometry: vertex positions, polygons and UV channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub polygons: Vec<Polygon>,
    pub uv: UvChannels,
}

impl Mesh {
    /// Create a mesh without UV channels.
    pub fn new(positions: Vec<Vec3>, polygons: Vec<Polygon>) -> Self {
        Self {
            positions,
            polygons,
            uv: UvChannels::new(),
        }
    }

    /// Axis-aligned box centered on the origin, one quad per face.
    ///
    /// Faces carry a `UVMap` channel mapping each quad to the unit square.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        let faces: [[u32; 4]; 6] = [
            [0, 3, 2, 1], // -Z
            [4, 5, 6, 7], // +Z
            [0, 1, 5, 4], // -Y
            [2, 3, 7, 6], // +Y
            [1, 2, 6, 5], // +X
            [3, 0, 4, 7], // -X
        ];
        let polygons = faces.iter().map(|face| Polygon::new(face.to_vec())).collect();

        let mut mesh = Self::new(positions, polygons);
        mesh.push_unit_square_uvs(DEFAULT_UV_CHANNEL);
        mesh
    }

    /// Unit cube (surface area 6).
    pub fn cube() -> Self {
        Self::cuboid(Vec3::splat(0.5))
    }

    /// Quad in the XY plane centered on the origin.
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let positions = vec![
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
        ];
        let mut mesh = Self::new(positions, vec![Polygon::new(vec![0, 1, 2, 3])]);
        mesh.push_unit_square_uvs(DEFAULT_UV_CHANNEL);
        mesh
    }

    fn push_unit_square_uvs(&mut self, name: &str) {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let coords = self
            .polygons
            .iter()
            .flat_map(|polygon| (0..polygon.vertices.len()).map(|i| corners[i % 4]))
            .collect();
        self.uv.push(UvLayer::with_coords(name, coords));
    }

    /// Total number of polygon corners (loops).
    pub fn loop_count(&self) -> usize {
        self.polygons.iter().map(|p| p.vertices.len()).sum()
    }

    /// First loop index of every polygon.
    pub fn loop_starts(&self) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.polygons.len());
        let mut offset = 0;
        for polygon in &self.polygons {
            starts.push(offset);
            offset += polygon.vertices.len();
        }
        starts
    }

    /// Positions of a polygon's corners, skipping out-of-range vertex indices.
    pub fn polygon_positions(&self, polygon: usize) -> Vec<Vec3> {
        self.polygons
            .get(polygon)
            .map(|p| {
                p.vertices
                    .iter()
                    .filter_map(|&v| self.positions.get(v as usize).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn local_bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_topology() {
        let mesh = Mesh::cube();
        assert_eq!(mesh.positions.len(), 8);
        assert_eq!(mesh.polygons.len(), 6);
        assert_eq!(mesh.loop_count(), 24);
        assert_eq!(mesh.uv.names(), vec![DEFAULT_UV_CHANNEL]);
        assert_eq!(mesh.uv.layer(0).unwrap().coords.len(), 24);
    }

    #[test]
    fn test_loop_starts() {
        let mesh = Mesh::new(
            vec![Vec3::ZERO; 5],
            vec![Polygon::new(vec![0, 1, 2]), Polygon::new(vec![0, 2, 3, 4])],
        );
        assert_eq!(mesh.loop_starts(), vec![0, 3]);
        assert_eq!(mesh.loop_count(), 7);
    }

    #[test]
    fn test_aabb_union() {
        let a = Aabb::from_points([Vec3::ZERO, Vec3::ONE]).unwrap();
        let b = Aabb::from_points([Vec3::splat(2.0)]).unwrap();
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::ZERO);
        assert_eq!(u.max, Vec3::splat(2.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }
}
