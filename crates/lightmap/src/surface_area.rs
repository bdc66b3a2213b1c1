//! World-space surface area measurement.

use glam::Vec3;

use crate::scene::MeshObject;

/// Area of a polygon given its corners, fan-triangulated from the first corner.
///
/// Works for triangles, quads and convex n-gons; non-planar polygons are
/// measured as the sum of their fan triangles.
pub fn polygon_area(corners: &[Vec3]) -> f32 {
    if corners.len() < 3 {
        return 0.0;
    }
    let origin = corners[0];
    corners[1..]
        .windows(2)
        .map(|edge| (edge[0] - origin).cross(edge[1] - origin).length() * 0.5)
        .sum()
}

/// Total world-space area of every polygon of `object`.
pub fn surface_area(object: &MeshObject) -> f32 {
    polygons_area(object, 0..object.mesh.polygons.len())
}

/// World-space area of the selected polygons of `object`.
pub fn polygons_area(object: &MeshObject, polygons: impl IntoIterator<Item = usize>) -> f32 {
    polygons
        .into_iter()
        .map(|index| {
            let corners: Vec<Vec3> = object
                .mesh
                .polygon_positions(index)
                .into_iter()
                .map(|p| object.transform.transform_point3(p))
                .collect();
            polygon_area(&corners)
        })
        .sum()
}
