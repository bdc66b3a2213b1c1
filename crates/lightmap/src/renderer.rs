//! Boundary to the external UV packer and light-transport renderer.
//!
//! The pipeline never computes radiance or island layouts itself. It builds a
//! request, hands it to a `LightmapRenderer` and validates what comes back
//! before touching the scene.

use glam::{Vec2, Vec3};
use lightbake_config::{BakeSettings, PackStrategy};

use crate::scene::SceneContext;
use crate::types::{ImageId, LightId, ObjectId};

/// One polygon to pack, with its corners in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct PackPolygon {
    /// Index into the object's mesh polygons
    pub index: usize,
    pub positions: Vec<Vec3>,
}

/// The polygons of one object taking part in a packing domain.
#[derive(Debug, Clone, PartialEq)]
pub struct PackSurface {
    pub object: ObjectId,
    pub polygons: Vec<PackPolygon>,
}

/// Every surface of a group, packed together into [0,1]².
#[derive(Debug, Clone, Copy)]
pub struct PackRequest<'a> {
    pub surfaces: &'a [PackSurface],
    pub uv_channel: &'a str,
    pub strategy: PackStrategy,
    /// Island spacing as a fraction of the packing cell
    pub margin: f32,
}

/// Packed coordinates for one surface: one `Vec2` per corner of each polygon,
/// in the order of the request.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedSurface {
    pub object: ObjectId,
    pub polygons: Vec<Vec<Vec2>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PackError {
    #[error("Packer failed: {0}")]
    Failed(String),

    #[error("Nothing to pack")]
    EmptyGroup,

    #[error("Packer returned no layout for object {0}")]
    MissingSurface(ObjectId),

    #[error("Packer returned {actual} polygons for object {object}, expected {expected}")]
    PolygonCount {
        object: ObjectId,
        expected: usize,
        actual: usize,
    },

    #[error("Polygon {polygon} of object {object} has {actual} UVs for {expected} corners")]
    CornerCount {
        object: ObjectId,
        polygon: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Polygon {polygon} of object {object} was packed outside the unit square")]
    OutOfRange { object: ObjectId, polygon: usize },

    #[error("Object {0} has no lightmap UV channel")]
    MissingChannel(ObjectId),
}

/// Polygons of one object selected as bake target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakeTarget {
    pub object: ObjectId,
    pub polygons: Vec<usize>,
}

/// One synchronous bake into one atlas.
#[derive(Debug, Clone, Copy)]
pub struct BakeRequest<'a> {
    pub scene: &'a SceneContext,
    pub targets: &'a [BakeTarget],
    /// Lights currently visible in the scene
    pub lights: &'a [LightId],
    pub image: ImageId,
    pub width: u32,
    pub height: u32,
    pub uv_channel: &'a str,
    pub settings: &'a BakeSettings,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BakeError {
    #[error("Renderer failed: {0}")]
    Failed(String),

    #[error("Renderer rejected settings: {0}")]
    Settings(String),

    #[error("Bake settings select no passes")]
    NoPasses,

    #[error("Renderer returned {actual} pixels, expected {expected}")]
    PixelCount { expected: usize, actual: usize },

    #[error("Renderer returned a non-finite value at pixel {0}")]
    NonFinite(usize),

    #[error("Atlas {0} disappeared before the bake finished")]
    MissingAtlas(ImageId),
}

/// External packer and renderer.
pub trait LightmapRenderer {
    /// Lay out the lightmap UVs of every surface in one shared [0,1]² domain.
    fn pack(&mut self, request: &PackRequest<'_>) -> Result<Vec<PackedSurface>, PackError>;

    /// Apply settings before a bake call.
    fn configure(&mut self, settings: &BakeSettings) -> Result<(), BakeError> {
        let _ = settings;
        Ok(())
    }

    /// Bake the targets into a `width * height` row-major pixel buffer.
    fn bake(&mut self, request: &BakeRequest<'_>) -> Result<Vec<[f32; 4]>, BakeError>;
}
