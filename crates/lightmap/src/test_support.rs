//! Deterministic renderer and scene builders shared by the unit tests.

use std::f32::consts::TAU;

use glam::{Affine3A, Vec2, Vec3};
use lightbake_config::BakeSettings;

use crate::renderer::{
    BakeError, BakeRequest, LightmapRenderer, PackError, PackRequest, PackedSurface,
};
use crate::scene::{Mesh, SceneContext};
use crate::types::{MaterialId, ObjectId};

/// Packs every polygon into its own grid cell and bakes a flat color.
#[derive(Debug, Clone)]
pub struct ScriptedRenderer {
    pub pack_calls: usize,
    pub bake_calls: usize,
    pub configure_calls: usize,
    pub last_light_count: usize,
    fill: [f32; 4],
    phase: f32,
    fail_pack_on: Option<usize>,
    fail_bake_on: Option<usize>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self {
            pack_calls: 0,
            bake_calls: 0,
            configure_calls: 0,
            last_light_count: 0,
            fill: [1.0, 1.0, 1.0, 1.0],
            phase: 0.0,
            fail_pack_on: None,
            fail_bake_on: None,
        }
    }

    pub fn with_fill(mut self, fill: [f32; 4]) -> Self {
        self.fill = fill;
        self
    }

    /// Rotate corners inside their cell by a fraction of a turn.
    pub fn with_cell_offset(mut self, turns: f32) -> Self {
        self.phase = turns * TAU;
        self
    }

    /// Fail the `call`-th pack (zero based).
    pub fn fail_pack_on(mut self, call: usize) -> Self {
        self.fail_pack_on = Some(call);
        self
    }

    /// Fail the `call`-th bake (zero based).
    pub fn fail_bake_on(mut self, call: usize) -> Self {
        self.fail_bake_on = Some(call);
        self
    }
}

impl LightmapRenderer for ScriptedRenderer {
    fn pack(&mut self, request: &PackRequest<'_>) -> Result<Vec<PackedSurface>, PackError> {
        let call = self.pack_calls;
        self.pack_calls += 1;
        if self.fail_pack_on == Some(call) {
            return Err(PackError::Failed("scripted pack failure".to_string()));
        }

        let total: usize = request.surfaces.iter().map(|s| s.polygons.len()).sum();
        let cells = (total as f32).sqrt().ceil().max(1.0) as usize;
        let size = 1.0 / cells as f32;
        let radius = size * 0.4 * (1.0 - request.margin.clamp(0.0, 1.0));

        let mut cell = 0;
        let packed = request
            .surfaces
            .iter()
            .map(|surface| PackedSurface {
                object: surface.object,
                polygons: surface
                    .polygons
                    .iter()
                    .map(|polygon| {
                        let center = Vec2::new(
                            ((cell % cells) as f32 + 0.5) * size,
                            ((cell / cells) as f32 + 0.5) * size,
                        );
                        cell += 1;
                        let corners = polygon.positions.len().max(1) as f32;
                        (0..polygon.positions.len())
                            .map(|corner| {
                                let angle = self.phase + TAU * corner as f32 / corners;
                                center + Vec2::from_angle(angle) * radius
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect();
        Ok(packed)
    }

    fn configure(&mut self, _settings: &BakeSettings) -> Result<(), BakeError> {
        self.configure_calls += 1;
        Ok(())
    }

    fn bake(&mut self, request: &BakeRequest<'_>) -> Result<Vec<[f32; 4]>, BakeError> {
        let call = self.bake_calls;
        self.bake_calls += 1;
        self.last_light_count = request.lights.len();
        if self.fail_bake_on == Some(call) {
            return Err(BakeError::Failed("scripted bake failure".to_string()));
        }
        Ok(vec![
            self.fill;
            request.width as usize * request.height as usize
        ])
    }
}

/// Two unit cubes sharing one material, three units apart.
pub fn two_cube_scene() -> (SceneContext, MaterialId, Vec<ObjectId>) {
    let mut scene = SceneContext::new();
    let material = scene.add_material("Wall", [0.8, 0.8, 0.8, 1.0]);
    let objects = vec![
        scene.add_object("CubeA", Mesh::cube(), Affine3A::IDENTITY, vec![Some(material)]),
        scene.add_object(
            "CubeB",
            Mesh::cube(),
            Affine3A::from_translation(Vec3::new(3.0, 0.0, 0.0)),
            vec![Some(material)],
        ),
    ];
    (scene, material, objects)
}
