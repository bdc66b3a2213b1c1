//! Authoring / baked view toggle
//!
//! Entering the baked view snapshots every material bound to a lightmap and
//! multiplies the atlas over whatever fed the base color. Leaving it restores
//! each graph verbatim from its snapshot. Both directions are no-ops when the
//! scene is already in the requested view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    GraphError, InputSocket, MixBlend, MixNode, ShadingGraph, ShadingGraphSnapshot, ShadingNode,
};
use crate::constants::LIGHTMAP_MULTIPLY_LABEL;
use crate::scene::SceneContext;
use crate::types::{LightId, MaterialId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Authoring,
    Baked,
}

/// Current view plus what is needed to leave the baked view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub mode: ViewMode,
    pub(crate) snapshots: BTreeMap<MaterialId, ShadingGraphSnapshot>,
    pub(crate) hidden_lights: Vec<LightId>,
}

impl ViewState {
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn hidden_lights(&self) -> &[LightId] {
        &self.hidden_lights
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewOutcome {
    Switched {
        mode: ViewMode,
        materials: usize,
        lights: usize,
    },
    AlreadyActive(ViewMode),
    /// Baked view requested but no material is bound to a lightmap
    NoLightmapsFound,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("Failed to rewrite material {material}: {source}")]
    Graph {
        material: MaterialId,
        source: GraphError,
    },
}

/// Multiply the bound atlas over the current base color input.
fn apply_baked_rewrite(graph: &mut ShadingGraph) -> Result<(), GraphError> {
    let output = graph.output();
    let Some(lightmap) = graph.lightmap_node() else {
        return Ok(());
    };
    let fallback = graph
        .output_node()
        .map(|node| node.base_color)
        .unwrap_or([1.0; 4]);

    let previous = graph.disconnect(output, InputSocket::BaseColor);
    let multiply = graph.add_node(ShadingNode::Mix(MixNode {
        label: LIGHTMAP_MULTIPLY_LABEL.to_string(),
        blend: MixBlend::Multiply,
        factor: 1.0,
        color_a: fallback,
        color_b: [1.0; 4],
    }));

    if let Some(previous) = previous {
        graph.connect(previous, multiply, InputSocket::ColorA)?;
    }
    graph.connect(lightmap, multiply, InputSocket::ColorB)?;
    graph.connect(multiply, output, InputSocket::BaseColor)?;
    Ok(())
}

impl SceneContext {
    /// Switch between the authoring and baked views.
    pub fn set_view(&mut self, mode: ViewMode) -> Result<ViewOutcome, ViewError> {
        if self.view.mode == mode {
            debug!("View already {:?}", mode);
            return Ok(ViewOutcome::AlreadyActive(mode));
        }
        match mode {
            ViewMode::Baked => self.enter_baked_view(),
            ViewMode::Authoring => self.leave_baked_view(),
        }
    }

    /// Materials whose bound sampling node reads an existing image.
    pub fn materials_with_lightmaps(&self) -> Vec<MaterialId> {
        self.materials
            .values()
            .filter(|material| {
                material
                    .graph
                    .lightmap_image()
                    .is_some_and(|image| self.images.contains_key(&image))
            })
            .map(|material| material.id)
            .collect()
    }

    fn enter_baked_view(&mut self) -> Result<ViewOutcome, ViewError> {
        let targets = self.materials_with_lightmaps();
        if targets.is_empty() {
            info!("No lightmaps found, staying in authoring view");
            return Ok(ViewOutcome::NoLightmapsFound);
        }

        let mut snapshots = BTreeMap::new();
        for id in &targets {
            let Some(material) = self.materials.get_mut(id) else {
                continue;
            };
            snapshots.insert(*id, ShadingGraphSnapshot::capture(*id, &material.graph));
            if let Err(source) = apply_baked_rewrite(&mut material.graph) {
                self.rollback_rewrites(snapshots);
                return Err(ViewError::Graph {
                    material: *id,
                    source,
                });
            }
        }

        let mut hidden = Vec::new();
        for light in self.lights.values_mut() {
            if light.visible && light.is_hidden_by_baked_view() {
                light.visible = false;
                hidden.push(light.id);
            }
        }

        let outcome = ViewOutcome::Switched {
            mode: ViewMode::Baked,
            materials: snapshots.len(),
            lights: hidden.len(),
        };
        info!(
            "Entered baked view ({} materials, {} lights hidden)",
            snapshots.len(),
            hidden.len()
        );
        self.view = ViewState {
            mode: ViewMode::Baked,
            snapshots,
            hidden_lights: hidden,
        };
        Ok(outcome)
    }

    fn rollback_rewrites(&mut self, snapshots: BTreeMap<MaterialId, ShadingGraphSnapshot>) {
        for (id, snapshot) in snapshots {
            if let Some(material) = self.materials.get_mut(&id) {
                material.graph = snapshot.restore();
            }
        }
    }

    fn leave_baked_view(&mut self) -> Result<ViewOutcome, ViewError> {
        let snapshots = std::mem::take(&mut self.view.snapshots);
        let materials = snapshots.len();
        for (id, snapshot) in snapshots {
            match self.materials.get_mut(&id) {
                Some(material) => material.graph = snapshot.restore(),
                None => warn!("Material {id} no longer exists, snapshot discarded"),
            }
        }

        let mut lights = 0;
        for id in std::mem::take(&mut self.view.hidden_lights) {
            if let Some(light) = self.lights.get_mut(&id) {
                light.visible = true;
                lights += 1;
            }
        }

        self.view.mode = ViewMode::Authoring;
        info!("Returned to authoring view ({materials} materials, {lights} lights shown)");

        Ok(ViewOutcome::Switched {
            mode: ViewMode::Authoring,
            materials,
            lights,
        })
    }

    /// Restore one material from its baked-view snapshot, leaving the rest of
    /// the view untouched. Returns false if the material had no snapshot.
    pub(crate) fn restore_material_view(&mut self, id: MaterialId) -> Result<bool, ViewError> {
        let Some(snapshot) = self.view.snapshots.remove(&id) else {
            return Ok(false);
        };
        if let Some(material) = self.materials.get_mut(&id) {
            material.graph = snapshot.restore();
        }
        Ok(true)
    }

    /// Drop back to the authoring view once no baked material remains.
    pub(crate) fn settle_view(&mut self) {
        if self.view.mode == ViewMode::Baked && self.view.snapshots.is_empty() {
            for id in std::mem::take(&mut self.view.hidden_lights) {
                if let Some(light) = self.lights.get_mut(&id) {
                    light.visible = true;
                }
            }
            self.view.mode = ViewMode::Authoring;
            info!("No baked materials remain, returned to authoring view");
        }
    }
}
