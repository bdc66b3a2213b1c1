//! Lightmap UV channel lifecycle
//!
//! Every baked mesh gets a primary channel at index 0 and a `lightmap`
//! channel at index 1. A different channel already sitting at index 1 keeps
//! its name and data and moves to index 2. The active selections are
//! captured once per object before anything changes and restored at the end
//! of the run, whatever happened in between.

use tracing::{debug, warn};

use crate::constants::{DEFAULT_UV_CHANNEL, LIGHTMAP_UV_CHANNEL};
use crate::scene::{Mesh, SceneContext, UvChannels, UvLayer};
use crate::types::ObjectId;

/// What `ensure_lightmap_layer` did to the lightmap channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightmapLayerChange {
    /// Already at index 1
    Reused,
    /// Found at another index and moved to index 1
    Moved { from: usize },
    /// Created at index 1; `displaced` is the channel pushed to index 2
    Created { displaced: Option<String> },
}

/// Create the primary UV channel if the mesh has none. Returns true if created.
pub fn ensure_primary_layer(mesh: &mut Mesh) -> bool {
    if !mesh.uv.is_empty() {
        return false;
    }
    mesh.uv.push(UvLayer::new(DEFAULT_UV_CHANNEL, mesh.loop_count()));
    true
}

fn unique_name(uv: &UvChannels, base: &str) -> String {
    if uv.index_of(base).is_none() {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}.{n:03}"))
        .find(|name| uv.index_of(name).is_none())
        .unwrap_or_else(|| base.to_string())
}

/// Put a `lightmap` channel at index 1 and make it active and active for render.
pub fn ensure_lightmap_layer(mesh: &mut Mesh) -> LightmapLayerChange {
    let loops = mesh.loop_count();
    ensure_primary_layer(mesh);
    mesh.uv.fit_to_loops(loops);
    let uv = &mut mesh.uv;

    let change = match uv.index_of(LIGHTMAP_UV_CHANNEL) {
        Some(1) => LightmapLayerChange::Reused,
        Some(0) => {
            // The only lightmap-named channel is the primary one; keep its data
            // as the primary under a new name.
            let coords = uv.layer(0).map(|layer| layer.coords.clone()).unwrap_or_default();
            let name = unique_name(uv, DEFAULT_UV_CHANNEL);
            uv.insert(0, UvLayer::with_coords(name, coords));
            LightmapLayerChange::Moved { from: 0 }
        }
        Some(from) => {
            if let Some(layer) = uv.remove(from) {
                uv.insert(1, layer);
            }
            LightmapLayerChange::Moved { from }
        }
        None => {
            let displaced = uv.layer(1).map(|layer| layer.name.clone());
            uv.insert(1, UvLayer::new(LIGHTMAP_UV_CHANNEL, loops));
            LightmapLayerChange::Created { displaced }
        }
    };

    uv.set_active(LIGHTMAP_UV_CHANNEL);
    uv.set_active_render(LIGHTMAP_UV_CHANNEL);
    change
}

/// Remove the `lightmap` channel. Returns true if one existed.
pub fn remove_lightmap_layer(mesh: &mut Mesh) -> bool {
    match mesh.uv.index_of(LIGHTMAP_UV_CHANNEL) {
        Some(index) => mesh.uv.remove(index).is_some(),
        None => false,
    }
}

/// Active channel names of one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UvSelection {
    pub active: Option<String>,
    pub active_render: Option<String>,
}

impl UvSelection {
    pub fn of(uv: &UvChannels) -> Self {
        Self {
            active: uv.active_name().map(str::to_string),
            active_render: uv.active_render_name().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("Object {0} no longer exists")]
    ObjectMissing(ObjectId),

    #[error("Object {object} has no UV channel named {channel:?}")]
    ChannelMissing { object: ObjectId, channel: String },
}

/// Selections captured at the start of a run, in capture order.
#[derive(Debug, Clone, Default)]
pub struct UvStateSnapshot {
    entries: Vec<(ObjectId, UvSelection)>,
}

impl UvStateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `object`'s selection unless it was already captured this run.
    pub fn capture(&mut self, object: ObjectId, uv: &UvChannels) -> bool {
        if self.contains(object) {
            return false;
        }
        self.entries.push((object, UvSelection::of(uv)));
        true
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.entries.iter().any(|(id, _)| *id == object)
    }

    pub fn get(&self, object: ObjectId) -> Option<&UvSelection> {
        self.entries
            .iter()
            .find(|(id, _)| *id == object)
            .map(|(_, selection)| selection)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reapply every captured selection whose channel still exists.
    ///
    /// Missing objects or channels are logged and reported; the remaining
    /// entries are still restored.
    pub fn restore(&self, scene: &mut SceneContext) -> Vec<RestoreError> {
        let mut errors = Vec::new();
        for (id, selection) in &self.entries {
            let Ok(object) = scene.object_mut(*id) else {
                errors.push(RestoreError::ObjectMissing(*id));
                continue;
            };
            let uv = &mut object.mesh.uv;
            if let Some(name) = &selection.active {
                if !uv.set_active(name) {
                    errors.push(RestoreError::ChannelMissing {
                        object: *id,
                        channel: name.clone(),
                    });
                }
            }
            if let Some(name) = &selection.active_render {
                if !uv.set_active_render(name) {
                    errors.push(RestoreError::ChannelMissing {
                        object: *id,
                        channel: name.clone(),
                    });
                }
            }
        }

        for error in &errors {
            warn!("UV restore: {error}");
        }
        debug!(
            "Restored UV selection of {} objects ({} problems)",
            self.entries.len(),
            errors.len()
        );
        errors
    }
}
