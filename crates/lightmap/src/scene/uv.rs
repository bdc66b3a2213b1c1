//! Named UV channels with active / active-for-render selection.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One named set of per-loop texture coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvLayer {
    pub name: String,
    /// One coordinate per polygon loop, in mesh loop order
    pub coords: Vec<Vec2>,
}

impl UvLayer {
    /// Create a zero-initialized layer for a mesh with `loop_count` loops.
    pub fn new(name: impl Into<String>, loop_count: usize) -> Self {
        Self {
            name: name.into(),
            coords: vec![Vec2::ZERO; loop_count],
        }
    }

    pub fn with_coords(name: impl Into<String>, coords: Vec<Vec2>) -> Self {
        Self {
            name: name.into(),
            coords,
        }
    }
}

/// Ordered UV channels of a mesh.
///
/// At most one channel is active (edited by tools) and at most one is active
/// for render (sampled by nodes without an explicit UV input). Both always
/// point at an existing channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UvChannels {
    layers: Vec<UvLayer>,
    active: Option<usize>,
    active_render: Option<usize>,
}

impl UvChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[UvLayer] {
        &self.layers
    }

    pub fn names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name.as_str()).collect()
    }

    pub fn layer(&self, index: usize) -> Option<&UvLayer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut UvLayer> {
        self.layers.get_mut(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&UvLayer> {
        self.index_of(name).and_then(|index| self.layers.get(index))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut UvLayer> {
        let index = self.index_of(name)?;
        self.layers.get_mut(index)
    }

    /// Append a layer. The first layer of a mesh becomes active and active for render.
    pub fn push(&mut self, layer: UvLayer) -> usize {
        let index = self.layers.len();
        self.insert(index, layer)
    }

    /// Insert a layer at `index` (clamped to the end), keeping the selection
    /// pointed at the same layers.
    pub fn insert(&mut self, index: usize, layer: UvLayer) -> usize {
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);

        for slot in [&mut self.active, &mut self.active_render] {
            if let Some(current) = slot {
                if *current >= index {
                    *current += 1;
                }
            }
        }

        if self.layers.len() == 1 {
            self.active = Some(0);
            self.active_render = Some(0);
        }
        index
    }

    /// Remove the layer at `index`.
    ///
    /// A selection that pointed at the removed layer falls back to the first
    /// remaining layer.
    pub fn remove(&mut self, index: usize) -> Option<UvLayer> {
        if index >= self.layers.len() {
            return None;
        }
        let removed = self.layers.remove(index);
        let remaining = self.layers.len();

        for slot in [&mut self.active, &mut self.active_render] {
            *slot = match *slot {
                Some(current) if current == index => (remaining > 0).then_some(0),
                Some(current) if current > index => Some(current - 1),
                other => other,
            };
        }

        Some(removed)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_render_index(&self) -> Option<usize> {
        self.active_render
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active
            .and_then(|index| self.layers.get(index))
            .map(|layer| layer.name.as_str())
    }

    pub fn active_render_name(&self) -> Option<&str> {
        self.active_render
            .and_then(|index| self.layers.get(index))
            .map(|layer| layer.name.as_str())
    }

    /// Make the named layer active. Returns false if no such layer exists.
    pub fn set_active(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(index) => {
                self.active = Some(index);
                true
            }
            None => false,
        }
    }

    /// Make the named layer active for render. Returns false if no such layer exists.
    pub fn set_active_render(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(index) => {
                self.active_render = Some(index);
                true
            }
            None => false,
        }
    }

    /// Resize every layer to `loop_count` coordinates, zero-filling new loops.
    pub(crate) fn fit_to_loops(&mut self, loop_count: usize) {
        for layer in &mut self.layers {
            layer.coords.resize(loop_count, Vec2::ZERO);
        }
    }
}
