//! Lightbake lightmap pipeline - atlas planning, grouping and bake orchestration
//!
//! This crate turns a selection of scene objects into baked lightmap atlases:
//! - [`resolution`] - Atlas size planning from surface area and texel density
//! - [`grouping`] - Partitioning objects into bake groups per material
//! - [`uv_layers`] - Lightmap UV channel placement and selection snapshots
//! - [`atlas`] - Atlas textures and the per-run atlas cache
//! - [`pipeline`] - One generate run: pack, bake, register
//! - [`registry`] - Lightmap ids, object tags and clearing
//! - [`shading`] - Material graphs and the baked/authoring view toggle
//! - [`commands`] - IPC command dispatch
//!
//! Packing and light transport are delegated to a [`renderer::LightmapRenderer`].

pub mod atlas;
pub mod commands;
pub mod constants;
pub mod grouping;
pub mod pipeline;
pub mod registry;
pub mod renderer;
pub mod resolution;
pub mod scene;
pub mod shading;
pub mod surface_area;
pub mod types;
pub mod uv_layers;

#[cfg(test)]
mod test_support;

pub use atlas::*;
pub use commands::*;
pub use constants::*;
pub use grouping::*;
pub use pipeline::*;
pub use registry::*;
pub use renderer::*;
pub use resolution::*;
pub use scene::*;
pub use shading::*;
pub use surface_area::*;
pub use types::*;
pub use uv_layers::*;
