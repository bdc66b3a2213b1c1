//! Lightmap run and registry summaries.

use serde::{Deserialize, Serialize};

/// Material view exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewKind {
    #[default]
    Authoring,
    Baked,
}

/// Outcome of one generate run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub groups_processed: usize,
    pub groups_succeeded: usize,
    pub groups_failed: usize,
    /// Lightmap ids written by this run (new or extended)
    pub atlases_created: Vec<String>,
    /// One human-readable entry per failed group
    pub errors: Vec<String>,
    /// Recovered planning problems and UV restore problems
    pub warnings: Vec<String>,
    /// Requested objects that were not baked (hidden or without materials)
    pub skipped_objects: Vec<u32>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.groups_failed == 0
    }
}

/// Outcome of clearing a lightmap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearSummary {
    pub lightmap_id: String,
    pub objects_untagged: usize,
    pub uv_channels_removed: usize,
    pub materials_unbound: usize,
}

/// One registry entry as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightmapInfo {
    pub lightmap_id: String,
    pub image_name: String,
    pub width: u32,
    pub height: u32,
    pub object_ids: Vec<u32>,
}
