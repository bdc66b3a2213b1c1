//! Command payloads for lightmap requests.

use lightbake_config::LightmapConfig;
use serde::{Deserialize, Serialize};

use crate::types::ViewKind;

/// Bake lightmaps for a set of objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateCommand {
    /// Objects to bake, in the order groups should be formed
    pub object_ids: Vec<u32>,
    /// Overrides the handler's default config when present
    #[serde(default)]
    pub config: Option<LightmapConfig>,
}

/// Remove one registered lightmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCommand {
    pub lightmap_id: String,
}

/// Switch between the authoring and baked view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetViewCommand {
    pub view: ViewKind,
}
