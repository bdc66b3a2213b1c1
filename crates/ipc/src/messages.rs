//! Request and response enums for the lightmap service.

use serde::{Deserialize, Serialize};

use crate::commands::{ClearCommand, GenerateCommand, SetViewCommand};
use crate::types::{ClearSummary, LightmapInfo, RunSummary, ViewKind};

/// Requests from a caller (UI panel, exporter, script) to the lightmap service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LightmapCommand {
    /// Plan, unwrap and bake lightmaps for the given objects
    Generate(GenerateCommand),

    /// Remove a lightmap and everything wired to it
    Clear(ClearCommand),

    /// Toggle between authoring and baked materials
    SetView(SetViewCommand),

    /// List registered lightmaps
    ListLightmaps,
}

/// Responses from the lightmap service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LightmapEvent {
    /// A generate run finished (possibly with failed groups)
    GenerateCompleted(RunSummary),

    /// A lightmap was removed
    Cleared(ClearSummary),

    /// The view is now `view`; `changed` is false if it already was
    ViewChanged {
        view: ViewKind,
        changed: bool,
        materials: usize,
        lights: usize,
    },

    /// Baked view requested but nothing has been baked
    NoLightmapsFound,

    /// Registered lightmaps
    LightmapList(Vec<LightmapInfo>),

    /// Error notification
    Error { code: String, message: String },
}

impl LightmapEvent {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        LightmapEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
