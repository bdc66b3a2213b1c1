//! Dispatch of IPC commands onto the scene.
//!
//! Every command produces exactly one event. Failures are reported as
//! `LightmapEvent::Error` with a stable code instead of being returned.

use lightbake_config::LightmapConfig;
use lightbake_ipc::{
    ClearSummary, LightmapCommand, LightmapEvent, LightmapInfo, RunSummary, ViewKind,
};
use tracing::{debug, info, warn};

use crate::pipeline::{GenerateRequest, RunError, RunResult};
use crate::registry::ClearError;
use crate::renderer::LightmapRenderer;
use crate::scene::SceneContext;
use crate::shading::{ViewMode, ViewOutcome};
use crate::types::{LightmapId, ObjectId};

impl From<ViewKind> for ViewMode {
    fn from(kind: ViewKind) -> Self {
        match kind {
            ViewKind::Authoring => ViewMode::Authoring,
            ViewKind::Baked => ViewMode::Baked,
        }
    }
}

impl From<ViewMode> for ViewKind {
    fn from(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Authoring => ViewKind::Authoring,
            ViewMode::Baked => ViewKind::Baked,
        }
    }
}

impl From<&RunResult> for RunSummary {
    fn from(result: &RunResult) -> Self {
        let mut warnings: Vec<String> = result.warnings.iter().map(ToString::to_string).collect();
        warnings.extend(result.restore_errors.iter().map(ToString::to_string));
        RunSummary {
            groups_processed: result.groups_processed(),
            groups_succeeded: result.groups_succeeded,
            groups_failed: result.groups_failed,
            atlases_created: result
                .atlases_created
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            errors: result.error_messages(),
            warnings,
            skipped_objects: result.skipped_objects.iter().map(|id| id.0).collect(),
        }
    }
}

fn run_error_code(error: &RunError) -> &'static str {
    match error {
        RunError::NoEligibleObjects => "no_eligible_objects",
        RunError::Scene(_) => "unknown_object",
        RunError::View(_) => "view_failed",
    }
}

/// Execute one command against the scene and answer with one event.
pub fn handle_command(
    scene: &mut SceneContext,
    renderer: &mut dyn LightmapRenderer,
    defaults: &LightmapConfig,
    command: LightmapCommand,
) -> LightmapEvent {
    match command {
        LightmapCommand::Generate(command) => {
            let mut config = command.config.unwrap_or_else(|| defaults.clone());
            let adjustments = config.validate();
            let objects: Vec<ObjectId> = command.object_ids.into_iter().map(ObjectId).collect();
            debug!("Generate requested for {} objects", objects.len());
            let request = GenerateRequest::new(objects, &config);
            match scene.generate(renderer, &request) {
                Ok(result) => {
                    let mut summary = RunSummary::from(&result);
                    let config_warnings = adjustments.iter().map(|adjustment| {
                        format!(
                            "Config value {} out of range ({} -> {})",
                            adjustment.field, adjustment.from, adjustment.to
                        )
                    });
                    summary.warnings.splice(0..0, config_warnings);
                    LightmapEvent::GenerateCompleted(summary)
                }
                Err(err) => {
                    warn!("Lightmap generation rejected: {err}");
                    LightmapEvent::error(run_error_code(&err), err.to_string())
                }
            }
        }
        LightmapCommand::Clear(command) => {
            let id = LightmapId::new(command.lightmap_id);
            match scene.clear_lightmap(&id) {
                Ok(report) => LightmapEvent::Cleared(ClearSummary {
                    lightmap_id: report.lightmap.as_str().to_string(),
                    objects_untagged: report.objects_untagged.len(),
                    uv_channels_removed: report.uv_channels_removed,
                    materials_unbound: report.materials_unbound.len(),
                }),
                Err(err @ ClearError::UnknownLightmap(_)) => {
                    LightmapEvent::error("unknown_lightmap", err.to_string())
                }
                Err(err) => LightmapEvent::error("clear_failed", err.to_string()),
            }
        }
        LightmapCommand::SetView(command) => match scene.set_view(command.view.into()) {
            Ok(ViewOutcome::Switched {
                mode,
                materials,
                lights,
            }) => {
                info!("View switched to {mode:?}");
                LightmapEvent::ViewChanged {
                    view: mode.into(),
                    changed: true,
                    materials,
                    lights,
                }
            }
            Ok(ViewOutcome::AlreadyActive(mode)) => LightmapEvent::ViewChanged {
                view: mode.into(),
                changed: false,
                materials: 0,
                lights: 0,
            },
            Ok(ViewOutcome::NoLightmapsFound) => LightmapEvent::NoLightmapsFound,
            Err(err) => LightmapEvent::error("view_failed", err.to_string()),
        },
        LightmapCommand::ListLightmaps => LightmapEvent::LightmapList(list_lightmaps(scene)),
    }
}

fn list_lightmaps(scene: &SceneContext) -> Vec<LightmapInfo> {
    scene
        .registry()
        .entries()
        .filter_map(|(id, entry)| {
            let atlas = scene.image(entry.image).ok()?;
            Some(LightmapInfo {
                lightmap_id: id.as_str().to_string(),
                image_name: atlas.name.clone(),
                width: atlas.width,
                height: atlas.height,
                object_ids: entry.objects.iter().map(|id| id.0).collect(),
            })
        })
        .collect()
}
