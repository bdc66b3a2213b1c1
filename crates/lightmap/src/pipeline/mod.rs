//! Lightmap generation pipeline
//!
//! `SceneContext::generate` drives one run:
//! 1. Filter the request down to visible mesh objects
//! 2. Leave the baked view if it is active
//! 3. Build bake groups
//! 4. Capture UV selections and prepare the lightmap UV channels
//! 5. Per group: plan the atlas, acquire it, pack, bake
//! 6. Restore UV selections (always, even after failures)
//! 7. Register the atlases of successful groups and tag their objects
//! 8. Re-enter the baked view if the run started there
//!
//! A failing group is rolled back and recorded; it never aborts the run.

mod bake;
mod unwrap;

use lightbake_config::{
    BakeSettings, ColorSpace, GroupingConfig, LightmapConfig, ResolutionPolicy, UnwrapSettings,
};
use tracing::{debug, info, warn};

use crate::atlas::{AtlasCache, CacheError};
use crate::grouping::{BakeGroup, GroupKey, build_groups};
use crate::renderer::{BakeError, LightmapRenderer, PackError};
use crate::resolution::{PlanningError, plan_group};
use crate::scene::{SceneContext, SceneError};
use crate::shading::{ViewError, ViewMode};
use crate::types::{ImageId, LightmapId, ObjectId};
use crate::uv_layers::{RestoreError, UvStateSnapshot, ensure_lightmap_layer, ensure_primary_layer};

/// Everything one `generate` call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub objects: Vec<ObjectId>,
    pub grouping: GroupingConfig,
    pub resolution: ResolutionPolicy,
    pub unwrap: UnwrapSettings,
    pub bake: BakeSettings,
    pub color_space: ColorSpace,
}

impl GenerateRequest {
    pub fn new(objects: Vec<ObjectId>, config: &LightmapConfig) -> Self {
        Self {
            objects,
            grouping: config.grouping,
            resolution: config.resolution,
            unwrap: config.unwrap,
            bake: config.bake,
            color_space: config.color_space,
        }
    }
}

/// Why one group failed.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("Atlas setup failed: {0}")]
    Atlas(#[from] CacheError),

    #[error("Packing failed: {0}")]
    Pack(#[from] PackError),

    #[error("Bake failed: {0}")]
    Bake(#[from] BakeError),
}

/// A failed group and the objects it covered.
#[derive(Debug)]
pub struct GroupFailure {
    pub key: GroupKey,
    pub objects: Vec<ObjectId>,
    pub error: GroupError,
}

impl std::fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.key {
            GroupKey::Material(material) => write!(f, "Group for {material}: {}", self.error),
            GroupKey::Manual => write!(f, "Manual group: {}", self.error),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunResult {
    pub groups_attempted: usize,
    pub groups_succeeded: usize,
    pub groups_failed: usize,
    /// Lightmaps written by this run, new or extended, in group order
    pub atlases_created: Vec<LightmapId>,
    pub errors: Vec<GroupFailure>,
    pub warnings: Vec<PlanningError>,
    pub restore_errors: Vec<RestoreError>,
    /// Requested objects not baked: hidden, or without any material
    pub skipped_objects: Vec<ObjectId>,
}

impl RunResult {
    pub fn groups_processed(&self) -> usize {
        self.groups_attempted
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Errors that stop a run before any group is attempted.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("No visible mesh objects to bake")]
    NoEligibleObjects,

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    View(#[from] ViewError),
}

impl SceneContext {
    /// Bake lightmaps for the requested objects.
    pub fn generate<R: LightmapRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        request: &GenerateRequest,
    ) -> Result<RunResult, RunError> {
        let mut result = RunResult::default();

        let mut eligible = Vec::with_capacity(request.objects.len());
        for id in &request.objects {
            if self.object(*id)?.visible {
                eligible.push(*id);
            } else {
                debug!("Skipping hidden object {id}");
                result.skipped_objects.push(*id);
            }
        }
        if eligible.is_empty() {
            warn!("No visible mesh objects selected for lightmap generation");
            return Err(RunError::NoEligibleObjects);
        }

        let was_baked = self.view_mode() == ViewMode::Baked;
        if was_baked {
            self.set_view(ViewMode::Authoring)?;
        }

        let grouping = build_groups(self, &eligible, &request.grouping)?;
        result.skipped_objects.extend(grouping.unassigned.iter().copied());
        info!(
            "Generating lightmaps for {} objects in {} groups",
            eligible.len(),
            grouping.groups.len()
        );

        let snapshot = self.prepare_uv_channels(&grouping.groups);

        let mut cache = AtlasCache::new();
        let mut succeeded: Vec<(&BakeGroup, ImageId)> = Vec::new();
        for group in &grouping.groups {
            result.groups_attempted += 1;
            match self.run_group(renderer, &mut cache, group, request, &mut result.warnings) {
                Ok(image) => {
                    result.groups_succeeded += 1;
                    succeeded.push((group, image));
                }
                Err(error) => {
                    result.groups_failed += 1;
                    let failure = GroupFailure {
                        key: group.key,
                        objects: group.objects.clone(),
                        error,
                    };
                    warn!("{failure}");
                    result.errors.push(failure);
                }
            }
        }

        result.restore_errors = snapshot.restore(self);

        for (group, image) in succeeded {
            let id = self.registry.register(image, &group.objects);
            self.tag_objects(&id, &group.objects);
            if !result.atlases_created.contains(&id) {
                result.atlases_created.push(id);
            }
        }

        if was_baked {
            if let Err(err) = self.set_view(ViewMode::Baked) {
                warn!("Could not return to baked view: {err}");
            }
        }

        info!(
            "Lightmap run finished: {} of {} groups baked, {} atlases",
            result.groups_succeeded,
            result.groups_attempted,
            result.atlases_created.len()
        );
        Ok(result)
    }

    /// Create missing primary channels, capture each object's UV selection
    /// once, then put the lightmap channel in place.
    fn prepare_uv_channels(&mut self, groups: &[BakeGroup]) -> UvStateSnapshot {
        let mut snapshot = UvStateSnapshot::new();
        for id in groups.iter().flat_map(|group| group.objects.iter()) {
            if snapshot.contains(*id) {
                continue;
            }
            let Ok(object) = self.object_mut(*id) else {
                continue;
            };
            if ensure_primary_layer(&mut object.mesh) {
                debug!("Created primary UV channel on {}", object.name);
            }
            snapshot.capture(*id, &object.mesh.uv);
            let change = ensure_lightmap_layer(&mut object.mesh);
            debug!("Lightmap UV channel on {}: {change:?}", object.name);
        }
        snapshot
    }

    fn run_group<R: LightmapRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        cache: &mut AtlasCache,
        group: &BakeGroup,
        request: &GenerateRequest,
        warnings: &mut Vec<PlanningError>,
    ) -> Result<ImageId, GroupError> {
        let plan = plan_group(
            group.planning_area(self),
            group.planning_objects.len(),
            &request.resolution,
            group.mode,
            group.footprint(self),
        );
        warnings.extend(plan.warnings);

        let binding = cache.acquire(
            self,
            &group.key,
            &group.materials,
            plan.spec,
            request.color_space,
        )?;
        let previous_coords = unwrap::capture_lightmap_coords(self, group);

        let outcome = unwrap::unwrap_group(self, renderer, group, &request.unwrap)
            .map_err(GroupError::from)
            .and_then(|_| {
                bake::bake_group(self, renderer, group, &binding, &request.bake)
                    .map_err(GroupError::from)
            });

        if let Err(error) = outcome {
            unwrap::restore_lightmap_coords(self, previous_coords);
            cache.rollback(self, &binding);
            return Err(error);
        }
        Ok(binding.image)
    }
}
