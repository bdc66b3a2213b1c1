//! Partitioning objects into bake groups
//!
//! Automatic grouping keys groups by material, so an object with several
//! materials lands in several groups and each group only covers the polygons
//! drawn with its material. Manual grouping puts every object into one group.
//! Group order follows first appearance in the input; nothing here iterates an
//! unordered collection.

use std::collections::HashMap;

use lightbake_config::{GroupingConfig, GroupingPolicy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolution::{PlanMode, footprint};
use crate::scene::{SceneContext, SceneError};
use crate::surface_area::polygons_area;
use crate::types::{MaterialId, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    Material(MaterialId),
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BakeGroup {
    pub key: GroupKey,
    /// Objects the caller asked to bake, in input order
    pub objects: Vec<ObjectId>,
    /// Objects whose area sizes the atlas; a superset of `objects` when
    /// shared materials are factored in
    pub planning_objects: Vec<ObjectId>,
    /// Materials whose graphs sample this group's atlas
    pub materials: Vec<MaterialId>,
    pub mode: PlanMode,
}

impl BakeGroup {
    /// Polygons of `object` that belong to this group.
    pub fn polygons_for(&self, scene: &SceneContext, object: ObjectId) -> Vec<usize> {
        let Ok(object) = scene.object(object) else {
            return Vec::new();
        };
        match self.key {
            GroupKey::Material(material) => object.polygons_with_material(material),
            GroupKey::Manual => (0..object.mesh.polygons.len()).collect(),
        }
    }

    /// World-space area of the group's polygons across `planning_objects`.
    pub fn planning_area(&self, scene: &SceneContext) -> f32 {
        self.planning_objects
            .iter()
            .filter_map(|id| scene.object(*id).ok())
            .map(|object| polygons_area(object, self.polygons_for(scene, object.id)))
            .sum()
    }

    /// Dominant footprint of the lead object, used for the aspect decision.
    pub fn footprint(&self, scene: &SceneContext) -> Option<(f32, f32)> {
        let lead = scene.object(*self.objects.first()?).ok()?;
        lead.world_bounds().map(|bounds| footprint(&bounds))
    }
}

/// Groups plus the requested objects no group covers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grouping {
    pub groups: Vec<BakeGroup>,
    /// Objects without any material (automatic grouping only)
    pub unassigned: Vec<ObjectId>,
}

/// Partition `objects` according to `config`. Duplicate ids are ignored.
pub fn build_groups(
    scene: &SceneContext,
    objects: &[ObjectId],
    config: &GroupingConfig,
) -> Result<Grouping, SceneError> {
    let mut requested = Vec::with_capacity(objects.len());
    for id in objects {
        scene.object(*id)?;
        if !requested.contains(id) {
            requested.push(*id);
        }
    }

    let grouping = match config.policy {
        GroupingPolicy::Automatic => group_by_material(scene, &requested, config),
        GroupingPolicy::Manual => manual_group(scene, requested),
    };

    debug!(
        "Built {} bake groups ({} objects unassigned)",
        grouping.groups.len(),
        grouping.unassigned.len()
    );
    Ok(grouping)
}

fn group_by_material(
    scene: &SceneContext,
    requested: &[ObjectId],
    config: &GroupingConfig,
) -> Grouping {
    let mut grouping = Grouping::default();
    let mut index_of: HashMap<MaterialId, usize> = HashMap::new();

    for id in requested {
        let Ok(object) = scene.object(*id) else {
            continue;
        };
        let materials = object.materials();
        if materials.is_empty() {
            grouping.unassigned.push(*id);
            continue;
        }
        for material in materials {
            let index = *index_of.entry(material).or_insert_with(|| {
                grouping.groups.push(BakeGroup {
                    key: GroupKey::Material(material),
                    objects: Vec::new(),
                    planning_objects: Vec::new(),
                    materials: vec![material],
                    mode: PlanMode::Single,
                });
                grouping.groups.len() - 1
            });
            grouping.groups[index].objects.push(*id);
        }
    }

    for group in &mut grouping.groups {
        group.planning_objects = group.objects.clone();
        if config.factor_shared_materials {
            let GroupKey::Material(material) = group.key else {
                continue;
            };
            for other in scene.objects_using_material(material) {
                if !group.planning_objects.contains(&other) {
                    group.planning_objects.push(other);
                }
            }
        }
    }

    grouping
}

fn manual_group(scene: &SceneContext, requested: Vec<ObjectId>) -> Grouping {
    if requested.is_empty() {
        return Grouping::default();
    }
    let mut materials = Vec::new();
    for object in requested.iter().filter_map(|id| scene.object(*id).ok()) {
        for material in object.materials() {
            if !materials.contains(&material) {
                materials.push(material);
            }
        }
    }
    Grouping {
        groups: vec![BakeGroup {
            key: GroupKey::Manual,
            planning_objects: requested.clone(),
            objects: requested,
            materials,
            mode: PlanMode::Grouped,
        }],
        unassigned: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use glam::{Affine3A, Vec3};

    use super::*;
    use crate::scene::Mesh;

    fn config(policy: GroupingPolicy, factor_shared_materials: bool) -> GroupingConfig {
        GroupingConfig {
            policy,
            factor_shared_materials,
        }
    }

    #[test]
    fn test_shared_material_forms_one_group() {
        let mut scene = SceneContext::new();
        let m = scene.add_material("M", [1.0; 4]);
        let a = scene.add_object("A", Mesh::cube(), Affine3A::IDENTITY, vec![Some(m)]);
        let b = scene.add_object(
            "B",
            Mesh::cube(),
            Affine3A::from_translation(Vec3::X * 3.0),
            vec![Some(m)],
        );

        let grouping =
            build_groups(&scene, &[a, b], &config(GroupingPolicy::Automatic, false)).unwrap();

        assert_eq!(grouping.groups.len(), 1);
        let group = &grouping.groups[0];
        assert_eq!(group.key, GroupKey::Material(m));
        assert_eq!(group.objects, vec![a, b]);
        assert_eq!(group.mode, PlanMode::Single);
        assert!((group.planning_area(&scene) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_multi_material_object_joins_each_group() {
        let mut scene = SceneContext::new();
        let m = scene.add_material("M", [1.0; 4]);
        let n = scene.add_material("N", [1.0; 4]);
        let mut mesh = Mesh::cube();
        mesh.polygons[0].material_index = 1;
        let a = scene.add_object("A", mesh, Affine3A::IDENTITY, vec![Some(n), Some(m)]);
        let b = scene.add_object("B", Mesh::cube(), Affine3A::IDENTITY, vec![Some(m)]);

        let grouping =
            build_groups(&scene, &[a, b], &config(GroupingPolicy::Automatic, false)).unwrap();

        let keys: Vec<_> = grouping.groups.iter().map(|g| g.key).collect();
        assert_eq!(keys, vec![GroupKey::Material(n), GroupKey::Material(m)]);
        assert_eq!(grouping.groups[0].objects, vec![a]);
        assert_eq!(grouping.groups[1].objects, vec![a, b]);
        assert_eq!(grouping.groups[1].polygons_for(&scene, a), vec![0]);
        assert_eq!(grouping.groups[0].polygons_for(&scene, a).len(), 5);
    }

    #[test]
    fn test_factor_shared_expands_planning_only() {
        let mut scene = SceneContext::new();
        let m = scene.add_material("M", [1.0; 4]);
        let a = scene.add_object("A", Mesh::cube(), Affine3A::IDENTITY, vec![Some(m)]);
        let b = scene.add_object("B", Mesh::cube(), Affine3A::IDENTITY, vec![Some(m)]);

        let grouping =
            build_groups(&scene, &[a], &config(GroupingPolicy::Automatic, true)).unwrap();

        let group = &grouping.groups[0];
        assert_eq!(group.objects, vec![a]);
        assert_eq!(group.planning_objects, vec![a, b]);
        assert!((group.planning_area(&scene) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_manual_grouping_single_group() {
        let mut scene = SceneContext::new();
        let m = scene.add_material("M", [1.0; 4]);
        let n = scene.add_material("N", [1.0; 4]);
        let a = scene.add_object("A", Mesh::cube(), Affine3A::IDENTITY, vec![Some(m)]);
        let b = scene.add_object("B", Mesh::cube(), Affine3A::IDENTITY, vec![Some(n), Some(m)]);

        let grouping =
            build_groups(&scene, &[b, a, b], &config(GroupingPolicy::Manual, false)).unwrap();

        assert_eq!(grouping.groups.len(), 1);
        let group = &grouping.groups[0];
        assert_eq!(group.key, GroupKey::Manual);
        assert_eq!(group.objects, vec![b, a]);
        assert_eq!(group.materials, vec![n, m]);
        assert_eq!(group.mode, PlanMode::Grouped);
    }

    #[test]
    fn test_object_without_material_is_unassigned() {
        let mut scene = SceneContext::new();
        let a = scene.add_object("A", Mesh::cube(), Affine3A::IDENTITY, vec![None]);
        let grouping =
            build_groups(&scene, &[a], &config(GroupingPolicy::Automatic, false)).unwrap();
        assert!(grouping.groups.is_empty());
        assert_eq!(grouping.unassigned, vec![a]);
    }

    #[test]
    fn test_unknown_object_is_an_error() {
        let scene = SceneContext::new();
        assert_eq!(
            build_groups(&scene, &[ObjectId(7)], &GroupingConfig::default()),
            Err(SceneError::UnknownObject(ObjectId(7)))
        );
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let mut scene = SceneContext::new();
        let materials: Vec<_> = (0..16)
            .map(|i| scene.add_material(format!("M{i}"), [1.0; 4]))
            .collect();
        let objects: Vec<_> = materials
            .iter()
            .rev()
            .map(|m| scene.add_object("O", Mesh::cube(), Affine3A::IDENTITY, vec![Some(*m)]))
            .collect();

        let first = build_groups(&scene, &objects, &GroupingConfig::default()).unwrap();
        let second = build_groups(&scene, &objects, &GroupingConfig::default()).unwrap();
        assert_eq!(first, second);
        let keys: Vec<_> = first.groups.iter().map(|g| g.key).collect();
        let expected: Vec<_> = materials.iter().rev().map(|m| GroupKey::Material(*m)).collect();
        assert_eq!(keys, expected);
    }
}
