//! Object registry: snapshot ownership and host-graph traversal
//!
//! The registry is the sole owner of [`SceneObject`] values for one scene
//! snapshot. It is built fresh at scene-open/render-start, may be patched
//! incrementally during an interactive session, and is dropped when the
//! session ends. It never mutates the host scene.

use std::collections::{BTreeSet, HashMap};

use super::object::{ExclusionList, SceneObject};
use crate::errors::BridgeResult;
use crate::host::{HostScene, NodeId};

/// Owns the set of scene objects for one snapshot
#[derive(Default)]
pub struct ObjectRegistry {
    objects: HashMap<NodeId, SceneObject>,
    order: Vec<NodeId>,
    lights: Vec<NodeId>,
    cameras: Vec<NodeId>,
    instancer_objects: Vec<NodeId>,
}

impl ObjectRegistry {
    /// Full traversal of the host graph into a fresh registry
    ///
    /// Never partial: a node whose path cannot resolve is skipped with a
    /// warning, not a fatal error.
    #[must_use]
    pub fn build(host: &dyn HostScene) -> Self {
        let mut registry = Self::default();
        for id in host.nodes() {
            match SceneObject::from_host(host, id) {
                Ok(object) => {
                    registry.order.push(id);
                    registry.objects.insert(id, object);
                }
                Err(err) => log::warn!("skipping host node: {err}"),
            }
        }
        registry.resolve_prototypes(host);
        registry.resolve_light_links(host);
        registry.rebuild_indices();
        registry
    }

    /// Look up an object by id
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Mutable lookup by id
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Objects in host traversal order
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    /// Number of owned objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the registry owns nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Light objects, in traversal order
    #[must_use]
    pub fn lights(&self) -> &[NodeId] {
        &self.lights
    }

    /// Camera objects, in traversal order
    #[must_use]
    pub fn cameras(&self) -> &[NodeId] {
        &self.cameras
    }

    /// Objects feeding an external instancer
    #[must_use]
    pub fn instancer_objects(&self) -> &[NodeId] {
        &self.instancer_objects
    }

    /// Resolve an object's prototype
    ///
    /// For a prototype path (`instance_number == 0`) this is the object
    /// itself; for an instance path it is the id-0 counterpart sharing the
    /// same underlying shape identity. Matching is by node identity, never by
    /// path string: paths differ per instance.
    #[must_use]
    pub fn find_prototype(&self, id: NodeId) -> Option<&SceneObject> {
        let object = self.objects.get(&id)?;
        if object.instance_number == 0 {
            return Some(object);
        }
        object.prototype.and_then(|proto| self.objects.get(&proto))
    }

    /// Incrementally add a single node to the snapshot
    pub fn patch_add(&mut self, host: &dyn HostScene, id: NodeId) -> BridgeResult<()> {
        let object = SceneObject::from_host(host, id)?;
        if self.objects.insert(id, object).is_none() {
            self.order.push(id);
        }
        self.resolve_prototypes(host);
        self.resolve_light_links(host);
        self.rebuild_indices();
        Ok(())
    }

    /// Incrementally remove a single node from the snapshot
    pub fn patch_remove(&mut self, id: NodeId) {
        if self.objects.remove(&id).is_some() {
            self.order.retain(|&n| n != id);
            self.rebuild_indices();
        }
    }

    /// Incrementally refresh a single node's transform samples
    pub fn patch_transform(&mut self, host: &dyn HostScene, id: NodeId) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.update_object(host);
        }
    }

    /// Re-sample transforms for motion blur
    ///
    /// The caller advances the host's evaluation time between calls; the
    /// first call per frame resets the sample list, later calls append one
    /// sample to every motion-blurred object.
    pub fn sample_motion(&mut self, host: &dyn HostScene, first_step: bool, steps: u32) {
        for object in self.objects.values_mut() {
            if first_step {
                object.mb_steps = steps.max(1);
                object.update_object(host);
            } else if object.flags.contains(super::ObjectFlags::MOTION_BLURRED)
                && (object.transform_samples.len() as u32) < object.mb_steps
            {
                object.add_motion_sample(host);
            }
        }
    }

    // Prototype resolution matches the underlying host node identity shared
    // by all instance paths.
    fn resolve_prototypes(&mut self, host: &dyn HostScene) {
        let prototypes: HashMap<u64, NodeId> = self
            .objects
            .values()
            .filter(|o| o.instance_number == 0)
            .map(|o| (host.shape_identity(o.id), o.id))
            .collect();

        for object in self.objects.values_mut() {
            if object.instance_number == 0 {
                continue;
            }
            object.prototype = prototypes.get(&host.shape_identity(object.id)).copied();
            if object.prototype.is_none() {
                log::warn!("instance {} has no prototype path in the snapshot", object.path);
            }
        }
    }

    // Per light, store whichever of the include/exclude link forms is the
    // smaller list.
    fn resolve_light_links(&mut self, host: &dyn HostScene) {
        let geometry: BTreeSet<NodeId> = self
            .objects
            .values()
            .filter(|o| o.category.is_shape())
            .map(|o| o.id)
            .collect();

        let light_ids: Vec<NodeId> = self
            .objects
            .values()
            .filter(|o| o.category.is_light())
            .map(|o| o.id)
            .collect();

        for light in light_ids {
            let light_exclusion =
                Self::pick_smaller_form(&geometry, &host.light_linked_nodes(light));
            let shadow_exclusion =
                Self::pick_smaller_form(&geometry, &host.shadow_linked_nodes(light));
            if let Some(object) = self.objects.get_mut(&light) {
                object.light_exclusion = light_exclusion;
                object.shadow_exclusion = shadow_exclusion;
            }
        }
    }

    fn pick_smaller_form(geometry: &BTreeSet<NodeId>, linked: &[NodeId]) -> ExclusionList {
        let linked: BTreeSet<NodeId> = linked
            .iter()
            .copied()
            .filter(|id| geometry.contains(id))
            .collect();
        let excluded: BTreeSet<NodeId> = geometry.difference(&linked).copied().collect();
        if excluded.len() <= linked.len() {
            ExclusionList {
                targets: excluded,
                is_exclude: true,
            }
        } else {
            ExclusionList {
                targets: linked,
                is_exclude: false,
            }
        }
    }

    fn rebuild_indices(&mut self) {
        self.lights.clear();
        self.cameras.clear();
        self.instancer_objects.clear();
        for id in &self.order {
            let Some(object) = self.objects.get(id) else {
                continue;
            };
            if object.category.is_light() {
                self.lights.push(*id);
            }
            if object.category == super::NodeCategory::Camera {
                self.cameras.push(*id);
            }
            if object.flags.contains(super::ObjectFlags::INSTANCER_GENERATED) {
                self.instancer_objects.push(*id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostNodeKind, MemoryScene};

    fn small_scene() -> (MemoryScene, NodeId, NodeId, NodeId) {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_node("floorShape", HostNodeKind::Mesh, None);
        let light = scene.add_node("keyLight", HostNodeKind::PointLight, None);
        let camera = scene.add_node("renderCam", HostNodeKind::Camera, None);
        (scene, mesh, light, camera)
    }

    #[test]
    fn test_build_populates_indices() {
        let (scene, mesh, light, camera) = small_scene();
        let registry = ObjectRegistry::build(&scene);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lights(), &[light]);
        assert_eq!(registry.cameras(), &[camera]);
        assert!(registry.get(mesh).is_some());
    }

    #[test]
    fn test_unresolvable_node_is_skipped_not_fatal() {
        let (mut scene, _, _, _) = small_scene();
        let ghost = scene.add_node("ghost", HostNodeKind::Mesh, None);
        scene.set_unresolvable(ghost);
        let registry = ObjectRegistry::build(&scene);
        assert_eq!(registry.len(), 3);
        assert!(registry.get(ghost).is_none());
    }

    #[test]
    fn test_find_prototype_resolves_to_id_zero() {
        let mut scene = MemoryScene::new();
        let proto = scene.add_node("treeShape", HostNodeKind::Mesh, None);
        let inst_a = scene.add_instance("treeShape1", proto, None);
        let inst_b = scene.add_instance("treeShape2", proto, None);

        let registry = ObjectRegistry::build(&scene);
        for inst in [inst_a, inst_b] {
            let resolved = registry.find_prototype(inst).expect("prototype resolves");
            assert_eq!(resolved.id, proto);
            assert_eq!(resolved.instance_number, 0);
            assert_eq!(scene.shape_identity(resolved.id), scene.shape_identity(inst));
        }
        // the prototype resolves to itself
        assert_eq!(registry.find_prototype(proto).unwrap().id, proto);
    }

    #[test]
    fn test_light_links_pick_smaller_form() {
        let mut scene = MemoryScene::new();
        let a = scene.add_node("aShape", HostNodeKind::Mesh, None);
        let b = scene.add_node("bShape", HostNodeKind::Mesh, None);
        let c = scene.add_node("cShape", HostNodeKind::Mesh, None);
        let wide = scene.add_node("wideLight", HostNodeKind::PointLight, None);
        let narrow = scene.add_node("narrowLight", HostNodeKind::PointLight, None);
        // wide illuminates all but one: exclude form is shorter
        scene.set_light_links(wide, vec![a, b]);
        // narrow illuminates a single object: include form is shorter
        scene.set_light_links(narrow, vec![a]);

        let registry = ObjectRegistry::build(&scene);
        let wide_obj = registry.get(wide).unwrap();
        assert!(wide_obj.light_exclusion.is_exclude);
        assert_eq!(wide_obj.light_exclusion.targets.len(), 1);
        assert!(wide_obj.light_exclusion.excludes(c));
        assert!(!wide_obj.light_exclusion.excludes(a));

        let narrow_obj = registry.get(narrow).unwrap();
        assert!(!narrow_obj.light_exclusion.is_exclude);
        assert_eq!(narrow_obj.light_exclusion.targets.len(), 1);
        assert!(narrow_obj.light_exclusion.excludes(b));
        assert!(!narrow_obj.light_exclusion.excludes(a));
    }

    #[test]
    fn test_motion_sampling_appends_up_to_step_count() {
        let mut scene = MemoryScene::new();
        let shape = scene.add_node("blurShape", HostNodeKind::Mesh, None);
        let mut registry = ObjectRegistry::build(&scene);

        registry.sample_motion(&scene, true, 3);
        registry.sample_motion(&scene, false, 3);
        registry.sample_motion(&scene, false, 3);
        registry.sample_motion(&scene, false, 3); // past the step count; ignored
        assert_eq!(registry.get(shape).unwrap().transform_samples.len(), 3);

        // a fresh first step resets to the current sample
        registry.sample_motion(&scene, true, 3);
        assert_eq!(registry.get(shape).unwrap().transform_samples.len(), 1);
    }

    #[test]
    fn test_incremental_patches() {
        let (mut scene, mesh, _, _) = small_scene();
        let mut registry = ObjectRegistry::build(&scene);

        let extra = scene.add_node("extraShape", HostNodeKind::Mesh, None);
        registry.patch_add(&scene, extra).unwrap();
        assert_eq!(registry.len(), 4);

        scene.set_world_matrix(
            mesh,
            crate::foundation::math::Mat4::new_translation(&nalgebra::Vector3::new(0.0, 2.0, 0.0)),
        );
        registry.patch_transform(&scene, mesh);
        assert_eq!(registry.get(mesh).unwrap().transform_samples[0][(1, 3)], 2.0);

        registry.patch_remove(extra);
        assert_eq!(registry.len(), 3);
        assert!(registry.get(extra).is_none());
    }
}
