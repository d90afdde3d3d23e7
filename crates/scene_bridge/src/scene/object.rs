//! Scene object: snapshot of one host node
//!
//! A [`SceneObject`] is created once per host node per scene snapshot and is
//! owned exclusively by the registry. Construction classifies the node and
//! computes every render-relevant flag up front; afterwards only the transform
//! sample list changes.

use std::collections::BTreeSet;

use bitflags::bitflags;

use super::visibility;
use crate::errors::{BridgeError, BridgeResult};
use crate::foundation::math::Mat4;
use crate::host::{path, HostNodeKind, HostScene, NodeId};

bitflags! {
    /// Render-relevant state captured at construction
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjectFlags: u8 {
        /// Object passes the full visibility chain
        const VISIBLE = 1 << 0;
        /// Something drives the object's transform or shape
        const ANIMATED = 1 << 1;
        /// The shape's creation input is procedurally connected
        const SHAPE_CONNECTED = 1 << 2;
        /// Motion blur is enabled for this object
        const MOTION_BLURRED = 1 << 3;
        /// The object feeds an external instancer/particle system
        const INSTANCER_GENERATED = 1 << 4;
    }
}

/// Closed classification of a host node, computed once at construction
///
/// Downstream code dispatches on this tag instead of re-probing the host's
/// node type, so every call site agrees on what an object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    /// Polygonal mesh
    Mesh,
    /// NURBS surface
    NurbsSurface,
    /// NURBS curve
    NurbsCurve,
    /// Point light
    PointLight,
    /// Spot light
    SpotLight,
    /// Directional light
    DirectionalLight,
    /// Area light (translated as emissive geometry)
    AreaLight,
    /// Camera
    Camera,
    /// No translation rule
    Other,
}

impl NodeCategory {
    fn classify(kind: HostNodeKind) -> Self {
        match kind {
            HostNodeKind::Mesh => Self::Mesh,
            HostNodeKind::NurbsSurface => Self::NurbsSurface,
            HostNodeKind::NurbsCurve => Self::NurbsCurve,
            HostNodeKind::PointLight => Self::PointLight,
            HostNodeKind::SpotLight => Self::SpotLight,
            HostNodeKind::DirectionalLight => Self::DirectionalLight,
            HostNodeKind::AreaLight => Self::AreaLight,
            HostNodeKind::Camera => Self::Camera,
            HostNodeKind::Transform | HostNodeKind::Instancer | HostNodeKind::Other => Self::Other,
        }
    }

    /// True for geometry-carrying categories
    #[must_use]
    pub const fn is_shape(self) -> bool {
        matches!(self, Self::Mesh | Self::NurbsSurface | Self::NurbsCurve)
    }

    /// True for light categories
    #[must_use]
    pub const fn is_light(self) -> bool {
        matches!(
            self,
            Self::PointLight | Self::SpotLight | Self::DirectionalLight | Self::AreaLight
        )
    }

    /// Canonical creation input plug for shape categories
    ///
    /// The shape is considered procedurally connected iff this plug exists and
    /// has an incoming connection.
    #[must_use]
    pub const fn creation_plug(self) -> Option<&'static str> {
        match self {
            Self::Mesh => Some("inMesh"),
            Self::NurbsSurface | Self::NurbsCurve => Some("create"),
            _ => None,
        }
    }
}

/// A set of light- or shadow-exclusion targets
///
/// Stored as whichever of the include/exclude forms is smaller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionList {
    /// Target ids; interpretation depends on [`ExclusionList::is_exclude`]
    pub targets: BTreeSet<NodeId>,
    /// True: targets are excluded. False: targets are the only ones included.
    pub is_exclude: bool,
}

impl Default for ExclusionList {
    // In most scenes only a few targets are excluded, so the exclude form is
    // the shorter list.
    fn default() -> Self {
        Self {
            targets: BTreeSet::new(),
            is_exclude: true,
        }
    }
}

impl ExclusionList {
    /// Whether a target id is affected (excluded from illumination/shadows)
    #[must_use]
    pub fn excludes(&self, id: NodeId) -> bool {
        if self.is_exclude {
            self.targets.contains(&id)
        } else {
            !self.targets.contains(&id)
        }
    }
}

/// Snapshot of one host scene node
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Stable host identity
    pub id: NodeId,
    /// Short node name
    pub short_name: String,
    /// Normalized full path (separator-safe form)
    pub path: String,
    /// `/`-separated hierarchy form of the path
    pub hierarchy_path: String,
    /// Classification tag
    pub category: NodeCategory,
    /// Flag set computed at construction
    pub flags: ObjectFlags,
    /// One entry per motion-blur time step; index 0 is the current sample
    pub transform_samples: Vec<Mat4>,
    /// 0 = prototype path, >0 = instance path
    pub instance_number: u32,
    /// Prototype id for instance paths; resolved by the registry
    pub prototype: Option<NodeId>,
    /// Particle id when the object is driven by an external instancer
    pub instancer_particle_id: Option<i64>,
    /// Per-object motion-blur step count
    pub mb_steps: u32,
    /// Targets this light does not illuminate
    pub light_exclusion: ExclusionList,
    /// Targets that do not receive shadows from this light
    pub shadow_exclusion: ExclusionList,
}

impl SceneObject {
    /// Build a snapshot of a host node
    ///
    /// Fails with [`BridgeError::InvalidNode`] when the node cannot resolve a
    /// path; all derived flags are computed here and never again.
    pub fn from_host(host: &dyn HostScene, id: NodeId) -> BridgeResult<Self> {
        let Some(raw_path) = host.path(id) else {
            return Err(BridgeError::InvalidNode(id));
        };

        let category = NodeCategory::classify(host.kind(id));
        let mut flags = ObjectFlags::empty();
        if visibility::resolve(host, id) {
            flags |= ObjectFlags::VISIBLE;
        }
        if detect_animated(host, id) {
            flags |= ObjectFlags::ANIMATED;
        }
        if detect_shape_connected(host, id, category) {
            flags |= ObjectFlags::SHAPE_CONNECTED;
        }
        if host.bool_attr(id, "motionBlur", true) {
            flags |= ObjectFlags::MOTION_BLURRED;
        }
        if detect_instancer_connection(host, id) {
            flags |= ObjectFlags::INSTANCER_GENERATED;
        }

        Ok(Self {
            id,
            short_name: host.name(id),
            path: path::normalize(&raw_path),
            hierarchy_path: path::hierarchy(&raw_path),
            category,
            flags,
            transform_samples: vec![host.world_matrix(id)],
            instance_number: host.instance_number(id),
            prototype: None,
            instancer_particle_id: None,
            mb_steps: 1,
            light_exclusion: ExclusionList::default(),
            shadow_exclusion: ExclusionList::default(),
        })
    }

    /// Recompute only the transform sample list
    ///
    /// Cheap and repeatable; flags are deliberately left untouched.
    pub fn update_object(&mut self, host: &dyn HostScene) {
        self.transform_samples.clear();
        self.transform_samples.push(host.world_matrix(self.id));
    }

    /// Append the host's current evaluation-time matrix as a motion sample
    pub fn add_motion_sample(&mut self, host: &dyn HostScene) {
        self.transform_samples.push(host.world_matrix(self.id));
    }

    /// Whether the object passed the full visibility chain
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.flags.contains(ObjectFlags::VISIBLE)
    }

    /// Whether something drives the object's transform
    #[must_use]
    pub const fn animated(&self) -> bool {
        self.flags.contains(ObjectFlags::ANIMATED)
    }

    /// True iff this light casts depth-map shadows
    #[must_use]
    pub fn shadow_map_casting_light(&self, host: &dyn HostScene) -> bool {
        if !self.category.is_light() {
            return false;
        }
        if !host.has_attr(self.id, "useDepthMapShadows") {
            return false;
        }
        host.bool_attr(self.id, "useDepthMapShadows", false)
    }

    /// Name used for renderer-side entities derived from this object
    #[must_use]
    pub fn entity_name(&self) -> String {
        format!("{}_{:x}", self.short_name, self.id.raw())
    }
}

// An object is animated iff it is transform-capable and at least one of its
// plugs is the destination of an incoming connection. This is a conservative
// over-approximation, not exact dependency analysis: downstream motion-blur
// sampling treats false negatives as worse than false positives.
fn detect_animated(host: &dyn HostScene, id: NodeId) -> bool {
    host.kind(id) == HostNodeKind::Transform && host.any_destination_connection(id)
}

fn detect_shape_connected(host: &dyn HostScene, id: NodeId, category: NodeCategory) -> bool {
    category
        .creation_plug()
        .is_some_and(|plug| host.plug_has_incoming(id, plug))
}

// The object feeds an instancer iff its matrix output is consumed by an
// instancer-category node.
fn detect_instancer_connection(host: &dyn HostScene, id: NodeId) -> bool {
    host.downstream_nodes(id, "matrix")
        .into_iter()
        .any(|consumer| host.kind(consumer) == HostNodeKind::Instancer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AttrValue, MemoryScene};
    use nalgebra::Vector3;

    #[test]
    fn test_unconnected_transform_is_not_animated() {
        let mut scene = MemoryScene::new();
        let node = scene.add_node("still", HostNodeKind::Transform, None);
        let obj = SceneObject::from_host(&scene, node).unwrap();
        assert!(!obj.animated());
    }

    #[test]
    fn test_any_destination_connection_marks_animated() {
        let mut scene = MemoryScene::new();
        let node = scene.add_node("driven", HostNodeKind::Transform, None);
        scene.connect_into(node, "translateX");
        let obj = SceneObject::from_host(&scene, node).unwrap();
        assert!(obj.animated());
    }

    #[test]
    fn test_shape_connection_uses_category_plug() {
        let mut scene = MemoryScene::new();
        let mesh = scene.add_node("meshShape", HostNodeKind::Mesh, None);
        let surface = scene.add_node("surfShape", HostNodeKind::NurbsSurface, None);
        scene.connect_into(mesh, "inMesh");
        scene.connect_into(surface, "inMesh"); // wrong plug for a surface

        let mesh_obj = SceneObject::from_host(&scene, mesh).unwrap();
        let surf_obj = SceneObject::from_host(&scene, surface).unwrap();
        assert!(mesh_obj.flags.contains(ObjectFlags::SHAPE_CONNECTED));
        assert!(!surf_obj.flags.contains(ObjectFlags::SHAPE_CONNECTED));
    }

    #[test]
    fn test_motion_blur_defaults_on() {
        let mut scene = MemoryScene::new();
        let node = scene.add_node("shape", HostNodeKind::Mesh, None);
        let obj = SceneObject::from_host(&scene, node).unwrap();
        assert!(obj.flags.contains(ObjectFlags::MOTION_BLURRED));

        scene.set_attr(node, "motionBlur", AttrValue::Bool(false));
        let obj = SceneObject::from_host(&scene, node).unwrap();
        assert!(!obj.flags.contains(ObjectFlags::MOTION_BLURRED));
    }

    #[test]
    fn test_unresolvable_node_is_invalid() {
        let mut scene = MemoryScene::new();
        let node = scene.add_node("ghost", HostNodeKind::Mesh, None);
        scene.set_unresolvable(node);
        assert!(matches!(
            SceneObject::from_host(&scene, node),
            Err(BridgeError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_path_is_normalized() {
        let mut scene = MemoryScene::new();
        let root = scene.add_node("ns:root", HostNodeKind::Transform, None);
        let shape = scene.add_node("thing.Shape", HostNodeKind::Mesh, Some(root));
        let obj = SceneObject::from_host(&scene, shape).unwrap();
        assert_eq!(obj.path, "_ns__root_thing_Shape");
        assert_eq!(obj.hierarchy_path, "/ns_root/thing.Shape");
    }

    #[test]
    fn test_update_object_refreshes_only_transforms() {
        let mut scene = MemoryScene::new();
        let node = scene.add_node("shape", HostNodeKind::Mesh, None);
        let mut obj = SceneObject::from_host(&scene, node).unwrap();
        let flags = obj.flags;

        scene.set_world_matrix(node, Mat4::new_translation(&Vector3::new(1.0, 0.0, 0.0)));
        obj.update_object(&scene);
        assert_eq!(obj.transform_samples.len(), 1);
        assert_eq!(obj.transform_samples[0][(0, 3)], 1.0);
        assert_eq!(obj.flags, flags);

        obj.add_motion_sample(&scene);
        assert_eq!(obj.transform_samples.len(), 2);
    }

    #[test]
    fn test_instancer_connection_detection() {
        let mut scene = MemoryScene::new();
        let shape = scene.add_node("proto", HostNodeKind::Mesh, None);
        let instancer = scene.add_node("instancer1", HostNodeKind::Instancer, None);
        scene.connect_output(shape, "matrix", instancer);
        let obj = SceneObject::from_host(&scene, shape).unwrap();
        assert!(obj.flags.contains(ObjectFlags::INSTANCER_GENERATED));
    }

    #[test]
    fn test_exclusion_list_defaults_to_exclude_form() {
        let list = ExclusionList::default();
        assert!(list.is_exclude);
        assert!(list.targets.is_empty());
    }

    #[test]
    fn test_shadow_map_casting_light_requires_attr() {
        let mut scene = MemoryScene::new();
        let light = scene.add_node("key", HostNodeKind::PointLight, None);
        let obj = SceneObject::from_host(&scene, light).unwrap();
        assert!(!obj.shadow_map_casting_light(&scene));

        scene.set_attr(light, "useDepthMapShadows", AttrValue::Bool(true));
        assert!(obj.shadow_map_casting_light(&scene));
    }
}
