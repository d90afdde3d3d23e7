//! Host scene-graph collaborator interface
//!
//! The bridge never talks to a concrete host application directly. Everything
//! it needs from the host (path resolution, attribute values, connection
//! introspection, render-layer membership) is expressed as read-only queries
//! on the [`HostScene`] trait. A production adapter wraps the real host API;
//! [`MemoryScene`] provides a self-contained implementation for tests and the
//! preview tool.

pub mod attr;
pub mod memory;
pub mod path;

pub use attr::AttrValue;
pub use memory::MemoryScene;

use crate::foundation::math::{Color3, Mat4};

slotmap::new_key_type! {
    /// Stable identity of one host DAG path
    ///
    /// Ids survive scene edits; a removed node's id is never reused for a
    /// different node within the same session.
    pub struct NodeId;
}

impl NodeId {
    /// Raw key bits, used to derive unique renderer-side entity names
    #[must_use]
    pub fn raw(self) -> u64 {
        slotmap::Key::data(&self).as_ffi()
    }
}

/// Raw node kind as reported by the host, prior to classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostNodeKind {
    /// Transform-capable DAG node
    Transform,
    /// Polygonal mesh shape
    Mesh,
    /// NURBS surface shape
    NurbsSurface,
    /// NURBS curve shape
    NurbsCurve,
    /// Point light
    PointLight,
    /// Spot light
    SpotLight,
    /// Directional light
    DirectionalLight,
    /// Area light
    AreaLight,
    /// Camera shape
    Camera,
    /// Particle/geometry instancer
    Instancer,
    /// Anything else
    Other,
}

/// Read-only view of the host application's scene graph
///
/// All queries are cheap lookups against the host's current evaluation state;
/// none of them mutate the host scene.
pub trait HostScene {
    /// All DAG paths in traversal order (parents before children)
    fn nodes(&self) -> Vec<NodeId>;

    /// Short node name
    fn name(&self, node: NodeId) -> String;

    /// Full hierarchical path in the host's `|`-separated form
    ///
    /// Returns `None` when the node cannot resolve a path; such nodes are
    /// skipped by the registry with a warning.
    fn path(&self, node: NodeId) -> Option<String>;

    /// Parent path, if any
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Raw node kind
    fn kind(&self, node: NodeId) -> HostNodeKind;

    /// True for intermediate (construction-history) objects
    fn is_intermediate(&self, node: NodeId) -> bool;

    /// Instance number of this path; 0 identifies the prototype path
    fn instance_number(&self, node: NodeId) -> u32;

    /// Identity of the underlying shape shared by all instance paths
    fn shape_identity(&self, node: NodeId) -> u64;

    /// World matrix at the host's current evaluation time
    fn world_matrix(&self, node: NodeId) -> Mat4;

    /// Boolean attribute, falling back to `default` when absent
    fn bool_attr(&self, node: NodeId, name: &str, default: bool) -> bool;

    /// Integer attribute, falling back to `default` when absent
    fn int_attr(&self, node: NodeId, name: &str, default: i32) -> i32;

    /// Float attribute, falling back to `default` when absent
    fn float_attr(&self, node: NodeId, name: &str, default: f32) -> f32;

    /// Enum attribute (by index), falling back to `default` when absent
    fn enum_attr(&self, node: NodeId, name: &str, default: i32) -> i32;

    /// Color attribute, falling back to `default` when absent
    fn color_attr(&self, node: NodeId, name: &str, default: Color3) -> Color3;

    /// True when the attribute exists on the node
    fn has_attr(&self, node: NodeId, name: &str) -> bool;

    /// True when the named plug is the destination of an incoming connection
    fn plug_has_incoming(&self, node: NodeId, plug: &str) -> bool;

    /// True when any plug on the node is a connection destination
    fn any_destination_connection(&self, node: NodeId) -> bool;

    /// Nodes consuming the named output plug
    fn downstream_nodes(&self, node: NodeId, plug: &str) -> Vec<NodeId>;

    /// True when the node is a member of the currently active render layer
    fn in_current_render_layer(&self, node: NodeId) -> bool;

    /// Nodes a light illuminates (the full linked set)
    fn light_linked_nodes(&self, light: NodeId) -> Vec<NodeId>;

    /// Nodes that receive shadows from a light (the full linked set)
    fn shadow_linked_nodes(&self, light: NodeId) -> Vec<NodeId>;
}
