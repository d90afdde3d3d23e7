//! In-memory host scene
//!
//! A self-contained [`HostScene`] implementation with a small mutation API.
//! Tests and the preview tool build scenes with it; a production adapter
//! around a real host replaces it without touching the rest of the bridge.

use std::collections::HashMap;

use slotmap::SlotMap;

use super::{AttrValue, HostNodeKind, HostScene, NodeId};
use crate::foundation::math::{Color3, Mat4};

struct NodeRecord {
    name: String,
    parent: Option<NodeId>,
    kind: HostNodeKind,
    intermediate: bool,
    instance_number: u32,
    shape_identity: u64,
    in_render_layer: bool,
    resolvable: bool,
    world_matrix: Mat4,
    attrs: HashMap<String, AttrValue>,
    incoming_plugs: Vec<String>,
    downstream: HashMap<String, Vec<NodeId>>,
    light_links: Option<Vec<NodeId>>,
    shadow_links: Option<Vec<NodeId>>,
}

impl NodeRecord {
    fn new(name: &str, kind: HostNodeKind, parent: Option<NodeId>, shape_identity: u64) -> Self {
        Self {
            name: name.to_owned(),
            parent,
            kind,
            intermediate: false,
            instance_number: 0,
            shape_identity,
            in_render_layer: true,
            resolvable: true,
            world_matrix: Mat4::identity(),
            attrs: HashMap::new(),
            incoming_plugs: Vec::new(),
            downstream: HashMap::new(),
            light_links: None,
            shadow_links: None,
        }
    }
}

/// In-memory host scene graph with a builder-style mutation API
#[derive(Default)]
pub struct MemoryScene {
    nodes: SlotMap<NodeId, NodeRecord>,
    order: Vec<NodeId>,
    next_shape_identity: u64,
}

impl MemoryScene {
    /// Create an empty scene
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under an optional parent; returns its id
    pub fn add_node(&mut self, name: &str, kind: HostNodeKind, parent: Option<NodeId>) -> NodeId {
        self.next_shape_identity += 1;
        let record = NodeRecord::new(name, kind, parent, self.next_shape_identity);
        let id = self.nodes.insert(record);
        self.order.push(id);
        id
    }

    /// Add an instance path of an existing node
    ///
    /// The new path shares the prototype's kind and underlying shape identity;
    /// its instance number is the count of paths already referencing that
    /// shape.
    pub fn add_instance(&mut self, name: &str, prototype: NodeId, parent: Option<NodeId>) -> NodeId {
        let (kind, identity) = {
            let proto = &self.nodes[prototype];
            (proto.kind, proto.shape_identity)
        };
        let count = self
            .nodes
            .values()
            .filter(|n| n.shape_identity == identity)
            .count();
        let mut record = NodeRecord::new(name, kind, parent, identity);
        record.instance_number = count as u32;
        let id = self.nodes.insert(record);
        self.order.push(id);
        id
    }

    /// Remove a node (children keep dangling parents; callers manage order)
    pub fn remove_node(&mut self, node: NodeId) {
        self.nodes.remove(node);
        self.order.retain(|&n| n != node);
    }

    /// Set or replace an attribute value
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: AttrValue) {
        self.nodes[node].attrs.insert(name.to_owned(), value);
    }

    /// Set the node's world matrix
    pub fn set_world_matrix(&mut self, node: NodeId, matrix: Mat4) {
        self.nodes[node].world_matrix = matrix;
    }

    /// Mark the node as an intermediate object
    pub fn set_intermediate(&mut self, node: NodeId, intermediate: bool) {
        self.nodes[node].intermediate = intermediate;
    }

    /// Set render-layer membership
    pub fn set_in_render_layer(&mut self, node: NodeId, member: bool) {
        self.nodes[node].in_render_layer = member;
    }

    /// Make the node unable to resolve a path (tests the skip-and-warn path)
    pub fn set_unresolvable(&mut self, node: NodeId) {
        self.nodes[node].resolvable = false;
    }

    /// Mark a plug as the destination of an incoming connection
    pub fn connect_into(&mut self, node: NodeId, plug: &str) {
        self.nodes[node].incoming_plugs.push(plug.to_owned());
    }

    /// Connect an output plug to a downstream consumer node
    pub fn connect_output(&mut self, node: NodeId, plug: &str, consumer: NodeId) {
        self.nodes[node]
            .downstream
            .entry(plug.to_owned())
            .or_default()
            .push(consumer);
    }

    /// Restrict a light to illuminate only the given nodes
    pub fn set_light_links(&mut self, light: NodeId, linked: Vec<NodeId>) {
        self.nodes[light].light_links = Some(linked);
    }

    /// Restrict the nodes receiving shadows from a light
    pub fn set_shadow_links(&mut self, light: NodeId, linked: Vec<NodeId>) {
        self.nodes[light].shadow_links = Some(linked);
    }

    /// Find a node by short name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.order
            .iter()
            .copied()
            .find(|&id| self.nodes.get(id).is_some_and(|n| n.name == name))
    }

    fn all_ids(&self) -> Vec<NodeId> {
        self.order.clone()
    }
}

impl HostScene for MemoryScene {
    fn nodes(&self) -> Vec<NodeId> {
        self.all_ids()
    }

    fn name(&self, node: NodeId) -> String {
        self.nodes.get(node).map(|n| n.name.clone()).unwrap_or_default()
    }

    fn path(&self, node: NodeId) -> Option<String> {
        let record = self.nodes.get(node)?;
        if !record.resolvable {
            return None;
        }
        let mut segments = vec![record.name.clone()];
        let mut current = record.parent;
        while let Some(parent) = current {
            let parent_record = self.nodes.get(parent)?;
            segments.push(parent_record.name.clone());
            current = parent_record.parent;
        }
        segments.reverse();
        Some(format!("|{}", segments.join("|")))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    fn kind(&self, node: NodeId) -> HostNodeKind {
        self.nodes.get(node).map_or(HostNodeKind::Other, |n| n.kind)
    }

    fn is_intermediate(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.intermediate)
    }

    fn instance_number(&self, node: NodeId) -> u32 {
        self.nodes.get(node).map_or(0, |n| n.instance_number)
    }

    fn shape_identity(&self, node: NodeId) -> u64 {
        self.nodes.get(node).map_or(0, |n| n.shape_identity)
    }

    fn world_matrix(&self, node: NodeId) -> Mat4 {
        self.nodes.get(node).map_or_else(Mat4::identity, |n| n.world_matrix)
    }

    fn bool_attr(&self, node: NodeId, name: &str, default: bool) -> bool {
        self.attr(node, name)
            .and_then(AttrValue::as_bool)
            .unwrap_or(default)
    }

    fn int_attr(&self, node: NodeId, name: &str, default: i32) -> i32 {
        self.attr(node, name)
            .and_then(AttrValue::as_int)
            .unwrap_or(default)
    }

    fn float_attr(&self, node: NodeId, name: &str, default: f32) -> f32 {
        self.attr(node, name)
            .and_then(AttrValue::as_float)
            .unwrap_or(default)
    }

    fn enum_attr(&self, node: NodeId, name: &str, default: i32) -> i32 {
        self.attr(node, name)
            .and_then(AttrValue::as_int)
            .unwrap_or(default)
    }

    fn color_attr(&self, node: NodeId, name: &str, default: Color3) -> Color3 {
        self.attr(node, name)
            .and_then(AttrValue::as_color)
            .unwrap_or(default)
    }

    fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    fn plug_has_incoming(&self, node: NodeId, plug: &str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.incoming_plugs.iter().any(|p| p == plug))
    }

    fn any_destination_connection(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| !n.incoming_plugs.is_empty())
    }

    fn downstream_nodes(&self, node: NodeId, plug: &str) -> Vec<NodeId> {
        self.nodes
            .get(node)
            .and_then(|n| n.downstream.get(plug).cloned())
            .unwrap_or_default()
    }

    fn in_current_render_layer(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.in_render_layer)
    }

    fn light_linked_nodes(&self, light: NodeId) -> Vec<NodeId> {
        match self.nodes.get(light).and_then(|n| n.light_links.clone()) {
            Some(linked) => linked,
            None => self.all_ids(),
        }
    }

    fn shadow_linked_nodes(&self, light: NodeId) -> Vec<NodeId> {
        match self.nodes.get(light).and_then(|n| n.shadow_links.clone()) {
            Some(linked) => linked,
            None => self.all_ids(),
        }
    }
}

impl MemoryScene {
    fn attr(&self, node: NodeId, name: &str) -> Option<&AttrValue> {
        self.nodes.get(node).and_then(|n| n.attrs.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_walks_ancestry() {
        let mut scene = MemoryScene::new();
        let root = scene.add_node("root", HostNodeKind::Transform, None);
        let child = scene.add_node("child", HostNodeKind::Transform, Some(root));
        let shape = scene.add_node("childShape", HostNodeKind::Mesh, Some(child));
        assert_eq!(scene.path(shape).as_deref(), Some("|root|child|childShape"));
    }

    #[test]
    fn test_unresolvable_path_is_none() {
        let mut scene = MemoryScene::new();
        let node = scene.add_node("orphan", HostNodeKind::Mesh, None);
        scene.set_unresolvable(node);
        assert!(scene.path(node).is_none());
    }

    #[test]
    fn test_instance_numbers_increase_per_shape() {
        let mut scene = MemoryScene::new();
        let proto = scene.add_node("shape", HostNodeKind::Mesh, None);
        let first = scene.add_instance("shape1", proto, None);
        let second = scene.add_instance("shape2", proto, None);
        assert_eq!(scene.instance_number(proto), 0);
        assert_eq!(scene.instance_number(first), 1);
        assert_eq!(scene.instance_number(second), 2);
        assert_eq!(scene.shape_identity(first), scene.shape_identity(proto));
    }

    #[test]
    fn test_attr_defaults_apply_when_absent() {
        let mut scene = MemoryScene::new();
        let node = scene.add_node("n", HostNodeKind::Transform, None);
        assert!(scene.bool_attr(node, "visibility", true));
        scene.set_attr(node, "visibility", AttrValue::Bool(false));
        assert!(!scene.bool_attr(node, "visibility", true));
    }
}
