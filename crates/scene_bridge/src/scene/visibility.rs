//! Visibility resolution for host DAG paths
//!
//! An object renders iff every check below passes; any single failure
//! short-circuits to not-visible.

use crate::host::{HostScene, NodeId};

/// Local visibility of one node
///
/// Not an intermediate object, and both `visibility` and
/// `overrideVisibility` evaluate true (absent attributes count as true).
#[must_use]
pub fn node_visible(host: &dyn HostScene, node: NodeId) -> bool {
    if host.is_intermediate(node) {
        return false;
    }
    if !host.bool_attr(node, "visibility", true) {
        return false;
    }
    if !host.bool_attr(node, "overrideVisibility", true) {
        return false;
    }
    true
}

/// Template state
///
/// Explicit `template` flag, or a display-type override equal to the reserved
/// template mode (1).
#[must_use]
pub fn is_templated(host: &dyn HostScene, node: NodeId) -> bool {
    if host.bool_attr(node, "template", false) {
        return true;
    }
    host.int_attr(node, "overrideDisplayType", 0) == 1
}

/// Walk from the leaf to the root; every node on the path must be locally
/// visible. Stops at the first failure.
#[must_use]
pub fn path_visible(host: &dyn HostScene, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if !node_visible(host, id) {
            return false;
        }
        current = host.parent(id);
    }
    true
}

/// Full visibility rule for an object
#[must_use]
pub fn resolve(host: &dyn HostScene, node: NodeId) -> bool {
    node_visible(host, node)
        && !is_templated(host, node)
        && host.in_current_render_layer(node)
        && path_visible(host, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AttrValue, HostNodeKind, MemoryScene};

    fn scene_with_parent_child() -> (MemoryScene, NodeId, NodeId) {
        let mut scene = MemoryScene::new();
        let parent = scene.add_node("group", HostNodeKind::Transform, None);
        let child = scene.add_node("shape", HostNodeKind::Mesh, Some(parent));
        (scene, parent, child)
    }

    #[test]
    fn test_hidden_ancestor_hides_child() {
        let (mut scene, parent, child) = scene_with_parent_child();
        scene.set_attr(parent, "visibility", AttrValue::Bool(false));
        scene.set_attr(child, "visibility", AttrValue::Bool(true));
        assert!(!resolve(&scene, child));
    }

    #[test]
    fn test_visible_chain_is_visible() {
        let (scene, _, child) = scene_with_parent_child();
        assert!(resolve(&scene, child));
    }

    #[test]
    fn test_override_visibility_hides() {
        let (mut scene, _, child) = scene_with_parent_child();
        scene.set_attr(child, "overrideVisibility", AttrValue::Bool(false));
        assert!(!resolve(&scene, child));
    }

    #[test]
    fn test_template_flag_hides() {
        let (mut scene, _, child) = scene_with_parent_child();
        scene.set_attr(child, "template", AttrValue::Bool(true));
        assert!(!resolve(&scene, child));
    }

    #[test]
    fn test_template_display_override_hides() {
        let (mut scene, _, child) = scene_with_parent_child();
        scene.set_attr(child, "overrideDisplayType", AttrValue::Int(1));
        assert!(!resolve(&scene, child));
        scene.set_attr(child, "overrideDisplayType", AttrValue::Int(2));
        assert!(resolve(&scene, child));
    }

    #[test]
    fn test_outside_render_layer_hides() {
        let (mut scene, _, child) = scene_with_parent_child();
        scene.set_in_render_layer(child, false);
        assert!(!resolve(&scene, child));
    }

    #[test]
    fn test_intermediate_object_hides() {
        let (mut scene, _, child) = scene_with_parent_child();
        scene.set_intermediate(child, true);
        assert!(!resolve(&scene, child));
    }
}
