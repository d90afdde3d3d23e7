//! Internal object model mirroring the host scene graph

pub mod object;
pub mod registry;
pub mod visibility;

pub use object::{ExclusionList, NodeCategory, ObjectFlags, SceneObject};
pub use registry::ObjectRegistry;
