//! # Scene Bridge
//!
//! A scene-graph translation and synchronization engine that bridges a 3D
//! content-creation host application to offline renderers.
//!
//! ## Architecture
//!
//! The bridge is organized around five components:
//! - **[`SceneObject`]**: snapshot of one host scene node (identity, transform
//!   samples, visibility, animation flags, instancing relationship)
//! - **[`ObjectRegistry`]**: owns the per-snapshot object set, built by a full
//!   host-graph traversal, with derived light/camera/instancer indices
//! - **[`TranslationSession`]**: maps host node identities to renderer-side
//!   entities and applies create/update/remove diffs as the host scene changes
//! - **[`RenderController`]**: the render-job lifecycle state machine; owns the
//!   single worker thread and its cooperative cancellation signal
//! - **[`TileSink`]**: receives progressive tile callbacks from the worker
//!   thread and converts pixels for display
//!
//! ## Data flow
//!
//! host graph → `ObjectRegistry` → `TranslationSession` → renderer scene
//! (via [`RenderBackend`]) → `RenderController` → `TileSink` → consumer.
//!
//! The concrete host scene graph and the concrete renderer SDK are external
//! collaborators, reached only through the [`host::HostScene`] and
//! [`render::RenderBackend`] traits.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod errors;
pub mod foundation;
pub mod host;
pub mod render;
pub mod scene;
pub mod translate;


pub use config::{Config, ConfigError, RenderSettings};
pub use errors::{BridgeError, BridgeResult};
pub use host::{HostScene, MemoryScene, NodeId};
pub use render::{
    FrameAccumulator, RenderBackend, RenderController, RenderSignal, RenderState, SharedBackend,
    SoftwareBackend, TileSink,
};
pub use scene::{NodeCategory, ObjectRegistry, SceneObject};
pub use translate::TranslationSession;

/// Common imports for bridge users
pub mod prelude {
    pub use crate::{
        config::{Config, RenderSettings},
        errors::{BridgeError, BridgeResult},
        host::{HostNodeKind, HostScene, MemoryScene, NodeId},
        render::{
            shared_backend, FrameAccumulator, RenderController, RenderState, SoftwareBackend,
        },
        scene::{NodeCategory, ObjectRegistry, SceneObject},
        translate::TranslationSession,
    };
}
