//! Error types for scene translation and render-session management

use crate::host::NodeId;
use crate::scene::NodeCategory;
use thiserror::Error;

/// Errors raised by the bridge
///
/// Per-object failures (`InvalidNode`, `UnsupportedType`) are contained at the
/// object boundary: callers log them and continue, so a single broken node
/// never prevents the rest of the scene from rendering. Session-lifecycle
/// failures (`SessionInit`) are hard errors; there is nothing meaningful to
/// render without a session.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A host node cannot produce a usable scene path
    ///
    /// The object is skipped during registry builds; the build itself
    /// continues.
    #[error("host node {0:?} cannot resolve a scene path")]
    InvalidNode(NodeId),

    /// No translation rule exists for a node category
    ///
    /// Logged and treated as a no-op by the translation pipeline so unknown
    /// node types pass through harmlessly.
    #[error("no translation rule for node category {0:?}")]
    UnsupportedType(NodeCategory),

    /// An underlying renderer create/insert call failed
    ///
    /// The specific entity is left absent; dependent entities must tolerate
    /// the dangling reference by falling back to a default.
    #[error("renderer API failure: {0}")]
    RendererApi(String),

    /// The render session itself could not be created or advanced
    #[error("render session could not be initialized: {0}")]
    SessionInit(String),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
