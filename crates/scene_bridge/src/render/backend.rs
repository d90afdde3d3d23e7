//! Renderer collaborator interface
//!
//! These traits and types define what the bridge calls into; the concrete
//! scene-object factories, geometry extraction and shading-network translation
//! live behind the backend, outside the core.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::signal::RenderSignal;
use super::tile::TileSink;
use crate::foundation::math::Mat4;
use crate::host::NodeId;

/// Error raised by renderer-side create/insert calls
#[derive(thiserror::Error, Debug)]
#[error("renderer API failure: {0}")]
pub struct RendererApiError(pub String);

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RendererApiError>;

/// Outcome of one blocking render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The pass ran to completion and delivered a full frame
    Completed,
    /// The pass observed the abort signal and stopped early
    Aborted,
}

/// Renderer entity kinds addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Geometry object (owns vertex data)
    Object,
    /// Positioned reference to an object
    ObjectInstance,
    /// Native light primitive
    Light,
    /// Material binding geometry to shaders
    Material,
    /// Emission profile or surface shader
    Shader,
    /// Scene camera
    Camera,
}

/// Reference to one renderer-side entity recorded by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// Entity table the name lives in
    pub kind: EntityKind,
    /// Unique name within that table
    pub name: String,
}

impl EntityRef {
    /// Convenience constructor
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Geometry payload handed to the backend
///
/// Mesh extraction is the backend's concern; the core only names the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// Geometry read from the host shape node by the backend
    HostMesh {
        /// Host node carrying the shape data
        source: NodeId,
    },
    /// Canonical unit plane (area-light emitter geometry)
    UnitPlane,
}

/// Parameter value in a declarative entity description
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean parameter
    Bool(bool),
    /// Integer parameter (also used for enums)
    Int(i32),
    /// Float parameter
    Float(f32),
    /// String parameter (also used for entity cross-references)
    Str(String),
    /// RGB color parameter
    Color([f32; 3]),
    /// 3-component vector parameter (positions, directions)
    Vec3([f32; 3]),
    /// Set of host node ids (exclusion lists)
    Ids(Vec<u64>),
}

/// Ordered name→value parameter set attached to an entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap(BTreeMap<String, ParamValue>);

impl ParamMap {
    /// Empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: &str, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, name: &str, value: ParamValue) {
        self.0.insert(name.to_owned(), value);
    }

    /// Look up a parameter by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no parameters are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate parameters in name order
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }
}

/// Output color space of the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// Linear RGB, no transfer applied by the renderer
    LinearRgb,
    /// sRGB transfer applied by the renderer
    Srgb,
}

/// Output frame descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Square tile edge length in pixels
    pub tile_size: u32,
    /// Color space the renderer writes
    pub color_space: ColorSpace,
    /// Name of the camera bound to the frame
    pub camera: Option<String>,
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            tile_size: 16,
            color_space: ColorSpace::LinearRgb,
            camera: None,
        }
    }
}

impl FrameDescriptor {
    /// Number of tile columns (last column may be partial)
    #[must_use]
    pub const fn tiles_x(&self) -> u32 {
        self.width.div_ceil(self.tile_size)
    }

    /// Number of tile rows (last row may be partial)
    #[must_use]
    pub const fn tiles_y(&self) -> u32 {
        self.height.div_ceil(self.tile_size)
    }
}

/// Renderer scene and job driver
///
/// Entity tables are mutated only from the control context; `render` runs on
/// the worker thread after `endSceneUpdate` hands off and must poll the signal
/// between tiles. Inserts are silent replaces: the caller decides whether a
/// stale entity of the same name must be removed first.
pub trait RenderBackend: Send {
    /// Create or replace a geometry object
    fn insert_object(&mut self, name: &str, geometry: Geometry, params: ParamMap)
        -> BackendResult<()>;

    /// Create or replace a positioned instance of a named object
    fn insert_instance(
        &mut self,
        name: &str,
        object: &str,
        transform: Mat4,
        params: ParamMap,
    ) -> BackendResult<()>;

    /// Create or replace a native light primitive
    fn insert_light(&mut self, name: &str, params: ParamMap) -> BackendResult<()>;

    /// Create or replace a material
    fn insert_material(&mut self, name: &str, params: ParamMap) -> BackendResult<()>;

    /// Create or replace an emission profile or surface shader
    fn insert_shader(&mut self, name: &str, params: ParamMap) -> BackendResult<()>;

    /// Replace the scene camera (a scene has a single active camera)
    fn set_camera(&mut self, name: &str, params: ParamMap) -> BackendResult<()>;

    /// Update the active camera's transform
    fn set_camera_transform(&mut self, transform: Mat4) -> BackendResult<()>;

    /// Remove an entity by name; returns true when something was removed
    fn remove(&mut self, kind: EntityKind, name: &str) -> bool;

    /// Whether an entity of the given kind and name exists
    fn contains(&self, kind: EntityKind, name: &str) -> bool;

    /// Replace the output frame descriptor
    fn set_frame(&mut self, frame: FrameDescriptor) -> BackendResult<()>;

    /// Current output frame descriptor
    fn frame(&self) -> FrameDescriptor;

    /// Blocking render pass
    ///
    /// Invoked on the worker thread. Must poll `signal` cooperatively between
    /// tiles and deliver partial results through `sink`.
    fn render(&mut self, signal: &RenderSignal, sink: &dyn TileSink) -> BackendResult<RenderOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_map_builder() {
        let params = ParamMap::new()
            .with("intensity", ParamValue::Float(2.0))
            .with("color", ParamValue::Color([1.0, 0.5, 0.0]));
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("intensity"), Some(&ParamValue::Float(2.0)));
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn test_frame_tile_counts_round_up() {
        let frame = FrameDescriptor {
            width: 100,
            height: 64,
            tile_size: 16,
            ..FrameDescriptor::default()
        };
        assert_eq!(frame.tiles_x(), 7);
        assert_eq!(frame.tiles_y(), 4);
    }
}
