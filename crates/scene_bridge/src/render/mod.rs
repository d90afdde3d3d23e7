//! Render job control and progressive result delivery
//!
//! The renderer itself is an external collaborator behind [`RenderBackend`].
//! [`RenderController`] owns the job lifecycle and the single worker thread;
//! [`TileSink`] implementations receive partial results on that thread.

pub mod backend;
pub mod controller;
pub mod signal;
pub mod software;
pub mod tile;

pub use backend::{
    BackendResult, ColorSpace, EntityKind, EntityRef, FrameDescriptor, Geometry, ParamMap,
    ParamValue, RenderBackend, RenderOutcome, RendererApiError,
};
pub use controller::{shared_backend, RenderController, RenderState, SharedBackend};
pub use signal::RenderSignal;
pub use software::SoftwareBackend;
pub use tile::{ChannelSink, FrameAccumulator, FrameData, TileData, TileEvent, TileSink};
