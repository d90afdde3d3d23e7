//! Logging utilities
//!
//! The bridge logs through the `log` facade only; no component constructs or
//! owns a logger. The hosting binary decides the backend and installs it once
//! per session.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system for a standalone session
pub fn init() {
    env_logger::init();
}
