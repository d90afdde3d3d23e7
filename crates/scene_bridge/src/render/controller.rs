//! Render job lifecycle state machine
//!
//! Exactly one worker thread performs rendering at any time; starting a new
//! one always joins the previous one first. Cancellation is cooperative:
//! state transitions set the signal and the worker observes it between tiles.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::backend::{RenderBackend, RenderOutcome};
use super::signal::RenderSignal;
use super::tile::TileSink;
use crate::errors::{BridgeError, BridgeResult};

/// Shared, lock-guarded renderer backend
///
/// The translation session mutates the backend from the control context; the
/// worker thread holds the lock for the duration of a render pass, so scene
/// mutation and rendering never overlap on the same entity tables.
pub type SharedBackend = Arc<Mutex<dyn RenderBackend>>;

/// Wrap a concrete backend for sharing between session and controller
pub fn shared_backend(backend: impl RenderBackend + 'static) -> SharedBackend {
    Arc::new(Mutex::new(backend))
}

/// Lifecycle states of the render job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No session active
    Idle,
    /// Scene edits are being applied; no worker may start
    SceneBuilding,
    /// A render pass is live (the worker may already have converged)
    Rendering,
    /// The worker idles between tiles until resumed
    Paused,
    /// Abort requested; waiting for the worker to observe it
    Stopping,
    /// The pass was stopped; a fresh build cycle is required to render again
    Stopped,
}

/// Owns the renderer's job lifecycle
pub struct RenderController {
    backend: SharedBackend,
    sink: Arc<dyn TileSink>,
    signal: RenderSignal,
    state: Arc<Mutex<RenderState>>,
    worker: Option<JoinHandle<()>>,
}

impl RenderController {
    /// Controller over a shared backend, delivering results to `sink`
    #[must_use]
    pub fn new(backend: SharedBackend, sink: Arc<dyn TileSink>) -> Self {
        Self {
            backend,
            sink,
            signal: RenderSignal::new(),
            state: Arc::new(Mutex::new(RenderState::Idle)),
            worker: None,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> RenderState {
        *self.state.lock().unwrap()
    }

    /// The signal polled by the worker (shared, cloneable)
    #[must_use]
    pub fn signal(&self) -> RenderSignal {
        self.signal.clone()
    }

    /// Entry point: run the initial full scene build, then go
    /// `Idle` → `Rendering` directly
    ///
    /// The build closure performs the full translation against the backend;
    /// it runs on the calling context before the worker starts.
    pub fn start_async<F>(&mut self, build: F) -> BridgeResult<()>
    where
        F: FnOnce() -> BridgeResult<()>,
    {
        if self.state() != RenderState::Idle {
            return Err(BridgeError::SessionInit(
                "a render session is already active".into(),
            ));
        }
        build()?;
        self.signal.reset();
        self.spawn_worker();
        self.set_state(RenderState::Rendering);
        log::debug!("render session started");
        Ok(())
    }

    /// Abort the current pass (if any) and enter `SceneBuilding`
    ///
    /// The abort signal is set before any join can happen so a long-running
    /// frame cannot block the edit indefinitely.
    pub fn begin_scene_update(&mut self) {
        self.signal.request_abort();
        self.set_state(RenderState::SceneBuilding);
        log::debug!("scene update begins; current pass aborted");
    }

    /// Blocking barrier: join the previous worker, then start a new pass
    pub fn end_scene_update(&mut self) {
        self.join_worker();
        self.signal.reset();
        self.spawn_worker();
        self.set_state(RenderState::Rendering);
        log::debug!("scene update ends; new pass started");
    }

    /// Signal abort without blocking
    ///
    /// The pass is unrecoverable afterwards; render again via a fresh
    /// `begin_scene_update`/`end_scene_update` cycle.
    pub fn stop_async(&mut self) {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, RenderState::Rendering | RenderState::Paused) {
            *state = RenderState::Stopping;
        }
        drop(state);
        self.signal.request_abort();
    }

    /// Idle the worker between tiles
    pub fn pause(&mut self) {
        let mut state = self.state.lock().unwrap();
        if *state == RenderState::Rendering {
            self.signal.request_pause();
            *state = RenderState::Paused;
        }
    }

    /// Let a paused worker continue
    pub fn resume(&mut self) {
        let mut state = self.state.lock().unwrap();
        if *state == RenderState::Paused {
            self.signal.resume();
            *state = RenderState::Rendering;
        }
    }

    /// Force abort, join the worker, and return to `Idle`
    ///
    /// Blocks until the worker has joined. Emits the `-1.0` teardown progress
    /// so consumers can dismiss progress UI.
    pub fn destroy_scene(&mut self) {
        self.signal.request_abort();
        self.join_worker();
        self.sink.on_progress(-1.0);
        self.signal.reset();
        self.set_state(RenderState::Idle);
        log::debug!("render session destroyed");
    }

    /// True only when no worker thread is active
    #[must_use]
    pub fn is_safe_to_unload(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn set_state(&self, state: RenderState) {
        *self.state.lock().unwrap() = state;
    }

    // Sequential replacement: any previous worker is joined before the new
    // one exists, so two passes can never run concurrently.
    fn spawn_worker(&mut self) {
        self.join_worker();
        let backend = Arc::clone(&self.backend);
        let sink = Arc::clone(&self.sink);
        let signal = self.signal.clone();
        let state = Arc::clone(&self.state);
        self.worker = Some(thread::spawn(move || {
            let outcome = {
                let mut backend = backend.lock().unwrap();
                backend.render(&signal, sink.as_ref())
            };
            match outcome {
                Ok(RenderOutcome::Aborted) => {
                    let mut state = state.lock().unwrap();
                    if *state == RenderState::Stopping {
                        *state = RenderState::Stopped;
                    }
                }
                Ok(RenderOutcome::Completed) => {
                    // the session stays live; a scene update restarts the pass
                }
                Err(err) => log::error!("render pass failed: {err}"),
            }
        }));
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("render worker thread panicked");
            }
        }
    }
}

impl Drop for RenderController {
    fn drop(&mut self) {
        self.signal.request_abort();
        self.join_worker();
    }
}
