//! Animation runner that owns the single background render loop.
//!
//! At most one run writes to the device at a time. Starting an animation
//! takes the run slot, cancels and joins the previous run, and only then
//! writes the new first frame, so device writes are globally serialized.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crosec_transport::{CancelToken, SharedDevice, TransportError};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{Animation, Frame, Renderer, START_KEY};

/// Failure to start an animation
#[derive(Error, Debug)]
pub enum AnimationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to spawn animation worker: {0}")]
    Spawn(#[source] std::io::Error),
}

impl AnimationError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, AnimationError::Transport(e) if e.is_canceled())
    }
}

/// A live background loop and its cancellation signal
struct AnimationRun {
    name: &'static str,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl AnimationRun {
    /// Cancel and wait for the loop to finish its current tick
    fn stop(self) {
        debug!("Stopping {} animation", self.name);
        self.cancel.cancel();
        if self.handle.join().is_err() {
            warn!("{} animation worker panicked", self.name);
        }
    }
}

/// Renders animations onto an EC device
pub struct AnimationEngine {
    device: SharedDevice,
    current: Mutex<Option<AnimationRun>>,
}

impl AnimationEngine {
    pub fn new(device: SharedDevice) -> Self {
        Self {
            device,
            current: Mutex::new(None),
        }
    }

    /// Replace whatever is running with `animation`
    ///
    /// The first frame is written synchronously and its outcome returned.
    /// Looping animations then continue on a worker thread until `cancel`
    /// (or a later `start`/`stop`) cancels them.
    pub fn start(&self, animation: Animation, cancel: &CancelToken) -> Result<(), AnimationError> {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.stop();
        }

        match animation {
            Animation::Static(frame) => {
                self.write_frame(&frame, cancel)?;
                info!("Applied static frame");
                Ok(())
            }
            Animation::Looping(renderer) => {
                self.write_frame(&renderer.frame(), cancel)?;
                *current = Some(self.spawn_loop(renderer, cancel)?);
                Ok(())
            }
        }
    }

    /// Stop the running animation, if any, and wait for it to finish
    pub fn stop(&self) {
        if let Some(run) = self.current.lock().take() {
            run.stop();
        }
    }

    /// Whether a background loop is still rendering
    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    fn write_frame(&self, frame: &Frame, cancel: &CancelToken) -> Result<(), TransportError> {
        crosec_transport::set_rgb_colors(self.device.as_ref(), START_KEY, frame, cancel)
    }

    fn spawn_loop(
        &self,
        renderer: Box<dyn Renderer>,
        cancel: &CancelToken,
    ) -> Result<AnimationRun, AnimationError> {
        let name = renderer.name();
        let run_cancel = cancel.child();
        let loop_cancel = run_cancel.clone();
        let device = Arc::clone(&self.device);

        let handle = thread::Builder::new()
            .name(format!("rgb-{}", name.to_ascii_lowercase()))
            .spawn(move || run_loop(device, renderer, loop_cancel))
            .map_err(AnimationError::Spawn)?;

        info!("Started {} animation", name);
        Ok(AnimationRun {
            name,
            cancel: run_cancel,
            handle,
        })
    }
}

impl Drop for AnimationEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fixed-delay tick loop: wait, advance, write
///
/// Ends silently on cancellation. Any other write failure ends the loop too;
/// it is logged but not reported to the caller that started the run.
fn run_loop(device: SharedDevice, mut renderer: Box<dyn Renderer>, cancel: CancelToken) {
    let name = renderer.name();
    let mut frames: u64 = 1;

    loop {
        if cancel.wait_timeout(renderer.tick()) {
            break;
        }

        renderer.advance();
        let frame = renderer.frame();
        match crosec_transport::set_rgb_colors(device.as_ref(), START_KEY, &frame, &cancel) {
            Ok(()) => frames += 1,
            Err(e) if e.is_canceled() => break,
            Err(e) => {
                warn!("{} animation stopped after {} frames: {}", name, frames, e);
                return;
            }
        }
    }

    debug!("{} animation canceled after {} frames", name, frames);
}
