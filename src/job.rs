// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Running a render off the calling thread.
//!
//! The engines themselves block until they are done.  `RenderJob`
//! puts one on a background thread and hands back something to poll,
//! wait on or cancel; `RenderController` keeps at most one such job
//! alive, cancelling the old one whenever a new one is started.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use crate::buddhabrot::BuddhabrotEngine;
use crate::config::RenderConfig;
use crate::error::{ConfigError, ParseError, RenderError};
use crate::escape::EscapeTimeEngine;
use crate::formula::{Variant, VariantFormula};

/// The output image: RGBA, eight bits per channel, row-major.
pub type PixelBuffer = image::RgbaImage;

/// A shared flag that asks a render to stop.  Cloning gives another
/// handle on the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Ask the render to stop.  Calling it again does nothing.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Receives progress from the workers of a render.  Called from many
/// threads at once.
pub trait RenderObserver: Sync {
    /// Fraction of the work done, in `[0, 1]`.
    fn progress(&self, _fraction: f64) {}

    /// The render ran to completion.  Not called when it was
    /// cancelled.
    fn finished(&self) {}
}

impl RenderObserver for () {}

impl<F> RenderObserver for F
where
    F: Fn(f64) + Sync,
{
    fn progress(&self, fraction: f64) {
        self(fraction)
    }
}

/// What a render produced.
#[derive(Debug)]
pub struct RenderOutcome {
    /// The image.  Incomplete when `cancelled` is set: cells the
    /// workers never reached hold whatever was there before.
    pub image: PixelBuffer,
    /// Wall-clock time spent rendering.
    pub elapsed: Duration,
    /// The render stopped early.
    pub cancelled: bool,
}

impl RenderOutcome {
    /// `elapsed`, in whole milliseconds.
    pub fn elapsed_millis(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Which engine, and for escape-time, which formula.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fractal {
    /// One of the escape-time variants.
    EscapeTime(Variant),
    /// The orbit-density renderer.
    Buddhabrot,
}

impl Fractal {
    /// Checks `config` for this kind of render.
    pub fn validate(self, config: &RenderConfig) -> Result<(), ConfigError> {
        match self {
            Fractal::EscapeTime(_) => config.validate_for_escape_time(),
            Fractal::Buddhabrot => config.validate(),
        }
    }

    /// Run the render on the calling thread.
    pub fn render(
        self,
        config: &RenderConfig,
        cancel: &CancelToken,
        observer: &dyn RenderObserver,
    ) -> Result<RenderOutcome, RenderError> {
        match self {
            Fractal::EscapeTime(variant) => {
                let formula = VariantFormula::from_config(variant, config);
                EscapeTimeEngine::new(config)?.run(&formula, cancel, observer)
            }
            Fractal::Buddhabrot => BuddhabrotEngine::new(config)?.run(cancel, observer),
        }
    }
}

impl fmt::Display for Fractal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fractal::EscapeTime(variant) => fmt::Display::fmt(variant, f),
            Fractal::Buddhabrot => f.write_str("buddhabrot"),
        }
    }
}

impl FromStr for Fractal {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("buddhabrot") {
            return Ok(Fractal::Buddhabrot);
        }
        s.parse().map(Fractal::EscapeTime)
    }
}

/// Where a job, or the controller, stands.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Status {
    /// Nothing has been started.
    Idle,
    /// Workers are busy.
    Running {
        /// Fraction done so far.
        progress: f64,
    },
    /// The image is complete.
    Completed,
    /// The render stopped early on request.
    Cancelled,
    /// The render died; `wait` has the error.
    Failed,
}

const RUNNING: usize = 0;
const COMPLETED: usize = 1;
const CANCELLED: usize = 2;
const FAILED: usize = 3;

// State shared between a job handle and its thread.
struct Shared {
    progress: AtomicU64,
    state: AtomicUsize,
    listener: Option<Arc<dyn RenderObserver + Send>>,
}

impl Shared {
    fn current(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::SeqCst))
    }
}

impl RenderObserver for Shared {
    // Rows finish in any order, so only ever move forward.
    fn progress(&self, fraction: f64) {
        let mut current = self.progress.load(Ordering::SeqCst);
        while f64::from_bits(current) < fraction {
            match self.progress.compare_exchange(
                current,
                fraction.to_bits(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        if let Some(listener) = &self.listener {
            listener.progress(self.current());
        }
    }

    fn finished(&self) {
        if let Some(listener) = &self.listener {
            listener.finished();
        }
    }
}

/// A render running on its own thread.  Dropping the handle without
/// waiting cancels the render.
pub struct RenderJob {
    cancel: CancelToken,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<Result<RenderOutcome, RenderError>>>,
}

impl RenderJob {
    /// Validate `config` and start rendering it in the background.
    /// Configuration errors are returned here, before any thread is
    /// spawned.
    pub fn start(config: RenderConfig, fractal: Fractal) -> Result<RenderJob, ConfigError> {
        RenderJob::spawn(config, fractal, None)
    }

    /// Like `start`, forwarding progress and completion to `listener`.
    pub fn start_with(
        config: RenderConfig,
        fractal: Fractal,
        listener: Arc<dyn RenderObserver + Send>,
    ) -> Result<RenderJob, ConfigError> {
        RenderJob::spawn(config, fractal, Some(listener))
    }

    fn spawn(
        config: RenderConfig,
        fractal: Fractal,
        listener: Option<Arc<dyn RenderObserver + Send>>,
    ) -> Result<RenderJob, ConfigError> {
        fractal.validate(&config)?;

        let cancel = CancelToken::new();
        let shared = Arc::new(Shared {
            progress: AtomicU64::new(0.0_f64.to_bits()),
            state: AtomicUsize::new(RUNNING),
            listener,
        });

        let handle = {
            let cancel = cancel.clone();
            let shared = shared.clone();
            thread::spawn(move || {
                debug!("{} job started", fractal);
                let result = fractal.render(&config, &cancel, &*shared);
                let state = match &result {
                    Ok(outcome) if outcome.cancelled => CANCELLED,
                    Ok(_) => COMPLETED,
                    Err(_) => FAILED,
                };
                shared.state.store(state, Ordering::SeqCst);
                result
            })
        };

        Ok(RenderJob {
            cancel,
            shared,
            handle: Some(handle),
        })
    }

    /// Ask the render to stop.  Safe to call any number of times,
    /// including after it has finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fraction of the work done.  Never decreases.
    pub fn progress(&self) -> f64 {
        self.shared.current()
    }

    /// Current status, without blocking.
    pub fn poll(&self) -> Status {
        match self.shared.state.load(Ordering::SeqCst) {
            RUNNING => Status::Running {
                progress: self.progress(),
            },
            COMPLETED => Status::Completed,
            CANCELLED => Status::Cancelled,
            _ => Status::Failed,
        }
    }

    /// Whether the render thread is done.
    pub fn is_finished(&self) -> bool {
        self.shared.state.load(Ordering::SeqCst) != RUNNING
    }

    /// Block until the render ends and take its outcome.
    pub fn wait(mut self) -> Result<RenderOutcome, RenderError> {
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(RenderError::WorkerPanicked),
            },
            None => Err(RenderError::WorkerPanicked),
        }
    }
}

impl Drop for RenderJob {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}

impl fmt::Debug for RenderJob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RenderJob")
            .field("status", &self.poll())
            .finish()
    }
}

/// Keeps at most one render going.  The state machine is Idle, then
/// Running, then Completed or Cancelled; starting again from any
/// state cancels whatever was running.
#[derive(Debug, Default)]
pub struct RenderController {
    job: Option<RenderJob>,
}

impl RenderController {
    /// An idle controller.
    pub fn new() -> Self {
        RenderController::default()
    }

    /// Cancel the current render, if any, and start a new one.
    pub fn start(&mut self, config: RenderConfig, fractal: Fractal) -> Result<(), ConfigError> {
        fractal.validate(&config)?;
        self.cancel();
        self.job = Some(RenderJob::start(config, fractal)?);
        Ok(())
    }

    /// Cancel the current render.  Does nothing when idle or finished.
    pub fn cancel(&self) {
        if let Some(job) = &self.job {
            job.cancel();
        }
    }

    /// Current status.
    pub fn poll(&self) -> Status {
        match &self.job {
            Some(job) => job.poll(),
            None => Status::Idle,
        }
    }

    /// Block on the current render and take its outcome, returning
    /// the controller to idle.  `None` when idle.
    pub fn wait(&mut self) -> Option<Result<RenderOutcome, RenderError>> {
        self.job.take().map(RenderJob::wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn fractal_names() {
        assert_eq!("buddhabrot".parse::<Fractal>(), Ok(Fractal::Buddhabrot));
        assert_eq!(
            "julia".parse::<Fractal>(),
            Ok(Fractal::EscapeTime(Variant::Julia))
        );
        assert_eq!(Fractal::EscapeTime(Variant::BurningShip).to_string(), "burning-ship");
        assert!("nebulabrot".parse::<Fractal>().is_err());
    }

    #[test]
    fn shared_progress_never_goes_backwards() {
        let shared = Shared {
            progress: AtomicU64::new(0.0_f64.to_bits()),
            state: AtomicUsize::new(RUNNING),
            listener: None,
        };
        shared.progress(0.5);
        shared.progress(0.25);
        assert_eq!(shared.current(), 0.5);
        shared.progress(1.0);
        assert_eq!(shared.current(), 1.0);
    }

    #[test]
    fn idle_controller() {
        let mut controller = RenderController::new();
        assert_eq!(controller.poll(), Status::Idle);
        controller.cancel();
        assert!(controller.wait().is_none());
    }
}
