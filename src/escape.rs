// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time renderer.
//!
//! Every pixel is mapped to the complex plane, handed to a point
//! formula, and coloured by the palette entry for the count that comes
//! back.  Rows are handed out to a pool of scoped worker threads from
//! a shared queue; each row is a disjoint slice of the output buffer,
//! so writing pixels needs no locking at all.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::RenderConfig;
use crate::error::{ConfigError, RenderError};
use crate::formula::PointFormula;
use crate::job::{CancelToken, PixelBuffer, RenderObserver, RenderOutcome};

const CHANNELS: usize = 4;

/// Renders one escape-time image per call to `run`.
pub struct EscapeTimeEngine<'a> {
    config: &'a RenderConfig,
}

impl<'a> EscapeTimeEngine<'a> {
    /// Checks `config` and wraps it.  Nothing is scheduled here; a bad
    /// configuration fails before any thread exists.
    pub fn new(config: &'a RenderConfig) -> Result<Self, ConfigError> {
        config.validate_for_escape_time()?;
        Ok(EscapeTimeEngine { config })
    }

    /// Render into a fresh buffer.  Blocks until every row is done or
    /// cancellation is noticed.
    pub fn run<F>(
        &self,
        formula: &F,
        cancel: &CancelToken,
        observer: &dyn RenderObserver,
    ) -> Result<RenderOutcome, RenderError>
    where
        F: PointFormula + ?Sized,
    {
        let plane = &self.config.plane;
        let mut image = PixelBuffer::new(plane.width() as u32, plane.height() as u32);
        let start = Instant::now();
        let cancelled = self.render_rows(formula, &mut image, cancel, observer)?;
        Ok(RenderOutcome {
            image,
            elapsed: start.elapsed(),
            cancelled,
        })
    }

    /// Render into a buffer the caller owns; it must be the size of the
    /// plane.  On cancellation the rows not reached keep their old
    /// contents.  Returns whether the render was cancelled.
    pub fn run_into<F>(
        &self,
        formula: &F,
        buffer: &mut PixelBuffer,
        cancel: &CancelToken,
        observer: &dyn RenderObserver,
    ) -> Result<bool, RenderError>
    where
        F: PointFormula + ?Sized,
    {
        let plane = &self.config.plane;
        let (width, height) = (buffer.width() as usize, buffer.height() as usize);
        if width != plane.width() || height != plane.height() {
            return Err(ConfigError::BufferSize {
                expected: (plane.width(), plane.height()),
                actual: (width, height),
            }
            .into());
        }
        self.render_rows(formula, buffer, cancel, observer)
    }

    fn render_rows<F>(
        &self,
        formula: &F,
        buffer: &mut PixelBuffer,
        cancel: &CancelToken,
        observer: &dyn RenderObserver,
    ) -> Result<bool, RenderError>
    where
        F: PointFormula + ?Sized,
    {
        let start = Instant::now();
        let (width, height) = (self.config.plane.width(), self.config.plane.height());
        let threads = self.config.threads.min(height);
        debug!(
            "escape-time render: {}x{}, {} iterations, {} threads",
            width, height, self.config.max_iterations, threads
        );

        let completed = AtomicUsize::new(0);
        {
            let rows = Arc::new(Mutex::new(buffer.chunks_mut(width * CHANNELS).enumerate()));
            let completed = &completed;
            crossbeam::scope(|spawner| {
                for _ in 0..threads {
                    let rows = rows.clone();
                    spawner.spawn(move |_| loop {
                        let row = match rows.lock() {
                            Ok(mut rows) => rows.next(),
                            Err(_) => None,
                        };
                        match row {
                            Some((y, row)) => {
                                if !self.render_row(formula, y, row, cancel) {
                                    break;
                                }
                                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                                observer.progress(done as f64 / height as f64);
                            }
                            None => {
                                break;
                            }
                        }
                    });
                }
            })
            .map_err(|_| RenderError::WorkerPanicked)?;
        }

        let done = completed.load(Ordering::SeqCst);
        if done < height {
            warn!(
                "escape-time render cancelled after {} of {} rows",
                done, height
            );
            return Ok(true);
        }

        observer.finished();
        info!(
            "escape-time render finished in {} ms",
            start.elapsed().as_millis()
        );
        Ok(false)
    }

    // Fills one row; false when it was abandoned for cancellation.
    fn render_row<F>(&self, formula: &F, y: usize, row: &mut [u8], cancel: &CancelToken) -> bool
    where
        F: PointFormula + ?Sized,
    {
        let plane = &self.config.plane;
        let palette = &self.config.palette;
        for (x, pixel) in row.chunks_mut(CHANNELS).enumerate() {
            if cancel.is_cancelled() {
                return false;
            }
            let count = formula.iterate(plane.to_complex(x as f64, y as f64));
            pixel.copy_from_slice(&palette.get_color(count).to_rgba8());
        }
        true
    }
}
