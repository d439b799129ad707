// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot renderer
//!
//! The Buddhabrot is a variant of the Mandelbrot set that plots where
//! orbits go rather than how fast they leave.  Every seed `c` is
//! iterated under `z^p + c` from zero; each iteration creates a new
//! complex number that itself may be used as a coordinate on the
//! complex plane.  By mapping that coordinate to the nearest integral
//! pixel and incrementing that pixel by one, we plot the "orbit" of
//! the seed.  Only orbits that escape are plotted; seeds in the set
//! contribute nothing.  The resulting histogram, scaled by its
//! maximum, is the image.
//!
//! Orbits cross pixel ownership freely, so workers never share a
//! histogram: each one fills its own `DensityField`, and the fields
//! are summed after every worker has joined.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossbeam::thread::ScopedJoinHandle;
use itertools::iproduct;
use log::{debug, info, warn};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::complex::{Complex, ComplexExt};
use crate::config::{RenderConfig, Sampling};
use crate::error::{ConfigError, RenderError};
use crate::formula::ESCAPE_RADIUS;
use crate::job::{CancelToken, PixelBuffer, RenderObserver, RenderOutcome};

/// Random seeds are drawn in batches of this many, each batch from its
/// own generator, so the picture does not depend on how batches are
/// spread over threads.
pub const SAMPLE_BATCH: u64 = 4096;

/// Visit counts per pixel, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityField {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl DensityField {
    /// An empty field.
    pub fn new(width: usize, height: usize) -> Self {
        DensityField {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Visits recorded at pixel (x, y).
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[y * self.width + x]
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Record one visit at a linear offset.
    #[inline]
    pub fn increment(&mut self, offset: usize) {
        let cell = &mut self.cells[offset];
        *cell = cell.saturating_add(1);
    }

    /// Add another field of the same size into this one.
    pub fn merge(&mut self, other: &DensityField) {
        for (cell, visits) in self.cells.iter_mut().zip(other.cells.iter()) {
            *cell = cell.saturating_add(*visits);
        }
    }

    /// The largest count in the field.
    pub fn max(&self) -> u32 {
        self.cells.iter().cloned().max().unwrap_or(0)
    }

    /// Sum of every count.
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }
}

/// Renders one Buddhabrot per call to `run`.
pub struct BuddhabrotEngine<'a> {
    config: &'a RenderConfig,
}

impl<'a> BuddhabrotEngine<'a> {
    /// Checks `config` and wraps it.
    pub fn new(config: &'a RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(BuddhabrotEngine { config })
    }

    /// Trace the orbit of `c` into `path`.  Returns true when the orbit
    /// escaped; the path of an orbit that used up the whole iteration
    /// budget is of no use.
    pub fn trace(&self, c: Complex, path: &mut Vec<Complex>) -> bool {
        path.clear();
        let mut z = Complex::new(0.0, 0.0);
        let mut count = 0;
        while count < self.config.max_iterations && z.modulus() < ESCAPE_RADIUS {
            z = z.pow(self.config.power) + c;
            path.push(z);
            count += 1;
        }
        !(z.modulus() < ESCAPE_RADIUS)
    }

    /// Plot the orbit of `c` into `field`, if it escapes.
    pub fn accumulate_seed(&self, c: Complex, field: &mut DensityField, path: &mut Vec<Complex>) {
        if !self.trace(c, path) {
            return;
        }
        for z in path.iter() {
            if let Some(offset) = self.config.plane.to_offset(z) {
                field.increment(offset);
            }
        }
    }

    /// Build the density field.  Returns it, and whether the run was
    /// cancelled before every seed was traced.
    pub fn accumulate(
        &self,
        cancel: &CancelToken,
        observer: &dyn RenderObserver,
    ) -> Result<(DensityField, bool), RenderError> {
        let plane = &self.config.plane;
        let units = self.work_units();
        let threads = self.config.threads.min(units).max(1);
        debug!(
            "buddhabrot: {}x{}, {} iterations, {:?}, {} work units on {} threads",
            plane.width(),
            plane.height(),
            self.config.max_iterations,
            self.config.sampling,
            units,
            threads
        );

        let queue: Arc<Mutex<Range<usize>>> = Arc::new(Mutex::new(0..units));
        let completed = AtomicUsize::new(0);
        let mut fields: Vec<DensityField> = vec![];
        {
            let completed = &completed;
            crossbeam::scope(|spawner| {
                let handles: Vec<ScopedJoinHandle<DensityField>> = (0..threads)
                    .map(|_| {
                        let queue = queue.clone();
                        spawner.spawn(move |_| {
                            let mut field = DensityField::new(plane.width(), plane.height());
                            let mut path = Vec::with_capacity(self.config.max_iterations as usize);
                            loop {
                                let unit = match queue.lock() {
                                    Ok(mut queue) => queue.next(),
                                    Err(_) => None,
                                };
                                match unit {
                                    Some(unit) => {
                                        if !self.accumulate_unit(unit, &mut field, &mut path, cancel) {
                                            break;
                                        }
                                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                                        observer.progress(done as f64 / units as f64);
                                    }
                                    None => {
                                        break;
                                    }
                                }
                            }
                            field
                        })
                    })
                    .collect();

                fields = handles
                    .into_iter()
                    .filter_map(|handle| handle.join().ok())
                    .collect();
            })
            .map_err(|_| RenderError::WorkerPanicked)?;
        }
        if fields.len() != threads {
            return Err(RenderError::WorkerPanicked);
        }

        let mut density = DensityField::new(plane.width(), plane.height());
        for field in &fields {
            density.merge(field);
        }
        let cancelled = completed.load(Ordering::SeqCst) < units;
        Ok((density, cancelled))
    }

    /// Scale `field` by its maximum and blend from the zero colour to
    /// the maximum colour.
    pub fn colorize(&self, field: &DensityField) -> PixelBuffer {
        let mut image = PixelBuffer::new(field.width() as u32, field.height() as u32);
        let max_density = f64::from(field.max());
        let zero = &self.config.zero_color;
        let max = &self.config.max_color;
        for (pixel, &visits) in image.chunks_mut(4).zip(field.cells()) {
            let t = if max_density > 0.0 {
                f64::from(visits) / max_density
            } else {
                0.0
            };
            pixel.copy_from_slice(&zero.interpolate(max, t).to_rgba8());
        }
        image
    }

    /// Accumulate, then colour.  A cancelled run still colours what it
    /// collected, and says so.
    pub fn run(
        &self,
        cancel: &CancelToken,
        observer: &dyn RenderObserver,
    ) -> Result<RenderOutcome, RenderError> {
        let start = Instant::now();
        let (density, cancelled) = self.accumulate(cancel, observer)?;
        let image = self.colorize(&density);
        if cancelled {
            warn!("buddhabrot cancelled; the image is incomplete");
        } else {
            observer.finished();
            info!(
                "buddhabrot finished in {} ms, peak density {}",
                start.elapsed().as_millis(),
                density.max()
            );
        }
        Ok(RenderOutcome {
            image,
            elapsed: start.elapsed(),
            cancelled,
        })
    }

    // Rows of the image for grid sampling, batches for random sampling.
    fn work_units(&self) -> usize {
        match self.config.sampling {
            Sampling::Grid => self.config.plane.height(),
            Sampling::Random { samples, .. } => {
                ((samples + SAMPLE_BATCH - 1) / SAMPLE_BATCH) as usize
            }
        }
    }

    // False when the unit was abandoned for cancellation.
    fn accumulate_unit(
        &self,
        unit: usize,
        field: &mut DensityField,
        path: &mut Vec<Complex>,
        cancel: &CancelToken,
    ) -> bool {
        match self.config.sampling {
            Sampling::Grid => self.accumulate_row(unit, field, path, cancel),
            Sampling::Random { samples, seed } => {
                self.accumulate_batch(unit as u64, samples, seed, field, path, cancel)
            }
        }
    }

    // Every pixel of row `y` is split into `supersampling`² seeds.
    fn accumulate_row(
        &self,
        y: usize,
        field: &mut DensityField,
        path: &mut Vec<Complex>,
        cancel: &CancelToken,
    ) -> bool {
        let plane = &self.config.plane;
        let steps = self.config.supersampling as usize;
        let step = 1.0 / steps as f64;
        for (x, i, j) in iproduct!(0..plane.width(), 0..steps, 0..steps) {
            if cancel.is_cancelled() {
                return false;
            }
            let c = plane.to_complex(x as f64 + i as f64 * step, y as f64 + j as f64 * step);
            self.accumulate_seed(c, field, path);
        }
        true
    }

    fn accumulate_batch(
        &self,
        batch: u64,
        samples: u64,
        seed: u64,
        field: &mut DensityField,
        path: &mut Vec<Complex>,
        cancel: &CancelToken,
    ) -> bool {
        let plane = &self.config.plane;
        let (up_left, down_right) = (plane.up_left(), plane.down_right());
        let re = Uniform::new(up_left.re, down_right.re);
        let im = Uniform::new(down_right.im, up_left.im);
        let mut rng = StdRng::seed_from_u64(seed ^ batch.wrapping_mul(0x9E37_79B9_7F4A_7C15));

        let first = batch * SAMPLE_BATCH;
        let count = SAMPLE_BATCH.min(samples - first);
        for _ in 0..count {
            if cancel.is_cancelled() {
                return false;
            }
            let c = Complex::new(re.sample(&mut rng), im.sample(&mut rng));
            self.accumulate_seed(c, field, path);
        }
        true
    }
}
