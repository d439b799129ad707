// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cycle detection for orbits that have no meaningful escape radius.
//!
//! With a negative exponent, `z^p + c` does not run off to infinity in
//! any useful sense, so instead of testing the modulus we watch the
//! last few values of the orbit and stop once they start repeating.
//! A point whose orbit settles into a cycle is treated as bounded.

use crate::complex::{Complex, ComplexExt};

/// Absolute tolerance, per component, for two orbit values to count
/// as the same.
pub const TOLERANCE: f64 = 0.01;

/// Smallest buffer that can hold two copies of a period-2 pattern.
pub const MIN_BUFFER_LENGTH: usize = 4;

/// Largest buffer used, whatever the iteration cap.
pub const MAX_BUFFER_LENGTH: usize = 100;

/// Sliding window over the most recent orbit values.
#[derive(Clone, Debug)]
pub struct PeriodicityDetector {
    buffer: Vec<Complex>,
    capacity: usize,
    // Index of the oldest sample once the buffer is full.
    head: usize,
}

impl PeriodicityDetector {
    /// A detector with room for `capacity` samples (at least
    /// `MIN_BUFFER_LENGTH`).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUFFER_LENGTH);
        PeriodicityDetector {
            buffer: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// A detector sized for an iteration cap: a tenth of the cap, but
    /// never more than `MAX_BUFFER_LENGTH`.
    pub fn for_iterations(max_iterations: u32) -> Self {
        let length = if max_iterations > 1000 {
            MAX_BUFFER_LENGTH
        } else {
            (max_iterations / 10) as usize
        };
        PeriodicityDetector::new(length.min(MAX_BUFFER_LENGTH))
    }

    /// Number of samples the window holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget every sample.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.head = 0;
    }

    /// Push `z` into the window, dropping the oldest sample when
    /// full, and report whether the window now looks periodic.  Nothing
    /// is reported until the window has filled once.
    pub fn observe(&mut self, z: Complex) -> bool {
        if self.buffer.len() < self.capacity {
            self.buffer.push(z);
            return self.buffer.len() == self.capacity && self.is_periodic();
        }
        self.buffer[self.head] = z;
        self.head = (self.head + 1) % self.capacity;
        self.is_periodic()
    }

    // The i'th sample, oldest first.
    #[inline]
    fn sample(&self, i: usize) -> &Complex {
        &self.buffer[(self.head + i) % self.capacity]
    }

    // Try each candidate period from half the window down to two: the
    // oldest `len` samples must match the `len` samples after them.
    fn is_periodic(&self) -> bool {
        (2..=self.capacity / 2)
            .rev()
            .any(|len| (0..len).all(|k| self.sample(k).approx_eq(self.sample(len + k), TOLERANCE)))
    }
}
