// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types.  Configuration problems are caught before any worker
//! is started; once a render is underway the only way it can end
//! early is cancellation, which is not an error.

use failure::Fail;

/// Something is wrong with a `RenderConfig` or one of its parts.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum ConfigError {
    /// The iteration cap must be at least one.
    #[fail(display = "The maximum number of iterations must be positive.")]
    NonPositiveIterations,

    /// The pixel plane has no area.
    #[fail(display = "The image must be at least one pixel wide and high, not {}x{}.", _0, _1)]
    EmptyImage(usize, usize),

    /// The complex region is inverted or has no area.
    #[fail(display = "Degenerate region: {}", _0)]
    DegeneratePlane(String),

    /// An escape-time palette has to carry one colour per iteration.
    #[fail(
        display = "The palette has {} colours but {} iterations were requested.",
        palette, iterations
    )]
    PaletteLengthMismatch {
        /// Number of colours in the palette.
        palette: usize,
        /// The configured iteration cap.
        iterations: u32,
    },

    /// Gradient stops must run from 0 to 1, strictly increasing.
    #[fail(display = "Invalid palette stops: {}", _0)]
    InvalidStops(String),

    /// Buddhabrot supersampling must be at least one.
    #[fail(display = "Supersampling must be at least 1.")]
    ZeroSupersampling,

    /// At least one worker thread is needed.
    #[fail(display = "Thread count must be at least 1.")]
    ZeroThreads,

    /// A caller-supplied buffer does not match the plane.
    #[fail(
        display = "The output buffer is {:?} but the plane is {:?}.",
        actual, expected
    )]
    BufferSize {
        /// Width and height of the plane.
        expected: (usize, usize),
        /// Width and height of the buffer.
        actual: (usize, usize),
    },

    /// Random sampling was asked for with nothing to sample.
    #[fail(display = "Random sampling needs at least one sample.")]
    ZeroSamples,
}

/// Why a render did not produce an outcome.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The configuration was rejected before any work was scheduled.
    #[fail(display = "{}", _0)]
    Config(#[cause] ConfigError),

    /// A worker thread panicked.
    #[fail(display = "A render worker panicked.")]
    WorkerPanicked,
}

impl From<ConfigError> for RenderError {
    fn from(err: ConfigError) -> Self {
        RenderError::Config(err)
    }
}

/// Failures turning user-supplied text into engine values.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum ParseError {
    /// Not a `(re, im)` literal.
    #[fail(display = "Could not parse complex number '{}'", _0)]
    Complex(String),

    /// Not a `WIDTHxHEIGHT` pair.
    #[fail(display = "Could not parse image size '{}'", _0)]
    Size(String),

    /// Not a `#rrggbb` colour.
    #[fail(display = "Could not parse colour '{}'", _0)]
    Color(String),

    /// Not one of the known fractal names.
    #[fail(display = "Unknown fractal '{}'", _0)]
    Fractal(String),
}
