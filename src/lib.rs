#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fractal renderer
//!
//! Renders escape-time fractals (the Mandelbrot set and its Julia,
//! Burning Ship, periodicity-checked and Lyapunov relatives) and the
//! Buddhabrot into RGBA images.
//!
//! An escape-time image takes each pixel, maps it to a point on the
//! complex plane, and repeatedly applies an update rule to it,
//! counting how many steps it takes to leave a circle around the
//! origin.  That count, looked up in a palette, is the pixel's
//! colour.  The Buddhabrot instead plots where the escaping orbits
//! go, and colours each pixel by how many orbits passed through it.
//!
//! Rendering is spread across scoped worker threads.  A render can
//! be run to completion on the calling thread with `Fractal::render`,
//! or in the background with `RenderJob`, which can be polled and
//! cancelled.

pub mod buddhabrot;
pub mod complex;
pub mod config;
pub mod error;
pub mod escape;
pub mod formula;
pub mod job;
pub mod palette;
pub mod parse;
pub mod periodic;
pub mod planes;

pub use crate::buddhabrot::{BuddhabrotEngine, DensityField};
pub use crate::complex::{Complex, ComplexExt};
pub use crate::config::{RenderConfig, Sampling};
pub use crate::error::{ConfigError, ParseError, RenderError};
pub use crate::escape::EscapeTimeEngine;
pub use crate::formula::{PointFormula, Variant, VariantFormula};
pub use crate::job::{
    CancelToken, Fractal, PixelBuffer, RenderController, RenderJob, RenderObserver,
    RenderOutcome, Status,
};
pub use crate::palette::{Color, ColorPalette};
pub use crate::periodic::PeriodicityDetector;
pub use crate::planes::{CartesianPlane, Pixel};
