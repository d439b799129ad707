// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parameters of one render.  Built by whoever drives the engine,
//! checked once before any work is scheduled, and read-only while a
//! render is in flight.

use crate::complex::Complex;
use crate::error::ConfigError;
use crate::palette::{Color, ColorPalette};
use crate::planes::CartesianPlane;

/// Iteration cap used when none is given.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// The exponent of the classic Mandelbrot set.
pub const DEFAULT_POWER: Complex = Complex { re: 2.0, im: 0.0 };

/// A Julia constant with a pleasant picture.
pub const DEFAULT_CONSTANT: Complex = Complex {
    re: 0.285,
    im: 0.013,
};

/// Upper-left corner of the initial region.
pub const DEFAULT_UP_LEFT: Complex = Complex { re: -2.0, im: 2.0 };

/// Lower-right corner of the initial region.
pub const DEFAULT_DOWN_RIGHT: Complex = Complex { re: 2.0, im: -2.0 };

/// Buddhabrot seeds per pixel, per axis.
pub const DEFAULT_SUPERSAMPLING: u32 = 1;

/// Buddhabrot colour for cells no orbit visited.
pub const DEFAULT_ZERO_COLOR: Color = Color::BLACK;

/// Buddhabrot colour for the most visited cell.
pub const DEFAULT_MAX_COLOR: Color = Color::WHITE;

/// How the Buddhabrot picks the seeds whose orbits it traces.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Sampling {
    /// `supersampling × supersampling` evenly spaced seeds inside every
    /// pixel.
    Grid,
    /// Seeds drawn uniformly over the region from a seeded generator.
    Random {
        /// Number of seeds to trace.
        samples: u64,
        /// Generator seed; the same seed gives the same image.
        seed: u64,
    },
}

/// Everything an engine needs to produce an image.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Iteration cap, at least 1.
    pub max_iterations: u32,
    /// Exponent of the update rule.
    pub power: Complex,
    /// Julia-style parameter; ignored by the Mandelbrot variants.
    pub constant: Complex,
    /// Region and image size.
    pub plane: CartesianPlane,
    /// Escape count to colour.  Must hold `max_iterations` colours.
    pub palette: ColorPalette,
    /// Buddhabrot seeds per pixel, per axis; at least 1.
    pub supersampling: u32,
    /// Buddhabrot seed selection.
    pub sampling: Sampling,
    /// Buddhabrot colour for zero density.
    pub zero_color: Color,
    /// Buddhabrot colour for the maximum density.
    pub max_color: Color,
    /// Worker threads.
    pub threads: usize,
}

impl RenderConfig {
    /// A configuration for `plane` with the default power, constant,
    /// colours and gradient palette, and one worker per CPU.
    pub fn new(plane: CartesianPlane, max_iterations: u32) -> Self {
        RenderConfig {
            max_iterations,
            power: DEFAULT_POWER,
            constant: DEFAULT_CONSTANT,
            plane,
            palette: ColorPalette::default_gradient(max_iterations as usize),
            supersampling: DEFAULT_SUPERSAMPLING,
            sampling: Sampling::Grid,
            zero_color: DEFAULT_ZERO_COLOR,
            max_color: DEFAULT_MAX_COLOR,
            threads: num_cpus::get(),
        }
    }

    /// The default region at the given image size.
    pub fn default_plane(width: usize, height: usize) -> Result<CartesianPlane, ConfigError> {
        CartesianPlane::new(width, height, DEFAULT_UP_LEFT, DEFAULT_DOWN_RIGHT)
    }

    /// Replace the palette with the rainbow of the same length.
    pub fn with_hue_palette(mut self) -> Self {
        self.palette = ColorPalette::hue(self.max_iterations as usize);
        self
    }

    /// Checks what every engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::NonPositiveIterations);
        }
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.supersampling == 0 {
            return Err(ConfigError::ZeroSupersampling);
        }
        if let Sampling::Random { samples: 0, .. } = self.sampling {
            return Err(ConfigError::ZeroSamples);
        }
        self.plane.validate()
    }

    /// `validate`, plus one palette colour per iteration.
    pub fn validate_for_escape_time(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.palette.len() != self.max_iterations as usize {
            return Err(ConfigError::PaletteLengthMismatch {
                palette: self.palette.len(),
                iterations: self.max_iterations,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RenderConfig {
        RenderConfig::new(RenderConfig::default_plane(40, 30).unwrap(), 64)
    }

    #[test]
    fn defaults_are_valid() {
        let config = config();
        assert!(config.validate_for_escape_time().is_ok());
        assert_eq!(config.palette.len(), 64);
        assert_eq!(config.power, DEFAULT_POWER);
        assert_eq!(config.plane.up_left(), DEFAULT_UP_LEFT);
        assert!(config.threads >= 1);
    }

    #[test]
    fn zero_iterations_fail_fast() {
        let mut config = config();
        config.max_iterations = 0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveIterations));
    }

    #[test]
    fn palette_must_match_the_iteration_cap() {
        let mut config = config();
        config.max_iterations = 100;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.validate_for_escape_time(),
            Err(ConfigError::PaletteLengthMismatch {
                palette: 64,
                iterations: 100
            })
        );
        let config = config.with_hue_palette();
        assert!(config.validate_for_escape_time().is_ok());
    }

    #[test]
    fn buddhabrot_knobs_are_checked() {
        let mut config = config();
        config.supersampling = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSupersampling));

        let mut config = self::config();
        config.sampling = Sampling::Random { samples: 0, seed: 1 };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSamples));

        let mut config = self::config();
        config.threads = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroThreads));
    }

    #[test]
    fn degenerate_planes_are_rejected() {
        let mut config = config();
        config.plane.zoom_at(Complex::new(0.0, 0.0), -1.0);
        match config.validate() {
            Err(ConfigError::DegeneratePlane(_)) => {}
            other => panic!("expected a degenerate plane, got {:?}", other),
        }
    }
}
