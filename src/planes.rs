// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the CartesianPlane struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 in
//! the upper-left corner, and a rectangle on the complex plane
//! described by its upper-left and lower-right corners.  Screen y
//! grows downwards, imaginary values grow upwards; the mapping flips
//! one into the other.

use crate::complex::Complex;
use crate::error::ConfigError;

/// Describes the x, y of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels to complex numbers and back, and owns the pan/zoom
/// state of a rendering session.
#[derive(Clone, Debug, PartialEq)]
pub struct CartesianPlane {
    width: usize,
    height: usize,
    up_left: Complex,
    down_right: Complex,
    // Complex units per pixel, horizontally and vertically.
    scale: (f64, f64),
    // Pixels per complex unit; the inverse of `scale`.
    grid_factors: (f64, f64),
}

impl CartesianPlane {
    /// Constructor.  Takes the size of the integral plane, and the two
    /// corners of the complex region it shows.
    pub fn new(
        width: usize,
        height: usize,
        up_left: Complex,
        down_right: Complex,
    ) -> Result<CartesianPlane, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyImage(width, height));
        }
        check_corners(&up_left, &down_right)?;
        Ok(CartesianPlane::from_parts(width, height, up_left, down_right))
    }

    fn from_parts(width: usize, height: usize, up_left: Complex, down_right: Complex) -> Self {
        let region_width = down_right.re - up_left.re;
        let region_height = up_left.im - down_right.im;
        CartesianPlane {
            width,
            height,
            up_left,
            down_right,
            scale: (region_width / (width as f64), region_height / (height as f64)),
            grid_factors: ((width as f64) / region_width, (height as f64) / region_height),
        }
    }

    /// Width of the integral plane, in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the integral plane, in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Whether the integral plane has no pixels.  Never true for a
    /// plane built with `new`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The complex value at pixel (0, 0).
    pub fn up_left(&self) -> Complex {
        self.up_left
    }

    /// The complex value at pixel (width, height).
    pub fn down_right(&self) -> Complex {
        self.down_right
    }

    /// Complex units covered by one pixel, as (horizontal, vertical).
    pub fn scale(&self) -> (f64, f64) {
        self.scale
    }

    /// Checks the invariants a render relies on.  Zooming and
    /// translating do not clamp, so a plane can drift into a
    /// degenerate state; this is where that gets caught.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyImage(self.width, self.height));
        }
        check_corners(&self.up_left, &self.down_right)?;
        if self.scale.0 <= 0.0 || self.scale.1 <= 0.0 {
            return Err(ConfigError::DegeneratePlane(
                "The region is too small to be resolved at this image size.".to_string(),
            ));
        }
        Ok(())
    }

    /// Map a (possibly fractional) pixel position to the complex
    /// plane.
    #[inline]
    pub fn to_complex(&self, x: f64, y: f64) -> Complex {
        Complex::new(
            self.up_left.re + x * self.scale.0,
            self.up_left.im - y * self.scale.1,
        )
    }

    /// Map a complex number back to the pixel that contains it, or
    /// `None` when it falls outside the image.
    #[inline]
    pub fn to_pixel(&self, point: &Complex) -> Option<Pixel> {
        let left = (point.re - self.up_left.re) * self.grid_factors.0;
        let top = (self.up_left.im - point.im) * self.grid_factors.1;
        if !(left >= 0.0 && top >= 0.0) {
            return None;
        }
        let (x, y) = (left as usize, top as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Pixel(x, y))
    }

    /// Like `to_pixel`, but returns the linear offset from the root of
    /// a row-major buffer.
    #[inline]
    pub fn to_offset(&self, point: &Complex) -> Option<usize> {
        self.to_pixel(point).map(|Pixel(x, y)| y * self.width + x)
    }

    /// Rescale the region around `center` by `factor`.  `center` keeps
    /// its pixel position; a factor above one zooms out, below one
    /// zooms in.
    pub fn zoom_at(&mut self, center: Complex, factor: f64) {
        let up_left = center + (self.up_left - center) * factor;
        let down_right = center + (self.down_right - center) * factor;
        *self = CartesianPlane::from_parts(self.width, self.height, up_left, down_right);
    }

    /// Pan the region by `to - from`, keeping its size.
    pub fn translate(&mut self, from: Complex, to: Complex) {
        let delta = to - from;
        self.up_left = self.up_left + delta;
        self.down_right = self.down_right + delta;
    }

    /// Same region, different image size.
    pub fn resized(&self, width: usize, height: usize) -> Result<CartesianPlane, ConfigError> {
        CartesianPlane::new(width, height, self.up_left, self.down_right)
    }
}

fn check_corners(up_left: &Complex, down_right: &Complex) -> Result<(), ConfigError> {
    if !(up_left.re < down_right.re) {
        return Err(ConfigError::DegeneratePlane(
            "The upper left corner is not to the left of the lower right corner.".to_string(),
        ));
    }
    if !(up_left.im > down_right.im) {
        return Err(ConfigError::DegeneratePlane(
            "The upper left corner is not above the lower right corner.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::ComplexExt;

    fn square(size: usize) -> CartesianPlane {
        CartesianPlane::new(size, size, Complex::new(-2.0, 2.0), Complex::new(2.0, -2.0)).unwrap()
    }

    #[test]
    fn plane_fails_on_bad_shape() {
        let flipped = CartesianPlane::new(4, 4, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0));
        assert!(flipped.is_err());
        let mirrored = CartesianPlane::new(4, 4, Complex::new(1.0, 1.0), Complex::new(-1.0, -1.0));
        assert!(mirrored.is_err());
        let flat = CartesianPlane::new(4, 4, Complex::new(-1.0, 1.0), Complex::new(1.0, 1.0));
        assert!(flat.is_err());
        let empty = CartesianPlane::new(0, 4, Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0));
        assert_eq!(empty, Err(ConfigError::EmptyImage(0, 4)));
    }

    #[test]
    fn plane_passes_on_good_shape() {
        let pm = CartesianPlane::new(4, 4, Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0));
        assert!(pm.is_ok());
        assert_eq!(pm.unwrap().scale(), (0.5, 0.5));
    }

    #[test]
    fn to_complex_maps_the_corners() {
        let pm = CartesianPlane::new(640, 480, Complex::new(-2.5, 1.0), Complex::new(1.5, -2.0))
            .unwrap();
        assert_eq!(pm.to_complex(0.0, 0.0), pm.up_left());
        let far = pm.to_complex(640.0, 480.0);
        let (sx, sy) = pm.scale();
        assert!(far.approx_eq(&pm.down_right(), sx.max(sy)));
    }

    #[test]
    fn to_complex_on_mixed_planes() {
        let pm = square(4);
        assert_eq!(pm.to_complex(2.0, 2.0), Complex::new(0.0, 0.0));
        assert_eq!(pm.to_complex(1.0, 3.0), Complex::new(-1.0, -1.0));
        assert_eq!(pm.to_complex(3.0, 0.0), Complex::new(1.0, 2.0));
    }

    #[test]
    fn to_pixel_on_large_mixed_planes() {
        let pm = square(640);
        assert_eq!(pm.to_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(320, 320)));
        assert_eq!(pm.to_pixel(&Complex::new(-2.0, 2.0)), Some(Pixel(0, 0)));
        assert_eq!(pm.to_pixel(&Complex::new(1.0, 1.99)), Some(Pixel(480, 1)));
        assert_eq!(pm.to_offset(&Complex::new(-2.0, 2.0)), Some(0));
        assert_eq!(pm.to_offset(&Complex::new(0.0, 0.0)), Some(320 * 640 + 320));
    }

    #[test]
    fn to_pixel_drops_points_outside_the_image() {
        let pm = square(4);
        assert_eq!(pm.to_pixel(&Complex::new(2.0, 0.0)), None);
        assert_eq!(pm.to_pixel(&Complex::new(0.0, -2.0)), None);
        assert_eq!(pm.to_pixel(&Complex::new(-2.1, 0.0)), None);
        assert_eq!(pm.to_pixel(&Complex::new(0.0, 2.1)), None);
        assert_eq!(pm.to_pixel(&Complex::new(std::f64::NAN, 0.0)), None);
    }

    #[test]
    fn pixel_round_trip() {
        let pm = square(100);
        for &(x, y) in &[(0, 0), (13, 87), (99, 99), (50, 1)] {
            let z = pm.to_complex(x as f64 + 0.5, y as f64 + 0.5);
            assert_eq!(pm.to_pixel(&z), Some(Pixel(x, y)));
        }
    }

    #[test]
    fn zoom_keeps_the_center_in_place() {
        let mut pm = square(100);
        let center = pm.to_complex(25.0, 75.0);
        pm.zoom_at(center, 0.5);
        assert!(pm.to_complex(25.0, 75.0).approx_eq(&center, 1e-12));
        assert!(pm.up_left().approx_eq(&Complex::new(-1.5, 0.5), 1e-12));
        assert!(pm.down_right().approx_eq(&Complex::new(0.5, -1.5), 1e-12));
        assert!((pm.scale().0 - 0.02).abs() < 1e-12);

        pm.zoom_at(center, 2.0);
        assert!(pm.up_left().approx_eq(&Complex::new(-2.0, 2.0), 1e-12));
        assert!(pm.validate().is_ok());
    }

    #[test]
    fn zoom_by_zero_is_caught_by_validate() {
        let mut pm = square(10);
        pm.zoom_at(Complex::new(0.0, 0.0), 0.0);
        assert!(pm.validate().is_err());
    }

    #[test]
    fn translate_moves_both_corners() {
        let mut pm = square(10);
        pm.translate(Complex::new(0.0, 0.0), Complex::new(1.0, -0.5));
        assert_eq!(pm.up_left(), Complex::new(-1.0, 1.5));
        assert_eq!(pm.down_right(), Complex::new(3.0, -2.5));
        assert_eq!(pm.scale(), (0.4, 0.4));
    }
}
