// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Colours, and the palettes that turn an escape count into one.
//!
//! A palette is a precomputed table with one entry per iteration, plus
//! a single colour reserved for points that never escaped.  The table
//! is built either by interpolating between gradient stops or by
//! sweeping the hue wheel.

use crate::error::ConfigError;

/// An RGB colour with opacity, each channel in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red channel.
    pub red: f64,
    /// Green channel.
    pub green: f64,
    /// Blue channel.
    pub blue: f64,
    /// Opacity; 1 is opaque.
    pub opacity: f64,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    /// Opaque pure red.
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    /// An opaque colour from channels in `[0, 1]`.
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Color {
        Color {
            red,
            green,
            blue,
            opacity: 1.0,
        }
    }

    /// An opaque colour from 8-bit channels.
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Color {
        Color::rgb(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
        )
    }

    /// An opaque colour from hue (degrees, any value; wrapped into
    /// `[0, 360)`), saturation and brightness.
    pub fn hsb(hue: f64, saturation: f64, brightness: f64) -> Color {
        let hue = hue.rem_euclid(360.0);
        let saturation = clamp_unit(saturation);
        let brightness = clamp_unit(brightness);

        let sector = hue / 60.0;
        let i = sector.floor();
        let f = sector - i;
        let p = brightness * (1.0 - saturation);
        let q = brightness * (1.0 - saturation * f);
        let t = brightness * (1.0 - saturation * (1.0 - f));

        let (r, g, b) = match i as u32 {
            0 => (brightness, t, p),
            1 => (q, brightness, p),
            2 => (p, brightness, t),
            3 => (p, q, brightness),
            4 => (t, p, brightness),
            _ => (brightness, p, q),
        };
        Color::rgb(r, g, b)
    }

    /// Linear interpolation towards `other`.  `t` is clamped to
    /// `[0, 1]`; the endpoints are returned exactly.
    pub fn interpolate(&self, other: &Color, t: f64) -> Color {
        if !(t > 0.0) {
            return *self;
        }
        if t >= 1.0 {
            return *other;
        }
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        Color {
            red: lerp(self.red, other.red),
            green: lerp(self.green, other.green),
            blue: lerp(self.blue, other.blue),
            opacity: lerp(self.opacity, other.opacity),
        }
    }

    /// The colour as RGBA bytes, the layout of the output buffer.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            to_byte(self.red),
            to_byte(self.green),
            to_byte(self.blue),
            to_byte(self.opacity),
        ]
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v < 0.0 {
        0.0
    } else if v > 1.0 {
        1.0
    } else {
        v
    }
}

fn to_byte(v: f64) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}

/// Default gradient colours, dark red through white and back.
pub const DEFAULT_COLORS: [Color; 7] = [
    Color::rgb(40.0 / 255.0, 0.0, 0.0),
    Color::RED,
    Color::WHITE,
    Color::RED,
    Color::rgb(100.0 / 255.0, 0.0, 0.0),
    Color::RED,
    Color::rgb(50.0 / 255.0, 0.0, 0.0),
];

/// Where each of `DEFAULT_COLORS` sits along the gradient.
pub const DEFAULT_STOPS: [f64; 7] = [0.0, 0.17, 0.25, 0.30, 0.5, 0.75, 1.0];

/// Colour for points that belong to the set.
pub const DEFAULT_COLOR_SET: Color = Color::BLACK;

/// Maps escape counts to colours.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorPalette {
    colors: Vec<Color>,
    color_set: Color,
}

impl ColorPalette {
    /// Build a palette of `length` colours by interpolating across
    /// `stops`, pairs of colour and position.  Positions must start
    /// at 0, end at 1 and strictly increase.
    pub fn gradient(
        length: usize,
        stops: &[(Color, f64)],
        color_set: Color,
    ) -> Result<ColorPalette, ConfigError> {
        check_stops(stops)?;

        let mut colors = Vec::with_capacity(length);
        let mut j = 0;
        for i in 0..length {
            let p = if length > 1 {
                i as f64 / (length - 1) as f64
            } else {
                0.0
            };
            // Segments are visited in order and never revisited.
            while j + 2 < stops.len() && p > stops[j + 1].1 {
                j += 1;
            }
            let (from, start) = stops[j];
            let (to, end) = stops[j + 1];
            colors.push(from.interpolate(&to, (p - start) / (end - start)));
        }

        Ok(ColorPalette { colors, color_set })
    }

    /// The default red-and-white gradient, with black for the set.
    pub fn default_gradient(length: usize) -> ColorPalette {
        ColorPalette {
            colors: gradient_table(length),
            color_set: DEFAULT_COLOR_SET,
        }
    }

    /// A rainbow: entry `k` has hue `k / (length - 1) * 360°` at full
    /// saturation and brightness.  Black for the set.
    pub fn hue(length: usize) -> ColorPalette {
        let colors = (0..length)
            .map(|k| {
                let fraction = if length > 1 {
                    k as f64 / (length - 1) as f64
                } else {
                    0.0
                };
                Color::hsb(fraction * 360.0, 1.0, 1.0)
            })
            .collect();
        ColorPalette {
            colors,
            color_set: DEFAULT_COLOR_SET,
        }
    }

    /// Number of colours before `color_set` takes over.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// True for a palette that maps everything to `color_set`.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The colour of points in the set.
    pub fn color_set(&self) -> Color {
        self.color_set
    }

    /// The colour for an escape count.  Counts past the end of the
    /// table, including the iteration cap itself, are in the set.
    #[inline]
    pub fn get_color(&self, index: u32) -> Color {
        match self.colors.get(index as usize) {
            Some(color) => *color,
            None => self.color_set,
        }
    }
}

fn gradient_table(length: usize) -> Vec<Color> {
    let stops: Vec<(Color, f64)> = DEFAULT_COLORS
        .iter()
        .cloned()
        .zip(DEFAULT_STOPS.iter().cloned())
        .collect();
    match ColorPalette::gradient(length, &stops, DEFAULT_COLOR_SET) {
        Ok(palette) => palette.colors,
        // The default stops are well-formed.
        Err(_) => vec![DEFAULT_COLOR_SET; length],
    }
}

fn check_stops(stops: &[(Color, f64)]) -> Result<(), ConfigError> {
    if stops.len() < 2 {
        return Err(ConfigError::InvalidStops(
            "at least two stops are needed".to_string(),
        ));
    }
    if stops[0].1 != 0.0 {
        return Err(ConfigError::InvalidStops(
            "the first stop must be at 0".to_string(),
        ));
    }
    if stops[stops.len() - 1].1 != 1.0 {
        return Err(ConfigError::InvalidStops(
            "the last stop must be at 1".to_string(),
        ));
    }
    if stops.windows(2).any(|pair| !(pair[0].1 < pair[1].1)) {
        return Err(ConfigError::InvalidStops(
            "stops must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop(length: usize) -> ColorPalette {
        ColorPalette::gradient(
            length,
            &[(Color::BLACK, 0.0), (Color::WHITE, 1.0)],
            Color::RED,
        )
        .unwrap()
    }

    #[test]
    fn gradient_endpoints_are_exact() {
        for &n in &[2usize, 3, 10, 100, 1000] {
            let palette = ColorPalette::default_gradient(n);
            assert_eq!(palette.len(), n);
            assert_eq!(palette.get_color(0), DEFAULT_COLORS[0]);
            assert_eq!(palette.get_color(n as u32 - 1), DEFAULT_COLORS[6]);
        }
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let palette = two_stop(5);
        assert_eq!(palette.get_color(0), Color::BLACK);
        assert_eq!(palette.get_color(2), Color::rgb(0.5, 0.5, 0.5));
        assert_eq!(palette.get_color(4), Color::WHITE);
    }

    #[test]
    fn gradient_hits_interior_stops() {
        // With 101 entries each stop lands on an index.
        let palette = ColorPalette::default_gradient(101);
        let white = palette.get_color(25);
        assert_eq!(white.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(palette.get_color(50).to_rgba8(), [100, 0, 0, 255]);
    }

    #[test]
    fn gradient_skips_narrow_segments() {
        // Short palettes step over more than one stop between entries.
        let palette = ColorPalette::default_gradient(3);
        assert_eq!(palette.get_color(1).to_rgba8(), [100, 0, 0, 255]);
    }

    #[test]
    fn out_of_range_is_color_set() {
        let palettes = vec![
            ColorPalette::default_gradient(50),
            ColorPalette::hue(50),
            two_stop(50),
        ];
        for palette in palettes {
            let set = palette.color_set();
            assert_eq!(palette.get_color(50), set);
            assert_eq!(palette.get_color(51), set);
            assert_eq!(palette.get_color(std::u32::MAX), set);
        }
        assert_eq!(two_stop(50).color_set(), Color::RED);
    }

    #[test]
    fn hue_palette_sweeps_the_wheel() {
        let palette = ColorPalette::hue(7);
        assert_eq!(palette.get_color(0).to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(palette.get_color(2).to_rgba8(), [0, 255, 0, 255]);
        assert_eq!(palette.get_color(4).to_rgba8(), [0, 0, 255, 255]);
        assert_eq!(palette.get_color(6).to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(palette.color_set(), Color::BLACK);
    }

    #[test]
    fn single_entry_palettes() {
        assert_eq!(two_stop(1).get_color(0), Color::BLACK);
        assert_eq!(ColorPalette::hue(1).get_color(0).to_rgba8(), [255, 0, 0, 255]);
        assert!(ColorPalette::hue(0).is_empty());
    }

    #[test]
    fn bad_stops_are_rejected() {
        let c = Color::WHITE;
        assert!(ColorPalette::gradient(10, &[(c, 0.0)], c).is_err());
        assert!(ColorPalette::gradient(10, &[(c, 0.1), (c, 1.0)], c).is_err());
        assert!(ColorPalette::gradient(10, &[(c, 0.0), (c, 0.9)], c).is_err());
        assert!(ColorPalette::gradient(10, &[(c, 0.0), (c, 0.5), (c, 0.5), (c, 1.0)], c).is_err());
    }

    #[test]
    fn interpolate_clamps() {
        let a = Color::BLACK;
        let b = Color::WHITE;
        assert_eq!(a.interpolate(&b, -1.0), a);
        assert_eq!(a.interpolate(&b, 2.0), b);
        assert_eq!(a.interpolate(&b, std::f64::NAN), a);
        assert_eq!(a.interpolate(&b, 0.25).to_rgba8(), [64, 64, 64, 255]);
    }

    #[test]
    fn rgb8_round_trip() {
        let c = Color::from_rgb8(12, 200, 255);
        assert_eq!(c.to_rgba8(), [12, 200, 255, 255]);
    }
}
