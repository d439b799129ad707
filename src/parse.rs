// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning command-line text into engine values.

use std::str::FromStr;

use crate::complex::Complex;
use crate::error::ParseError;
use crate::palette::Color;

/// Split `s` at the first `separator` and parse both halves.
pub fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (
            T::from_str(s[..index].trim()),
            T::from_str(s[index + separator.len_utf8()..].trim()),
        ) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// `re,im`, optionally wrapped in parentheses: `(-0.75, 0.1)`.
pub fn parse_complex(s: &str) -> Result<Complex, ParseError> {
    let trimmed = s.trim();
    let inner = if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() >= 2 {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    match parse_pair::<f64>(inner, ',') {
        Some((re, im)) if re.is_finite() && im.is_finite() => Ok(Complex::new(re, im)),
        _ => Err(ParseError::Complex(s.to_string())),
    }
}

/// `WIDTHxHEIGHT`, both positive.
pub fn parse_size(s: &str) -> Result<(usize, usize), ParseError> {
    match parse_pair::<usize>(s.trim(), 'x') {
        Some((width, height)) if width > 0 && height > 0 => Ok((width, height)),
        _ => Err(ParseError::Size(s.to_string())),
    }
}

/// `#rrggbb`, the leading `#` optional.
pub fn parse_color(s: &str) -> Result<Color, ParseError> {
    let trimmed = s.trim();
    let hex = if trimmed.starts_with('#') {
        &trimmed[1..]
    } else {
        trimmed
    };
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError::Color(s.to_string()));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    match (channel(0), channel(2), channel(4)) {
        (Ok(red), Ok(green), Ok(blue)) => Ok(Color::from_rgb8(red, green, blue)),
        _ => Err(ParseError::Color(s.to_string())),
    }
}
