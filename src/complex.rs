// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Complex arithmetic used by every point formula.
//!
//! The value type itself is `num`'s `Complex<f64>`, which is already
//! `Copy` and immutable in practice; what it lacks is the particular
//! flavour of exponentiation the fractal formulas need, where a zero
//! or infinite base has to produce a usable value instead of a NaN
//! that would poison the rest of an orbit.

use num::Complex as NumComplex;

/// A point on the complex plane.
pub type Complex = NumComplex<f64>;

/// Largest integral exponent that is computed by repeated
/// multiplication rather than through `exp(w * ln(z))`.
const MAX_FAST_EXPONENT: f64 = 16.0;

/// Operations on `Complex` that `num` does not provide in the form
/// the iteration loops want.
pub trait ComplexExt {
    /// Raise `self` to a complex power, `exp(exponent * ln(self))`,
    /// on the principal branch.
    ///
    /// A zero base gives zero when the exponent's real part is
    /// non-negative and `(+inf, 0)` otherwise.  A non-finite base
    /// with a negative real exponent gives zero.
    fn pow(&self, exponent: Complex) -> Complex;

    /// `sqrt(re² + im²)`.
    fn modulus(&self) -> f64;

    /// True when the real and the imaginary parts each differ from
    /// `other` by no more than `epsilon`.
    fn approx_eq(&self, other: &Complex, epsilon: f64) -> bool;

    /// `(|re|, |im|)`, the fold used by the Burning Ship family.
    fn abs_parts(&self) -> Complex;
}

impl ComplexExt for Complex {
    fn pow(&self, exponent: Complex) -> Complex {
        if self.re == 0.0 && self.im == 0.0 {
            return if exponent.re >= 0.0 {
                Complex::new(0.0, 0.0)
            } else {
                Complex::new(std::f64::INFINITY, 0.0)
            };
        }

        if !self.re.is_finite() || !self.im.is_finite() {
            return if exponent.re < 0.0 {
                Complex::new(0.0, 0.0)
            } else {
                Complex::new(std::f64::INFINITY, 0.0)
            };
        }

        if exponent.im == 0.0
            && exponent.re >= 0.0
            && exponent.re <= MAX_FAST_EXPONENT
            && exponent.re.fract() == 0.0
        {
            return integral_pow(*self, exponent.re as u32);
        }

        (exponent * self.ln()).exp()
    }

    #[inline]
    fn modulus(&self) -> f64 {
        self.norm()
    }

    fn approx_eq(&self, other: &Complex, epsilon: f64) -> bool {
        (self.re - other.re).abs() <= epsilon && (self.im - other.im).abs() <= epsilon
    }

    #[inline]
    fn abs_parts(&self) -> Complex {
        Complex::new(self.re.abs(), self.im.abs())
    }
}

/// Exponentiation by squaring.
fn integral_pow(base: Complex, mut exponent: u32) -> Complex {
    let mut result = Complex::new(1.0, 0.0);
    let mut square = base;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result * square;
        }
        exponent >>= 1;
        if exponent > 0 {
            square = square * square;
        }
    }
    result
}
