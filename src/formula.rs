// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time point formulas.
//!
//! Every variant follows the same template: start from a seed, and
//! while the count is below the cap and the escape test holds, apply
//! the update rule and count.  What changes between variants is the
//! seed, the test and the rule:
//!
//! | variant        | seed | keeps going while        | update                    |
//! |----------------|------|--------------------------|---------------------------|
//! | Mandelbrot     | 0    | `|z| < 2`                | `z^p + c`                 |
//! | Julia          | c    | `|z| < max(2, |c|)`      | `z^p + k`                 |
//! | Burning Ship   | 0    | `|z| < 2`                | `(|re z|, |im z|)^p - c`  |
//! | Burning Julia  | c    | `|z| < max(2, |c|)`      | `(|re z|, |im z|)^p - k`  |
//! | Periodic       | 0    | `|z| < 2`, or no cycle   | `z^p + c`                 |
//! | Lyapunov       | 0    | always, to the cap       | `z^p + c`                 |
//!
//! where `p` is the power and `k` the constant of the configuration.

use std::fmt;
use std::str::FromStr;

use crate::complex::{Complex, ComplexExt};
use crate::config::RenderConfig;
use crate::error::ParseError;
use crate::periodic::PeriodicityDetector;

/// Escape radius of the Mandelbrot family.
pub const ESCAPE_RADIUS: f64 = 2.0;

/// One fractal's inner loop.  Given a point of the complex plane,
/// returns how many iterations it took to escape; the iteration cap
/// means it never did.
pub trait PointFormula: Sync {
    /// Iterate the point `c`.
    fn iterate(&self, c: Complex) -> u32;
}

impl<F> PointFormula for F
where
    F: Fn(Complex) -> u32 + Sync,
{
    fn iterate(&self, c: Complex) -> u32 {
        self(c)
    }
}

/// The escape-time variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The classic set, generalised to any power.
    Mandelbrot,
    /// Julia sets of the configured constant.
    Julia,
    /// The Burning Ship, folding `z` into the first quadrant.
    BurningShip,
    /// Julia sets of the Burning Ship.
    BurningJulia,
    /// Mandelbrot with cycle detection standing in for the escape test
    /// when the power has a negative real part.
    MandelbrotPeriodic,
    /// Lyapunov-exponent classification.  Known not to produce a
    /// correct picture; kept as the documented formula.
    Lyapunov,
}

impl Variant {
    /// Every variant, in menu order.
    pub const ALL: [Variant; 6] = [
        Variant::Mandelbrot,
        Variant::Julia,
        Variant::MandelbrotPeriodic,
        Variant::BurningShip,
        Variant::BurningJulia,
        Variant::Lyapunov,
    ];

    /// The name accepted by `from_str`.
    pub fn name(self) -> &'static str {
        match self {
            Variant::Mandelbrot => "mandelbrot",
            Variant::Julia => "julia",
            Variant::BurningShip => "burning-ship",
            Variant::BurningJulia => "burning-julia",
            Variant::MandelbrotPeriodic => "periodic",
            Variant::Lyapunov => "lyapunov",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-").replace(' ', "-");
        Variant::ALL
            .iter()
            .cloned()
            .find(|v| v.name() == wanted)
            .ok_or_else(|| ParseError::Fractal(s.to_string()))
    }
}

/// A variant bound to the parameters of one render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VariantFormula {
    variant: Variant,
    max_iterations: u32,
    power: Complex,
    constant: Complex,
}

impl VariantFormula {
    /// Bind `variant` to the iteration cap, power and constant.
    pub fn new(variant: Variant, max_iterations: u32, power: Complex, constant: Complex) -> Self {
        VariantFormula {
            variant,
            max_iterations,
            power,
            constant,
        }
    }

    /// Bind `variant` to the parameters of `config`.
    pub fn from_config(variant: Variant, config: &RenderConfig) -> Self {
        VariantFormula::new(variant, config.max_iterations, config.power, config.constant)
    }

    /// The variant this formula runs.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    fn mandelbrot(&self, c: Complex) -> u32 {
        let mut z = Complex::new(0.0, 0.0);
        let mut count = 0;
        while count < self.max_iterations && z.modulus() < ESCAPE_RADIUS {
            z = z.pow(self.power) + c;
            count += 1;
        }
        count
    }

    fn julia(&self, c: Complex) -> u32 {
        let radius = ESCAPE_RADIUS.max(c.modulus());
        let mut z = c;
        let mut count = 0;
        while count < self.max_iterations && z.modulus() < radius {
            z = z.pow(self.power) + self.constant;
            count += 1;
        }
        count
    }

    fn burning_ship(&self, c: Complex) -> u32 {
        let mut z = Complex::new(0.0, 0.0);
        let mut count = 0;
        while count < self.max_iterations && z.modulus() < ESCAPE_RADIUS {
            z = z.abs_parts().pow(self.power) - c;
            count += 1;
        }
        count
    }

    fn burning_julia(&self, c: Complex) -> u32 {
        let radius = ESCAPE_RADIUS.max(c.modulus());
        let mut z = c;
        let mut count = 0;
        while count < self.max_iterations && z.modulus() < radius {
            z = z.abs_parts().pow(self.power) - self.constant;
            count += 1;
        }
        count
    }

    // Divergence means nothing for negative powers, so a repeating
    // orbit stands in for "did not escape".  An approximation.
    fn periodic(&self, c: Complex) -> u32 {
        if self.power.re >= 0.0 {
            return self.mandelbrot(c);
        }
        let mut detector = PeriodicityDetector::for_iterations(self.max_iterations);
        let mut z = Complex::new(0.0, 0.0);
        let mut count = 0;
        while count < self.max_iterations && !detector.observe(z) {
            z = z.pow(self.power) + c;
            count += 1;
        }
        count
    }

    // The average of log|z_n| over the whole orbit.  A non-positive
    // exponent puts the point in the set.
    fn lyapunov(&self, c: Complex) -> u32 {
        let mut z = Complex::new(0.0, 0.0);
        let mut exponent = 0.0;
        for _ in 0..self.max_iterations {
            z = z.pow(self.power) + c;
            exponent += z.modulus().ln();
        }
        exponent /= f64::from(self.max_iterations);

        if exponent <= 0.0 {
            self.max_iterations
        } else {
            0
        }
    }
}

impl PointFormula for VariantFormula {
    fn iterate(&self, c: Complex) -> u32 {
        match self.variant {
            Variant::Mandelbrot => self.mandelbrot(c),
            Variant::Julia => self.julia(c),
            Variant::BurningShip => self.burning_ship(c),
            Variant::BurningJulia => self.burning_julia(c),
            Variant::MandelbrotPeriodic => self.periodic(c),
            Variant::Lyapunov => self.lyapunov(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: Complex = Complex { re: 2.0, im: 0.0 };
    const NOTHING: Complex = Complex { re: 0.0, im: 0.0 };

    fn formula(variant: Variant, max_iterations: u32) -> VariantFormula {
        VariantFormula::new(variant, max_iterations, SQUARE, Complex::new(0.285, 0.013))
    }

    #[test]
    fn origin_never_escapes_mandelbrot() {
        for &cap in &[1, 2, 10, 100, 1000, 25_000] {
            assert_eq!(formula(Variant::Mandelbrot, cap).iterate(NOTHING), cap);
        }
    }

    #[test]
    fn far_points_escape_at_once() {
        let f = formula(Variant::Mandelbrot, 100);
        assert_eq!(f.iterate(Complex::new(3.0, 0.0)), 1);
        assert_eq!(f.iterate(Complex::new(0.0, -2.5)), 1);
        assert_eq!(f.iterate(Complex::new(1.5, 1.5)), 1);
    }

    #[test]
    fn known_mandelbrot_counts() {
        let f = formula(Variant::Mandelbrot, 100);
        // 1 -> 2: escapes on the second step.
        assert_eq!(f.iterate(Complex::new(1.0, 0.0)), 2);
        // -1 is a superattracting 2-cycle.
        assert_eq!(f.iterate(Complex::new(-1.0, 0.0)), 100);
        // -2 sits on the boundary: 0, -2, 2, ... stops once |z| reaches 2.
        assert_eq!(f.iterate(Complex::new(-2.0, 0.0)), 1);
    }

    #[test]
    fn julia_uses_the_constant() {
        let f = VariantFormula::new(Variant::Julia, 50, SQUARE, NOTHING);
        // z -> z^2: the unit disc is the filled Julia set.
        assert_eq!(f.iterate(Complex::new(0.5, 0.5)), 50);
        assert_eq!(f.iterate(Complex::new(1.5, 0.0)), 1);
        // A seed sitting on its own escape radius stops at once.
        assert_eq!(f.iterate(Complex::new(3.0, 0.0)), 0);
    }

    #[test]
    fn burning_ship_subtracts_the_point() {
        let f = formula(Variant::BurningShip, 100);
        assert_eq!(f.iterate(NOTHING), 100);
        assert_eq!(f.iterate(Complex::new(3.0, 0.0)), 1);
        // c = 1: 0 -> -1 -> 0 -> -1 ... bounded.
        assert_eq!(f.iterate(Complex::new(1.0, 0.0)), 100);
    }

    #[test]
    fn burning_julia_folds_before_the_power() {
        let f = VariantFormula::new(Variant::BurningJulia, 40, SQUARE, Complex::new(1.0, 0.0));
        // 0 -> -1 -> 0 ...
        assert_eq!(f.iterate(NOTHING), 40);
        let g = VariantFormula::new(Variant::BurningJulia, 40, SQUARE, Complex::new(-2.0, 0.0));
        // 0 -> 2: out.
        assert_eq!(g.iterate(NOTHING), 1);
    }

    #[test]
    fn periodic_matches_mandelbrot_for_non_negative_powers() {
        let m = formula(Variant::Mandelbrot, 200);
        let p = formula(Variant::MandelbrotPeriodic, 200);
        for &(re, im) in &[(0.0, 0.0), (0.3, 0.5), (-0.75, 0.1), (0.26, 0.0), (-1.8, 0.01)] {
            let c = Complex::new(re, im);
            assert_eq!(m.iterate(c), p.iterate(c));
        }
    }

    #[test]
    fn periodic_detects_cycles_for_negative_powers() {
        let f = VariantFormula::new(Variant::MandelbrotPeriodic, 500, Complex::new(-2.0, 0.0), NOTHING);
        // c = 1: 0 -> inf -> 1 -> 2 -> 1.25 -> ... settles on the real
        // fixed point of z^-2 + 1, once the window has flushed the
        // transient.
        let count = f.iterate(Complex::new(1.0, 0.0));
        assert!(count > 50 && count < 500, "count {}", count);
    }

    #[test]
    fn lyapunov_classifies_by_sign() {
        let f = formula(Variant::Lyapunov, 100);
        // Orbit of 0 stays at 0: log 0 is -inf, in the set.
        assert_eq!(f.iterate(NOTHING), 100);
        // Orbit of 3 explodes: positive exponent.
        assert_eq!(f.iterate(Complex::new(3.0, 0.0)), 0);
    }

    #[test]
    fn closures_are_formulas() {
        let constant = |_c: Complex| -> u32 { 7 };
        assert_eq!(constant.iterate(NOTHING), 7);
    }

    #[test]
    fn variant_names_round_trip() {
        for v in Variant::ALL.iter() {
            assert_eq!(v.name().parse::<Variant>(), Ok(*v));
        }
        assert_eq!("Burning Ship".parse::<Variant>(), Ok(Variant::BurningShip));
        assert_eq!("burning_julia".parse::<Variant>(), Ok(Variant::BurningJulia));
        assert!("newton".parse::<Variant>().is_err());
    }
}
