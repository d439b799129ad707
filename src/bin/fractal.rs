// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use failure::Error;
use log::{info, trace, warn};
use std::str::FromStr;

use fractal::parse::{parse_color, parse_complex, parse_size};
use fractal::{CancelToken, CartesianPlane, Fractal, RenderConfig, Sampling};

fn validate_with<T, E>(parse: fn(&str) -> Result<T, E>, s: &str) -> Result<(), String>
where
    E: std::fmt::Display,
{
    parse(s).map(|_| ()).map_err(|e| e.to_string())
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const UPLEFT: &str = "upleft";
const DOWNRIGHT: &str = "downright";
const FRACTAL: &str = "fractal";
const ITERATIONS: &str = "iterations";
const POWER: &str = "power";
const CONSTANT: &str = "constant";
const HUE: &str = "hue";
const SUPERSAMPLING: &str = "supersampling";
const SAMPLES: &str = "samples";
const SEED: &str = "seed";
const ZERO_COLOR: &str = "zero-color";
const MAX_COLOR: &str = "max-color";
const THREADS: &str = "threads";
const ZOOM: &str = "zoom";
const CENTER: &str = "center";

const MAX_THREADS: usize = 256;

fn args<'a>() -> ArgMatches<'a> {
    App::new("fractal")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Escape-time fractal and Buddhabrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x800")
                .validator(|s| validate_with(parse_size, &s))
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(UPLEFT)
                .long(UPLEFT)
                .short("l")
                .takes_value(true)
                .default_value("-2,2")
                .allow_hyphen_values(true)
                .validator(|s| validate_with(parse_complex, &s))
                .help("Upper left corner of the complex region"),
        )
        .arg(
            Arg::with_name(DOWNRIGHT)
                .long(DOWNRIGHT)
                .short("r")
                .takes_value(true)
                .default_value("2,-2")
                .allow_hyphen_values(true)
                .validator(|s| validate_with(parse_complex, &s))
                .help("Lower right corner of the complex region"),
        )
        .arg(
            Arg::with_name(FRACTAL)
                .long(FRACTAL)
                .short("f")
                .takes_value(true)
                .default_value("mandelbrot")
                .validator(|s| validate_with(Fractal::from_str, &s))
                .help("mandelbrot, julia, burning-ship, burning-julia, periodic, lyapunov or buddhabrot"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1u32,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iteration cap"),
        )
        .arg(
            Arg::with_name(POWER)
                .long(POWER)
                .short("p")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_with(parse_complex, &s))
                .help("Exponent of the update rule, as re,im"),
        )
        .arg(
            Arg::with_name(CONSTANT)
                .long(CONSTANT)
                .short("k")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_with(parse_complex, &s))
                .help("Julia constant, as re,im"),
        )
        .arg(
            Arg::with_name(HUE)
                .long(HUE)
                .help("Colour escape-time images with the hue wheel instead of the gradient"),
        )
        .arg(
            Arg::with_name(SUPERSAMPLING)
                .long(SUPERSAMPLING)
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1u32,
                        64,
                        "Could not parse supersampling",
                        "Supersampling must be between 1 and 64",
                    )
                })
                .help("Buddhabrot seeds per pixel, per axis"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .long(SAMPLES)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1u64,
                        std::u64::MAX,
                        "Could not parse sample count",
                        "Sample count must be positive",
                    )
                })
                .help("Trace this many random Buddhabrot seeds instead of a grid"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .requires(SAMPLES)
                .validator(|s| {
                    validate_range(
                        &s,
                        0u64,
                        std::u64::MAX,
                        "Could not parse seed",
                        "Seed out of range",
                    )
                })
                .help("Seed for random Buddhabrot sampling; defaults to 0"),
        )
        .arg(
            Arg::with_name(ZERO_COLOR)
                .long(ZERO_COLOR)
                .takes_value(true)
                .default_value("#000000")
                .validator(|s| validate_with(parse_color, &s))
                .help("Buddhabrot colour for unvisited pixels, #rrggbb"),
        )
        .arg(
            Arg::with_name(MAX_COLOR)
                .long(MAX_COLOR)
                .takes_value(true)
                .default_value("#ffffff")
                .validator(|s| validate_with(parse_color, &s))
                .help("Buddhabrot colour for the most visited pixel, #rrggbb"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        MAX_THREADS,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", MAX_THREADS),
                    )
                })
                .help("Number of threads to use in the renderer; defaults to one per CPU"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse zoom factor",
                        "Zoom factor must be positive",
                    )
                })
                .help("Scale the region by this factor; below 1 zooms in"),
        )
        .arg(
            Arg::with_name(CENTER)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_with(parse_complex, &s))
                .help("Point to zoom around, as re,im; defaults to the middle of the region"),
        )
        .get_matches()
}

// Validators have already run, so a missing or malformed value here is
// a bug in `args`.
fn value<T, E>(matches: &ArgMatches, name: &str, parse: fn(&str) -> Result<T, E>) -> Result<T, Error>
where
    E: std::fmt::Display,
{
    let raw = matches
        .value_of(name)
        .ok_or_else(|| failure::err_msg(format!("missing --{}", name)))?;
    parse(raw).map_err(|e| failure::err_msg(format!("--{}: {}", name, e)))
}

fn optional<T, E>(
    matches: &ArgMatches,
    name: &str,
    parse: fn(&str) -> Result<T, E>,
) -> Result<Option<T>, Error>
where
    E: std::fmt::Display,
{
    match matches.value_of(name) {
        Some(_) => value(matches, name, parse).map(Some),
        None => Ok(None),
    }
}

fn plane(matches: &ArgMatches) -> Result<CartesianPlane, Error> {
    let (width, height) = value(matches, SIZE, parse_size)?;
    let up_left = value(matches, UPLEFT, parse_complex)?;
    let down_right = value(matches, DOWNRIGHT, parse_complex)?;
    let mut plane = CartesianPlane::new(width, height, up_left, down_right)?;
    if let Some(factor) = optional(matches, ZOOM, f64::from_str)? {
        let center = match optional(matches, CENTER, parse_complex)? {
            Some(center) => center,
            None => (up_left + down_right) / 2.0,
        };
        plane.zoom_at(center, factor);
    }
    Ok(plane)
}

fn config(matches: &ArgMatches) -> Result<RenderConfig, Error> {
    let mut config = RenderConfig::new(plane(matches)?, value(matches, ITERATIONS, u32::from_str)?);
    if matches.is_present(HUE) {
        config = config.with_hue_palette();
    }
    if let Some(power) = optional(matches, POWER, parse_complex)? {
        config.power = power;
    }
    if let Some(constant) = optional(matches, CONSTANT, parse_complex)? {
        config.constant = constant;
    }
    config.supersampling = value(matches, SUPERSAMPLING, u32::from_str)?;
    if let Some(samples) = optional(matches, SAMPLES, u64::from_str)? {
        config.sampling = Sampling::Random {
            samples,
            seed: optional(matches, SEED, u64::from_str)?.unwrap_or(0),
        };
    }
    config.zero_color = value(matches, ZERO_COLOR, parse_color)?;
    config.max_color = value(matches, MAX_COLOR, parse_color)?;
    if let Some(threads) = optional(matches, THREADS, usize::from_str)? {
        config.threads = threads;
    }
    Ok(config)
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let fractal = value(matches, FRACTAL, Fractal::from_str)?;
    let config = config(matches)?;
    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| failure::err_msg("missing --output"))?;

    let report = |fraction: f64| trace!("{:5.1}%", fraction * 100.0);
    let outcome = fractal.render(&config, &CancelToken::new(), &report)?;
    if outcome.cancelled {
        warn!("render stopped early; writing what there is");
    }
    outcome.image.save(output)?;
    info!(
        "wrote {} ({} in {} ms)",
        output,
        fractal,
        outcome.elapsed_millis()
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
