// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn renders_a_small_mandelbrot() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("mandelbrot.png");

    Command::cargo_bin("fractal")
        .unwrap()
        .args(&["--size", "40x30", "--iterations", "50", "--threads", "2"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    assert!(predicate::path::is_file().eval(&output));
    let image = image::open(&output).unwrap();
    assert_eq!(image::GenericImageView::dimensions(&image), (40, 30));
}

#[test]
fn renders_a_zoomed_julia_with_the_hue_palette() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("julia.png");

    Command::cargo_bin("fractal")
        .unwrap()
        .args(&["--fractal", "julia", "--hue", "--size", "24x24"])
        .args(&["--constant", "(-0.8, 0.156)", "--zoom", "0.5", "--center", "0,0"])
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(predicate::path::exists().eval(&output));
}

#[test]
fn renders_a_random_buddhabrot() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("buddha.png");

    Command::cargo_bin("fractal")
        .unwrap()
        .args(&["--fractal", "buddhabrot", "--size", "32x32", "--iterations", "200"])
        .args(&["--samples", "5000", "--seed", "7", "--max-color", "#ff8000"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    assert!(predicate::path::is_file().eval(&output));
}

#[test]
fn rejects_an_unknown_fractal() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("fractal")
        .unwrap()
        .args(&["--fractal", "nebulabrot"])
        .arg("--output")
        .arg(dir.path().join("never.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nebulabrot"));
}

#[test]
fn rejects_a_malformed_size() {
    Command::cargo_bin("fractal")
        .unwrap()
        .args(&["--size", "800by600", "--output", "never.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("size"));
}

#[test]
fn rejects_an_inverted_region() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("never.png");
    Command::cargo_bin("fractal")
        .unwrap()
        .args(&["--upleft", "1,1", "--downright", "-1,-1", "--size", "8x8"])
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failure"));
    assert!(!output.exists());
}

#[test]
fn output_is_required() {
    Command::cargo_bin("fractal")
        .unwrap()
        .assert()
        .failure();
}
