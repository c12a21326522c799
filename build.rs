//! Build script that checks for the native `OpenCV` install and the face-mesh model.
//!
//! Nothing here fails the build; missing pieces are reported as cargo warnings.

use std::{env, path::Path, process::Command};

const DEFAULT_MODEL: &str = "assets/face_mesh.onnx";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={DEFAULT_MODEL}");

    check_opencv();
    check_model();

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}

fn pkg_config_version(package: &str) -> Option<String> {
    let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    match pkg_config_version("opencv4").or_else(|| pkg_config_version("opencv")) {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. Camera capture needs libopencv.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev pkg-config");
            println!("cargo:warning=On macOS: brew install opencv pkg-config");
        }
    }
}

fn check_model() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
    if !Path::new(&manifest_dir).join(DEFAULT_MODEL).exists() {
        println!(
            "cargo:warning={DEFAULT_MODEL} is missing; pass --model or set model.face_mesh in the config"
        );
    }
}
