//! Helpers shared by the integration tests.

#[path = "../../src/test/image.rs"]
mod image;

pub use image::*;

use std::path::{Path, PathBuf};

/// Writes an image into `dir` and returns its path.
pub fn write_image(dir: &Path, name: &str, image: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, image).unwrap();
    path
}
