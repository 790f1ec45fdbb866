//! Synthetic .NET images for tests.


pub use image::*;
