//! The image codec seam.
//!
//! The recompression step only needs two things from a codec: open an image
//! (with its metadata) and write a JPEG. Putting those behind a trait keeps
//! the keep-or-replace policy testable with synthetic sizes, and lets a
//! caller swap in a different encoder without touching the policy.

use crate::config::Quality;
use crate::error::FileError;
use crate::pipeline::encode;
use crate::pipeline::input::{self, InputImage};
use crate::pipeline::header::Density;
use image::{ImageFormat, RgbImage};
use std::path::Path;

/// Image decode/encode operations used by the pipeline.
pub trait ImageCodec {
    /// Format every candidate is written in. Sources already in this format
    /// may be kept as-is.
    fn target_format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    /// Open and decode `path`.
    fn open(&self, path: &Path) -> Result<InputImage, FileError>;

    /// Encode `pixels` to `dest`. Returns bytes written.
    fn encode(
        &self,
        pixels: &RgbImage,
        dest: &Path,
        quality: Quality,
        density: Density,
    ) -> Result<u64, image::ImageError>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRsCodec;

impl ImageCodec for ImageRsCodec {
    fn open(&self, path: &Path) -> Result<InputImage, FileError> {
        input::open_image(path)
    }

    fn encode(
        &self,
        pixels: &RgbImage,
        dest: &Path,
        quality: Quality,
        density: Density,
    ) -> Result<u64, image::ImageError> {
        encode::encode_jpeg(pixels, dest, quality, density)
    }
}
