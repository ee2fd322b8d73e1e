//! JPEG encoding: `RgbImage` → baseline JPEG file with a JFIF density.
//!
//! The density written into the JFIF header is what the assembler later
//! uses to size the page, so it is copied through unchanged (value and unit)
//! from the source. Getting it wrong would change the physical page size of
//! every recompressed image.

use crate::config::Quality;
use crate::pipeline::header::{Density, DensityUnit};
use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
use image::{ImageResult, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

fn pixel_density(d: Density) -> PixelDensity {
    PixelDensity {
        density: (d.x, d.y),
        unit: match d.unit {
            DensityUnit::AspectOnly => PixelDensityUnit::PixelAspectRatio,
            DensityUnit::PixelsPerInch => PixelDensityUnit::Inches,
            DensityUnit::PixelsPerCm => PixelDensityUnit::Centimeters,
        },
    }
}

/// Encode `img` as JPEG at `quality` into memory.
pub fn encode_jpeg_to_vec(
    img: &RgbImage,
    quality: Quality,
    density: Density,
) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.get());
    encoder.set_pixel_density(pixel_density(density));
    encoder.encode_image(img)?;
    Ok(buf)
}

/// Encode `img` as JPEG at `quality` and write it to `dest`.
///
/// Returns the number of bytes written.
pub fn encode_jpeg(
    img: &RgbImage,
    dest: &Path,
    quality: Quality,
    density: Density,
) -> ImageResult<u64> {
    let buf = encode_jpeg_to_vec(img, quality, density)?;
    let mut out = BufWriter::new(File::create(dest)?);
    out.write_all(&buf)?;
    out.flush()?;
    debug!(
        "Encoded {}x{} at quality {} → {} ({} bytes)",
        img.width(),
        img.height(),
        quality,
        dest.display(),
        buf.len()
    );
    Ok(buf.len() as u64)
}
