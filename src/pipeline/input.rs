//! Input images: read a file, identify it, decode it, and record the
//! metadata the recompression decision needs.
//!
//! The file is read once into memory. The same buffer feeds the header
//! reader (density, palette, component count) and the decoder, so the size,
//! the metadata and the pixels always describe the same bytes.

use crate::error::FileError;
use crate::pipeline::header::{exif_density, read_jpeg_header, read_png_header, Density};
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Colour layout of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// 1 bit per pixel.
    Bilevel,
    /// 8-bit (or deeper) single channel.
    Greyscale,
    GreyscaleAlpha,
    /// Indexed colour.
    Palette,
    Rgb,
    Rgba,
    Cmyk,
}

impl ColorMode {
    /// Modes whose pixels must be converted to full colour before JPEG
    /// quality settings mean anything.
    pub fn is_palette_like(self) -> bool {
        matches!(self, ColorMode::Bilevel | ColorMode::Greyscale | ColorMode::Palette)
    }
}

/// A decoded input image plus the header metadata the decoder drops.
#[derive(Debug, Clone)]
pub struct InputImage {
    pub path: PathBuf,
    pub format: ImageFormat,
    /// Explicit density tag: JFIF in inches or cm, EXIF / TIFF resolution,
    /// or PNG `pHYs` in metres.
    pub density_tag: Option<Density>,
    /// JFIF density whatever its unit, including aspect-only.
    /// Only JPEG sources carry this.
    pub jfif_density: Option<Density>,
    pub color_mode: ColorMode,
    pub byte_size: u64,
    pub pixels: DynamicImage,
}

/// Read, identify and decode `path`.
///
/// # Errors
/// * [`FileError::NotFound`]: the path does not exist
/// * [`FileError::Unreadable`]: it exists but cannot be read or is not an
///   image the decoder understands
pub fn open_image(path: &Path) -> Result<InputImage, FileError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FileError::NotFound {
            path: path.to_path_buf(),
        },
        _ => FileError::Unreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;

    let unreadable = |detail: String| FileError::Unreadable {
        path: path.to_path_buf(),
        detail,
    };

    let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| unreadable(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| unreadable("unrecognised image format".into()))?;
    let pixels = reader.decode().map_err(|e| unreadable(e.to_string()))?;

    let (density_tag, jfif_density, header_mode) = match format {
        ImageFormat::Jpeg => {
            let header = read_jpeg_header(&bytes);
            let jfif = header.and_then(|h| h.jfif).map(|j| j.density);
            // an absolute JFIF density wins over EXIF
            let tag = jfif
                .filter(|d| d.dpi().is_some())
                .or_else(|| exif_density(&bytes));
            let mode = header.and_then(|h| match h.components {
                4 => Some(ColorMode::Cmyk),
                _ => None,
            });
            (tag, jfif, mode)
        }
        ImageFormat::Png => {
            let header = read_png_header(&bytes);
            let mode = header.and_then(|h| match h.color_type {
                png::ColorType::Indexed => Some(ColorMode::Palette),
                png::ColorType::Grayscale if h.bit_depth == 1 => Some(ColorMode::Bilevel),
                _ => None,
            });
            (header.and_then(|h| h.density), None, mode)
        }
        ImageFormat::Tiff => (exif_density(&bytes), None, None),
        ImageFormat::Gif => (None, None, Some(ColorMode::Palette)),
        _ => (None, None, None),
    };

    let color_mode = header_mode.unwrap_or_else(|| color_mode_of(pixels.color()));

    debug!(
        "Opened {} as {:?}: {}x{} {:?}, density tag {:?}, {} bytes",
        path.display(),
        format,
        pixels.width(),
        pixels.height(),
        color_mode,
        density_tag,
        bytes.len()
    );

    Ok(InputImage {
        path: path.to_path_buf(),
        format,
        density_tag,
        jfif_density,
        color_mode,
        byte_size: bytes.len() as u64,
        pixels,
    })
}

fn color_mode_of(color: ColorType) -> ColorMode {
    match color {
        ColorType::L8 | ColorType::L16 => ColorMode::Greyscale,
        ColorType::La8 | ColorType::La16 => ColorMode::GreyscaleAlpha,
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
        _ => ColorMode::Rgb,
    }
}
