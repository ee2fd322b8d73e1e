//! Header metadata the `image` decoders do not expose.
//!
//! `image` returns pixels but drops the physical-size fields and the source
//! colour layout. They are recovered here without decoding any pixels:
//!
//! * PNG `IHDR` / `pHYs` through `png::Decoder::read_info`
//! * EXIF and TIFF `XResolution` / `YResolution` / `ResolutionUnit` through
//!   `kamadak-exif`, which reads both bare TIFF files and the JPEG APP1 block
//! * JPEG JFIF density, frame size, component count and the Adobe APP14 flag
//!   from a short segment walk that stops at the first scan

use exif::{In, Tag, Value};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

const INCHES_PER_METRE: f64 = 39.3701;
const CM_PER_INCH: f64 = 2.54;

/// Unit of a pixel-density pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityUnit {
    /// Only the aspect ratio is meaningful (JFIF unit 0).
    AspectOnly,
    PixelsPerInch,
    PixelsPerCm,
}

/// Horizontal / vertical pixel density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Density {
    pub x: u16,
    pub y: u16,
    pub unit: DensityUnit,
}

impl Density {
    pub const fn ppi(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            unit: DensityUnit::PixelsPerInch,
        }
    }

    /// 72 pixels per inch: one pixel per PDF point.
    pub const DEFAULT: Density = Density::ppi(72, 72);

    /// Dots per inch on each axis, or `None` when only an aspect ratio is
    /// recorded (or a value is zero).
    pub fn dpi(&self) -> Option<(f64, f64)> {
        if self.x == 0 || self.y == 0 {
            return None;
        }
        let scale = match self.unit {
            DensityUnit::AspectOnly => return None,
            DensityUnit::PixelsPerInch => 1.0,
            DensityUnit::PixelsPerCm => CM_PER_INCH,
        };
        Some((f64::from(self.x) * scale, f64::from(self.y) * scale))
    }
}

/// Whole pixels per inch, or `None` for zero, negative or non-finite input.
fn to_ppi(value: f64) -> Option<u16> {
    (value.is_finite() && value >= 0.5).then(|| value.round().min(f64::from(u16::MAX)) as u16)
}

// ── JPEG ─────────────────────────────────────────────────────────────────

/// Layout of the `JFIF` APP0 segment, if present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JfifInfo {
    pub density: Density,
}

/// What the JPEG headers say.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JpegHeader {
    pub jfif: Option<JfifInfo>,
    pub width: u32,
    pub height: u32,
    /// 1 = grey, 3 = YCbCr/RGB, 4 = CMYK/YCCK.
    pub components: u8,
    /// An Adobe APP14 segment was seen (CMYK data is then stored inverted).
    pub adobe: bool,
}

fn be16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

/// `true` for start-of-frame markers (all SOFn except DHT, JPG and DAC).
fn is_sof(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// Parse JPEG header segments up to the first scan.
///
/// Returns `None` if `bytes` does not start with a JPEG SOI marker or no
/// frame header is found.
pub fn read_jpeg_header(bytes: &[u8]) -> Option<JpegHeader> {
    let [0xFF, 0xD8, ..] = bytes else {
        return None;
    };

    let mut header = JpegHeader::default();
    let mut seen_frame = false;
    let mut pos = 2;

    while let Some(&[0xFF, marker, hi, lo]) = bytes.get(pos..pos + 4) {
        match marker {
            // fill byte
            0xFF => {
                pos += 1;
                continue;
            }
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => break,
            _ => {}
        }

        let len = usize::from(u16::from_be_bytes([hi, lo]));
        let Some(seg) = bytes.get(pos + 4..pos + 2 + len) else {
            break;
        };

        match (marker, seg) {
            (0xE0, [b'J', b'F', b'I', b'F', 0, _, _, unit, density @ ..])
                if header.jfif.is_none() && density.len() >= 4 =>
            {
                let unit = match *unit {
                    1 => DensityUnit::PixelsPerInch,
                    2 => DensityUnit::PixelsPerCm,
                    _ => DensityUnit::AspectOnly,
                };
                header.jfif = Some(JfifInfo {
                    density: Density {
                        x: be16(density),
                        y: be16(&density[2..]),
                        unit,
                    },
                });
            }
            (0xEE, [b'A', b'd', b'o', b'b', b'e', ..]) => header.adobe = true,
            (m, [_, frame @ ..]) if is_sof(m) && !seen_frame && frame.len() >= 5 => {
                header.height = u32::from(be16(frame));
                header.width = u32::from(be16(&frame[2..]));
                header.components = frame[4];
                seen_frame = true;
            }
            _ => {}
        }

        pos += 2 + len;
    }

    seen_frame.then_some(header)
}

// ── PNG ──────────────────────────────────────────────────────────────────

/// What the PNG headers say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngHeader {
    pub bit_depth: u8,
    pub color_type: png::ColorType,
    /// `pHYs` converted to pixels per inch; `None` when absent or unit-less.
    pub density: Option<Density>,
}

/// Read the PNG header chunks (everything before the first `IDAT`).
pub fn read_png_header(bytes: &[u8]) -> Option<PngHeader> {
    let reader = png::Decoder::new(Cursor::new(bytes)).read_info().ok()?;
    let info = reader.info();

    let density = info
        .pixel_dims
        .filter(|dims| dims.unit == png::Unit::Meter)
        .and_then(|dims| {
            let x = to_ppi(f64::from(dims.xppu) / INCHES_PER_METRE)?;
            let y = to_ppi(f64::from(dims.yppu) / INCHES_PER_METRE)?;
            Some(Density::ppi(x, y))
        });

    Some(PngHeader {
        bit_depth: info.bit_depth as u8,
        color_type: info.color_type,
        density,
    })
}

// ── EXIF / TIFF ──────────────────────────────────────────────────────────

/// Resolution from the primary IFD of a TIFF file or a JPEG's EXIF block,
/// in pixels per inch.
///
/// `ResolutionUnit` 2 (or absent) is inches and 3 is centimetres. Unit 1
/// means "no absolute unit" and yields `None`, as does a missing
/// `XResolution`. A missing `YResolution` reuses the horizontal value.
pub fn exif_density(bytes: &[u8]) -> Option<Density> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let rational = |tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|field| match field.value {
                Value::Rational(ref v) => v.first().map(|r| r.to_f64()),
                _ => None,
            })
    };

    let scale = match exif
        .get_field(Tag::ResolutionUnit, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
    {
        None | Some(2) => 1.0,
        Some(3) => CM_PER_INCH,
        Some(_) => return None,
    };

    let x = rational(Tag::XResolution)?;
    let y = rational(Tag::YResolution).unwrap_or(x);
    Some(Density::ppi(to_ppi(x * scale)?, to_ppi(y * scale)?))
}
