//! Recompression and the keep-or-replace decision for one input image.
//!
//! Every readable input is re-encoded as a JPEG candidate in the scratch
//! directory. The candidate replaces the source unless the source is already
//! a JPEG that is no larger than the candidate: re-encoding is lossy, so it
//! is only worth it when it actually saves space or the source could not be
//! embedded as-is.

use crate::config::Quality;
use crate::error::Jpeg2PdfError;
use crate::output::{SelectionReason, SelectionResult};
use crate::pipeline::codec::ImageCodec;
use crate::pipeline::input::InputImage;
use crate::pipeline::orchestrator::Scratch;
use crate::pipeline::header::Density;
use image::{ImageFormat, RgbImage};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A re-encoded copy of a source image living in the scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecompressedCandidate {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub byte_size: u64,
    pub quality: Quality,
}

/// Density to write into the candidate.
///
/// An explicit density tag wins. Otherwise, only when the source is
/// already in the target format, the format's own density fields are used
/// (for JPEG that is the JFIF pair, including aspect-only values).
/// Everything else gets 72×72 ppi.
pub fn resolve_density(image: &InputImage, target: ImageFormat) -> Density {
    if let Some(tag) = image.density_tag {
        return tag;
    }
    if image.format == target {
        if let Some(d) = image.jfif_density {
            return d;
        }
    }
    Density::DEFAULT
}

/// Full-colour 8-bit pixels for the JPEG writer.
///
/// Palette, bilevel and greyscale sources are expanded to RGB before
/// encoding; so are alpha and 16-bit sources, which a baseline JPEG cannot
/// carry. RGB sources are borrowed.
pub fn normalize_color(image: &InputImage) -> Cow<'_, RgbImage> {
    match image.pixels.as_rgb8() {
        Some(rgb) if !image.color_mode.is_palette_like() => Cow::Borrowed(rgb),
        _ => {
            debug!(
                "Converting {} from {:?} to RGB",
                image.path.display(),
                image.color_mode
            );
            Cow::Owned(image.pixels.to_rgb8())
        }
    }
}

/// Keep-or-replace rule.
///
/// The original is kept only if it is already in the target format, the
/// caller has not forced recompression, and it is not larger than the
/// candidate.
pub fn select(
    source_is_native: bool,
    force_recompress: bool,
    original_bytes: u64,
    candidate_bytes: u64,
) -> SelectionReason {
    if source_is_native && !force_recompress && original_bytes <= candidate_bytes {
        SelectionReason::KeptOriginal
    } else {
        SelectionReason::Recompressed
    }
}

/// Recompress `source` at `quality` and decide which file to keep.
///
/// # Errors
/// * [`Jpeg2PdfError::Input`]: the source is missing or not an image; the
///   caller skips it and carries on
/// * [`Jpeg2PdfError::RecompressFailed`]: the candidate could not be written
pub fn decide(
    codec: &dyn ImageCodec,
    source: &Path,
    scratch: &mut Scratch,
    quality: Quality,
    force_recompress: bool,
) -> Result<SelectionResult, Jpeg2PdfError> {
    let image = codec.open(source)?;
    let target = codec.target_format();

    let density = resolve_density(&image, target);
    let pixels = normalize_color(&image);

    let output_path = scratch.next_candidate_path();
    let byte_size = codec
        .encode(&pixels, &output_path, quality, density)
        .map_err(|e| Jpeg2PdfError::RecompressFailed {
            path: source.to_path_buf(),
            detail: e.to_string(),
        })?;
    let candidate = RecompressedCandidate {
        source_path: source.to_path_buf(),
        output_path,
        byte_size,
        quality,
    };

    let native = image.format == target;
    let reason = select(native, force_recompress, image.byte_size, candidate.byte_size);
    debug!(
        "{}: original {} bytes ({:?}), candidate {} bytes at q{} → {:?}",
        source.display(),
        image.byte_size,
        image.format,
        candidate.byte_size,
        candidate.quality,
        reason
    );

    let chosen_path = match reason {
        SelectionReason::KeptOriginal => source.to_path_buf(),
        SelectionReason::Recompressed => candidate.output_path.clone(),
    };

    Ok(SelectionResult {
        source: source.to_path_buf(),
        chosen_path,
        candidate_path: candidate.output_path,
        reason,
        original_bytes: image.byte_size,
        candidate_bytes: candidate.byte_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use crate::pipeline::codec::ImageRsCodec;
    use crate::pipeline::input::ColorMode;
    use crate::pipeline::header::tests::{strip_jfif, tiff_bytes, with_exif};
    use crate::pipeline::header::{read_jpeg_header, DensityUnit};
    use image::codecs::jpeg::{JpegEncoder, PixelDensity};
    use image::{DynamicImage, GrayImage, Luma, Rgb};

    fn q(v: i64) -> Quality {
        Quality::new(v).unwrap()
    }

    /// Deterministic noise: compresses badly, so quality changes size a lot.
    fn noise(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            let v = x.wrapping_mul(2_654_435_761).wrapping_add(y.wrapping_mul(40_503)) ^ (x * y);
            Rgb([(v >> 3) as u8, (v >> 11) as u8, (v >> 19) as u8])
        })
    }

    fn write_jpeg(path: &Path, img: &RgbImage, quality: u8, density: PixelDensity) {
        let mut file = std::fs::File::create(path).unwrap();
        let mut enc = JpegEncoder::new_with_quality(&mut file, quality);
        enc.set_pixel_density(density);
        enc.encode_image(img).unwrap();
    }

    fn fake_image(format: ImageFormat, tag: Option<Density>, jfif: Option<Density>) -> InputImage {
        InputImage {
            path: PathBuf::from("fake"),
            format,
            density_tag: tag,
            jfif_density: jfif,
            color_mode: ColorMode::Rgb,
            byte_size: 0,
            pixels: DynamicImage::ImageRgb8(RgbImage::new(1, 1)),
        }
    }

    #[test]
    fn selection_rule_truth_table() {
        assert_eq!(select(true, false, 100, 100), SelectionReason::KeptOriginal);
        assert_eq!(select(true, false, 99, 100), SelectionReason::KeptOriginal);
        assert_eq!(select(true, false, 101, 100), SelectionReason::Recompressed);
        assert_eq!(select(true, true, 10, 100), SelectionReason::Recompressed);
        assert_eq!(select(false, false, 10, 100), SelectionReason::Recompressed);
    }

    #[test]
    fn density_prefers_explicit_tag() {
        let tag = Density::ppi(300, 300);
        let img = fake_image(ImageFormat::Png, Some(tag), None);
        assert_eq!(resolve_density(&img, ImageFormat::Jpeg), tag);
    }

    #[test]
    fn jfif_fallback_only_for_native_sources() {
        let aspect = Density {
            x: 1,
            y: 1,
            unit: DensityUnit::AspectOnly,
        };
        let jpeg = fake_image(ImageFormat::Jpeg, None, Some(aspect));
        assert_eq!(resolve_density(&jpeg, ImageFormat::Jpeg), aspect);

        let other = fake_image(ImageFormat::Png, None, Some(aspect));
        assert_eq!(resolve_density(&other, ImageFormat::Jpeg), Density::DEFAULT);
    }

    #[test]
    fn greyscale_is_expanded_to_rgb() {
        let mut img = fake_image(ImageFormat::Png, None, None);
        img.pixels = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([200])));
        img.color_mode = ColorMode::Greyscale;
        let rgb = normalize_color(&img);
        assert!(matches!(rgb, Cow::Owned(_)));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([200, 200, 200]));
    }

    #[test]
    fn rgb_is_borrowed() {
        let img = fake_image(ImageFormat::Png, None, None);
        assert!(matches!(normalize_color(&img), Cow::Borrowed(_)));
    }

    #[test]
    fn small_jpeg_is_kept() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("small.jpg");
        write_jpeg(&src, &noise(64, 64), 20, PixelDensity::dpi(200));

        let mut scratch = Scratch::new(1).unwrap();
        let r = decide(&ImageRsCodec, &src, &mut scratch, q(100), false).unwrap();
        assert_eq!(r.reason, SelectionReason::KeptOriginal);
        assert_eq!(r.chosen_path, src);
        assert!(r.candidate_path.starts_with(scratch.path()));
        assert_eq!(r.candidate_path.file_name().unwrap(), "page0001.jpg");
        assert!(r.original_bytes <= r.candidate_bytes);
    }

    #[test]
    fn forced_recompression_replaces_small_jpeg() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("small.jpg");
        write_jpeg(&src, &noise(64, 64), 20, PixelDensity::dpi(200));

        let mut scratch = Scratch::new(1).unwrap();
        let r = decide(&ImageRsCodec, &src, &mut scratch, q(100), true).unwrap();
        assert_eq!(r.reason, SelectionReason::Recompressed);
        assert!(r.chosen_path.starts_with(scratch.path()));
        assert!(r.chosen_path.exists());
    }

    #[test]
    fn large_jpeg_is_replaced_and_density_kept() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("large.jpg");
        write_jpeg(&src, &noise(64, 64), 100, PixelDensity::dpi(200));

        let mut scratch = Scratch::new(1).unwrap();
        let r = decide(&ImageRsCodec, &src, &mut scratch, q(10), false).unwrap();
        assert_eq!(r.reason, SelectionReason::Recompressed);
        assert!(r.candidate_bytes < r.original_bytes);

        let header = read_jpeg_header(&std::fs::read(&r.chosen_path).unwrap()).unwrap();
        assert_eq!(header.jfif.unwrap().density, Density::ppi(200, 200));
    }

    #[test]
    fn exif_resolution_reaches_the_candidate() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("camera.jpg");
        write_jpeg(&src, &noise(64, 64), 100, PixelDensity::dpi(72));
        let bytes = with_exif(
            &strip_jfif(&std::fs::read(&src).unwrap()),
            &tiff_bytes((300, 1), (300, 1), Some(2)),
        );
        std::fs::write(&src, bytes).unwrap();

        let image = ImageRsCodec.open(&src).unwrap();
        assert_eq!(resolve_density(&image, ImageFormat::Jpeg), Density::ppi(300, 300));

        let mut scratch = Scratch::new(1).unwrap();
        let r = decide(&ImageRsCodec, &src, &mut scratch, q(10), false).unwrap();
        assert_eq!(r.reason, SelectionReason::Recompressed);
        let header = read_jpeg_header(&std::fs::read(&r.chosen_path).unwrap()).unwrap();
        assert_eq!(header.jfif.unwrap().density, Density::ppi(300, 300));
    }

    #[test]
    fn png_is_always_replaced() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("tiny.png");
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).save(&src).unwrap();

        let mut scratch = Scratch::new(1).unwrap();
        let r = decide(&ImageRsCodec, &src, &mut scratch, q(75), false).unwrap();
        assert_eq!(r.reason, SelectionReason::Recompressed);

        let header = read_jpeg_header(&std::fs::read(&r.chosen_path).unwrap()).unwrap();
        assert_eq!(header.jfif.unwrap().density, Density::DEFAULT);
    }

    #[test]
    fn missing_source_surfaces_as_input_error() {
        let mut scratch = Scratch::new(1).unwrap();
        let err = decide(
            &ImageRsCodec,
            Path::new("/no/such/file.jpg"),
            &mut scratch,
            q(75),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Jpeg2PdfError::Input(FileError::NotFound { .. })
        ));
    }
}
