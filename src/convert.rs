//! Top-level conversion entry points.
//!
//! [`convert`] runs the whole pipeline and returns the PDF in memory;
//! [`convert_to_file`] additionally writes it to disk. Both keep the scratch
//! directory alive until the document has been assembled, and drop it on
//! every return path.

use crate::config::ConversionConfig;
use crate::error::Jpeg2PdfError;
use crate::output::{ConversionOutput, ConversionStats, SelectionReason};
use crate::pipeline::assemble::{self, DocumentInfo};
use crate::pipeline::codec::{ImageCodec, ImageRsCodec};
use crate::pipeline::{orchestrator, postprocess};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Extension given to output paths that have none.
pub const DEFAULT_EXTENSION: &str = "pdf";

/// Convert `inputs` into one PDF, in input order.
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some inputs were skipped
/// (check `output.stats.skipped`).
///
/// # Errors
/// Returns `Err(Jpeg2PdfError)` only for fatal errors:
/// - No input could be used
/// - A recompressed candidate could not be written
/// - The document could not be assembled
pub fn convert<P: AsRef<Path>>(
    inputs: &[P],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Jpeg2PdfError> {
    convert_with_codec(inputs, config, &ImageRsCodec)
}

/// [`convert`] with a caller-supplied image codec.
pub fn convert_with_codec<P: AsRef<Path>>(
    inputs: &[P],
    config: &ConversionConfig,
    codec: &dyn ImageCodec,
) -> Result<ConversionOutput, Jpeg2PdfError> {
    let start = Instant::now();
    info!("Starting conversion of {} input files", inputs.len());

    // ── Step 1: Choose a file per input ──────────────────────────────────
    let pages = orchestrator::run(inputs, config, codec)?;

    // ── Step 2: Assemble ─────────────────────────────────────────────────
    let info = DocumentInfo {
        title: config.title.as_deref(),
        author: config.author.as_deref(),
    };
    let raw = assemble::assemble(&pages.chosen_paths(), &info, config.viewer.page_mode)?;

    // ── Step 3: Page labels and initial view ─────────────────────────────
    let pdf = postprocess::apply_to_bytes(
        &raw,
        config.page_numbering.as_ref(),
        &config.viewer,
        config.first_page_number,
    )?;
    debug!(
        "Document ready; removing scratch directory {}",
        pages.scratch_dir().display()
    );

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let selections: Vec<_> = pages.selections().collect();
    let stats = ConversionStats {
        total_inputs: inputs.len(),
        processed: selections.len(),
        skipped: pages.skipped().count(),
        kept_original: selections
            .iter()
            .filter(|s| s.reason == SelectionReason::KeptOriginal)
            .count(),
        recompressed: selections
            .iter()
            .filter(|s| s.reason == SelectionReason::Recompressed)
            .count(),
        image_bytes: selections.iter().map(|s| s.chosen_bytes()).sum(),
        pdf_bytes: pdf.len() as u64,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} files, {} bytes, {}ms",
        stats.processed, stats.total_inputs, stats.pdf_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        pdf,
        files: pages.outcomes.clone(),
        stats,
    })
}

/// `path`, with `.pdf` appended when it has no extension.
pub fn resolve_output_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(DEFAULT_EXTENSION)
    }
}

fn write_error(path: &Path, source: std::io::Error) -> Jpeg2PdfError {
    if source.kind() == ErrorKind::PermissionDenied {
        Jpeg2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        Jpeg2PdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write `bytes` to `path` atomically (temp file + rename).
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Jpeg2PdfError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, bytes).map_err(|e| write_error(path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        write_error(path, e)
    })?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Convert `inputs` and write the PDF to `output`.
///
/// `output` gets a `.pdf` extension if it has none. Nothing is written when
/// the conversion fails.
pub fn convert_to_file<P: AsRef<Path>>(
    inputs: &[P],
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Jpeg2PdfError> {
    let result = convert(inputs, config)?;
    let path = resolve_output_path(output);
    info!("Writing {}...", path.display());
    write_atomic(&path, &result.pdf)?;
    Ok(result.stats)
}
