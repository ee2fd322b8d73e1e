//! Error types for the jpeg2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Jpeg2PdfError`]: **Fatal**: the run cannot produce a document
//!   (bad configuration, no usable inputs, output not writable). Returned as
//!   `Err(Jpeg2PdfError)` from the top-level `convert*` functions.
//!
//! * [`FileError`]: **Non-fatal**: a single input could not be opened or
//!   decoded, but every other input is fine. Stored inside
//!   [`crate::output::FileOutcome`] so callers can see which inputs were
//!   excluded from the document instead of losing the whole run to one bad
//!   file.
//!
//! Configuration errors are always raised before any image is opened.

use crate::numbering::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the jpeg2pdf library.
///
/// Per-input failures use [`FileError`] and are stored in
/// [`crate::output::FileOutcome`] rather than propagated here. The one
/// exception is [`Jpeg2PdfError::Input`], which carries a `FileError` out of
/// the per-image decision step so the orchestrator can tell it apart from
/// genuinely fatal failures.
#[derive(Debug, Error)]
pub enum Jpeg2PdfError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// JPEG quality outside 1–100.
    #[error("JPEG compression quality must be an integer between 1 and 100 (1=worst, 100=best), got {value}")]
    InvalidQuality { value: i64 },

    /// More than one of fit-horizontal / fit-vertical / fit-window.
    #[error("only one magnification setting can be specified (got {count})")]
    ConflictingMagnification { count: usize },

    /// More than one page mode requested.
    #[error("only one page mode setting can be specified (got {count})")]
    ConflictingPageMode { count: usize },

    /// The page-numbering format string is malformed.
    #[error("invalid page numbering format '{format}': {source}")]
    InvalidPageNumbering {
        format: String,
        #[source]
        source: FormatError,
    },

    /// First page number below 1.
    #[error("first page number must be a positive integer, got {value}")]
    InvalidFirstPage { value: i64 },

    // ── Input errors ──────────────────────────────────────────────────────
    /// A single input could not be used. Only ever seen inside the pipeline.
    #[error(transparent)]
    Input(#[from] FileError),

    /// Every input was missing or unreadable; nothing to assemble.
    #[error("No image files were processed successfully ({skipped} of {total} skipped), so no PDF file will be generated.")]
    NoUsableInputs { total: usize, skipped: usize },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The scratch directory for recompressed images could not be created.
    #[error("Failed to create scratch directory: {source}")]
    ScratchDir {
        #[source]
        source: std::io::Error,
    },

    /// Writing a recompressed candidate failed.
    #[error("Failed to recompress '{path}': {detail}")]
    RecompressFailed { path: PathBuf, detail: String },

    /// The document assembler could not embed a page.
    #[error("Failed to assemble page from '{path}': {detail}")]
    AssemblyFailed { path: PathBuf, detail: String },

    /// The assembled document could not be parsed or edited.
    #[error("Assembled PDF is corrupt: {detail}")]
    CorruptDocument { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Output location not writable by this process.
    #[error("Unable to write '{path}': permission denied")]
    PermissionDenied { path: PathBuf },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<lopdf::Error> for Jpeg2PdfError {
    fn from(err: lopdf::Error) -> Self {
        Self::CorruptDocument {
            detail: err.to_string(),
        }
    }
}

/// A non-fatal error for a single input image.
///
/// Stored alongside [`crate::output::FileOutcome`] when an input is skipped.
/// The run continues unless ALL inputs fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The path does not exist.
    #[error("Unable to open {}.", .path.display())]
    NotFound { path: PathBuf },

    /// The file exists but is not an image the codec can identify or decode.
    #[error("{} is either not an image file or the file is corrupted, so it will not be added to the PDF file ({detail})", .path.display())]
    Unreadable { path: PathBuf, detail: String },
}

impl FileError {
    /// The input path this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileError::NotFound { path } | FileError::Unreadable { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_quality_display() {
        let e = Jpeg2PdfError::InvalidQuality { value: 101 };
        let msg = e.to_string();
        assert!(msg.contains("between 1 and 100"), "got: {msg}");
        assert!(msg.contains("101"), "got: {msg}");
    }

    #[test]
    fn no_usable_inputs_display() {
        let e = Jpeg2PdfError::NoUsableInputs {
            total: 3,
            skipped: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 of 3"), "got: {msg}");
        assert!(msg.contains("no PDF file"), "got: {msg}");
    }

    #[test]
    fn page_numbering_display_includes_cause() {
        let e = Jpeg2PdfError::InvalidPageNumbering {
            format: "%z".into(),
            source: FormatError::UnknownStyle('z'),
        };
        let msg = e.to_string();
        assert!(msg.contains("'%z'"), "got: {msg}");
        assert!(msg.contains("%z"), "got: {msg}");
    }

    #[test]
    fn file_error_is_transparent_inside_fatal() {
        let fe = FileError::NotFound {
            path: PathBuf::from("missing.png"),
        };
        let e: Jpeg2PdfError = fe.clone().into();
        assert_eq!(e.to_string(), fe.to_string());
        assert!(e.to_string().contains("missing.png"));
    }

    #[test]
    fn file_error_path_accessor() {
        let fe = FileError::Unreadable {
            path: PathBuf::from("notes.txt"),
            detail: "unsupported format".into(),
        };
        assert_eq!(fe.path(), std::path::Path::new("notes.txt"));
        assert!(fe.to_string().contains("not an image file"));
    }
}
