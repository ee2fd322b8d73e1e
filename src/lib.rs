//! # jpeg2pdf
//!
//! Combine image files into a single PDF, one page per image.
//!
//! ## Why recompress selectively?
//!
//! A PDF can embed a JPEG byte-for-byte, so a JPEG input costs nothing extra.
//! Everything else (PNG, GIF, TIFF, …) has to become a JPEG first. This crate
//! re-encodes every input at the requested quality and then keeps whichever
//! file is appropriate: the original when it is already a JPEG no larger
//! than the re-encoded copy, the copy otherwise. Page size is derived from
//! the image density, which is carried through recompression unchanged.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images
//!  │
//!  ├─ 1. Open      decode + sniff density / colour mode (skip bad inputs)
//!  ├─ 2. Decide    recompress into a scratch dir, keep original or copy
//!  ├─ 3. Assemble  embed chosen JPEGs as DCTDecode pages (lopdf)
//!  ├─ 4. Patch     /PageLabels and /OpenAction in the catalog
//!  └─ 5. Output    PDF bytes + per-file report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jpeg2pdf::{convert_to_file, ConversionConfig, Magnification};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .quality(80)
//!         .title("Holiday")
//!         .page_numbering("%D")
//!         .request_magnification(Magnification::FitPage)
//!         .build()?;
//!     let stats = convert_to_file(&["a.png", "b.jpg"], "album", &config)?;
//!     eprintln!("{} pages, {} skipped", stats.processed, stats.skipped);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `jpeg2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! jpeg2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod numbering;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, Magnification, PageMode, Quality, ViewerDirective,
    DEFAULT_QUALITY,
};
pub use convert::{convert, convert_to_file, convert_with_codec, resolve_output_path};
pub use error::{FileError, Jpeg2PdfError};
pub use numbering::{FormatError, NumberingStyle, PageNumberSpec};
pub use output::{ConversionOutput, ConversionStats, FileOutcome, SelectionReason, SelectionResult};
pub use pipeline::codec::{ImageCodec, ImageRsCodec};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
