//! Drive the recompression decision over every input, in order.
//!
//! ## Why hand back the scratch directory?
//!
//! Recompressed candidates live in a [`TempDir`]. The assembler still needs
//! them after this stage, so the directory travels inside the returned
//! [`PageSet`] and is deleted when that value is dropped. Dropping happens
//! on every exit path (success, an assembly or write error, or the
//! no-usable-inputs early return), so nothing is left behind.

use crate::config::ConversionConfig;
use crate::error::{FileError, Jpeg2PdfError};
use crate::output::{FileOutcome, SelectionResult};
use crate::pipeline::codec::ImageCodec;
use crate::pipeline::recompress;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Scratch directory with counter-based candidate names.
///
/// Names are `page0001.jpg`, `page0002.jpg`, … The counter only moves
/// forward, so two inputs never share a candidate file. The index is padded
/// to at least four digits, or more if the input count needs it.
pub struct Scratch {
    dir: TempDir,
    counter: usize,
    width: usize,
}

impl Scratch {
    /// Create a scratch directory sized for `input_count` inputs.
    pub fn new(input_count: usize) -> Result<Self, Jpeg2PdfError> {
        let dir = tempfile::Builder::new()
            .prefix("jpeg2pdf-")
            .tempdir()
            .map_err(|source| Jpeg2PdfError::ScratchDir { source })?;
        Ok(Self {
            dir,
            counter: 0,
            width: input_count.to_string().len().max(4),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for the next candidate.
    pub fn next_candidate_path(&mut self) -> PathBuf {
        self.counter += 1;
        self.dir
            .path()
            .join(format!("page{:0width$}.jpg", self.counter, width = self.width))
    }
}

/// Outcome of the selection stage.
///
/// Holds the scratch directory alive; see the module docs.
pub struct PageSet {
    /// Per-input outcomes in input order.
    pub outcomes: Vec<FileOutcome>,
    scratch: Scratch,
}

impl PageSet {
    /// Chosen files in page order.
    pub fn selections(&self) -> impl Iterator<Item = &SelectionResult> {
        self.outcomes.iter().filter_map(|o| o.selection.as_ref())
    }

    /// Chosen paths in page order, ready for the assembler.
    pub fn chosen_paths(&self) -> Vec<PathBuf> {
        self.selections().map(|s| s.chosen_path.clone()).collect()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileError> {
        self.outcomes.iter().filter_map(|o| o.error.as_ref())
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

/// Run the decision engine over `inputs`.
///
/// Missing and unreadable inputs are logged and skipped. Any other failure
/// aborts the run (the scratch directory is removed on the way out).
///
/// # Errors
/// * [`Jpeg2PdfError::NoUsableInputs`]: nothing could be used
/// * [`Jpeg2PdfError::ScratchDir`] / [`Jpeg2PdfError::RecompressFailed`]
pub fn run<P: AsRef<Path>>(
    inputs: &[P],
    config: &ConversionConfig,
    codec: &dyn ImageCodec,
) -> Result<PageSet, Jpeg2PdfError> {
    let total = inputs.len();
    let mut scratch = Scratch::new(total)?;
    debug!("Created scratch directory {}", scratch.path().display());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    let mut outcomes = Vec::with_capacity(total);
    for (i, input) in inputs.iter().enumerate() {
        let index = i + 1;
        let path = input.as_ref();

        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, path);
        }

        match recompress::decide(
            codec,
            path,
            &mut scratch,
            config.quality,
            config.force_recompress,
        ) {
            Ok(selection) => {
                if config.debug {
                    info!(
                        "Processing {} and saving as {}...",
                        path.display(),
                        selection.candidate_path.display()
                    );
                } else {
                    info!("Processing {}...", path.display());
                }
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(index, total, &selection);
                }
                outcomes.push(FileOutcome::selected(index, selection));
            }
            Err(Jpeg2PdfError::Input(err)) => {
                warn!("{}", err);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_skipped(index, total, &err);
                }
                outcomes.push(FileOutcome::skipped(index, err));
            }
            Err(fatal) => return Err(fatal),
        }
    }

    let pages = PageSet { outcomes, scratch };
    let chosen = pages.chosen_paths();
    let processed = chosen.len();

    info!(
        "The following files will be combined into a PDF file: [{}]",
        chosen
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if let Some(ref cb) = config.progress_callback {
        if processed > 0 {
            cb.on_selection_complete(&chosen);
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, processed);
    }

    if processed == 0 {
        return Err(Jpeg2PdfError::NoUsableInputs {
            total,
            skipped: total,
        });
    }

    Ok(pages)
}
