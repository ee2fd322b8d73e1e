//! Result types returned by a conversion run.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why a file was chosen for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// The source is already a JPEG no larger than its recompressed copy.
    KeptOriginal,
    /// The recompressed copy was used.
    Recompressed,
}

/// The file chosen to become one page, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// The input path as given by the caller.
    pub source: PathBuf,
    /// Either `source` or `candidate_path`.
    pub chosen_path: PathBuf,
    /// The recompressed copy in the scratch directory, written either way.
    pub candidate_path: PathBuf,
    pub reason: SelectionReason,
    /// Size of the source file in bytes.
    pub original_bytes: u64,
    /// Size of the recompressed candidate in bytes.
    pub candidate_bytes: u64,
}

impl SelectionResult {
    pub fn kept_original(&self) -> bool {
        self.reason == SelectionReason::KeptOriginal
    }

    /// Bytes of the file that ends up in the document.
    pub fn chosen_bytes(&self) -> u64 {
        match self.reason {
            SelectionReason::KeptOriginal => self.original_bytes,
            SelectionReason::Recompressed => self.candidate_bytes,
        }
    }
}

/// What happened to one input, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// 1-indexed position in the input list.
    pub index: usize,
    pub input: PathBuf,
    /// Present when the input became a page.
    pub selection: Option<SelectionResult>,
    /// Present when the input was skipped.
    pub error: Option<FileError>,
}

impl FileOutcome {
    pub fn selected(index: usize, selection: SelectionResult) -> Self {
        Self {
            index,
            input: selection.source.clone(),
            selection: Some(selection),
            error: None,
        }
    }

    pub fn skipped(index: usize, error: FileError) -> Self {
        Self {
            index,
            input: error.path().to_path_buf(),
            selection: None,
            error: Some(error),
        }
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_inputs: usize,
    /// Inputs that became pages.
    pub processed: usize,
    /// Inputs excluded as missing or unreadable.
    pub skipped: usize,
    pub kept_original: usize,
    pub recompressed: usize,
    /// Sum of the chosen files' sizes.
    pub image_bytes: u64,
    pub pdf_bytes: u64,
    pub total_duration_ms: u64,
}

/// A finished document plus the per-file report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The final PDF bytes, page labels and open action already applied.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub files: Vec<FileOutcome>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Chosen files in page order.
    pub fn pages(&self) -> impl Iterator<Item = &SelectionResult> {
        self.files.iter().filter_map(|f| f.selection.as_ref())
    }
}
