//! Pipeline stages for image-to-PDF conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the codec can be swapped without touching the selection policy.
//!
//! ## Data Flow
//!
//! ```text
//! inputs ──▶ orchestrator ──▶ recompress ──▶ assemble ──▶ postprocess
//!  (paths)    (per file)      (keep/replace)  (lopdf)     (labels, view)
//! ```
//!
//! 1. [`orchestrator`]: walk the inputs in order, skip the unusable ones,
//!    own the scratch directory
//! 2. [`recompress`]: re-encode one image through the [`codec`] and keep
//!    whichever of original and candidate is appropriate
//! 3. [`assemble`]: embed the chosen JPEGs as pages
//! 4. [`postprocess`]: write page labels and the open action into the
//!    catalog
//!
//! [`input`], [`header`] and [`encode`] sit behind [`codec::ImageRsCodec`].

pub mod assemble;
pub mod codec;
pub mod encode;
pub mod header;
pub mod input;
pub mod orchestrator;
pub mod postprocess;
pub mod recompress;
