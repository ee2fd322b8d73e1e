//! Configuration types for image-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The builder accepts raw user values
//! (quality, first page number, format string, viewer requests) and
//! [`ConversionConfigBuilder::build`] validates all of them at once, so every
//! configuration error surfaces before a single input image is opened.

use crate::error::Jpeg2PdfError;
use crate::numbering::PageNumberSpec;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default JPEG quality used when none is given.
pub const DEFAULT_QUALITY: u8 = 75;

/// JPEG compression quality, 1 (worst) to 100 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(u8);

impl Quality {
    /// Validate a raw quality value.
    pub fn new(value: i64) -> Result<Self, Jpeg2PdfError> {
        match u8::try_from(value) {
            Ok(q) if (1..=100).contains(&q) => Ok(Self(q)),
            _ => Err(Jpeg2PdfError::InvalidQuality { value }),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Initial zoom a viewer applies when the document is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Magnification {
    /// Fit the page width to the window (`/FitH`).
    FitWidth,
    /// Fit the page height to the window (`/FitV`).
    FitHeight,
    /// Fit the whole page in the window (`/Fit`).
    FitPage,
}

impl Magnification {
    /// PDF destination name without the slash.
    pub fn pdf_name(self) -> &'static str {
        match self {
            Magnification::FitWidth => "FitH",
            Magnification::FitHeight => "FitV",
            Magnification::FitPage => "Fit",
        }
    }
}

/// Panels a viewer shows next to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageMode {
    /// Show the page-thumbnail panel (`/UseThumbs`).
    ShowThumbnails,
}

impl PageMode {
    pub fn pdf_name(self) -> &'static str {
        match self {
            PageMode::ShowThumbnails => "UseThumbs",
        }
    }
}

/// Initial-view settings written into the finished document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerDirective {
    pub magnification: Option<Magnification>,
    pub page_mode: Option<PageMode>,
}

impl ViewerDirective {
    /// Build a directive from everything the user asked for.
    ///
    /// At most one magnification and one page mode may be requested;
    /// asking for more is a configuration error, even if the values repeat.
    pub fn from_requests(
        magnifications: &[Magnification],
        page_modes: &[PageMode],
    ) -> Result<Self, Jpeg2PdfError> {
        if magnifications.len() > 1 {
            return Err(Jpeg2PdfError::ConflictingMagnification {
                count: magnifications.len(),
            });
        }
        if page_modes.len() > 1 {
            return Err(Jpeg2PdfError::ConflictingPageMode {
                count: page_modes.len(),
            });
        }
        Ok(Self {
            magnification: magnifications.first().copied(),
            page_mode: page_modes.first().copied(),
        })
    }
}

/// Configuration for one conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use jpeg2pdf::{ConversionConfig, Magnification};
///
/// let config = ConversionConfig::builder()
///     .quality(85)
///     .page_numbering("A-%D")
///     .first_page_number(5)
///     .request_magnification(Magnification::FitWidth)
///     .build()
///     .unwrap();
/// assert_eq!(config.quality.get(), 85);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// JPEG quality used for every recompressed candidate. Default: 75.
    pub quality: Quality,

    /// Always use the recompressed candidate, even when the original JPEG is
    /// smaller. Default: false.
    pub force_recompress: bool,

    /// Include scratch file paths in per-file progress lines. Default: false.
    pub debug: bool,

    /// Document title (`/Title` in the info dictionary).
    pub title: Option<String>,

    /// Document author (`/Author` in the info dictionary).
    pub author: Option<String>,

    /// Page-label prefix and style. `None` writes an empty label range.
    pub page_numbering: Option<PageNumberSpec>,

    /// Number shown on the first page. Default: 1.
    pub first_page_number: u32,

    /// Initial magnification and page mode.
    pub viewer: ViewerDirective,

    /// Per-file progress events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            force_recompress: false,
            debug: false,
            title: None,
            author: None,
            page_numbering: None,
            first_page_number: 1,
            viewer: ViewerDirective::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("quality", &self.quality)
            .field("force_recompress", &self.force_recompress)
            .field("debug", &self.debug)
            .field("title", &self.title)
            .field("author", &self.author)
            .field("page_numbering", &self.page_numbering)
            .field("first_page_number", &self.first_page_number)
            .field("viewer", &self.viewer)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for [`ConversionConfig`].
///
/// Holds unvalidated values; nothing is checked until [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ConversionConfigBuilder {
    quality: Option<i64>,
    force_recompress: bool,
    debug: bool,
    title: Option<String>,
    author: Option<String>,
    page_numbering: Option<String>,
    first_page_number: Option<i64>,
    magnifications: Vec<Magnification>,
    page_modes: Vec<PageMode>,
    progress_callback: Option<ProgressCallbackSlot>,
}

// Keeps the builder `Debug` without requiring it of the callback.
struct ProgressCallbackSlot(ProgressCallback);

impl fmt::Debug for ProgressCallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<dyn ConversionProgressCallback>")
    }
}

impl ConversionConfigBuilder {
    pub fn quality(mut self, quality: i64) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn force_recompress(mut self, v: bool) -> Self {
        self.force_recompress = v;
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.debug = v;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Page-numbering format string, e.g. `"A-%D"`.
    pub fn page_numbering(mut self, format: impl Into<String>) -> Self {
        self.page_numbering = Some(format.into());
        self
    }

    pub fn first_page_number(mut self, n: i64) -> Self {
        self.first_page_number = Some(n);
        self
    }

    /// Record a requested magnification. Requesting more than one makes
    /// [`build`](Self::build) fail.
    pub fn request_magnification(mut self, m: Magnification) -> Self {
        self.magnifications.push(m);
        self
    }

    /// Record a requested page mode. Requesting more than one makes
    /// [`build`](Self::build) fail.
    pub fn request_page_mode(mut self, mode: PageMode) -> Self {
        self.page_modes.push(mode);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(ProgressCallbackSlot(cb));
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Jpeg2PdfError> {
        let quality = match self.quality {
            Some(q) => Quality::new(q)?,
            None => Quality::default(),
        };

        let viewer = ViewerDirective::from_requests(&self.magnifications, &self.page_modes)?;

        let page_numbering = match self.page_numbering {
            Some(format) => Some(PageNumberSpec::parse(&format).map_err(|source| {
                Jpeg2PdfError::InvalidPageNumbering {
                    format: format.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let first_page_number = match self.first_page_number {
            Some(n) => u32::try_from(n)
                .ok()
                .filter(|&n| n >= 1)
                .ok_or(Jpeg2PdfError::InvalidFirstPage { value: n })?,
            None => 1,
        };

        Ok(ConversionConfig {
            quality,
            force_recompress: self.force_recompress,
            debug: self.debug,
            title: self.title,
            author: self.author,
            page_numbering,
            first_page_number,
            viewer,
            progress_callback: self.progress_callback.map(|slot| slot.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::NumberingStyle;

    #[test]
    fn defaults() {
        let c = ConversionConfig::builder().build().unwrap();
        assert_eq!(c.quality.get(), 75);
        assert_eq!(c.first_page_number, 1);
        assert!(!c.force_recompress);
        assert!(c.page_numbering.is_none());
        assert_eq!(c.viewer, ViewerDirective::default());
    }

    #[test]
    fn default_impl_matches_builder_defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.quality.get(), DEFAULT_QUALITY);
        assert_eq!(c.first_page_number, 1);
    }

    #[test]
    fn quality_bounds() {
        assert!(Quality::new(1).is_ok());
        assert!(Quality::new(100).is_ok());
        for bad in [0, 101, -5, 300] {
            match ConversionConfig::builder().quality(bad).build() {
                Err(Jpeg2PdfError::InvalidQuality { value }) => assert_eq!(value, bad),
                other => panic!("expected InvalidQuality for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn first_page_must_be_positive() {
        assert!(matches!(
            ConversionConfig::builder().first_page_number(0).build(),
            Err(Jpeg2PdfError::InvalidFirstPage { value: 0 })
        ));
        let c = ConversionConfig::builder()
            .first_page_number(12)
            .build()
            .unwrap();
        assert_eq!(c.first_page_number, 12);
    }

    #[test]
    fn conflicting_magnification_rejected() {
        let r = ConversionConfig::builder()
            .request_magnification(Magnification::FitWidth)
            .request_magnification(Magnification::FitPage)
            .build();
        assert!(matches!(
            r,
            Err(Jpeg2PdfError::ConflictingMagnification { count: 2 })
        ));
    }

    #[test]
    fn repeated_page_mode_rejected() {
        let r = ViewerDirective::from_requests(
            &[],
            &[PageMode::ShowThumbnails, PageMode::ShowThumbnails],
        );
        assert!(matches!(
            r,
            Err(Jpeg2PdfError::ConflictingPageMode { count: 2 })
        ));
    }

    #[test]
    fn single_requests_accepted() {
        let v = ViewerDirective::from_requests(
            &[Magnification::FitHeight],
            &[PageMode::ShowThumbnails],
        )
        .unwrap();
        assert_eq!(v.magnification, Some(Magnification::FitHeight));
        assert_eq!(v.page_mode, Some(PageMode::ShowThumbnails));
        assert_eq!(Magnification::FitHeight.pdf_name(), "FitV");
    }

    #[test]
    fn page_numbering_parsed_at_build() {
        let c = ConversionConfig::builder()
            .page_numbering("A-%D")
            .build()
            .unwrap();
        let spec = c.page_numbering.unwrap();
        assert_eq!(spec.prefix, "A-");
        assert_eq!(spec.style, Some(NumberingStyle::Decimal));

        let err = ConversionConfig::builder()
            .page_numbering("%D-x")
            .build()
            .unwrap_err();
        assert!(matches!(err, Jpeg2PdfError::InvalidPageNumbering { .. }));
    }
}
