//! Page-numbering format strings.
//!
//! A format string is a literal prefix optionally followed by one style
//! token. The token is `%` plus a style character:
//!
//! | Token | Rendering in the viewer |
//! |-------|-------------------------|
//! | `%D`  | 1, 2, 3, …              |
//! | `%R`  | I, II, III, …           |
//! | `%r`  | i, ii, iii, …           |
//! | `%A`  | A, B, C, … AA, BB, …    |
//! | `%a`  | a, b, c, … aa, bb, …    |
//!
//! `%%` writes a literal `%` into the prefix. So `A-%D` numbers pages
//! `A-1`, `A-2`, …, and `100%%` labels every page `100%` with no number.
//!
//! PDF page labels only support a prefix followed by the number, so a style
//! token must end the string; anything after it is rejected instead of being
//! silently dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a page-numbering format string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("only one page numbering style may be specified in the formatting string")]
    MultipleStyles,

    #[error("invalid formatting style %{0}")]
    UnknownStyle(char),

    #[error("no suffixes are permitted in the page formatting string")]
    SuffixNotAllowed,
}

/// Numbering style of a page-label range (`/S` in the PDF page-label dictionary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberingStyle {
    /// Arabic numerals.
    Decimal,
    /// Upper-case Roman numerals.
    UpperRoman,
    /// Lower-case Roman numerals.
    LowerRoman,
    /// Upper-case letters.
    UpperAlpha,
    /// Lower-case letters.
    LowerAlpha,
}

impl NumberingStyle {
    /// Map a style character (the one after `%`) to a style.
    pub fn from_token(c: char) -> Option<Self> {
        match c {
            'D' => Some(Self::Decimal),
            'R' => Some(Self::UpperRoman),
            'r' => Some(Self::LowerRoman),
            'A' => Some(Self::UpperAlpha),
            'a' => Some(Self::LowerAlpha),
            _ => None,
        }
    }

    /// The style character as written in a format string and in PDF.
    pub fn token(self) -> char {
        match self {
            Self::Decimal => 'D',
            Self::UpperRoman => 'R',
            Self::LowerRoman => 'r',
            Self::UpperAlpha => 'A',
            Self::LowerAlpha => 'a',
        }
    }

    /// PDF name bytes without the leading slash, e.g. `b"D"`.
    pub fn pdf_name(self) -> Vec<u8> {
        self.token().to_string().into_bytes()
    }
}

/// Displays as a PDF name, e.g. `/D`.
impl fmt::Display for NumberingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.token())
    }
}

/// Parsed page-numbering format: a prefix and an optional style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNumberSpec {
    /// Text shown before each page number. May be empty.
    pub prefix: String,
    /// Numbering style; `None` shows the prefix alone.
    pub style: Option<NumberingStyle>,
}

#[derive(Clone, Copy)]
enum ScanState {
    Normal,
    /// The previous character was an unescaped `%`.
    PendingStyle,
}

impl PageNumberSpec {
    /// Parse a format string such as `A-%D`, `%r` or `100%%`.
    ///
    /// Single left-to-right scan. A trailing lone `%` has nothing to pair with
    /// and is kept in the prefix.
    pub fn parse(format: &str) -> Result<Self, FormatError> {
        let chars: Vec<char> = format.chars().collect();
        let mut state = ScanState::Normal;
        let mut prefix = String::with_capacity(format.len());
        let mut style: Option<NumberingStyle> = None;
        // char index of the `%` that introduced the style
        let mut style_start: Option<usize> = None;

        for (i, &c) in chars.iter().enumerate() {
            match state {
                ScanState::Normal => {
                    if c == '%' {
                        state = ScanState::PendingStyle;
                    } else if style.is_none() {
                        prefix.push(c);
                    }
                }
                ScanState::PendingStyle => {
                    state = ScanState::Normal;
                    if c == '%' {
                        if style.is_none() {
                            prefix.push('%');
                        }
                        continue;
                    }
                    if style.is_some() {
                        return Err(FormatError::MultipleStyles);
                    }
                    let token =
                        NumberingStyle::from_token(c).ok_or(FormatError::UnknownStyle(c))?;
                    style = Some(token);
                    style_start = Some(i - 1);
                }
            }
        }

        if let ScanState::PendingStyle = state {
            if style.is_none() {
                prefix.push('%');
            }
        }

        if let Some(start) = style_start {
            if start + 2 != chars.len() {
                return Err(FormatError::SuffixNotAllowed);
            }
        }

        Ok(Self { prefix, style })
    }
}

impl std::str::FromStr for PageNumberSpec {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
