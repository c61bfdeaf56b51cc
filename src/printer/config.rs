//! # Paper Profiles
//!
//! This module defines the paper widths the emulator can render for.
//!
//! ## Supported Widths
//!
//! | Paper | Print width | Resolution | Font A cols | Font B cols |
//! |-------|-------------|------------|-------------|-------------|
//! | 58mm  | 48mm (384 dots) | 203 DPI | 32 | 42 |
//! | 80mm  | 72mm (576 dots) | 203 DPI | 48 | 64 |
//!
//! ## Usage
//!
//! ```
//! use recibo::printer::Paper;
//! use recibo::protocol::Font;
//!
//! let paper = Paper::parse("58mm").unwrap();
//! assert_eq!(paper.columns(Font::A), 32);
//! assert_eq!(Paper::default().columns(Font::B), 64);
//! ```

use serde::{Deserialize, Serialize};

use crate::protocol::Font;

/// Glyph width in dots for `font`. Font C renders like font B.
fn glyph_width(font: Font) -> u16 {
    match font {
        Font::A => 12,
        Font::B | Font::C => 9,
    }
}

/// # Paper Width
///
/// Decides how many characters fit on a line of the rendered receipt.
///
/// ## Calculations
///
/// ```text
/// dots_per_mm = dpi / 25.4 ≈ 8
/// columns     = width_dots / glyph_width
///
/// For 80mm paper:
///   font A: 576 / 12 = 48
///   font B: 576 / 9  = 64
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Paper {
    #[serde(rename = "58mm")]
    Mm58,
    #[default]
    #[serde(rename = "80mm")]
    Mm80,
}

impl Paper {
    /// Display name, e.g. `"80mm"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mm58 => "58mm",
            Self::Mm80 => "80mm",
        }
    }

    /// Printable width in dots at 203 DPI.
    #[inline]
    pub fn width_dots(&self) -> u16 {
        match self {
            Self::Mm58 => 384,
            Self::Mm80 => 576,
        }
    }

    /// Characters per line in `font`.
    pub fn columns(&self, font: Font) -> usize {
        (self.width_dots() / glyph_width(font)) as usize
    }

    /// Parse a paper name from the CLI or a config file.
    ///
    /// Accepts `"58mm"`, `"58"`, `"80mm"` and `"80"`, case-insensitive.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "58mm" | "58" => Ok(Self::Mm58),
            "80mm" | "80" => Ok(Self::Mm80),
            _ => Err(format!(
                "Unknown paper '{}'. Use one of: {}",
                s,
                Self::all().map(|paper| paper.name()).join(", ")
            )),
        }
    }

    /// List all paper widths.
    pub fn all() -> [Self; 2] {
        [Self::Mm58, Self::Mm80]
    }
}

// ============================================================================
// TESTS
// ============================================================================
