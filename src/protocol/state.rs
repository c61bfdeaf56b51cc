//! # Printer Formatting State
//!
//! The text attributes an ESC/POS printer carries between commands.
//!
//! | Attribute | Command | Default |
//! |-----------|---------|---------|
//! | Bold | ESC E n, ESC ! | off |
//! | Double strike | ESC G n | off |
//! | Underline | ESC - n, ESC ! | off |
//! | Alignment | ESC a n | left |
//! | Font | ESC M n, ESC ! | A |
//! | Character size | GS ! n | 1×1 |
//! | Code page | ESC t n | 0 (PC437) |
//! | Line spacing | ESC 2, ESC 3 n | 30 dots |
//! | Character spacing | ESC SP n | 0 |
//! | Upside down | ESC { n | off |
//! | Reverse | GS B n | off |
//!
//! Selector parameters outside their legal range are either clamped to the
//! nearest legal value or rejected, depending on the [`ParamPolicy`].

use serde::{Deserialize, Serialize};

/// Default line spacing in dots (1/6 inch at 180 DPI).
pub const DEFAULT_LINE_SPACING: u8 = 30;

/// ASCII '0'. Selector commands accept '0'..'2' as aliases for 0..2.
const ASCII_ZERO: u8 = b'0';

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// Underline thickness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Underline {
    #[default]
    Off = 0,
    Single = 1,
    Double = 2,
}

/// Available fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Font {
    /// Font A: 12×24 dots, 48 columns on 80mm paper
    #[default]
    A = 0,
    /// Font B: 9×17 dots, 64 columns on 80mm paper
    B = 1,
    /// Font C: printer specific, rendered like font B
    C = 2,
}

/// What to do with a parameter outside the command's legal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamPolicy {
    /// Clamp to the nearest legal value, like lenient real printers.
    #[default]
    Clamp,
    /// Leave the state unchanged and report the command as unsupported.
    Reject,
}

/// Outcome of applying a selector parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamOutcome {
    Exact,
    Clamped { requested: u8, applied: u8 },
    Rejected { requested: u8 },
}

/// Current text attributes.
///
/// `PrinterState` is `Copy`: a [`snapshot`](Self::snapshot) is attached to every
/// text run so later commands cannot change how an earlier run is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrinterState {
    pub bold: bool,
    pub double_strike: bool,
    pub underline: Underline,
    pub alignment: Alignment,
    pub font: Font,
    /// Horizontal magnification, 1..=8. Tracked but not rendered.
    pub width_mult: u8,
    /// Vertical magnification, 1..=8. Tracked but not rendered.
    pub height_mult: u8,
    pub code_page: u8,
    pub line_spacing: u8,
    pub char_spacing: u8,
    pub upside_down: bool,
    pub reverse: bool,
}

impl Default for PrinterState {
    fn default() -> Self {
        Self {
            bold: false,
            double_strike: false,
            underline: Underline::Off,
            alignment: Alignment::Left,
            font: Font::A,
            width_mult: 1,
            height_mult: 1,
            code_page: 0,
            line_spacing: DEFAULT_LINE_SPACING,
            char_spacing: 0,
            upside_down: false,
            reverse: false,
        }
    }
}

/// Resolve a selector with legal values `0..=max` (or their ASCII digits).
///
/// Returns the selected value and whether `n` was legal as given.
fn selector(n: u8, max: u8) -> (u8, bool) {
    if n <= max {
        (n, true)
    } else if (ASCII_ZERO..=ASCII_ZERO + max).contains(&n) {
        (n - ASCII_ZERO, true)
    } else if n > ASCII_ZERO + max {
        (max, false)
    } else if n - max <= ASCII_ZERO - n {
        (max, false)
    } else {
        // Nearest legal value is ASCII '0'.
        (0, false)
    }
}

impl PrinterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every attribute to its power-on default (ESC @).
    pub fn initialize(&mut self) {
        *self = Self::default();
    }

    /// Immutable copy for attaching to a text run.
    #[inline]
    pub fn snapshot(&self) -> PrinterState {
        *self
    }

    /// Apply a selector through the policy, calling `set` with the value to store.
    fn apply(
        &mut self,
        n: u8,
        max: u8,
        policy: ParamPolicy,
        set: impl FnOnce(&mut Self, u8),
    ) -> ParamOutcome {
        match (selector(n, max), policy) {
            ((value, true), _) => {
                set(self, value);
                ParamOutcome::Exact
            }
            ((value, false), ParamPolicy::Clamp) => {
                set(self, value);
                ParamOutcome::Clamped {
                    requested: n,
                    applied: value,
                }
            }
            ((_, false), ParamPolicy::Reject) => ParamOutcome::Rejected { requested: n },
        }
    }

    /// ESC E n
    pub fn set_bold(&mut self, n: u8, policy: ParamPolicy) -> ParamOutcome {
        self.apply(n, 1, policy, |s, v| s.bold = v == 1)
    }

    /// ESC - n
    pub fn set_underline(&mut self, n: u8, policy: ParamPolicy) -> ParamOutcome {
        self.apply(n, 2, policy, |s, v| {
            s.underline = match v {
                0 => Underline::Off,
                1 => Underline::Single,
                _ => Underline::Double,
            }
        })
    }

    /// ESC a n
    pub fn set_alignment(&mut self, n: u8, policy: ParamPolicy) -> ParamOutcome {
        self.apply(n, 2, policy, |s, v| {
            s.alignment = match v {
                0 => Alignment::Left,
                1 => Alignment::Center,
                _ => Alignment::Right,
            }
        })
    }

    /// ESC M n
    pub fn set_font(&mut self, n: u8, policy: ParamPolicy) -> ParamOutcome {
        self.apply(n, 2, policy, |s, v| {
            s.font = match v {
                0 => Font::A,
                1 => Font::B,
                _ => Font::C,
            }
        })
    }

    /// GS ! n: width multiplier in bits 4-6, height in bits 0-2.
    ///
    /// Bits 3 and 7 are undefined; clamping masks them off.
    pub fn set_character_size(&mut self, n: u8, policy: ParamPolicy) -> ParamOutcome {
        let legal = n & 0x77;
        if legal != n && policy == ParamPolicy::Reject {
            return ParamOutcome::Rejected { requested: n };
        }
        self.width_mult = (legal >> 4) + 1;
        self.height_mult = (legal & 0x07) + 1;
        if legal == n {
            ParamOutcome::Exact
        } else {
            ParamOutcome::Clamped {
                requested: n,
                applied: legal,
            }
        }
    }

    /// ESC ! n: font B (bit 0), emphasized (bit 3), double height (bit 4),
    /// double width (bit 5), underline (bit 7).
    pub fn set_print_mode(&mut self, n: u8) {
        self.font = if n & 0x01 != 0 { Font::B } else { Font::A };
        self.bold = n & 0x08 != 0;
        self.height_mult = if n & 0x10 != 0 { 2 } else { 1 };
        self.width_mult = if n & 0x20 != 0 { 2 } else { 1 };
        self.underline = if n & 0x80 != 0 {
            Underline::Single
        } else {
            Underline::Off
        };
    }

    /// ESC 3 n, or ESC 2 (`None`) for the default spacing.
    pub fn set_line_spacing(&mut self, n: Option<u8>) {
        self.line_spacing = n.unwrap_or(DEFAULT_LINE_SPACING);
    }

    /// ESC SP n
    pub fn set_char_spacing(&mut self, n: u8) {
        self.char_spacing = n;
    }

    /// ESC t n. Any table number is recorded; translation is the renderer's job.
    pub fn set_code_page(&mut self, n: u8) {
        self.code_page = n;
    }

    /// ESC G n (LSB)
    pub fn set_double_strike(&mut self, n: u8) {
        self.double_strike = n & 1 == 1;
    }

    /// ESC { n (LSB)
    pub fn set_upside_down(&mut self, n: u8) {
        self.upside_down = n & 1 == 1;
    }

    /// GS B n (LSB)
    pub fn set_reverse(&mut self, n: u8) {
        self.reverse = n & 1 == 1;
    }

    /// Bold or double strike, the two ways ESC/POS darkens text.
    #[inline]
    pub fn is_emphasized(&self) -> bool {
        self.bold || self.double_strike
    }
}
