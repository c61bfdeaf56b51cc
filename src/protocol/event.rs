//! # Output Events
//!
//! What the decoder hands to a [`Renderer`](crate::render::Renderer), in stream
//! order. Events are passed by value; the decoder keeps no reference to them.

use std::fmt;

use serde::Serialize;

use super::state::PrinterState;
use super::table::{CommandKind, LengthRule};

/// A decoded command: signature, parameter bytes, and where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: &'static str,
    pub kind: CommandKind,
    pub rule: LengthRule,
    pub signature: Vec<u8>,
    pub payload: Vec<u8>,
    pub offset: u64,
}

impl Command {
    /// Parameter byte `i`, or 0 if the payload is shorter.
    #[inline]
    pub fn param(&self, i: usize) -> u8 {
        self.payload.get(i).copied().unwrap_or(0)
    }

    /// The command's single argument.
    ///
    /// For [`LengthRule::AsciiNumber`] payloads this parses the digits
    /// (saturating at 255); otherwise it is the first parameter byte.
    pub fn argument(&self) -> u8 {
        match self.rule {
            LengthRule::AsciiNumber => self
                .payload
                .iter()
                .filter(|d| d.is_ascii_digit())
                .fold(0u32, |acc, d| {
                    (acc * 10 + (d - b'0') as u32).min(u8::MAX as u32)
                }) as u8,
            _ => self.param(0),
        }
    }
}

/// A run of literal bytes printed with one set of attributes.
///
/// The bytes are untranslated; code page handling happens in the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub bytes: Vec<u8>,
    pub style: PrinterState,
}

/// Why a command produced no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnsupportedReason {
    /// Recognized and skipped, but its effect is outside the emulated feature set.
    NotEmulated(&'static str),
    /// Known prefix, unknown suffix. Following bytes are decoded as text.
    UnknownCommand,
    /// Recognized, but the payload length could not be determined.
    Underspecified,
    /// The stream ended before the command was complete.
    Truncated,
    /// Parameter outside the legal range under [`ParamPolicy::Reject`](super::ParamPolicy::Reject).
    OutOfRange { requested: u8 },
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEmulated(what) => write!(f, "{} not emulated", what),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::Underspecified => write!(f, "payload length undetermined"),
            Self::Truncated => write!(f, "truncated at end of stream"),
            Self::OutOfRange { requested } => write!(f, "parameter {} out of range", requested),
        }
    }
}

/// A command that was consumed without effect, kept visible for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unsupported {
    /// Signature bytes as they appeared in the stream.
    pub signature: Vec<u8>,
    /// Number of bytes consumed after the signature.
    pub payload_len: u64,
    pub offset: u64,
    pub reason: UnsupportedReason,
}

impl Unsupported {
    /// Signature as a hex string, e.g. `"1D 28 6B"`.
    pub fn signature_hex(&self) -> String {
        self.signature
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Renderable output of the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Text(TextRun),
    LineFeed,
    CarriageReturn,
    Tab,
    /// Print the line buffer and feed `lines` lines (ESC d n).
    Feed { lines: u8 },
    /// Paper cut, including FF. `feed` is the pre-cut feed in motion units.
    Cut { partial: bool, feed: u8 },
    Bell,
    /// Real-time status request (DLE EOT n).
    StatusQuery(u8),
    Unsupported(Unsupported),
}

impl Event {
    /// Build a text event.
    pub fn text(bytes: impl Into<Vec<u8>>, style: PrinterState) -> Self {
        Self::Text(TextRun {
            bytes: bytes.into(),
            style,
        })
    }

    /// A full cut with no feed, as produced by FF or `GS V 0`.
    pub const fn cut() -> Self {
        Self::Cut {
            partial: false,
            feed: 0,
        }
    }
}
