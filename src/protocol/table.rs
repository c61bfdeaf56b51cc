//! # Command Table
//!
//! Data-driven description of the ESC/POS commands the emulator recognizes.
//!
//! Each entry pairs a signature (1 to 3 leading bytes) with a [`CommandKind`]
//! and a [`LengthRule`] saying how many parameter bytes follow. Lookup is
//! longest-prefix: `GS V 0` wins over the `GS V` fallback, which wins over the
//! bare `GS` family entry.
//!
//! A byte is a control byte exactly when some signature starts with it. Every
//! other byte is literal text.
//!
//! ## Example
//!
//! ```
//! use recibo::protocol::table::{CommandTable, CommandKind, Lookup};
//!
//! let table = CommandTable::escpos();
//! match table.lookup(&[0x1B, b'E', 1]) {
//!     Lookup::Matched(spec) => assert_eq!(spec.kind, CommandKind::Bold),
//!     _ => panic!("ESC E should match"),
//! }
//! assert!(matches!(table.lookup(&[0x1D, b'V']), Lookup::NeedMore));
//! ```

use std::sync::{Arc, LazyLock};

use super::commands::{BEL, CR, DC4, DLE, ENQ, EOT, ESC, FF, FS, GS, HT, LF, NUL};
use crate::error::ReciboError;

/// Longest digit run read by [`LengthRule::AsciiNumber`].
pub const MAX_ASCII_DIGITS: usize = 10;

/// Longest payload searched for a [`LengthRule::Terminated`] terminator.
pub const MAX_TERMINATED_LEN: usize = 1024;

/// Longest signature the table accepts.
pub const MAX_SIGNATURE_LEN: usize = 3;

/// How many parameter bytes follow a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    /// No parameters.
    None,
    /// Exactly `n` bytes.
    Fixed(usize),
    /// ASCII digits up to the first non-digit (which is not consumed).
    AsciiNumber,
    /// A `k`-byte little-endian length, then that many bytes.
    LengthPrefixed(usize),
    /// Bytes up to and including the terminator.
    Terminated(u8),
    /// `ESC *`: `m nL nH`, then `n` columns of 1 (m = 0, 1) or 3 (m = 32, 33) bytes.
    BitImage,
    /// `GS v 0`: `m xL xH yL yH`, then `x * y` bytes.
    Raster,
    /// Length cannot be known from the table.
    Unknown,
}

/// Result of measuring the parameters that follow a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// `header` bytes of parameters, then `body` bytes of bulk data.
    Complete { header: usize, body: u64 },
    /// More bytes are needed to know.
    Incomplete,
    /// The length cannot be determined.
    Undetermined,
}

#[inline]
fn le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

impl LengthRule {
    /// Measure the parameters in `params` (the bytes after the signature).
    ///
    /// `eof` means no more bytes will arrive, which ends an ASCII number.
    pub fn measure(&self, params: &[u8], eof: bool) -> Measure {
        match *self {
            LengthRule::None => Measure::Complete { header: 0, body: 0 },
            LengthRule::Fixed(n) if params.len() >= n => Measure::Complete { header: n, body: 0 },
            LengthRule::Fixed(_) => Measure::Incomplete,
            LengthRule::AsciiNumber => {
                let digits = params
                    .iter()
                    .take(MAX_ASCII_DIGITS)
                    .take_while(|b| b.is_ascii_digit())
                    .count();
                if digits == MAX_ASCII_DIGITS || digits < params.len() || eof {
                    Measure::Complete {
                        header: digits,
                        body: 0,
                    }
                } else {
                    Measure::Incomplete
                }
            }
            LengthRule::LengthPrefixed(k) if params.len() >= k => Measure::Complete {
                header: k,
                body: le(&params[..k]),
            },
            LengthRule::LengthPrefixed(_) => Measure::Incomplete,
            LengthRule::Terminated(t) => {
                match params.iter().take(MAX_TERMINATED_LEN).position(|&b| b == t) {
                    Some(i) => Measure::Complete {
                        header: i + 1,
                        body: 0,
                    },
                    None if params.len() >= MAX_TERMINATED_LEN => Measure::Undetermined,
                    None => Measure::Incomplete,
                }
            }
            LengthRule::BitImage if params.len() >= 3 => {
                let per_column = match params[0] {
                    0 | 1 => 1,
                    32 | 33 => 3,
                    _ => return Measure::Undetermined,
                };
                Measure::Complete {
                    header: 3,
                    body: le(&params[1..3]) * per_column,
                }
            }
            LengthRule::BitImage => Measure::Incomplete,
            LengthRule::Raster if params.len() >= 5 => Measure::Complete {
                header: 5,
                body: le(&params[1..3]) * le(&params[3..5]),
            },
            LengthRule::Raster => Measure::Incomplete,
            LengthRule::Unknown => Measure::Undetermined,
        }
    }
}

/// What a recognized command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    LineFeed,
    CarriageReturn,
    FormFeed,
    Bell,
    Tab,
    Initialize,
    Bold,
    DoubleStrike,
    Underline,
    Align,
    Font,
    PrintMode,
    CharacterSize,
    CodePage,
    LineSpacing,
    DefaultLineSpacing,
    CharSpacing,
    UpsideDown,
    Reverse,
    PrintAndFeed,
    /// A cut whose variant is fixed by the signature; an optional payload byte is the feed.
    Cut { partial: bool },
    /// `GS V m` with a variant byte that has no entry of its own.
    CutVariant,
    StatusQuery,
    /// Recognized and deliberately without effect.
    Ignored,
    /// Recognized, payload skipped, effect not emulated.
    NotEmulated(&'static str),
    /// Family fallback for an unrecognized suffix.
    Unknown,
}

/// One table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub signature: Vec<u8>,
    pub name: &'static str,
    pub kind: CommandKind,
    pub rule: LengthRule,
}

/// Outcome of a lookahead lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Longest signature matching the lookahead.
    Matched(&'a CommandSpec),
    /// The lookahead is a strict prefix of a longer signature.
    NeedMore,
    /// No signature matches; the first byte is literal text.
    NoMatch,
}

/// Signature table indexed by first byte.
#[derive(Debug, Clone)]
pub struct CommandTable {
    by_prefix: [Vec<CommandSpec>; 256],
    max_len: usize,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

static ESCPOS: LazyLock<Arc<CommandTable>> = LazyLock::new(|| Arc::new(CommandTable::escpos()));

impl CommandTable {
    /// An empty table: every byte is literal text.
    pub fn new() -> Self {
        Self {
            by_prefix: std::array::from_fn(|_| Vec::new()),
            max_len: 1,
        }
    }

    /// The shared factory ESC/POS table.
    pub fn shared() -> Arc<CommandTable> {
        Arc::clone(&ESCPOS)
    }

    /// Register a command.
    ///
    /// Fails on an empty or over-long signature, or one that is already
    /// registered. A signature may be a prefix of another; the longer one wins.
    pub fn register(
        &mut self,
        signature: &[u8],
        name: &'static str,
        kind: CommandKind,
        rule: LengthRule,
    ) -> Result<(), ReciboError> {
        if signature.is_empty() || signature.len() > MAX_SIGNATURE_LEN {
            return Err(ReciboError::Config(format!(
                "{}: signature must be 1 to {} bytes",
                name, MAX_SIGNATURE_LEN
            )));
        }
        let family = &mut self.by_prefix[signature[0] as usize];
        if family.iter().any(|spec| spec.signature == signature) {
            return Err(ReciboError::Config(format!(
                "{}: signature {:02X?} registered twice",
                name, signature
            )));
        }
        family.push(CommandSpec {
            signature: signature.to_vec(),
            name,
            kind,
            rule,
        });
        self.max_len = self.max_len.max(signature.len());
        Ok(())
    }

    /// Builder form of [`register`](Self::register) for the factory table.
    fn with(mut self, signature: &[u8], name: &'static str, kind: CommandKind, rule: LengthRule) -> Self {
        self.by_prefix[signature[0] as usize].push(CommandSpec {
            signature: signature.to_vec(),
            name,
            kind,
            rule,
        });
        self.max_len = self.max_len.max(signature.len());
        self
    }

    /// True if `byte` starts at least one signature.
    #[inline]
    pub fn is_prefix(&self, byte: u8) -> bool {
        !self.by_prefix[byte as usize].is_empty()
    }

    /// Length of the longest registered signature.
    #[inline]
    pub fn max_signature_len(&self) -> usize {
        self.max_len
    }

    /// Number of registered signatures.
    pub fn len(&self) -> usize {
        self.by_prefix.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every entry.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.by_prefix.iter().flatten()
    }

    /// Find the longest signature matching `lookahead`.
    pub fn lookup(&self, lookahead: &[u8]) -> Lookup<'_> {
        let Some(&first) = lookahead.first() else {
            return Lookup::NeedMore;
        };

        let mut best: Option<&CommandSpec> = None;
        let mut pending = false;
        for spec in &self.by_prefix[first as usize] {
            let sig = spec.signature.as_slice();
            if sig.len() <= lookahead.len() {
                if lookahead.starts_with(sig)
                    && best.is_none_or(|b| sig.len() > b.signature.len())
                {
                    best = Some(spec);
                }
            } else if sig.starts_with(lookahead) {
                pending = true;
            }
        }

        match (pending, best) {
            (true, _) => Lookup::NeedMore,
            (false, Some(spec)) => Lookup::Matched(spec),
            (false, None) => Lookup::NoMatch,
        }
    }

    /// The factory ESC/POS table.
    pub fn escpos() -> Self {
        use CommandKind as K;
        use LengthRule as R;

        let mut table = Self::new()
            // ===== Single-byte controls =====
            .with(&[LF], "LF", K::LineFeed, R::None)
            .with(&[CR], "CR", K::CarriageReturn, R::None)
            .with(&[FF], "FF", K::FormFeed, R::None)
            .with(&[BEL], "BEL", K::Bell, R::None)
            .with(&[HT], "HT", K::Tab, R::None)
            // ===== ESC =====
            .with(&[ESC], "ESC", K::Unknown, R::Unknown)
            .with(&[ESC, b'@'], "ESC @", K::Initialize, R::None)
            .with(&[ESC, b'E'], "ESC E", K::Bold, R::Fixed(1))
            .with(&[ESC, b'G'], "ESC G", K::DoubleStrike, R::Fixed(1))
            .with(&[ESC, b'-'], "ESC -", K::Underline, R::Fixed(1))
            .with(&[ESC, b'a'], "ESC a", K::Align, R::Fixed(1))
            .with(&[ESC, b'M'], "ESC M", K::Font, R::Fixed(1))
            .with(&[ESC, b'!'], "ESC !", K::PrintMode, R::Fixed(1))
            .with(&[ESC, b't'], "ESC t", K::CodePage, R::Fixed(1))
            .with(&[ESC, b'2'], "ESC 2", K::DefaultLineSpacing, R::None)
            .with(&[ESC, b'3'], "ESC 3", K::LineSpacing, R::Fixed(1))
            .with(&[ESC, b' '], "ESC SP", K::CharSpacing, R::Fixed(1))
            .with(&[ESC, b'{'], "ESC {", K::UpsideDown, R::Fixed(1))
            .with(&[ESC, b'd'], "ESC d", K::PrintAndFeed, R::Fixed(1))
            .with(&[ESC, b'i'], "ESC i", K::Cut { partial: false }, R::None)
            .with(&[ESC, b'm'], "ESC m", K::Cut { partial: true }, R::None)
            .with(&[ESC, b'S'], "ESC S", K::Ignored, R::None)
            .with(&[ESC, b'L'], "ESC L", K::NotEmulated("page mode"), R::None)
            .with(&[ESC, b'J'], "ESC J", K::NotEmulated("dot feed"), R::Fixed(1))
            .with(&[ESC, b'e'], "ESC e", K::NotEmulated("reverse feed"), R::Fixed(1))
            .with(&[ESC, b'$'], "ESC $", K::NotEmulated("absolute position"), R::Fixed(2))
            .with(&[ESC, b'\\'], "ESC \\", K::NotEmulated("relative position"), R::Fixed(2))
            .with(&[ESC, b'p'], "ESC p", K::NotEmulated("cash drawer pulse"), R::Fixed(3))
            .with(&[ESC, b'c'], "ESC c", K::NotEmulated("panel and sensor setup"), R::Fixed(2))
            .with(&[ESC, b'R'], "ESC R", K::NotEmulated("international character set"), R::Fixed(1))
            .with(&[ESC, b'r'], "ESC r", K::NotEmulated("print color"), R::Fixed(1))
            .with(&[ESC, b'U'], "ESC U", K::NotEmulated("unidirectional printing"), R::Fixed(1))
            .with(&[ESC, b'V'], "ESC V", K::NotEmulated("90 degree rotation"), R::Fixed(1))
            .with(&[ESC, b'='], "ESC =", K::NotEmulated("peripheral select"), R::Fixed(1))
            .with(&[ESC, b'D'], "ESC D", K::NotEmulated("tab positions"), R::Terminated(NUL))
            .with(&[ESC, b'*'], "ESC *", K::NotEmulated("bit image"), R::BitImage)
            // ===== GS =====
            .with(&[GS], "GS", K::Unknown, R::Unknown)
            .with(&[GS, b'!'], "GS !", K::CharacterSize, R::Fixed(1))
            .with(&[GS, b'B'], "GS B", K::Reverse, R::Fixed(1))
            .with(&[GS, b'V'], "GS V", K::CutVariant, R::Fixed(1))
            .with(&[GS, b'V', 0], "GS V", K::Cut { partial: false }, R::None)
            .with(&[GS, b'V', b'0'], "GS V", K::Cut { partial: false }, R::None)
            .with(&[GS, b'V', 1], "GS V", K::Cut { partial: true }, R::None)
            .with(&[GS, b'V', b'1'], "GS V", K::Cut { partial: true }, R::None)
            .with(&[GS, b'L'], "GS L", K::NotEmulated("left margin"), R::Fixed(2))
            .with(&[GS, b'W'], "GS W", K::NotEmulated("print area width"), R::Fixed(2))
            .with(&[GS, b'P'], "GS P", K::NotEmulated("motion units"), R::Fixed(2))
            .with(&[GS, b'h'], "GS h", K::NotEmulated("barcode height"), R::Fixed(1))
            .with(&[GS, b'w'], "GS w", K::NotEmulated("barcode width"), R::Fixed(1))
            .with(&[GS, b'H'], "GS H", K::NotEmulated("barcode text position"), R::Fixed(1))
            .with(&[GS, b'f'], "GS f", K::NotEmulated("barcode text font"), R::Fixed(1))
            .with(&[GS, b'k'], "GS k", K::Unknown, R::Unknown)
            .with(&[GS, b'/'], "GS /", K::NotEmulated("downloaded bit image"), R::Fixed(1))
            .with(&[GS, b'a'], "GS a", K::NotEmulated("automatic status back"), R::Fixed(1))
            .with(&[GS, b'r'], "GS r", K::NotEmulated("status transmission"), R::Fixed(1))
            .with(&[GS, b'I'], "GS I", K::NotEmulated("printer ID"), R::Fixed(1))
            .with(&[GS, b'b'], "GS b", K::NotEmulated("smoothing"), R::Fixed(1))
            .with(&[GS, b'8', b'L'], "GS 8 L", K::NotEmulated("graphics"), R::LengthPrefixed(4))
            .with(&[GS, b'v', b'0'], "GS v 0", K::NotEmulated("raster bit image"), R::Raster)
            // ===== FS =====
            .with(&[FS, b'.'], "FS .", K::Ignored, R::None)
            .with(&[FS, b'&'], "FS &", K::Ignored, R::None)
            .with(&[FS, b'!'], "FS !", K::NotEmulated("Kanji print mode"), R::Fixed(1))
            .with(&[FS, b'C'], "FS C", K::NotEmulated("Kanji code system"), R::Fixed(1))
            .with(&[FS, b'p'], "FS p", K::NotEmulated("NV bit image"), R::Fixed(2))
            // ===== DLE =====
            .with(&[DLE, EOT], "DLE EOT", K::StatusQuery, R::Fixed(1))
            .with(&[DLE, ENQ], "DLE ENQ", K::Ignored, R::Fixed(1))
            .with(&[DLE, DC4, 1], "DLE DC4", K::NotEmulated("real-time pulse"), R::Fixed(2))
            .with(&[DLE, DC4, 2], "DLE DC4", K::NotEmulated("power off"), R::Fixed(2));

        // GS V function B, C, D: a feed byte follows the variant.
        for (m, partial) in [(65, false), (66, true), (97, false), (98, true), (103, false), (104, true)] {
            table = table.with(&[GS, b'V', m], "GS V", K::Cut { partial }, R::Fixed(1));
        }
        // GS k function A is NUL terminated, function B carries a length byte.
        for m in 0..=6 {
            table = table.with(&[GS, b'k', m], "GS k", K::NotEmulated("barcode"), R::Terminated(NUL));
        }
        for m in 65..=73 {
            table = table.with(&[GS, b'k', m], "GS k", K::NotEmulated("barcode"), R::LengthPrefixed(1));
        }
        for &f in b"ACDEHKLNPQkz" {
            table = table.with(&[GS, b'(', f], "GS (", K::NotEmulated("extended graphics or 2D code"), R::LengthPrefixed(2));
        }
        for &f in b"ACELe" {
            table = table.with(&[FS, b'(', f], "FS (", K::NotEmulated("extended Kanji or NV memory"), R::LengthPrefixed(2));
        }
        table
    }
}
