//! # ESC/POS Control Bytes
//!
//! Byte constants for the ESC/POS command protocol, plus a handful of small
//! sequence builders used to script print jobs in tests and demos.
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`, `CR`, `FF`, `HT`, `BEL`
//! - Two bytes: `ESC @`, `ESC 2`
//! - Multi-byte with parameters: `ESC E n`, `GS V m n`, `GS ( k pL pH data...`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

// ============================================================================
// CONTROL BYTES
// ============================================================================

/// NUL - Terminator for `ESC D` tab stops and `GS k` function A barcodes
pub const NUL: u8 = 0x00;

/// EOT - Second byte of `DLE EOT n` (transmit real-time status)
pub const EOT: u8 = 0x04;

/// ENQ - Second byte of `DLE ENQ n` (real-time request)
pub const ENQ: u8 = 0x05;

/// BEL - Sound the buzzer
pub const BEL: u8 = 0x07;

/// HT (Horizontal Tab) - Advance to next tab position
pub const HT: u8 = 0x09;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

/// FF (Form Feed) - Print and eject; treated as a cut on receipt printers
pub const FF: u8 = 0x0C;

/// CR (Carriage Return)
///
/// Ignored by most receipt printers unless auto line feed is enabled.
pub const CR: u8 = 0x0D;

/// DLE (Data Link Escape) - Real-time command prefix
pub const DLE: u8 = 0x10;

/// DC4 - Second byte of `DLE DC4 fn m t` (real-time pulse / recovery)
pub const DC4: u8 = 0x14;

/// ESC (Escape) - Command prefix byte
///
/// Most ESC/POS commands begin with ESC (0x1B). This byte signals the start
/// of a control sequence rather than printable text.
pub const ESC: u8 = 0x1B;

/// FS (File Separator) - Kanji and NV graphics command prefix
pub const FS: u8 = 0x1C;

/// GS (Group Separator) - Extended command prefix
///
/// Used for character size, cutting, barcodes and graphics.
/// - Hex: 0x1D, Decimal: 29
pub const GS: u8 = 0x1D;

/// Status byte returned for `DLE EOT n`: online, paper present, no error.
///
/// Bit 1 and bit 4 are fixed to 1 by the ESC/POS status format.
pub const STATUS_ONLINE: u8 = 0x12;

// ============================================================================
// SEQUENCE BUILDERS
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ```
/// use recibo::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// Emphasized (bold) mode, `ESC E n`.
#[inline]
pub fn bold(on: bool) -> Vec<u8> {
    vec![ESC, b'E', on as u8]
}

/// Underline mode, `ESC - n` with `n` = 0 (off), 1 (thin) or 2 (thick).
#[inline]
pub fn underline(n: u8) -> Vec<u8> {
    vec![ESC, b'-', n]
}

/// Justification, `ESC a n` with `n` = 0 (left), 1 (center) or 2 (right).
#[inline]
pub fn align(n: u8) -> Vec<u8> {
    vec![ESC, b'a', n]
}

/// Print and feed `n` lines, `ESC d n`.
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

/// # Cut Paper (GS V m)
///
/// Function A cut with no feed: `m = 0` full, `m = 1` partial.
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | GS V m   |
/// | Hex     | 1D 56 m  |
#[inline]
pub fn cut(partial: bool) -> Vec<u8> {
    vec![GS, b'V', partial as u8]
}

/// Real-time status request, `DLE EOT n`.
#[inline]
pub fn status_request(n: u8) -> Vec<u8> {
    vec![DLE, EOT, n]
}
