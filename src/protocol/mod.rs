//! # ESC/POS Protocol Decoding
//!
//! This module turns the raw byte stream a point-of-sale host sends to a
//! thermal printer into a sequence of renderable [`Event`]s.
//!
//! ## Module Structure
//!
//! - [`commands`]: Control byte constants and small sequence builders
//! - [`cursor`]: Resumable buffer over chunked input
//! - [`table`]: Signature table and parameter length rules
//! - [`state`]: Text attributes carried between commands
//! - [`event`]: What the decoder emits
//! - [`decoder`]: The TEXT / DISPATCH / SKIP state machine
//! - [`cp437`]: Code page 437 to Unicode
//!
//! ## Usage Example
//!
//! ```
//! use recibo::protocol::{commands, Decoder, Event};
//!
//! let mut job = Vec::new();
//! job.extend(commands::init());
//! job.extend(commands::bold(true));
//! job.extend(b"TOTAL\n");
//! job.extend(commands::cut(false));
//!
//! let mut decoder = Decoder::new(Vec::new());
//! decoder.feed(&job)?;
//! let events = decoder.close()?;
//!
//! assert!(matches!(&events[0], Event::Text(run) if run.style.bold));
//! assert_eq!(events.last(), Some(&Event::cut()));
//! # Ok::<(), recibo::ReciboError>(())
//! ```
//!
//! ## Protocol Reference
//!
//! Command coverage follows the Epson ESC/POS command reference for TM-series
//! receipt printers.

pub mod commands;
pub mod cp437;
pub mod cursor;
pub mod decoder;
pub mod event;
pub mod state;
pub mod table;

pub use cursor::ByteCursor;
pub use decoder::Decoder;
pub use event::{Command, Event, TextRun, Unsupported, UnsupportedReason};
pub use state::{Alignment, Font, ParamOutcome, ParamPolicy, PrinterState, Underline};
pub use table::{CommandKind, CommandSpec, CommandTable, LengthRule, Lookup};
