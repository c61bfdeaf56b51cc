//! # Recibo - ESC/POS Receipt Printer Emulator
//!
//! Recibo pretends to be a thermal receipt printer on the raw TCP printing
//! port (9100), so point-of-sale software can be tested without hardware.
//! It provides:
//!
//! - **Protocol decoding**: a streaming ESC/POS decoder that turns bytes into
//!   text runs, line feeds, cuts and visible markers for unsupported commands
//! - **Rendering**: framed text receipts or JSON Lines
//! - **Server**: one task, decoder and printer state per connection
//!
//! ## Quick Start
//!
//! ```
//! use recibo::{
//!     printer::Paper,
//!     protocol::{commands, Decoder},
//!     render::ReceiptRenderer,
//! };
//!
//! let mut job = Vec::new();
//! job.extend(commands::init());
//! job.extend(commands::align(1));
//! job.extend(b"CORNER COFFEE\n");
//! job.extend(commands::align(0));
//! job.extend(b"Latte        4.50\n");
//! job.extend(commands::cut(false));
//!
//! let renderer = ReceiptRenderer::new(Vec::new(), Paper::Mm80).ansi(false);
//! let mut decoder = Decoder::new(renderer);
//! decoder.feed(&job)?;
//! let receipt = decoder.close()?;
//!
//! assert_eq!(receipt.receipts(), 1);
//! # Ok::<(), recibo::ReciboError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Byte cursor, command table, printer state, decoder |
//! | [`render`] | Receipt and JSON renderers |
//! | [`server`] | TCP listener and connection handling |
//! | [`printer`] | Paper profiles |
//! | [`error`] | Error types |

pub mod error;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod server;

// Re-exports for convenience
pub use error::ReciboError;
pub use printer::Paper;
pub use protocol::{Decoder, Event};
pub use render::Renderer;
