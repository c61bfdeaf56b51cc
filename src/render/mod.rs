//! # Rendering Module
//!
//! Turns decoder [`Event`]s into something a person can look at.
//!
//! ## Modules
//!
//! - [`receipt`]: Boxed virtual receipt, one per cut
//! - [`json`]: One JSON object per event (JSON Lines)
//!
//! ## Usage Example
//!
//! ```
//! use recibo::protocol::{Decoder, Event};
//! use recibo::render::renderer_fn;
//!
//! let mut lines = 0;
//! let mut decoder = Decoder::new(renderer_fn(|event| {
//!     if event == Event::LineFeed {
//!         lines += 1;
//!     }
//! }));
//! decoder.feed(b"one\ntwo\n")?;
//! decoder.close()?;
//! assert_eq!(lines, 2);
//! # Ok::<(), recibo::ReciboError>(())
//! ```

pub mod json;
pub mod receipt;

pub use json::JsonRenderer;
pub use receipt::ReceiptRenderer;

use serde::{Deserialize, Serialize};

use crate::error::ReciboError;
use crate::protocol::{Event, cp437};

/// Receives the decoder's events, in stream order.
pub trait Renderer {
    /// Handle one event.
    fn render(&mut self, event: Event) -> Result<(), ReciboError>;

    /// The stream has ended; write out anything still buffered.
    fn finish(&mut self) -> Result<(), ReciboError> {
        Ok(())
    }
}

/// Collects events; the renderer used by tests and offline tooling.
impl Renderer for Vec<Event> {
    #[inline]
    fn render(&mut self, event: Event) -> Result<(), ReciboError> {
        self.push(event);
        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    #[inline]
    fn render(&mut self, event: Event) -> Result<(), ReciboError> {
        (**self).render(event)
    }

    #[inline]
    fn finish(&mut self) -> Result<(), ReciboError> {
        (**self).finish()
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    #[inline]
    fn render(&mut self, event: Event) -> Result<(), ReciboError> {
        (**self).render(event)
    }

    #[inline]
    fn finish(&mut self) -> Result<(), ReciboError> {
        (**self).finish()
    }
}

/// Returns a [`Renderer`] that calls the given function for each event.
pub fn renderer_fn<F: FnMut(Event)>(f: F) -> RendererFn<F> {
    RendererFn { f }
}

/// See [`renderer_fn`].
pub struct RendererFn<F> {
    f: F,
}

impl<F: FnMut(Event)> Renderer for RendererFn<F> {
    #[inline(always)]
    fn render(&mut self, event: Event) -> Result<(), ReciboError> {
        (self.f)(event);
        Ok(())
    }
}

/// How text run bytes are turned into characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    /// Code page 437, the ESC/POS power-on table.
    #[default]
    Cp437,
    /// UTF-8, for hosts that send Unicode regardless of `ESC t`.
    Utf8,
}

impl Charset {
    /// Decode text run bytes, dropping leftover C0 control bytes and DEL.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let printable = |c: &char| !(*c < ' ' || *c == '\u{7f}');
        match self {
            Self::Cp437 => bytes
                .iter()
                .map(|&b| cp437::decode(b))
                .filter(printable)
                .collect(),
            Self::Utf8 => String::from_utf8_lossy(bytes)
                .chars()
                .filter(printable)
                .collect(),
        }
    }
}
