//! # ESC/POS Decoder
//!
//! The byte-stream state machine at the heart of the emulator.
//!
//! ```text
//!              control byte                     command resolved
//!   ┌──────┐ ───────────────► ┌──────────────┐ ─────────────────► ┌──────┐
//!   │ TEXT │                  │   DISPATCH   │                    │ TEXT │
//!   └──────┘ ◄─────────────── └──────────────┘ ──┐                └──────┘
//!              no match:                         │ bulk payload      ▲
//!              byte is text                      ▼                   │
//!                                            ┌──────┐  fully skipped │
//!                                            │ SKIP │ ───────────────┘
//!                                            └──────┘
//! ```
//!
//! Bytes arrive through [`Decoder::feed`] in chunks of any size. When a command
//! is not yet complete the decoder leaves its bytes in the [`ByteCursor`] and
//! waits for the next chunk, so chunk boundaries never change the output.
//!
//! ## Example
//!
//! ```
//! use recibo::protocol::{Decoder, Event, PrinterState};
//!
//! let mut decoder = Decoder::new(Vec::new());
//! decoder.feed(b"A\nB\x0c")?;
//! let events = decoder.close()?;
//!
//! let style = PrinterState::default();
//! assert_eq!(events, vec![
//!     Event::text("A", style),
//!     Event::LineFeed,
//!     Event::text("B", style),
//!     Event::cut(),
//! ]);
//! # Ok::<(), recibo::ReciboError>(())
//! ```

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::cursor::ByteCursor;
use super::event::{Command, Event, TextRun, Unsupported, UnsupportedReason};
use super::state::{ParamOutcome, ParamPolicy, PrinterState};
use super::table::{CommandKind, CommandSpec, CommandTable, LengthRule, Lookup, Measure};
use crate::error::ReciboError;
use crate::render::Renderer;

#[derive(Debug)]
enum Mode {
    /// Accumulating literal text.
    Text,
    /// A control byte is at the head of the cursor.
    Dispatch,
    /// Discarding the bulk payload of an unsupported command.
    Skip {
        unsupported: Unsupported,
        remaining: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Suspend,
}

/// Streaming ESC/POS decoder delivering [`Event`]s to a [`Renderer`].
///
/// One decoder serves one connection; it owns the [`PrinterState`] for that
/// connection and nothing else shares it.
pub struct Decoder<R> {
    renderer: R,
    table: Arc<CommandTable>,
    policy: ParamPolicy,
    max_run: Option<usize>,
    cursor: ByteCursor,
    state: PrinterState,
    mode: Mode,
    text: Vec<u8>,
}

impl<R: Renderer> Decoder<R> {
    /// Decoder using the factory ESC/POS table.
    pub fn new(renderer: R) -> Self {
        Self::with_table(renderer, CommandTable::shared())
    }

    /// Decoder using a custom command table.
    pub fn with_table(renderer: R, table: Arc<CommandTable>) -> Self {
        Self {
            renderer,
            table,
            policy: ParamPolicy::default(),
            max_run: None,
            cursor: ByteCursor::new(),
            state: PrinterState::new(),
            mode: Mode::Text,
            text: Vec::new(),
        }
    }

    /// Set the out-of-range parameter policy.
    pub fn with_policy(mut self, policy: ParamPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Flush pending text as a run whenever it reaches `limit` bytes.
    ///
    /// Off by default: without control bytes, text accumulates into a single
    /// run until the next command or [`Decoder::close`].
    pub fn with_max_run(mut self, limit: usize) -> Self {
        self.max_run = Some(limit.max(1));
        self
    }

    #[inline]
    pub fn state(&self) -> &PrinterState {
        &self.state
    }

    #[inline]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[inline]
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Total bytes decoded so far.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    /// Decode a chunk of bytes.
    ///
    /// Only a renderer failure is returned as an error; malformed input is
    /// reported through [`Event::Unsupported`].
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), ReciboError> {
        self.cursor.feed(bytes);
        self.drain(false)
    }

    /// End of stream: flush pending text, report any truncated command,
    /// finish the renderer and hand it back.
    pub fn close(mut self) -> Result<R, ReciboError> {
        self.drain(true)?;
        self.flush_text()?;
        self.renderer.finish()?;
        Ok(self.renderer)
    }

    fn drain(&mut self, eof: bool) -> Result<(), ReciboError> {
        loop {
            let step = match self.mode {
                Mode::Text => self.step_text()?,
                Mode::Dispatch => self.step_dispatch(eof)?,
                Mode::Skip { .. } => self.step_skip(eof)?,
            };
            if step == Step::Suspend {
                return Ok(());
            }
        }
    }

    fn emit(&mut self, event: Event) -> Result<(), ReciboError> {
        self.renderer.render(event)
    }

    fn flush_text(&mut self) -> Result<(), ReciboError> {
        if self.text.is_empty() {
            return Ok(());
        }
        let bytes = std::mem::take(&mut self.text);
        self.emit(Event::Text(TextRun {
            bytes,
            style: self.state.snapshot(),
        }))
    }

    fn unsupported(&mut self, unsupported: Unsupported) -> Result<(), ReciboError> {
        debug!(
            offset = unsupported.offset,
            signature = %unsupported.signature_hex(),
            reason = %unsupported.reason,
            "unsupported command"
        );
        self.emit(Event::Unsupported(unsupported))
    }

    fn step_text(&mut self) -> Result<Step, ReciboError> {
        while let Some(byte) = self.cursor.peek_at(0) {
            if self.table.is_prefix(byte) {
                self.mode = Mode::Dispatch;
                return Ok(Step::Continue);
            }
            self.text.push(byte);
            self.cursor.consume(1);
            if self.max_run.is_some_and(|limit| self.text.len() >= limit) {
                self.flush_text()?;
            }
        }
        Ok(Step::Suspend)
    }

    fn step_skip(&mut self, eof: bool) -> Result<Step, ReciboError> {
        if let Mode::Skip { remaining, .. } = &mut self.mode {
            *remaining -= self.cursor.skip(*remaining);
            if *remaining > 0 && !eof {
                return Ok(Step::Suspend);
            }
        }
        if let Mode::Skip {
            mut unsupported,
            remaining,
        } = std::mem::replace(&mut self.mode, Mode::Text)
        {
            if remaining > 0 {
                unsupported.reason = UnsupportedReason::Truncated;
                unsupported.payload_len -= remaining;
            }
            self.unsupported(unsupported)?;
        }
        Ok(Step::Continue)
    }

    fn step_dispatch(&mut self, eof: bool) -> Result<Step, ReciboError> {
        let table = Arc::clone(&self.table);
        let window = self.cursor.available().min(table.max_signature_len());
        let spec = match table.lookup(self.cursor.peek(window)) {
            Lookup::Matched(spec) => spec,
            Lookup::NeedMore if !eof => return Ok(Step::Suspend),
            Lookup::NeedMore => {
                self.truncated(None)?;
                return Ok(Step::Continue);
            }
            Lookup::NoMatch => {
                // Malformed lookahead: the control byte is literal text.
                let byte = self.cursor.peek(1)[0];
                trace!(offset = self.cursor.offset(), byte, "no command matches, treating as text");
                self.text.push(byte);
                self.cursor.consume(1);
                self.mode = Mode::Text;
                return Ok(Step::Continue);
            }
        };

        let sig_len = spec.signature.len();
        let params = &self.cursor.remaining()[sig_len..];
        match spec.rule.measure(params, eof) {
            Measure::Incomplete if !eof => Ok(Step::Suspend),
            Measure::Incomplete => {
                self.truncated(Some(spec))?;
                Ok(Step::Continue)
            }
            Measure::Undetermined => self.underspecified(spec, eof),
            Measure::Complete { header, body } => self.complete(spec, header, body, eof),
        }
    }

    /// The stream ended inside a command: everything left belongs to it.
    fn truncated(&mut self, spec: Option<&CommandSpec>) -> Result<(), ReciboError> {
        self.flush_text()?;
        let rest = self.cursor.remaining();
        let len = rest.len();
        let sig_len = spec.map_or(len, |s| s.signature.len().min(len));
        let unsupported = Unsupported {
            signature: rest[..sig_len].to_vec(),
            payload_len: (len - sig_len) as u64,
            offset: self.cursor.offset(),
            reason: UnsupportedReason::Truncated,
        };
        self.cursor.consume(len);
        self.mode = Mode::Text;
        self.unsupported(unsupported)
    }

    /// Length unknown: drop the signature (and an unknown suffix byte) and
    /// resume in TEXT, so any parameters surface as text.
    fn underspecified(&mut self, spec: &CommandSpec, eof: bool) -> Result<Step, ReciboError> {
        let sig_len = spec.signature.len();
        let (consumed, reason) = match spec.rule {
            LengthRule::Unknown => match self.cursor.peek_at(sig_len) {
                None if !eof => return Ok(Step::Suspend),
                None => {
                    self.truncated(Some(spec))?;
                    return Ok(Step::Continue);
                }
                Some(next) if self.table.is_prefix(next) => {
                    (sig_len, UnsupportedReason::UnknownCommand)
                }
                Some(_) => (sig_len + 1, UnsupportedReason::UnknownCommand),
            },
            _ => (sig_len, UnsupportedReason::Underspecified),
        };

        self.flush_text()?;
        let unsupported = Unsupported {
            signature: self.cursor.peek(consumed).to_vec(),
            payload_len: 0,
            offset: self.cursor.offset(),
            reason,
        };
        self.cursor.consume(consumed);
        self.mode = Mode::Text;
        self.unsupported(unsupported)?;
        Ok(Step::Continue)
    }

    fn complete(
        &mut self,
        spec: &CommandSpec,
        header: usize,
        body: u64,
        eof: bool,
    ) -> Result<Step, ReciboError> {
        let sig_len = spec.signature.len();
        let head_len = sig_len + header;

        // Bulk data of an unsupported command is skipped as it arrives.
        if let CommandKind::NotEmulated(what) = spec.kind
            && body > 0
        {
            self.flush_text()?;
            let unsupported = Unsupported {
                signature: self.cursor.peek(sig_len).to_vec(),
                payload_len: header as u64 + body,
                offset: self.cursor.offset(),
                reason: UnsupportedReason::NotEmulated(what),
            };
            self.cursor.consume(head_len);
            self.mode = Mode::Skip {
                unsupported,
                remaining: body,
            };
            return Ok(Step::Continue);
        }

        let total = head_len + body as usize;
        if !self.cursor.need(total) {
            if eof {
                self.truncated(Some(spec))?;
                return Ok(Step::Continue);
            }
            return Ok(Step::Suspend);
        }

        self.flush_text()?;
        let bytes = self.cursor.peek(total);
        let command = Command {
            name: spec.name,
            kind: spec.kind,
            rule: spec.rule,
            signature: bytes[..sig_len].to_vec(),
            payload: bytes[sig_len..].to_vec(),
            offset: self.cursor.offset(),
        };
        self.cursor.consume(total);
        self.mode = Mode::Text;
        self.execute(command)?;
        Ok(Step::Continue)
    }

    /// Report a parameter outcome: clamps are logged, rejections are events.
    fn outcome(&mut self, command: &Command, outcome: ParamOutcome) -> Result<(), ReciboError> {
        match outcome {
            ParamOutcome::Exact => Ok(()),
            ParamOutcome::Clamped { requested, applied } => {
                warn!(
                    offset = command.offset,
                    command = command.name,
                    requested,
                    applied,
                    "parameter out of range, clamped"
                );
                Ok(())
            }
            ParamOutcome::Rejected { requested } => self.unsupported(Unsupported {
                signature: command.signature.clone(),
                payload_len: command.payload.len() as u64,
                offset: command.offset,
                reason: UnsupportedReason::OutOfRange { requested },
            }),
        }
    }

    fn execute(&mut self, command: Command) -> Result<(), ReciboError> {
        debug!(
            offset = command.offset,
            command = command.name,
            payload = ?command.payload,
            "command"
        );
        let n = command.argument();
        let policy = self.policy;

        match command.kind {
            CommandKind::LineFeed => self.emit(Event::LineFeed),
            CommandKind::CarriageReturn => self.emit(Event::CarriageReturn),
            CommandKind::FormFeed => self.emit(Event::cut()),
            CommandKind::Bell => self.emit(Event::Bell),
            CommandKind::Tab => self.emit(Event::Tab),
            CommandKind::Initialize => {
                self.state.initialize();
                Ok(())
            }
            CommandKind::Bold => {
                let outcome = self.state.set_bold(n, policy);
                self.outcome(&command, outcome)
            }
            CommandKind::Underline => {
                let outcome = self.state.set_underline(n, policy);
                self.outcome(&command, outcome)
            }
            CommandKind::Align => {
                let outcome = self.state.set_alignment(n, policy);
                self.outcome(&command, outcome)
            }
            CommandKind::Font => {
                let outcome = self.state.set_font(n, policy);
                self.outcome(&command, outcome)
            }
            CommandKind::CharacterSize => {
                let outcome = self.state.set_character_size(n, policy);
                self.outcome(&command, outcome)
            }
            CommandKind::DoubleStrike => {
                self.state.set_double_strike(n);
                Ok(())
            }
            CommandKind::PrintMode => {
                self.state.set_print_mode(n);
                Ok(())
            }
            CommandKind::CodePage => {
                self.state.set_code_page(n);
                Ok(())
            }
            CommandKind::LineSpacing => {
                self.state.set_line_spacing(Some(n));
                Ok(())
            }
            CommandKind::DefaultLineSpacing => {
                self.state.set_line_spacing(None);
                Ok(())
            }
            CommandKind::CharSpacing => {
                self.state.set_char_spacing(n);
                Ok(())
            }
            CommandKind::UpsideDown => {
                self.state.set_upside_down(n);
                Ok(())
            }
            CommandKind::Reverse => {
                self.state.set_reverse(n);
                Ok(())
            }
            CommandKind::PrintAndFeed => self.emit(Event::Feed { lines: n }),
            CommandKind::Cut { partial } => self.emit(Event::Cut {
                partial,
                feed: command.param(0),
            }),
            CommandKind::CutVariant => match (n, policy) {
                (0 | b'0', _) => self.emit(Event::cut()),
                (1 | b'1', _) => self.emit(Event::Cut {
                    partial: true,
                    feed: 0,
                }),
                (_, ParamPolicy::Clamp) => {
                    warn!(offset = command.offset, variant = n, "unknown cut variant, cutting in full");
                    self.emit(Event::cut())
                }
                (_, ParamPolicy::Reject) => {
                    self.outcome(&command, ParamOutcome::Rejected { requested: n })
                }
            },
            CommandKind::StatusQuery => self.emit(Event::StatusQuery(n)),
            CommandKind::Ignored => {
                debug!(offset = command.offset, command = command.name, "ignored");
                Ok(())
            }
            CommandKind::NotEmulated(what) => self.unsupported(Unsupported {
                signature: command.signature,
                payload_len: command.payload.len() as u64,
                offset: command.offset,
                reason: UnsupportedReason::NotEmulated(what),
            }),
            // Unknown entries are resolved in `underspecified`; only a custom
            // table pairing Unknown with a measurable rule gets here.
            CommandKind::Unknown => self.unsupported(Unsupported {
                signature: command.signature,
                payload_len: command.payload.len() as u64,
                offset: command.offset,
                reason: UnsupportedReason::UnknownCommand,
            }),
        }
    }
}
