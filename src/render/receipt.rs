//! # Virtual Receipt
//!
//! Lays text out the way a receipt printer would (fixed columns, alignment,
//! hard wrapping) and writes each finished receipt as a framed block:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  CORNER COFFEE                   │
//! │ Latte                                       4.50 │
//! │ ------------------------------------------------ │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! A receipt ends at every cut and at end of stream. Character size is
//! recorded by the decoder but not rendered; every glyph is one column.

use std::io::Write;

use tracing::info;

use super::{Charset, Renderer};
use crate::error::ReciboError;
use crate::printer::Paper;
use crate::protocol::{Alignment, Event, Font, PrinterState, Underline, Unsupported};

/// Tab stops every this many columns.
const TAB_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Cell {
    ch: char,
    style: PrinterState,
}

impl Cell {
    fn plain(ch: char) -> Self {
        Self {
            ch,
            style: PrinterState::default(),
        }
    }
}

/// A laid-out line: its cells, the width it was laid out at, and alignment.
#[derive(Debug, Clone)]
struct Line {
    cells: Vec<Cell>,
    width: usize,
    alignment: Alignment,
}

/// Renderer writing framed text receipts to `W`.
///
/// ## Example
///
/// ```
/// use recibo::printer::Paper;
/// use recibo::protocol::Decoder;
/// use recibo::render::ReceiptRenderer;
///
/// let renderer = ReceiptRenderer::new(Vec::new(), Paper::Mm58).ansi(false);
/// let mut decoder = Decoder::new(renderer);
/// decoder.feed(b"\x1ba\x01HELLO\n")?;
/// let out = String::from_utf8(decoder.close()?.into_inner()).unwrap();
///
/// assert!(out.contains("│              HELLO               │"));
/// # Ok::<(), recibo::ReciboError>(())
/// ```
pub struct ReceiptRenderer<W> {
    out: W,
    paper: Paper,
    charset: Charset,
    ansi: bool,
    markers: bool,
    /// Lines of the receipt in progress.
    lines: Vec<Line>,
    /// The line being filled.
    line: Vec<Cell>,
    font: Font,
    alignment: Alignment,
    receipts: usize,
}

impl<W: Write> ReceiptRenderer<W> {
    /// Create a renderer for `paper` with CP437 text, ANSI styles and
    /// unsupported-command markers enabled.
    pub fn new(out: W, paper: Paper) -> Self {
        Self {
            out,
            paper,
            charset: Charset::default(),
            ansi: true,
            markers: true,
            lines: Vec::new(),
            line: Vec::new(),
            font: Font::A,
            alignment: Alignment::Left,
            receipts: 0,
        }
    }

    /// Select how text bytes are decoded.
    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Enable or disable ANSI bold/underline/reverse escapes.
    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Enable or disable `[unsupported ...]` marker lines.
    pub fn markers(mut self, markers: bool) -> Self {
        self.markers = markers;
        self
    }

    /// Number of receipts written so far.
    pub fn receipts(&self) -> usize {
        self.receipts
    }

    /// Consume the renderer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line_width(&self) -> usize {
        self.paper.columns(self.font)
    }

    fn push_cell(&mut self, cell: Cell) {
        if self.line.len() >= self.line_width() {
            self.end_line();
        }
        self.line.push(cell);
    }

    fn end_line(&mut self) {
        let width = self.line_width();
        self.lines.push(Line {
            cells: std::mem::take(&mut self.line),
            width,
            alignment: self.alignment,
        });
    }

    fn blank_line(&mut self) {
        self.end_line();
    }

    fn tab(&mut self) {
        let width = self.line_width();
        let stop = (self.line.len() / TAB_WIDTH + 1) * TAB_WIDTH;
        if stop >= width {
            self.end_line();
            return;
        }
        self.line.resize(stop, Cell::plain(' '));
    }

    fn text(&mut self, bytes: &[u8], style: PrinterState) {
        self.font = style.font;
        self.alignment = style.alignment;
        for ch in self.charset.decode(bytes).chars() {
            self.push_cell(Cell { ch, style });
        }
    }

    /// A full-width line of its own, outside the text flow.
    fn standalone(&mut self, text: &str, alignment: Alignment) {
        if !self.line.is_empty() {
            self.end_line();
        }
        let width = self.paper.columns(Font::A);
        let cells: Vec<Cell> = text.chars().map(Cell::plain).collect();
        for chunk in cells.chunks(width) {
            self.lines.push(Line {
                cells: chunk.to_vec(),
                width,
                alignment,
            });
        }
    }

    fn marker(&mut self, unsupported: &Unsupported) {
        if !self.markers {
            return;
        }
        let text = format!(
            "[unsupported {}: {}]",
            unsupported.signature_hex(),
            unsupported.reason
        );
        self.standalone(&text, Alignment::Left);
    }

    fn cut(&mut self, partial: bool) -> Result<(), ReciboError> {
        let width = self.paper.columns(Font::A);
        let rule: String = if partial {
            "- ".repeat(width).chars().take(width).collect()
        } else {
            "-".repeat(width)
        };
        self.standalone(&rule, Alignment::Left);
        self.write_receipt()
    }

    fn sgr(&self, style: &PrinterState) -> &'static str {
        if !self.ansi {
            return "";
        }
        match (
            style.is_emphasized(),
            style.underline != Underline::Off,
            style.reverse,
        ) {
            (false, false, false) => "",
            (true, false, false) => "\x1b[1m",
            (false, true, false) => "\x1b[4m",
            (false, false, true) => "\x1b[7m",
            (true, true, false) => "\x1b[1;4m",
            (true, false, true) => "\x1b[1;7m",
            (false, true, true) => "\x1b[4;7m",
            (true, true, true) => "\x1b[1;4;7m",
        }
    }

    fn format_line(&self, line: &Line, frame: usize, out: &mut String) {
        let pad = line.width.saturating_sub(line.cells.len());
        let (left, right) = match line.alignment {
            Alignment::Left => (0, pad),
            Alignment::Center => (pad / 2, pad - pad / 2),
            Alignment::Right => (pad, 0),
        };
        let fill = frame.saturating_sub(line.width.max(line.cells.len()));

        out.push_str("│ ");
        out.push_str(&" ".repeat(left));
        let mut active = "";
        for cell in &line.cells {
            let sgr = self.sgr(&cell.style);
            if sgr != active {
                if !active.is_empty() {
                    out.push_str("\x1b[0m");
                }
                out.push_str(sgr);
                active = sgr;
            }
            out.push(cell.ch);
        }
        if !active.is_empty() {
            out.push_str("\x1b[0m");
        }
        out.push_str(&" ".repeat(right + fill));
        out.push_str(" │\n");
    }

    fn write_receipt(&mut self) -> Result<(), ReciboError> {
        if !self.line.is_empty() {
            self.end_line();
        }
        if self.lines.is_empty() {
            return Ok(());
        }

        let frame = self
            .lines
            .iter()
            .map(|line| line.width.max(line.cells.len()))
            .max()
            .unwrap_or(0)
            .max(self.paper.columns(Font::A));

        let border = "─".repeat(frame + 2);
        let mut text = format!("┌{}┐\n", border);
        for line in &self.lines {
            self.format_line(line, frame, &mut text);
        }
        text.push_str(&format!("└{}┘\n", border));

        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        self.lines.clear();
        self.receipts += 1;
        Ok(())
    }
}

impl<W: Write> Renderer for ReceiptRenderer<W> {
    fn render(&mut self, event: Event) -> Result<(), ReciboError> {
        match event {
            Event::Text(run) => self.text(&run.bytes, run.style),
            Event::LineFeed => self.end_line(),
            // Auto line feed is off, as on most receipt printers.
            Event::CarriageReturn => {}
            Event::Tab => self.tab(),
            Event::Feed { lines } => {
                if !self.line.is_empty() {
                    self.end_line();
                }
                for _ in 0..lines {
                    self.blank_line();
                }
            }
            Event::Cut { partial, .. } => return self.cut(partial),
            Event::Bell => info!("bell"),
            Event::StatusQuery(_) => {}
            Event::Unsupported(unsupported) => self.marker(&unsupported),
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReciboError> {
        self.write_receipt()?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Decoder, ParamPolicy};

    fn render(paper: Paper, bytes: &[u8]) -> String {
        let renderer = ReceiptRenderer::new(Vec::new(), paper).ansi(false);
        let mut decoder = Decoder::new(renderer);
        decoder.feed(bytes).unwrap();
        String::from_utf8(decoder.close().unwrap().into_inner()).unwrap()
    }

    fn body(out: &str) -> Vec<&str> {
        out.lines()
            .filter(|l| l.starts_with('│'))
            .map(|l| l.trim_start_matches("│ ").trim_end_matches(" │"))
            .collect()
    }

    #[test]
    fn test_frame_width_matches_paper() {
        let out = render(Paper::Mm58, b"hi\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].chars().count(), 32 + 4);
        assert_eq!(lines[1], format!("│ hi{} │", " ".repeat(30)));
    }

    #[test]
    fn test_alignment_padding() {
        let out = render(Paper::Mm58, b"\x1ba\x02right\n\x1ba\x01mid\n");
        let rows = body(&out);
        assert_eq!(rows[0], format!("{}right", " ".repeat(27)));
        assert_eq!(rows[1], format!("{}mid{}", " ".repeat(14), " ".repeat(15)));
    }

    #[test]
    fn test_hard_wrap() {
        let text = "x".repeat(40);
        let out = render(Paper::Mm58, text.as_bytes());
        let rows = body(&out);
        assert_eq!(rows[0], "x".repeat(32));
        assert_eq!(rows[1].trim_end(), "x".repeat(8));
    }

    #[test]
    fn test_cut_ends_receipt() {
        let out = render(Paper::Mm58, b"one\x1dV\x00two\n");
        assert_eq!(out.matches('┌').count(), 2);
        let rows = body(&out);
        assert_eq!(rows[1], "-".repeat(32));
        assert_eq!(rows[2].trim_end(), "two");
    }

    #[test]
    fn test_trailing_cut_writes_no_empty_receipt() {
        let out = render(Paper::Mm80, b"only\x0c");
        assert_eq!(out.matches('┌').count(), 1);
    }

    #[test]
    fn test_empty_stream_writes_nothing() {
        assert_eq!(render(Paper::Mm80, b""), "");
    }

    #[test]
    fn test_tabs_and_feed() {
        let out = render(Paper::Mm58, b"a\tb\x1bd\x02c");
        let rows = body(&out);
        assert_eq!(rows[0].trim_end(), "a       b");
        assert_eq!(rows[1].trim(), "");
        assert_eq!(rows[2].trim(), "");
        assert_eq!(rows[3].trim_end(), "c");
    }

    #[test]
    fn test_unsupported_marker() {
        let out = render(Paper::Mm80, b"\x1bJ\x10ok");
        let rows = body(&out);
        assert!(rows[0].starts_with("[unsupported 1B 4A: dot feed not emulated]"));
        assert_eq!(rows[1].trim_end(), "ok");
    }

    #[test]
    fn test_markers_disabled() {
        let renderer = ReceiptRenderer::new(Vec::new(), Paper::Mm80)
            .ansi(false)
            .markers(false);
        let mut decoder = Decoder::new(renderer).with_policy(ParamPolicy::Clamp);
        decoder.feed(b"\x1bp\x00\x19\xfaok").unwrap();
        let out = String::from_utf8(decoder.close().unwrap().into_inner()).unwrap();
        assert!(!out.contains("unsupported"));
    }

    #[test]
    fn test_font_b_is_wider() {
        let text = "y".repeat(50);
        let mut bytes = b"\x1bM\x01".to_vec();
        bytes.extend_from_slice(text.as_bytes());
        let out = render(Paper::Mm80, &bytes);
        assert_eq!(body(&out)[0], text.clone() + &" ".repeat(14));
    }

    #[test]
    fn test_ansi_bold() {
        let renderer = ReceiptRenderer::new(Vec::new(), Paper::Mm58);
        let mut decoder = Decoder::new(renderer);
        decoder.feed(b"\x1bE\x01B\x1bE\x00n\n").unwrap();
        let out = String::from_utf8(decoder.close().unwrap().into_inner()).unwrap();
        assert!(out.contains("\x1b[1mB\x1b[0mn"));
    }

    #[test]
    fn test_cp437_box_drawing() {
        let out = render(Paper::Mm58, &[0xC9, 0xCD, 0xBB, b'\n']);
        assert!(body(&out)[0].starts_with("╔═╗"));
    }
}
