//! # JSON Lines Output
//!
//! One JSON object per event, for piping the emulator into other tools:
//!
//! ```text
//! {"event":"text","text":"TOTAL","style":{"bold":true,...}}
//! {"event":"line_feed"}
//! {"event":"cut","partial":false,"feed":0}
//! ```
//!
//! When several connections share one output, [`JsonRenderer::peer`] tags
//! every record with its connection so the streams can be told apart:
//!
//! ```text
//! {"peer":"10.0.0.7:51544","event":"line_feed"}
//! ```

use std::io::Write;

use serde::Serialize;

use super::{Charset, Renderer};
use crate::error::ReciboError;
use crate::protocol::{Event, PrinterState, UnsupportedReason};

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    Text {
        text: String,
        style: &'a PrinterState,
    },
    LineFeed,
    CarriageReturn,
    Tab,
    Feed {
        lines: u8,
    },
    Cut {
        partial: bool,
        feed: u8,
    },
    Bell,
    StatusQuery {
        n: u8,
    },
    Unsupported {
        signature: String,
        payload_len: u64,
        offset: u64,
        reason: &'a UnsupportedReason,
    },
}

/// A record plus the connection it came from.
#[derive(Debug, Serialize)]
struct Line<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    peer: Option<&'a str>,
    #[serde(flatten)]
    record: &'a Record<'a>,
}

/// Renderer writing each event as a JSON object on its own line.
///
/// Each line goes out in a single `write_all`, so lines from renderers
/// sharing a locked writer such as stdout never tear.
pub struct JsonRenderer<W> {
    out: W,
    charset: Charset,
    peer: Option<String>,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            charset: Charset::default(),
            peer: None,
        }
    }

    /// Select how text bytes are decoded.
    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Tag every record with a `"peer"` field.
    pub fn peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, record: &Record<'_>) -> Result<(), ReciboError> {
        let mut line = serde_json::to_vec(&Line {
            peer: self.peer.as_deref(),
            record,
        })?;
        line.push(b'\n');
        self.out.write_all(&line)?;
        Ok(())
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, event: Event) -> Result<(), ReciboError> {
        match &event {
            Event::Text(run) => {
                let text = self.charset.decode(&run.bytes);
                self.write(&Record::Text {
                    text,
                    style: &run.style,
                })
            }
            Event::LineFeed => self.write(&Record::LineFeed),
            Event::CarriageReturn => self.write(&Record::CarriageReturn),
            Event::Tab => self.write(&Record::Tab),
            Event::Feed { lines } => self.write(&Record::Feed { lines: *lines }),
            Event::Cut { partial, feed } => self.write(&Record::Cut {
                partial: *partial,
                feed: *feed,
            }),
            Event::Bell => self.write(&Record::Bell),
            Event::StatusQuery(n) => self.write(&Record::StatusQuery { n: *n }),
            Event::Unsupported(unsupported) => self.write(&Record::Unsupported {
                signature: unsupported.signature_hex(),
                payload_len: unsupported.payload_len,
                offset: unsupported.offset,
                reason: &unsupported.reason,
            }),
        }
    }

    fn finish(&mut self) -> Result<(), ReciboError> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Decoder;
    use serde_json::{Value, json};
    use std::io;
    use std::sync::{Arc, Mutex};

    /// A writer shared by several renderers, like stdout.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn records(bytes: &[u8]) -> Vec<Value> {
        let mut decoder = Decoder::new(JsonRenderer::new(Vec::new()));
        decoder.feed(bytes).unwrap();
        let out = decoder.close().unwrap().into_inner();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_one_object_per_event() {
        let values = records(b"A\nB\x0c");
        assert_eq!(values.len(), 4);
        assert_eq!(values[0]["event"], "text");
        assert_eq!(values[0]["text"], "A");
        assert_eq!(values[1], json!({"event": "line_feed"}));
        assert_eq!(values[3], json!({"event": "cut", "partial": false, "feed": 0}));
    }

    #[test]
    fn test_style_is_serialized() {
        let values = records(b"\x1bE\x01\x1ba\x01hi");
        let style = &values[0]["style"];
        assert_eq!(style["bold"], true);
        assert_eq!(style["alignment"], "center");
        assert_eq!(style["underline"], "off");
        assert_eq!(style["font"], "A");
    }

    #[test]
    fn test_unsupported_record() {
        let values = records(b"\x1b$\x10\x00");
        assert_eq!(values[0]["event"], "unsupported");
        assert_eq!(values[0]["signature"], "1B 24");
        assert_eq!(values[0]["payload_len"], 2);
        assert_eq!(values[0]["offset"], 0);
        assert_eq!(
            values[0]["reason"],
            json!({"kind": "not_emulated", "detail": "absolute position"})
        );
    }

    #[test]
    fn test_status_query_record() {
        let values = records(&[0x10, 0x04, 0x01]);
        assert_eq!(values[0], json!({"event": "status_query", "n": 1}));
    }

    #[test]
    fn test_untagged_by_default() {
        let values = records(b"x");
        assert!(values[0].get("peer").is_none());
    }

    #[test]
    fn test_interleaved_jobs_are_tagged() {
        let out = Shared::default();
        let mut a = Decoder::new(JsonRenderer::new(out.clone()).peer("10.0.0.1:4000"));
        let mut b = Decoder::new(JsonRenderer::new(out.clone()).peer("10.0.0.2:4000"));
        for (x, y) in b"a\n".iter().zip(b"b\n") {
            a.feed(&[*x]).unwrap();
            b.feed(&[*y]).unwrap();
        }
        a.close().unwrap();
        b.close().unwrap();

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        let values: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(values.len(), 4);

        for (peer, letter) in [("10.0.0.1:4000", "a"), ("10.0.0.2:4000", "b")] {
            let job: Vec<&Value> = values.iter().filter(|v| v["peer"] == peer).collect();
            assert_eq!(job.len(), 2);
            assert_eq!(job[0]["event"], "text");
            assert_eq!(job[0]["text"], letter);
            assert_eq!(*job[1], json!({"peer": peer, "event": "line_feed"}));
        }
    }
}
