//! End-to-end decoding tests over the public API.

use pretty_assertions::assert_eq;

use recibo::protocol::{
    Alignment, Decoder, Event, ParamPolicy, PrinterState, Underline, Unsupported,
    UnsupportedReason, commands,
};

const ESC: u8 = commands::ESC;
const GS: u8 = commands::GS;

fn decode(bytes: &[u8]) -> Vec<Event> {
    let mut decoder = Decoder::new(Vec::new());
    decoder.feed(bytes).unwrap();
    decoder.close().unwrap()
}

fn decode_in_chunks(bytes: &[u8], size: usize) -> Vec<Event> {
    let mut decoder = Decoder::new(Vec::new());
    for chunk in bytes.chunks(size) {
        decoder.feed(chunk).unwrap();
    }
    decoder.close().unwrap()
}

fn plain(text: &str) -> Event {
    Event::text(text, PrinterState::default())
}

/// A job touching most of the table: styles, cuts, skipped payloads,
/// unknown commands and malformed lookahead.
fn kitchen_sink() -> Vec<u8> {
    let mut job = Vec::new();
    job.extend(commands::init());
    job.extend(commands::align(1));
    job.extend(commands::bold(true));
    job.extend(b"CORNER COFFEE\n");
    job.extend(commands::bold(false));
    job.extend(commands::align(0));
    job.extend(commands::underline(2));
    job.extend(b"Latte\t4.50\r\n");
    job.extend(commands::underline(0));
    job.extend([ESC, b'!', 0x38]);
    job.extend(b"TOTAL");
    job.extend([ESC, b'!', 0x00, GS, b'!', 0x11]);
    job.extend([GS, b'(', b'k', 3, 0, 49, 67, 8]);
    job.extend([GS, b'v', b'0', 0, 1, 0, 2, 0, ESC, GS]);
    job.extend([GS, b'k', 4]);
    job.extend(b"*42*\0");
    job.extend([ESC, 0xFE, b'x']);
    job.extend([0x1C, b'z']);
    job.extend(commands::feed_lines(3));
    job.extend(commands::status_request(1));
    job.extend([GS, b'V', 66, 10]);
    job.extend(b"tail");
    job
}

#[test]
fn test_text_without_control_bytes_is_one_run() {
    let text: Vec<u8> = (0x20..0x7F).chain(0x80..=0xFF).collect();
    assert_eq!(decode(&text), vec![Event::text(text.clone(), PrinterState::default())]);
}

#[test]
fn test_long_text_stays_one_run() {
    let text = vec![b'x'; 10_000];
    let expected = vec![Event::text(text.clone(), PrinterState::default())];
    assert_eq!(decode(&text), expected);
    assert_eq!(decode_in_chunks(&text, 4096), expected);
}

#[test]
fn test_line_and_cut_round_trip() {
    assert_eq!(
        decode(b"A\nB\x0c"),
        vec![plain("A"), Event::LineFeed, plain("B"), Event::cut()]
    );
}

#[test]
fn test_initialize_is_idempotent() {
    let mut decoder = Decoder::new(Vec::new());
    decoder.feed(&[ESC, b'E', 1, ESC, b'a', 2, GS, b'!', 0x33]).unwrap();
    for _ in 0..3 {
        decoder.feed(&commands::init()).unwrap();
        assert_eq!(*decoder.state(), PrinterState::default());
    }
}

#[test]
fn test_bold_toggles_only_middle_run() {
    let mut job = b"before".to_vec();
    job.extend(commands::bold(true));
    job.extend(b"middle");
    job.extend(commands::bold(false));
    job.extend(b"after");

    let bold = PrinterState {
        bold: true,
        ..PrinterState::default()
    };
    assert_eq!(
        decode(&job),
        vec![plain("before"), Event::text("middle", bold), plain("after")]
    );
}

#[test]
fn test_chunk_boundaries_do_not_matter() {
    let job = kitchen_sink();
    let whole = decode(&job);
    for size in [1, 2, 3, 5, 7, 64] {
        assert_eq!(decode_in_chunks(&job, size), whole, "chunk size {}", size);
    }
}

#[test]
fn test_kitchen_sink_events() {
    let events = decode(&kitchen_sink());

    let title = PrinterState {
        bold: true,
        alignment: Alignment::Center,
        ..PrinterState::default()
    };
    let underlined = PrinterState {
        underline: Underline::Double,
        ..PrinterState::default()
    };
    let total = PrinterState {
        bold: true,
        width_mult: 2,
        height_mult: 2,
        ..PrinterState::default()
    };
    let after_size = PrinterState {
        width_mult: 2,
        height_mult: 2,
        ..PrinterState::default()
    };

    let unsupported = |signature: &[u8], payload_len: u64, offset: u64, reason| {
        Event::Unsupported(Unsupported {
            signature: signature.to_vec(),
            payload_len,
            offset,
            reason,
        })
    };

    assert_eq!(
        events,
        vec![
            Event::text("CORNER COFFEE", title),
            Event::LineFeed,
            Event::text("Latte", underlined),
            Event::Tab,
            Event::text("4.50", underlined),
            Event::CarriageReturn,
            Event::LineFeed,
            Event::text("TOTAL", total),
            unsupported(
                &[GS, b'(', b'k'],
                5,
                60,
                UnsupportedReason::NotEmulated("extended graphics or 2D code")
            ),
            unsupported(
                &[GS, b'v', b'0'],
                7,
                68,
                UnsupportedReason::NotEmulated("raster bit image")
            ),
            unsupported(&[GS, b'k', 4], 5, 78, UnsupportedReason::NotEmulated("barcode")),
            unsupported(&[ESC, 0xFE], 0, 86, UnsupportedReason::UnknownCommand),
            Event::text("x\x1cz", after_size),
            Event::Feed { lines: 3 },
            Event::StatusQuery(1),
            Event::Cut {
                partial: true,
                feed: 10
            },
            Event::text("tail", after_size),
        ]
    );
}

#[test]
fn test_unknown_suffix_keeps_following_text_intact() {
    let mut job = commands::bold(true);
    job.extend([ESC, 0x7F]);
    job.extend(b"still bold");

    let events = decode(&job);
    let bold = PrinterState {
        bold: true,
        ..PrinterState::default()
    };
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        Event::Unsupported(u) if u.reason == UnsupportedReason::UnknownCommand
    ));
    assert_eq!(events[1], Event::text("still bold", bold));
}

#[test]
fn test_unknown_gs_suffix_resyncs() {
    let events = decode(&[GS, b'Z', b'o', b'k', b'\n']);
    assert_eq!(events.len(), 3);
    assert_eq!(events[1], plain("ok"));
    assert_eq!(events[2], Event::LineFeed);
}

#[test]
fn test_alignment_clamps() {
    let mut decoder = Decoder::new(Vec::new());
    decoder.feed(&[ESC, b'a', 9, b'r', b'\n']).unwrap();
    assert_eq!(decoder.state().alignment, Alignment::Right);
    let events = decoder.close().unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Text(run) if run.style.alignment == Alignment::Right));
}

#[test]
fn test_strict_policy_rejects() {
    let mut decoder = Decoder::new(Vec::new()).with_policy(ParamPolicy::Reject);
    decoder.feed(&[ESC, b'a', 9, b'r']).unwrap();
    assert_eq!(decoder.state().alignment, Alignment::Left);
    let events = decoder.close().unwrap();
    assert_eq!(
        events,
        vec![
            Event::Unsupported(Unsupported {
                signature: vec![ESC, b'a'],
                payload_len: 1,
                offset: 0,
                reason: UnsupportedReason::OutOfRange { requested: 9 },
            }),
            plain("r"),
        ]
    );
}

#[test]
fn test_teardown_mid_command() {
    let events = decode(&[b'p', b'a', b'r', b't', ESC, b'$', 0x10]);
    assert_eq!(
        events,
        vec![
            plain("part"),
            Event::Unsupported(Unsupported {
                signature: vec![ESC, b'$'],
                payload_len: 1,
                offset: 4,
                reason: UnsupportedReason::Truncated,
            }),
        ]
    );
}

#[test]
fn test_truncated_in_every_chunking() {
    let job = [b'p', ESC, b'$', 0x10];
    for size in 1..=job.len() {
        let events = decode_in_chunks(&job, size);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            Event::Unsupported(u) if u.reason == UnsupportedReason::Truncated
        ));
    }
}

#[test]
fn test_bit_image_payload_is_skipped() {
    // ESC * 33: 24-dot double density, 3 bytes per column
    let mut job = vec![ESC, b'*', 33, 2, 0];
    job.extend([0x0A; 6]);
    job.extend(b"ok");
    let events = decode(&job);
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Unsupported(u) if u.payload_len == 9));
    assert_eq!(events[1], plain("ok"));
}

#[test]
fn test_bit_image_bad_mode_is_underspecified() {
    let events = decode(&[ESC, b'*', 5, b'h', b'i']);
    assert_eq!(
        events[0],
        Event::Unsupported(Unsupported {
            signature: vec![ESC, b'*'],
            payload_len: 0,
            offset: 0,
            reason: UnsupportedReason::Underspecified,
        })
    );
    assert_eq!(events[1], plain("\x05hi"));
}

#[test]
fn test_ascii_digit_selectors() {
    let mut decoder = Decoder::new(Vec::new());
    decoder.feed(&[ESC, b'a', b'2', ESC, b'-', b'1']).unwrap();
    assert_eq!(decoder.state().alignment, Alignment::Right);
    assert_eq!(decoder.state().underline, Underline::Single);
}
