//! # Byte Cursor
//!
//! A resumable reader over a byte stream that arrives in arbitrary chunks.
//!
//! The cursor never blocks. When the decoder asks for more bytes than have
//! arrived, [`ByteCursor::need`] says so and the decoder suspends until the
//! connection layer calls [`ByteCursor::feed`] again.

/// Compact the buffer once this many consumed bytes sit at its front.
const COMPACT_THRESHOLD: usize = 4096;

/// Buffered view of the unconsumed tail of a byte stream.
///
/// ## Example
///
/// ```
/// use recibo::protocol::ByteCursor;
///
/// let mut cursor = ByteCursor::new();
/// cursor.feed(b"\x1bE");
/// assert!(!cursor.need(3));
///
/// cursor.feed(&[1]);
/// assert!(cursor.need(3));
/// assert_eq!(cursor.peek(3), &[0x1B, b'E', 1]);
///
/// cursor.consume(3);
/// assert_eq!(cursor.offset(), 3);
/// ```
#[derive(Debug, Default)]
pub struct ByteCursor {
    buf: Vec<u8>,
    head: usize,
    offset: u64,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly arrived bytes.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.head >= COMPACT_THRESHOLD && self.head * 2 >= self.buf.len() {
            self.buf.drain(..self.head);
            self.head = 0;
        }
        self.buf.extend_from_slice(chunk);
    }

    /// Number of unconsumed bytes.
    #[inline]
    pub fn available(&self) -> usize {
        self.buf.len() - self.head
    }

    /// True if at least `n` unconsumed bytes are buffered.
    #[inline]
    pub fn need(&self, n: usize) -> bool {
        self.available() >= n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// The next `n` bytes, without consuming them.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are available; check [`need`](Self::need) first.
    pub fn peek(&self, n: usize) -> &[u8] {
        assert!(
            self.need(n),
            "peek({}) with only {} bytes buffered",
            n,
            self.available()
        );
        &self.buf[self.head..self.head + n]
    }

    /// Everything currently buffered.
    #[inline]
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.head..]
    }

    /// The byte `i` positions ahead, if it has arrived.
    #[inline]
    pub fn peek_at(&self, i: usize) -> Option<u8> {
        self.buf.get(self.head + i).copied()
    }

    /// Advance past `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are available.
    pub fn consume(&mut self, n: usize) {
        assert!(
            self.need(n),
            "consume({}) with only {} bytes buffered",
            n,
            self.available()
        );
        self.head += n;
        self.offset += n as u64;
        if self.head == self.buf.len() {
            self.buf.clear();
            self.head = 0;
        }
    }

    /// Consume up to `n` bytes, returning how many were consumed.
    pub fn skip(&mut self, n: u64) -> u64 {
        let step = n.min(self.available() as u64);
        self.consume(step as usize);
        step
    }

    /// Stream offset of the next unconsumed byte.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }
}
