//! Uniform byte access for both random-access buffers and forward-only streams.
//!
//! Every layer in the pipeline is written against the small [`Source`] capability set rather than
//! against a concrete buffer or reader, so the same layer code runs unchanged over a `&[u8]` slice
//! or an [`io::Read`]. A [`Window`] then bounds a `Source` to the `[pos, pos + len)` range the
//! caller asked to parse, the way `xparse`'s `pos`/`len` arguments do in the data model.

use core::slice;
use std::io;

/// The capability set the parsing pipeline needs from a byte source.
///
/// Implementations must never be asked to [`peek`](Source::peek) once [`eof`](Source::eof) is
/// true; every loop in the pipeline checks `eof` first.
pub trait Source {
    /// Whether the source has been fully consumed.
    fn eof(&self) -> bool;

    /// Returns the next unconsumed byte without consuming it.
    ///
    /// # Panics
    /// Implementations may panic (in debug builds) if called while [`eof`](Source::eof) is true.
    fn peek(&mut self) -> u8;

    /// Consumes one byte, advancing the current position.
    fn advance(&mut self);

    /// The current absolute position within the source.
    fn position(&self) -> u64;

    /// Moves the current position back (or forward) to a position previously observed from this
    /// same source.
    ///
    /// This must be cheap; it is used to retry after a failed sentinel or multi-byte delimiter
    /// probe, and by the close-quote scanner. Implementations are not required to support seeking
    /// to a position never previously observed.
    fn seek(&mut self, pos: u64);

    /// Compares the next `bytes.len()` bytes against `bytes`. On a match, consumes them and
    /// returns `true`; on a mismatch (or running out of input), restores the original position
    /// and returns `false`.
    ///
    /// The default implementation is the `memcmp`-equivalent helper the data model calls for,
    /// expressed in terms of the primitive capabilities above; random-access sources may want a
    /// direct slice comparison instead.
    fn probe_matches(&mut self, bytes: &[u8]) -> bool {
        let start = self.position();
        for &want in bytes {
            if self.eof() || self.peek() != want {
                self.seek(start);
                return false;
            }
            self.advance();
        }
        true
    }
}

/// A [`Source`] bounded to the half-open range `[pos, pos + len)` of an inner source.
///
/// This is the view every layer actually operates on: it is how `xparse`'s `len` argument (the
/// caller-supplied window, not the physical end of the underlying buffer or stream) is enforced.
pub struct Window<'s, S: ?Sized> {
    source: &'s mut S,
    limit: u64,
}

impl<'s, S: Source + ?Sized> Window<'s, S> {
    /// Creates a window over `source` bounded to `[pos, pos + len)`.
    #[inline]
    pub fn new(source: &'s mut S, pos: u64, len: u64) -> Self {
        source.seek(pos);
        Self {
            source,
            limit: pos + len,
        }
    }

    /// Whether the window has been fully consumed, either because the inner source is at EOF or
    /// because the caller-supplied length bound has been reached.
    #[inline]
    pub fn eof(&self) -> bool {
        self.source.position() >= self.limit || self.source.eof()
    }

    /// Returns the next unconsumed byte without consuming it.
    #[inline]
    pub fn peek(&mut self) -> u8 {
        debug_assert!(!self.eof(), "peek called at eof");
        self.source.peek()
    }

    /// Consumes one byte, advancing the current position.
    #[inline]
    pub fn advance(&mut self) {
        self.source.advance();
    }

    /// The current absolute position within the source.
    #[inline]
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// Moves the current position to a position previously observed from this window.
    #[inline]
    pub fn seek(&mut self, pos: u64) {
        self.source.seek(pos);
    }

    /// Compares the next `bytes.len()` bytes against `bytes`, honoring the window's bound.
    pub fn probe_matches(&mut self, bytes: &[u8]) -> bool {
        let start = self.position();
        for &want in bytes {
            if self.eof() || self.peek() != want {
                self.seek(start);
                return false;
            }
            self.advance();
        }
        true
    }
}

/// A random-access [`Source`] over an in-memory byte slice.
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Creates a new slice source positioned at the start of `bytes`.
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// The full underlying byte slice, irrespective of the current position.
    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> Source for SliceSource<'a> {
    #[inline]
    fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline]
    fn peek(&mut self) -> u8 {
        self.bytes[self.pos]
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn position(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    fn seek(&mut self, pos: u64) {
        self.pos = pos as usize;
    }

    #[inline]
    fn probe_matches(&mut self, bytes: &[u8]) -> bool {
        let start = self.pos;
        let end = start + bytes.len();
        if end > self.bytes.len() || &self.bytes[start..end] != bytes {
            return false;
        }
        self.pos = end;
        true
    }
}

/// State that a buffered lookahead byte can be in, mirroring the byte-at-a-time peek discipline
/// a forward-only reader needs.
enum PeekState {
    /// The byte is unavailable and needs to be read from the reader.
    Spoiled,
    /// The byte is available and reflects the most recent state of the reader.
    Fresh(u8),
    /// The reader has indicated that no more bytes are available.
    Unavailable,
}

/// A forward-only [`Source`] over an [`io::Read`], with a retained history buffer so previously
/// observed positions can be seeked back to.
///
/// Every byte ever read from the underlying reader is kept in `history`, so `seek` to any
/// position the caller has already observed is an O(1) index reset. This trades memory for
/// simplicity; a production host parsing unbounded streams would want to cap and evict the
/// history once no live `PosLen` can reference it, the way a ring buffer would.
pub struct ReaderSource<R> {
    reader: R,
    history: Vec<u8>,
    pos: usize,
    peek: PeekState,
    io_error: Option<io::Error>,
}

impl<R: io::Read> ReaderSource<R> {
    /// Creates a new reader source over `reader`.
    #[inline]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            history: Vec::new(),
            pos: 0,
            peek: PeekState::Spoiled,
            io_error: None,
        }
    }

    /// The most recent I/O error encountered while filling the history buffer, if any.
    ///
    /// A read error is otherwise reported to the pipeline as EOF; callers that care about the
    /// distinction should check this after parsing completes.
    #[inline]
    pub fn io_error(&self) -> Option<&io::Error> {
        self.io_error.as_ref()
    }

    /// Every byte read from the underlying reader so far, in order.
    ///
    /// Used by [`get_string`](crate::layers::get_string) to reify a [`PosLen`](crate::poslen::PosLen)
    /// observed from this source.
    #[inline]
    pub fn history(&self) -> &[u8] {
        &self.history
    }

    fn fill_peek(&mut self) {
        if self.pos < self.history.len() {
            self.peek = PeekState::Fresh(self.history[self.pos]);
            return;
        }
        let mut byte = 0u8;
        match self.reader.read(slice::from_mut(&mut byte)) {
            Ok(0) => self.peek = PeekState::Unavailable,
            Ok(_) => {
                self.history.push(byte);
                self.peek = PeekState::Fresh(byte);
            }
            Err(e) => {
                self.io_error = Some(e);
                self.peek = PeekState::Unavailable;
            }
        }
    }

    fn peek_byte(&mut self) -> Option<u8> {
        if matches!(self.peek, PeekState::Spoiled) {
            self.fill_peek();
        }
        match self.peek {
            PeekState::Fresh(b) => Some(b),
            PeekState::Unavailable => None,
            PeekState::Spoiled => unreachable!("fill_peek always leaves a non-spoiled state"),
        }
    }
}

impl<R: io::Read> Source for ReaderSource<R> {
    #[inline]
    fn eof(&self) -> bool {
        if self.pos < self.history.len() {
            return false;
        }
        matches!(self.peek, PeekState::Unavailable)
    }

    fn peek(&mut self) -> u8 {
        self.peek_byte().expect("peek called at eof")
    }

    fn advance(&mut self) {
        if self.pos == self.history.len() {
            // Consume the freshly peeked byte (if any) into history so that `seek` back to it
            // later is possible.
            if let PeekState::Fresh(b) = self.peek {
                self.history.push(b);
            }
        }
        self.pos += 1;
        self.peek = PeekState::Spoiled;
    }

    #[inline]
    fn position(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    fn seek(&mut self, pos: u64) {
        self.pos = pos as usize;
        self.peek = PeekState::Spoiled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_basic_walk() {
        let mut s = SliceSource::new(b"abc");
        assert!(!s.eof());
        assert_eq!(s.peek(), b'a');
        s.advance();
        assert_eq!(s.peek(), b'b');
        s.advance();
        s.advance();
        assert!(s.eof());
    }

    #[test]
    fn slice_source_probe_matches_and_restores_on_mismatch() {
        let mut s = SliceSource::new(b"NAfoo");
        assert!(s.probe_matches(b"NA"));
        assert_eq!(s.position(), 2);

        let mut s = SliceSource::new(b"NUfoo");
        assert!(!s.probe_matches(b"NA"));
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn reader_source_matches_slice_source_behavior() {
        let mut r = ReaderSource::new(&b"abc,def"[..]);
        assert_eq!(r.peek(), b'a');
        r.advance();
        assert_eq!(r.peek(), b'b');
        r.advance();
        r.advance();
        assert_eq!(r.peek(), b',');
    }

    #[test]
    fn reader_source_seeks_back_within_history() {
        let mut r = ReaderSource::new(&b"NA,7"[..]);
        assert!(!r.probe_matches(b"NU"));
        assert_eq!(r.position(), 0);
        assert_eq!(r.peek(), b'N');
    }

    #[test]
    fn window_bounds_eof_before_physical_end() {
        let mut s = SliceSource::new(b"1234567890");
        let mut w = Window::new(&mut s, 2, 3);
        assert!(!w.eof());
        assert_eq!(w.peek(), b'3');
        w.advance();
        w.advance();
        assert!(!w.eof());
        assert_eq!(w.peek(), b'5');
        w.advance();
        assert!(w.eof());
    }
}
