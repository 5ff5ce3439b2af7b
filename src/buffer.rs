//! The sliding character buffer.
//!
//! `Buffer<R>` owns a growable byte vector backed by a caller-supplied
//! [`Read`](std::io::Read) source, a read head, and the running line/column
//! of that read head. It never copies data out for its own bookkeeping
//! beyond what the source itself hands over; instead, it grows its backing storage on
//! demand and periodically shifts unread bytes to the front to reclaim
//! space.

use std::io::Read;

use crate::errors::Result;

/// Initial capacity of a freshly created buffer.
const INITIAL_CAPACITY: usize = 8 * 1024;

/// Upper bound on how large the backing storage is allowed to grow before a
/// shift is attempted instead of a further doubling. This is an
/// implementation-defined cap, not a limit on document size: once the unread
/// region no longer fits even after a shift, the buffer keeps doubling past
/// this cap rather than failing.
const SHIFT_THRESHOLD: usize = 1024 * 1024;

/// Advances `pos` over `consumed`, treating `\n`, `\r`, and `\r\n` as one
/// line break. Shared by [`Buffer::advance`] and the tokenizer, which needs
/// to compute the position of a sub-partition before it has actually moved
/// the buffer's read head past it.
pub(crate) fn advance_position(mut pos: Position, consumed: &[u8]) -> Position {
    let mut i = 0;
    while i < consumed.len() {
        match consumed[i] {
            b'\r' => {
                pos.line += 1;
                pos.col = 1;
                if consumed.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => {
                pos.line += 1;
                pos.col = 1;
            }
            _ => {
                pos.col += 1;
            }
        }
        i += 1;
    }
    pos
}

/// A `(line, col)` source position, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: u64,
    pub col: u64,
}

impl Position {
    pub const START: Position = Position { line: 1, col: 1 };
}

/// A named sub-range of an artifact: a byte offset and length into the
/// buffer's *current* window, plus the source position of its first byte.
///
/// Partitions are only meaningful for the buffer generation they were
/// produced against — see [`Buffer::snapshot`]/[`Buffer::restore`]. A parser
/// never emits a partition and then shifts the buffer before handing that
/// partition to a handler, so handlers always see valid partitions for the
/// duration of their callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Partition {
    pub offset: usize,
    pub length: usize,
    pub line: u64,
    pub col: u64,
}

impl Partition {
    pub const EMPTY: Partition = Partition {
        offset: 0,
        length: 0,
        line: 0,
        col: 0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
        }
    }

    /// Slices `buf` using this partition's offset and length.
    #[inline]
    pub fn bytes<'b>(&self, buf: &'b Buffer<impl Read>) -> &'b [u8] {
        &buf.window()[self.offset..self.offset + self.length]
    }
}

/// An opaque, cheap-to-take snapshot of a [`Buffer`]'s read position.
///
/// Valid only against the buffer generation it was taken from; restoring
/// after an intervening shift returns `Ok(false)` rather than corrupting
/// position tracking.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pos: usize,
    line: u64,
    col: u64,
    generation: u64,
}

/// A read-only view of a [`Buffer`]'s window at one instant, handed to
/// handlers instead of the buffer itself so the handler trait never needs to
/// be generic over the source type `R` (and so stays usable as a trait
/// object). Valid only for the duration of the callback that received it —
/// see [`Partition`]'s own validity note.
#[derive(Clone, Copy)]
pub struct BufferView<'a> {
    window: &'a [u8],
}

impl<'a> BufferView<'a> {
    pub(crate) fn new(window: &'a [u8]) -> Self {
        BufferView { window }
    }

    #[inline]
    pub fn slice(&self, p: Partition) -> &'a [u8] {
        &self.window[p.offset..p.offset + p.length]
    }
}

/// Sliding buffer over a byte-oriented source.
pub struct Buffer<R> {
    source: R,
    data: Vec<u8>,
    /// Read head: index of the next unconsumed byte.
    pos: usize,
    /// End of valid (filled) data.
    end: usize,
    line: u64,
    col: u64,
    /// Bumped every time the buffer shifts its window; invalidates earlier
    /// [`Snapshot`]s and [`Partition`]s.
    generation: u64,
    at_eof: bool,
}

impl<R: Read> Buffer<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            data: Vec::with_capacity(INITIAL_CAPACITY),
            pos: 0,
            end: 0,
            line: 1,
            col: 1,
            generation: 0,
            at_eof: false,
        }
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The unread window of the buffer: `window()[0]` is the next unread byte.
    #[inline]
    pub fn window(&self) -> &[u8] {
        &self.data[self.pos..self.end]
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.at_eof && self.window().is_empty()
    }

    #[inline]
    pub fn view(&self) -> BufferView<'_> {
        BufferView::new(self.window())
    }

    /// Guarantees at least `min` unread bytes are available, reading more
    /// from the source (growing or shifting the backing storage as needed).
    ///
    /// Returns the number of unread bytes actually available, which is less
    /// than `min` only at end of input.
    pub fn ensure(&mut self, min: usize) -> Result<usize> {
        while self.window().len() < min && !self.at_eof {
            self.fill_more()?;
        }
        Ok(self.window().len())
    }

    /// Reads one more chunk from the source, growing or shifting the backing
    /// storage first if there is no room. Returns `false` if the source is
    /// exhausted.
    pub fn fill_more(&mut self) -> Result<bool> {
        if self.at_eof {
            return Ok(false);
        }

        // Reclaim space occupied by already-consumed bytes before growing
        // further by shifting unread content to the front.
        if self.pos > 0 && (self.pos >= SHIFT_THRESHOLD || self.end == self.data.capacity()) {
            self.data.drain(..self.pos);
            self.end -= self.pos;
            self.pos = 0;
            self.generation += 1;
        }

        if self.end == self.data.capacity() {
            let new_cap = (self.data.capacity() * 2).max(INITIAL_CAPACITY);
            self.data.reserve(new_cap - self.data.capacity());
        }

        let start = self.data.len();
        // SAFETY-free growth: extend with zeroed space, then read into it and
        // truncate to what was actually filled.
        let want = self.data.capacity() - start;
        self.data.resize(start + want.max(4096), 0);
        let read = self.source.read(&mut self.data[start..])?;
        self.data.truncate(start + read);
        self.end = self.data.len();

        if read == 0 {
            self.at_eof = true;
        }
        Ok(read > 0)
    }

    /// Moves the read head forward by `n` bytes, updating line/col by
    /// scanning the consumed range. Treats `\n`, `\r`, and `\r\n` as one line
    /// break.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.end);
        let new_pos = advance_position(self.position(), &self.data[self.pos..self.pos + n]);
        self.line = new_pos.line;
        self.col = new_pos.col;
        self.pos += n;
    }

    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            line: self.line,
            col: self.col,
            generation: self.generation,
        }
    }

    /// Restores a previously taken snapshot. Returns `false` (and leaves the
    /// buffer untouched) if the snapshot's generation was shifted away.
    pub fn restore(&mut self, snap: Snapshot) -> bool {
        if snap.generation != self.generation {
            return false;
        }
        self.pos = snap.pos;
        self.line = snap.line;
        self.col = snap.col;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn ensure_reads_until_min_or_eof() {
        let mut buf = Buffer::new(Cursor::new(b"hello world".to_vec()));
        let avail = buf.ensure(5).unwrap();
        assert!(avail >= 5);
        assert!(buf.window().starts_with(b"hello"));
    }

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut buf = Buffer::new(Cursor::new(b"ab\ncd\r\nef".to_vec()));
        buf.ensure(9).unwrap();
        buf.advance(2); // "ab"
        assert_eq!(buf.position(), Position { line: 1, col: 3 });
        buf.advance(1); // "\n"
        assert_eq!(buf.position(), Position { line: 2, col: 1 });
        buf.advance(2); // "cd"
        assert_eq!(buf.position(), Position { line: 2, col: 3 });
        buf.advance(2); // "\r\n" counts as a single break
        assert_eq!(buf.position(), Position { line: 3, col: 1 });
    }

    #[test]
    fn snapshot_restore_round_trips_within_a_generation() {
        let mut buf = Buffer::new(Cursor::new(b"0123456789".to_vec()));
        buf.ensure(10).unwrap();
        let snap = buf.snapshot();
        buf.advance(5);
        assert!(buf.restore(snap));
        assert_eq!(buf.position(), Position { line: 1, col: 1 });
    }

    #[test]
    fn eof_is_reported_once_source_is_drained() {
        let mut buf = Buffer::new(Cursor::new(b"hi".to_vec()));
        buf.ensure(2).unwrap();
        buf.advance(2);
        buf.ensure(1).unwrap();
        assert!(buf.is_eof());
    }
}
