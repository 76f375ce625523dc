//! Reassembly of fixed-size frames from a byte stream.
//!
//! A stream transport gives no message boundaries: one read may carry half a
//! record or several records at once. `StreamFramer` accumulates whatever
//! arrives and hands out complete frames from the front, keeping a partial
//! trailing frame buffered until the rest of it shows up.
//!
//! The accumulator is a single `Vec<u8>` with a read cursor. Draining only
//! advances the cursor; consumed bytes are compacted away on the next `feed`
//! once they make up at least half of the buffer.
use crate::record::{FRAME_LEN, Frame};

/// Byte accumulator that slices a stream into 17-byte frames.
#[derive(Debug, Default)]
pub struct StreamFramer {
    buf: Vec<u8>,
    cursor: usize,
}

impl StreamFramer {
    /// Creates an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes received from the transport.
    pub fn feed(&mut self, bytes: &[u8]) {
        if self.cursor == self.buf.len() {
            self.buf.clear();
            self.cursor = 0;
        } else if self.cursor >= self.buf.len() / 2 {
            self.buf.drain(..self.cursor);
            self.cursor = 0;
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Yields every complete frame currently buffered.
    ///
    /// The iterator is lazy: frames it does not get to stay buffered and are
    /// returned by the next call.
    pub fn drain(&mut self) -> Frames<'_> {
        Frames { framer: self }
    }

    /// Number of buffered bytes not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.cursor
    }

    fn next_frame(&mut self) -> Option<Frame> {
        let rest = &self.buf[self.cursor..];
        let frame: Frame = rest.get(..FRAME_LEN)?.try_into().ok()?;
        self.cursor += FRAME_LEN;
        Some(frame)
    }
}

/// Iterator over the complete frames of a [`StreamFramer`].
pub struct Frames<'a> {
    framer: &'a mut StreamFramer,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.framer.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.framer.buffered() / FRAME_LEN;
        (n, Some(n))
    }
}
