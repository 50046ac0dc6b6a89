/// Read cursor over the unconsumed window of an input buffer.
///
/// Parsers only ever move the cursor forward. A cursor is built fresh over
/// the caller's buffer for every call, so the buffer may grow (or drop its
/// consumed prefix) between calls.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Total bytes consumed since construction.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Look at the next `n` bytes without consuming them.
    pub fn peek_n(&self, n: usize) -> Option<&'a [u8]> {
        self.remaining().get(..n)
    }

    /// Mark `n` bytes consumed.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes remain.
    pub fn advance(&mut self, n: usize) {
        assert!(n <= self.len(), "advance past end of cursor");
        self.pos += n;
    }

    /// Consume and return up to `n` bytes.
    pub fn take(&mut self, n: usize) -> &'a [u8] {
        let n = n.min(self.len());
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    /// Consume exactly `N` bytes, or nothing if fewer are available.
    pub fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes: [u8; N] = self.peek_n(N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }
}
