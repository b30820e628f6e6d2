/// Marker trait for byte-oriented buffers with incremental append operations
///
/// It is convenient to think of `Target` as an analogue of [`std::io::Write`],
/// except that the `push_XXX` methods are infallible: the returned `usize` is
/// book-keeping for the caller, not a signal of partial success.
///
/// Capacity-limited targets such as [`SliceTarget`] cannot honor this on their
/// own, so the encode entry points measure an encoding with [`ByteCounter`]
/// before writing any of it, and only write when the whole of it fits.
pub trait Target {
    /// Prepares for at least `extra` more bytes to be pushed.
    ///
    /// For many implementors this is a no-op; growable buffers reserve capacity.
    fn anticipate(&mut self, extra: usize);

    /// Appends a single byte, returning `1`.
    fn push_one(&mut self, b: u8) -> usize;

    /// Appends the bytes of a known-length array, returning `N`.
    ///
    /// Indistinguishable from `push_one` over every element in order.
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize;

    /// Appends the bytes of an arbitrary-length slice, returning its length.
    fn push_all(&mut self, buf: &[u8]) -> usize;
}

/// Alias for `std::io::Sink`, used to count the number of bytes an encoding
/// requires without performing any memory operations.
pub type ByteCounter = std::io::Sink;

impl Target for ByteCounter {
    #[inline(always)]
    fn anticipate(&mut self, _: usize) {}

    #[inline(always)]
    fn push_one(&mut self, _: u8) -> usize {
        1
    }

    #[inline(always)]
    fn push_many<const N: usize>(&mut self, _: [u8; N]) -> usize {
        N
    }

    #[inline(always)]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        buf.len()
    }
}

impl Target for Vec<u8> {
    #[inline]
    fn anticipate(&mut self, extra: usize) {
        self.reserve(extra)
    }

    #[inline]
    fn push_one(&mut self, b: u8) -> usize {
        self.push(b);
        1
    }

    #[inline]
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.extend(&arr);
        N
    }

    #[inline]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.extend_from_slice(buf);
        buf.len()
    }
}

/// Write cursor over caller-provided memory
///
/// Bytes pushed beyond the end of the underlying slice are discarded and the
/// target is flagged as overflowed; the return values still report the
/// full count so that callers can tell how much room was missing.
#[derive(Debug)]
pub struct SliceTarget<'a> {
    buf: &'a mut [u8],
    pos: usize,
    overflowed: bool,
}

impl<'a> SliceTarget<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            overflowed: false,
        }
    }

    /// Number of bytes written so far
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes that can still be written
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn has_overflowed(&self) -> bool {
        self.overflowed
    }

    /// The initialized prefix of the underlying slice
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl Target for SliceTarget<'_> {
    #[inline(always)]
    fn anticipate(&mut self, extra: usize) {
        if extra > self.remaining() {
            self.overflowed = true;
        }
    }

    #[inline]
    fn push_one(&mut self, b: u8) -> usize {
        match self.buf.get_mut(self.pos) {
            Some(slot) => {
                *slot = b;
                self.pos += 1;
            }
            None => self.overflowed = true,
        }
        1
    }

    #[inline]
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.push_all(&arr)
    }

    fn push_all(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.remaining());
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
        if n < bytes.len() {
            self.overflowed = true;
        }
        bytes.len()
    }
}
