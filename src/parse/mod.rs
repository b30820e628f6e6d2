//! Parsing model for decoding
//!
//! This module defines the [`Parser`] trait, the stateful cursor that every
//! [`Decode`](crate::conv::Decode) implementation reads from, together with
//! [`SliceParser`], its implementation over a borrowed byte slice.
//!
//! # Context windows
//!
//! Decoding a TLV means reading its identifier and length octets and then
//! decoding exactly `length` bytes of content. A parser models this with a
//! stack of *context windows*: [`Parser::set_fit`] opens a window covering
//! the next `n` bytes, within which no read can reach the bytes beyond it,
//! and [`Parser::enforce_target`] closes the window, failing if any of its
//! bytes were left unread.
//!
//! # Lookahead
//!
//! Matching optional members and CHOICE alternatives requires inspecting the
//! next identifier before committing to a member. [`Parser::peek`] exposes the
//! unread bytes of the current window without consuming them.

use std::collections::BTreeMap;

use crate::error::{CodecError, CodecResult};
use crate::internal::{Stack, ViewStack};
use crate::mode::Mode;
use crate::tlv;

/// # Parser
///
/// Stateful cursor over an immutable input buffer.
///
/// The following properties should be respected by each implementation:
///
/// * A fresh parser has `offset() == 0` and `remainder()` equal to the input length
/// * `remainder()` is the largest `n` for which `consume(n)` and `set_fit(n)` succeed
/// * A successful `consume(n)` decreases `remainder()` by `n` and increases
///   `offset()` by `n`; a failed one changes neither
/// * Immediately after a successful `set_fit(n)`, `remainder()` is `n`
/// * `enforce_target()` closes the innermost window when `remainder() == 0`,
///   and fails otherwise
pub trait Parser {
    /// Number of bytes consumed since the start of the input
    fn offset(&self) -> usize;

    /// Number of bytes that can be consumed within the current window
    fn remainder(&self) -> usize;

    /// The unread bytes of the current window
    fn peek(&self) -> &[u8];

    /// Consumes and returns a single byte
    fn consume_byte(&mut self) -> CodecResult<u8>;

    /// Consumes and returns the next `nbytes` bytes
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput`, consuming nothing, if fewer than `nbytes`
    /// bytes remain in the current window.
    fn consume(&mut self, nbytes: usize) -> CodecResult<&[u8]>;

    /// Opens a window over exactly the next `n` bytes
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than `n` bytes remain in the current
    /// window, which is how a declared length exceeding the input is detected.
    fn set_fit(&mut self, n: usize) -> CodecResult<()>;

    /// Returns `true` if a window is open and all of its bytes have been consumed
    fn test_target(&self) -> bool;

    /// Closes the innermost window
    ///
    /// # Errors
    ///
    /// Returns `TrailingData` if unread bytes remain in the window, and
    /// `InvalidEncoding` if there is no window to close.
    fn enforce_target(&mut self) -> CodecResult<()>;

    /// Consumes `N` bytes and returns them in array-form
    fn consume_arr<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut ret = [0u8; N];
        ret.copy_from_slice(self.consume(N)?);
        Ok(ret)
    }

    /// Consumes every remaining byte of the current window
    fn consume_rest(&mut self) -> CodecResult<&[u8]> {
        let n = self.remainder();
        self.consume(n)
    }

    /// Consumes and discards `n` bytes
    fn skip(&mut self, n: usize) -> CodecResult<()> {
        self.consume(n).map(|_| ())
    }

    /// Length of the indefinite-length content starting at the current position,
    /// excluding its end-of-contents marker
    fn indefinite_extent<M: Mode>(&mut self) -> CodecResult<usize> {
        let base = self.offset();
        tlv::indefinite_extent::<M>(self.peek(), |_, _| ()).map_err(|e| e.shift(base))
    }
}

/// [`Parser`] over a borrowed slice, tracking windows as a stack of sub-slices
///
/// The extents of indefinite-length values found while scanning are memoized
/// by offset, so nested indefinite-length content is scanned only once.
#[derive(Clone, Debug)]
pub struct SliceParser<'a> {
    views: ViewStack<'a>,
    consumed: usize,
    extents: BTreeMap<usize, usize>,
}

impl<'a> SliceParser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            views: ViewStack::from_slice(input),
            consumed: 0,
            extents: BTreeMap::new(),
        }
    }

    /// Number of currently open context windows
    pub fn depth(&self) -> usize {
        self.views.depth().saturating_sub(1)
    }

    fn truncated(&self, needed: usize) -> CodecError {
        CodecError::truncated(self.consumed, needed, self.remainder())
    }
}

impl<'a> Parser for SliceParser<'a> {
    #[inline(always)]
    fn offset(&self) -> usize {
        self.consumed
    }

    #[inline]
    fn remainder(&self) -> usize {
        self.views.peek().map_or(0, <[u8]>::len)
    }

    #[inline]
    fn peek(&self) -> &[u8] {
        self.views.peek().unwrap_or_default()
    }

    fn consume_byte(&mut self) -> CodecResult<u8> {
        let Some((&first, tail)) = self.views.peek().and_then(<[u8]>::split_first) else {
            return Err(self.truncated(1));
        };
        if let Some(top) = self.views.peek_mut() {
            *top = tail;
        }
        self.consumed += 1;
        Ok(first)
    }

    fn consume(&mut self, nbytes: usize) -> CodecResult<&[u8]> {
        let Some(frame) = self.views.peek() else {
            return Err(self.truncated(nbytes));
        };
        if frame.len() < nbytes {
            return Err(self.truncated(nbytes));
        }
        let (ret, rest) = frame.split_at(nbytes);
        if let Some(top) = self.views.peek_mut() {
            *top = rest;
        }
        self.consumed += nbytes;
        Ok(ret)
    }

    fn set_fit(&mut self, n: usize) -> CodecResult<()> {
        let Some(frame) = self.views.peek() else {
            return Err(self.truncated(n));
        };
        if frame.len() < n {
            return Err(self.truncated(n));
        }
        let (novel, rest) = frame.split_at(n);
        if let Some(top) = self.views.peek_mut() {
            *top = rest;
        }
        self.views.push(novel);
        Ok(())
    }

    fn test_target(&self) -> bool {
        self.depth() > 0 && self.remainder() == 0
    }

    fn indefinite_extent<M: Mode>(&mut self) -> CodecResult<usize> {
        let base = self.consumed;
        if let Some(&n) = self.extents.get(&base) {
            return Ok(n);
        }
        let frame = self.views.peek().unwrap_or_default();
        let extents = &mut self.extents;
        tlv::indefinite_extent::<M>(frame, |start, len| {
            extents.insert(base + start, len);
        })
        .map_err(|e| e.shift(base))
    }

    fn enforce_target(&mut self) -> CodecResult<()> {
        if self.depth() == 0 {
            return Err(CodecError::bad_content(self.consumed, "window", "close without open window"));
        }
        match self.views.pop() {
            Some(frame) if !frame.is_empty() => Err(CodecError::TrailingData {
                offset: self.consumed,
                residual: frame.len(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn windows_nest() {
        let input = [1u8, 2, 3, 4, 5, 6];
        let mut p = SliceParser::new(&input);
        assert_eq!(p.consume_byte(), Ok(1));
        p.set_fit(3).unwrap();
        assert_eq!(p.remainder(), 3);
        assert_eq!(p.peek(), [2, 3, 4]);
        assert_eq!(p.consume(2).unwrap(), [2, 3]);
        assert_eq!(p.consume(2).unwrap_err().kind(), ErrorKind::TruncatedInput);
        assert!(!p.test_target());
        assert_eq!(p.consume_rest().unwrap(), [4]);
        assert!(p.test_target());
        p.enforce_target().unwrap();
        assert_eq!(p.offset(), 4);
        assert_eq!(p.consume_arr::<2>(), Ok([5, 6]));
        assert_eq!(p.remainder(), 0);
    }

    #[test]
    fn window_beyond_input() {
        let mut p = SliceParser::new(&[0u8; 3]);
        p.skip(1).unwrap();
        let err = p.set_fit(5).unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedInput {
                offset: 1,
                needed: 5,
                available: 2
            }
        );
    }

    #[test]
    fn indefinite_extents_are_memoized() {
        use crate::mode::Ber;
        // [0] (indefinite) { [1] (indefinite) { NULL } }
        let input = [0xa0, 0x80, 0xa1, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut p = SliceParser::new(&input);
        p.skip(2).unwrap();
        assert_eq!(p.indefinite_extent::<Ber>(), Ok(6));
        assert_eq!(p.extents.get(&4), Some(&2));
        p.skip(2).unwrap();
        assert_eq!(p.indefinite_extent::<Ber>(), Ok(2));
    }

    #[test]
    fn residue_on_close() {
        let mut p = SliceParser::new(&[0u8; 4]);
        p.set_fit(3).unwrap();
        p.skip(1).unwrap();
        assert_eq!(
            p.enforce_target(),
            Err(CodecError::TrailingData {
                offset: 1,
                residual: 2
            })
        );
        assert_eq!(p.enforce_target().unwrap_err().kind(), ErrorKind::InvalidEncoding);
    }
}
