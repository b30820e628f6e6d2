//! TLV framing
//!
//! The functions here read and write the identifier and length octets that
//! frame every encoded value, independently of what the content octets
//! represent. [`encode_tlv`] and [`decode_tlv`] work on whole TLVs in caller
//! memory; [`Header`] and [`with_content`] are the pieces the typed codecs in
//! [`conv`](crate::conv) are built from.
//!
//! Indefinite-length content (BER only) is delimited by scanning forward over
//! the nested TLVs it contains until the matching end-of-contents marker. The
//! scan is iterative, keeps an explicit stack of open levels, and reports the
//! extent of every nested indefinite-length value it passes over, so a parser
//! can answer later queries for inner values without scanning again.

use crate::conv::target::{SliceTarget, Target};
use crate::conv::EncodeResult;
use crate::error::{CodecError, CodecResult};
use crate::length::{self, Length};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::tag::Tag;

/// Identifier and length octets of one TLV
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub tag: Tag,
    pub length: Length,
    /// Number of octets occupied by the identifier and length
    pub size: usize,
}

impl Header {
    /// Parses a header from the head of `bytes`, with error offsets relative to `bytes`
    pub fn parse<M: Mode>(bytes: &[u8]) -> CodecResult<Header> {
        let (tag, tlen) = Tag::read_identifier(bytes)?;
        let (length, llen) =
            Length::read::<M>(&bytes[tlen..], tag.is_constructed()).map_err(|e| e.shift(tlen))?;
        Ok(Header {
            tag,
            length,
            size: tlen + llen,
        })
    }

    /// Parses and consumes a header from the current window of `p`
    pub fn read<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Header> {
        let base = p.offset();
        let header = Self::parse::<M>(p.peek()).map_err(|e| e.shift(base))?;
        p.skip(header.size)?;
        Ok(header)
    }

    /// Number of octets in the header of a TLV with the given tag and content length
    pub const fn encoded_len(tag: Tag, content_len: usize) -> usize {
        tag.identifier_len() + length::encoded_len(content_len)
    }

    /// Writes the header of a TLV with minimal definite length
    pub fn write<U: Target>(tag: Tag, content_len: usize, buf: &mut U) -> usize {
        tag.write_identifier(buf) + length::write_length(content_len, buf)
    }
}

/// A TLV located within an input buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: Tag,
    /// Content octets, excluding any end-of-contents marker
    pub content: &'a [u8],
    /// Total octets occupied, including header and end-of-contents marker
    pub consumed: usize,
    pub indefinite: bool,
}

/// Writes one TLV with `tag` around `content` into `output`
///
/// Nothing is written unless the whole TLV fits.
pub fn encode_tlv(tag: Tag, content: &[u8], output: &mut [u8]) -> EncodeResult {
    let needed = Header::encoded_len(tag, content.len()) + content.len();
    if needed > output.len() {
        return EncodeResult::failure(CodecError::BufferOverflow {
            needed,
            available: output.len(),
        });
    }
    let mut target = SliceTarget::new(output);
    let written = Header::write(tag, content.len(), &mut target) + target.push_all(content);
    EncodeResult::success(written)
}

/// Locates the TLV at the head of `input`
///
/// # Errors
///
/// `TruncatedInput` when the input ends before the declared content does (or
/// before the end-of-contents marker of an indefinite-length value),
/// `InvalidTagEncoding` and `InvalidLength` for malformed header octets.
pub fn decode_tlv<M: Mode>(input: &[u8]) -> CodecResult<Tlv<'_>> {
    let header = Header::parse::<M>(input)?;
    let rest = &input[header.size..];
    match header.length {
        Length::Definite(n) => {
            let content = rest
                .get(..n)
                .ok_or(CodecError::truncated(header.size, n, rest.len()))?;
            Ok(Tlv {
                tag: header.tag,
                content,
                consumed: header.size + n,
                indefinite: false,
            })
        }
        Length::Indefinite => {
            let n = indefinite_extent::<M>(rest, |_, _| ()).map_err(|e| e.shift(header.size))?;
            Ok(Tlv {
                tag: header.tag,
                content: &rest[..n],
                consumed: header.size + n + 2,
                indefinite: true,
            })
        }
    }
}

/// Computes the length of indefinite-length content starting at the head of
/// `bytes`, up to but excluding its end-of-contents marker
///
/// `record` is called with `(start, len)` for the content of every nested
/// indefinite-length value encountered, and finally for the outer content
/// itself, with `start` relative to `bytes`.
pub fn indefinite_extent<M: Mode>(
    bytes: &[u8],
    mut record: impl FnMut(usize, usize),
) -> CodecResult<usize> {
    let mut open: Vec<usize> = vec![0];
    let mut pos = 0;
    loop {
        let header = Header::parse::<M>(&bytes[pos..]).map_err(|e| e.shift(pos))?;
        let start = pos;
        pos += header.size;
        match header.length {
            Length::Indefinite => open.push(pos),
            Length::Definite(0) if header.tag == Tag::END_OF_CONTENTS => {
                if let Some(content_start) = open.pop() {
                    record(content_start, start - content_start);
                    if open.is_empty() {
                        return Ok(start);
                    }
                }
            }
            Length::Definite(_) if header.tag == Tag::END_OF_CONTENTS => {
                return Err(CodecError::bad_content(start, "end-of-contents", "non-empty content"));
            }
            Length::Definite(n) => {
                let available = bytes.len() - pos;
                if n > available {
                    return Err(CodecError::truncated(pos, n, available));
                }
                pos += n;
            }
        }
    }
}

/// Runs `f` over the content of a TLV whose header has just been read from `p`,
/// then checks that the content was consumed exactly
pub fn with_content<M, P, T, F>(p: &mut P, length: Length, f: F) -> CodecResult<T>
where
    M: Mode,
    P: Parser,
    F: FnOnce(&mut P) -> CodecResult<T>,
{
    match length {
        Length::Definite(n) => {
            p.set_fit(n)?;
            let ret = f(p)?;
            p.enforce_target()?;
            Ok(ret)
        }
        Length::Indefinite => {
            let n = p.indefinite_extent::<M>()?;
            p.set_fit(n)?;
            let ret = f(p)?;
            p.enforce_target()?;
            p.skip(2)?;
            Ok(ret)
        }
    }
}

/// Tag of the next TLV in the current window, or `None` if the window is exhausted
pub fn peek_tag<P: Parser>(p: &P) -> CodecResult<Option<Tag>> {
    if p.remainder() == 0 {
        return Ok(None);
    }
    let base = p.offset();
    Tag::read_identifier(p.peek())
        .map(|(tag, _)| Some(tag))
        .map_err(|e| e.shift(base))
}

/// Consumes the next TLV without interpreting its content
pub fn skip_tlv<M: Mode, P: Parser>(p: &mut P) -> CodecResult<()> {
    let header = Header::read::<M, P>(p)?;
    with_content::<M, P, (), _>(p, header.length, |p| p.consume_rest().map(|_| ()))
}
