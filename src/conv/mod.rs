//! Core of the binary-conversion API
//!
//! This module contains the high-level transcoding traits [`Encode`] and
//! [`Decode`], which are motivationally equivalent to the `Serialize` and
//! `Deserialize` traits of `serde`, together with the caller-facing entry
//! points [`encode`] and [`decode`].
//!
//! A type participates in BER/DER transcoding by implementing three traits:
//!
//! * [`Asn1Type`], which fixes the [`TagPlan`] the type is framed by,
//! * [`Encode`], which writes the *content octets* of a value, and
//! * [`Decode`], which reads them back.
//!
//! The framing itself (one header per entry of the plan, outermost first) is
//! never written by implementors; [`write_tagged`] and [`read_tagged`] apply
//! it uniformly, which is also how member-level tag overrides work: a member
//! of type `T` tagged `[0] IMPLICIT` is written with `T`'s content under a
//! different plan.
//!
//! CHOICE types are the exception to the one-TLV-per-plan-entry model. Their
//! natural plan is empty, and their content is the complete TLV of the selected
//! alternative; see [`Encode::selected_tag`] and [`Decode::parse_untagged`].
//!
//! Derive macros for `Encode` and `Decode` are provided in the sub-crates
//! `encode_derive` and `decode_derive`; the deriving of `Encode` also
//! provides `Asn1Type`.
//!
//! The submodule [`target`] offers an abstraction along the lines of
//! [`std::io::Write`], the [`target::Target`] trait, which is the dual of
//! [`crate::parse::Parser`]. The submodule [`member`] holds the helpers the
//! derived implementations for SEQUENCE, SET and CHOICE types are written in.

use crate::error::{CodecError, CodecResult, ErrorKind};
use crate::mode::{Ber, Der, Mode};
use crate::parse::{Parser, SliceParser};
use crate::tag::{Tag, TagPlan};
use crate::tlv::{self, Header};

use self::target::{ByteCounter, SliceTarget, Target};

pub mod member;
pub mod target;

/// Types with a fixed effective tagging, resolved at compile time
pub trait Asn1Type {
    /// Tags this type is framed by, outermost first
    const TAGS: TagPlan;
}

/// Trait for types whose values can be written as BER or DER
///
/// Implementing [`Encode`] can be as simple as providing a definition of the
/// required method [`write_content`](Encode::write_content); every other method
/// is derived from it and the type's [`Asn1Type::TAGS`].
pub trait Encode: Asn1Type {
    /// Appends the content octets of this value to a generic buffer, returning
    /// the exact number of bytes written
    ///
    /// # Errors
    ///
    /// Fails with `InvalidValue` if the value cannot be encoded under mode `M`.
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize>;

    /// Number of content octets this value encodes to under mode `M`
    fn content_len<M: Mode>(&self) -> CodecResult<usize> {
        self.write_content::<M, ByteCounter>(&mut std::io::sink())
    }

    /// For CHOICE types, the outermost tag of the currently selected alternative
    fn selected_tag(&self) -> Option<Tag> {
        None
    }

    /// Outermost tag of this value when written under `plan`
    fn outer_tag(&self, plan: &TagPlan) -> Option<Tag> {
        plan.outermost().or_else(|| self.selected_tag())
    }

    /// Total number of bytes of the complete encoding under mode `M`
    fn encoded_len<M: Mode>(&self) -> CodecResult<usize> {
        tagged_len::<M, Self>(self, Self::TAGS.as_slice())
    }

    /// Appends the complete encoding, headers included, to `buf`
    fn write_to<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        write_tagged::<M, Self, U>(self, Self::TAGS.as_slice(), buf)
    }

    /// Encodes into a freshly allocated `Vec<u8>`
    fn encode_to_vec<M: Mode>(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.anticipate(self.encoded_len::<M>()?);
        self.write_to::<M, _>(&mut buf)?;
        Ok(buf)
    }

    fn to_der(&self) -> CodecResult<Vec<u8>> {
        self.encode_to_vec::<Der>()
    }

    fn to_ber(&self) -> CodecResult<Vec<u8>> {
        self.encode_to_vec::<Ber>()
    }
}

/// Trait for types whose values can be read from BER or DER
pub trait Decode: Asn1Type + Sized {
    /// Parses a value from content octets
    ///
    /// The current window of `p` covers exactly the content of the innermost
    /// TLV of the type's plan; the caller verifies it was fully consumed.
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self>;

    /// For types with an empty plan (CHOICE), whether a TLV with outermost tag
    /// `tag` can begin a value of this type
    fn accepts_untagged(_tag: Tag) -> bool {
        false
    }

    /// For types with an empty plan (CHOICE), parses a complete TLV
    fn parse_untagged<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        Err(CodecError::bad_content(p.offset(), "type", "no tag to match against"))
    }

    /// Parses a complete encoding, headers included
    fn parse<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        read_tagged::<M, Self, P>(p, Self::TAGS.as_slice())
    }

    /// Decodes one value from the head of `input`, returning it with the number
    /// of bytes it occupied
    fn decode_prefix<M: Mode>(input: &[u8]) -> CodecResult<(Self, usize)> {
        let mut p = SliceParser::new(input);
        let value = Self::parse::<M, _>(&mut p)?;
        Ok((value, p.offset()))
    }

    /// Decodes one value occupying the whole of `input`
    ///
    /// Unless the `check_complete_parse` feature is disabled, trailing bytes
    /// are rejected with `TrailingData`.
    fn decode_all<M: Mode>(input: &[u8]) -> CodecResult<Self> {
        let (value, used) = Self::decode_prefix::<M>(input)?;
        if cfg!(feature = "check_complete_parse") && used != input.len() {
            return Err(CodecError::TrailingData {
                offset: used,
                residual: input.len() - used,
            });
        }
        Ok(value)
    }

    fn from_der(input: &[u8]) -> CodecResult<Self> {
        Self::decode_all::<Der>(input)
    }

    fn from_ber(input: &[u8]) -> CodecResult<Self> {
        Self::decode_all::<Ber>(input)
    }
}

/// Length of `content` octets once framed by `tags`, outermost first
fn framed_len(tags: &[Tag], content: usize) -> usize {
    tags.iter()
        .rev()
        .fold(content, |len, &tag| Header::encoded_len(tag, len) + len)
}

/// Length of the encoding of `value` under the tags `tags`, outermost first
pub fn tagged_len<M: Mode, T: Encode + ?Sized>(value: &T, tags: &[Tag]) -> CodecResult<usize> {
    Ok(framed_len(tags, value.content_len::<M>()?))
}

/// Writes `value` framed by `tags`, outermost first
///
/// The content is measured once; every header length is derived from that
/// single measurement.
pub fn write_tagged<M: Mode, T: Encode + ?Sized, U: Target>(
    value: &T,
    tags: &[Tag],
    buf: &mut U,
) -> CodecResult<usize> {
    if tags.is_empty() {
        return value.write_content::<M, U>(buf);
    }
    let content = value.content_len::<M>()?;
    let mut n = 0;
    for (ix, &tag) in tags.iter().enumerate() {
        n += Header::write(tag, framed_len(&tags[ix + 1..], content), buf);
    }
    Ok(n + value.write_content::<M, U>(buf)?)
}

/// Reads a value of type `T` framed by `tags`, outermost first
///
/// # Errors
///
/// Fails with `UnexpectedTag` if any header carries a tag other than the
/// corresponding entry of `tags`.
pub fn read_tagged<M: Mode, T: Decode, P: Parser>(p: &mut P, tags: &[Tag]) -> CodecResult<T> {
    let Some((&outer, inner)) = tags.split_first() else {
        return T::parse_untagged::<M, P>(p);
    };
    let offset = p.offset();
    let header = Header::read::<M, P>(p)?;
    if header.tag != outer {
        return Err(CodecError::UnexpectedTag {
            offset,
            expected: outer,
            found: header.tag,
        });
    }
    tlv::with_content::<M, P, T, _>(p, header.length, |p| {
        if inner.is_empty() {
            T::parse_content::<M, P>(p)
        } else {
            read_tagged::<M, T, P>(p, inner)
        }
    })
}

/// Outcome of [`encode`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeResult {
    pub success: bool,
    /// Bytes written into the output buffer; zero on failure
    pub bytes_written: usize,
    pub error: Option<CodecError>,
}

impl EncodeResult {
    pub(crate) fn success(bytes_written: usize) -> Self {
        Self {
            success: true,
            bytes_written,
            error: None,
        }
    }

    pub(crate) fn failure(error: CodecError) -> Self {
        Self {
            success: false,
            bytes_written: 0,
            error: Some(error),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(CodecError::kind)
    }

    pub fn into_result(self) -> CodecResult<usize> {
        match self.error {
            None => Ok(self.bytes_written),
            Some(err) => Err(err),
        }
    }
}

/// Outcome of [`decode`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeResult {
    pub success: bool,
    /// Bytes of input occupied by the decoded value; zero on failure
    pub bytes_read: usize,
    pub error: Option<CodecError>,
}

impl DecodeResult {
    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(CodecError::kind)
    }

    pub fn into_result(self) -> CodecResult<usize> {
        match self.error {
            None => Ok(self.bytes_read),
            Some(err) => Err(err),
        }
    }
}

/// Encodes `value` under mode `M` into caller memory
///
/// The encoding is measured before anything is written; if it does not fit,
/// the result reports `BufferOverflow` and `output` is left untouched.
pub fn encode<M: Mode, T: Encode>(output: &mut [u8], value: &T) -> EncodeResult {
    let needed = match value.encoded_len::<M>() {
        Ok(n) => n,
        Err(err) => return EncodeResult::failure(err),
    };
    if needed > output.len() {
        return EncodeResult::failure(CodecError::BufferOverflow {
            needed,
            available: output.len(),
        });
    }
    let mut target = SliceTarget::new(output);
    match value.write_to::<M, _>(&mut target) {
        Ok(written) if !target.has_overflowed() => EncodeResult::success(written),
        Ok(written) => EncodeResult::failure(CodecError::BufferOverflow {
            needed: written,
            available: target.position(),
        }),
        Err(err) => EncodeResult::failure(err),
    }
}

/// Decodes one value of type `T` under mode `M` from the head of `input`
///
/// On success `value_out` is overwritten and the number of bytes the value
/// occupied is reported; on failure `value_out` is left unchanged.
pub fn decode<M: Mode, T: Decode>(input: &[u8], value_out: &mut T) -> DecodeResult {
    match T::decode_prefix::<M>(input) {
        Ok((value, bytes_read)) => {
            *value_out = value;
            DecodeResult {
                success: true,
                bytes_read,
                error: None,
            }
        }
        Err(err) => DecodeResult {
            success: false,
            bytes_read: 0,
            error: Some(err),
        },
    }
}
