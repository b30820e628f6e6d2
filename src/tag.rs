//! Tag model for identifier octets and tagging chains
//!
//! Every ASN.1 type carries a *natural* tag (for built-in types, a tag of the
//! universal class), which schema-level tagging may either replace (implicit
//! tagging) or wrap in an additional constructed tag (explicit tagging). The
//! result of applying a chain of such steps is modeled as a [`TagPlan`], a
//! short list of tags in encode order, outermost first.
//!
//! All plan composition is `const`, so that the effective tags of a generated
//! type are fully resolved at compile time and no tag computation is performed
//! while encoding or decoding.
//!
//! Tagging of container types (`SequenceOf`, `SetOf`) is expressed at the type
//! level through the [`TagMode`] markers [`Natural`], [`Implicit`] and
//! [`Explicit`], parameterized by one of the class markers [`Universal`],
//! [`Application`], [`Context`] or [`Private`].

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::marker::PhantomData;

use crate::conv::target::Target;
use crate::error::{CodecError, CodecResult};

/// Maximum number of tags that a single [`TagPlan`] can hold
pub const MAX_TAG_DEPTH: usize = 8;

/// Universal tag numbers of the built-in types supported by this crate
pub mod number {
    pub const END_OF_CONTENTS: u32 = 0;
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const ENUMERATED: u32 = 10;
    pub const UTF8_STRING: u32 = 12;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const NUMERIC_STRING: u32 = 18;
    pub const PRINTABLE_STRING: u32 = 19;
    pub const IA5_STRING: u32 = 22;
    pub const UTC_TIME: u32 = 23;
    pub const GENERALIZED_TIME: u32 = 24;
    pub const VISIBLE_STRING: u32 = 26;
}

/// Tag class, in the order of the two most significant bits of the identifier octet
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Class {
    Universal = 0,
    Application = 1,
    Context = 2,
    Private = 3,
}

impl Class {
    /// Reconstructs a `Class` from the two high bits of an identifier octet
    pub const fn from_bits(octet: u8) -> Self {
        match octet >> 6 {
            0 => Class::Universal,
            1 => Class::Application,
            2 => Class::Context,
            _ => Class::Private,
        }
    }

    /// Returns the class in the bit-position it occupies in an identifier octet
    pub const fn to_bits(self) -> u8 {
        (self as u8) << 6
    }

    /// Keyword used for this class in ASN.1 tag notation, empty for context-specific tags
    pub const fn keyword(self) -> &'static str {
        match self {
            Class::Universal => "UNIVERSAL ",
            Class::Application => "APPLICATION ",
            Class::Context => "",
            Class::Private => "PRIVATE ",
        }
    }
}

/// An ASN.1 tag: class, number, and whether the encoding it introduces is constructed
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    class: Class,
    number: u32,
    constructed: bool,
}

impl Tag {
    /// Tag of the end-of-contents marker that terminates indefinite-length encodings
    pub const END_OF_CONTENTS: Tag = Tag::primitive(Class::Universal, number::END_OF_CONTENTS);

    pub const fn new(class: Class, number: u32, constructed: bool) -> Self {
        Self {
            class,
            number,
            constructed,
        }
    }

    pub const fn primitive(class: Class, number: u32) -> Self {
        Self::new(class, number, false)
    }

    pub const fn constructed(class: Class, number: u32) -> Self {
        Self::new(class, number, true)
    }

    #[inline]
    pub const fn class(&self) -> Class {
        self.class
    }

    #[inline]
    pub const fn number(&self) -> u32 {
        self.number
    }

    #[inline]
    pub const fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Returns a copy of this tag with the constructed flag set as indicated
    pub const fn with_constructed(self, constructed: bool) -> Self {
        Self::new(self.class, self.number, constructed)
    }

    /// Number of identifier octets needed to encode this tag
    pub const fn identifier_len(&self) -> usize {
        if self.number < 0x1f {
            1
        } else {
            let mut n = self.number;
            let mut len = 1;
            while n > 0 {
                len += 1;
                n >>= 7;
            }
            len
        }
    }

    /// Writes the identifier octets of this tag, returning the number of octets written
    ///
    /// Tag numbers below 31 use the single-octet form; all others use the
    /// high-tag-number form, with the number split into base-128 digits,
    /// most significant first, and every digit but the last flagged with `0x80`.
    pub fn write_identifier<U: Target>(&self, buf: &mut U) -> usize {
        let lead = self.class.to_bits() | if self.constructed { 0x20 } else { 0 };
        if self.number < 0x1f {
            return buf.push_one(lead | self.number as u8);
        }
        let mut digits = [0u8; 5];
        let mut n = self.number;
        let mut ix = digits.len();
        while n > 0 {
            ix -= 1;
            digits[ix] = (n & 0x7f) as u8;
            n >>= 7;
        }
        let last = digits.len() - 1;
        for d in digits[ix..last].iter_mut() {
            *d |= 0x80;
        }
        buf.push_one(lead | 0x1f) + buf.push_all(&digits[ix..])
    }

    /// Parses identifier octets from the head of `bytes`, returning the tag and the
    /// number of octets it occupied
    ///
    /// Offsets carried by returned errors are relative to the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if `bytes` ends before the identifier does, and
    /// `InvalidTagEncoding` if the high-tag-number form is used for a number
    /// below 31, has a redundant leading continuation octet, or describes a
    /// number that does not fit in a `u32`.
    pub fn read_identifier(bytes: &[u8]) -> CodecResult<(Tag, usize)> {
        let Some(&lead) = bytes.first() else {
            return Err(CodecError::truncated(0, 1, 0));
        };
        let class = Class::from_bits(lead);
        let constructed = lead & 0x20 != 0;
        if lead & 0x1f != 0x1f {
            return Ok((Tag::new(class, (lead & 0x1f) as u32, constructed), 1));
        }
        let mut number: u32 = 0;
        for (ix, &octet) in bytes.iter().enumerate().skip(1) {
            if ix == 1 && octet == 0x80 {
                return Err(CodecError::bad_tag(ix, "redundant leading continuation octet"));
            }
            if number > (u32::MAX >> 7) {
                return Err(CodecError::bad_tag(ix, "tag number overflows 32 bits"));
            }
            number = (number << 7) | (octet & 0x7f) as u32;
            if octet & 0x80 == 0 {
                if number < 0x1f {
                    return Err(CodecError::bad_tag(0, "high-tag-number form used for a low tag number"));
                }
                return Ok((Tag::new(class, number, constructed), ix + 1));
            }
        }
        Err(CodecError::truncated(bytes.len(), 1, 0))
    }

    /// Canonical ordering of tags used to sort the members of a DER-encoded SET:
    /// universal before application before context-specific before private,
    /// then ascending by number.
    pub fn canonical_cmp(&self, other: &Tag) -> Ordering {
        (self.class, self.number).cmp(&(other.class, other.number))
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}{}]", self.class.keyword(), self.number)?;
        if self.constructed {
            write!(f, "c")
        } else {
            Ok(())
        }
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag{}", self)
    }
}

/// One schema-level tagging instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum TagStep {
    /// Replace the outermost tag, keeping its constructed flag
    Implicit(Class, u32),
    /// Wrap the current encoding in a new constructed tag
    Explicit(Class, u32),
}

impl TagStep {
    pub const fn implicit(class: Class, number: u32) -> Self {
        TagStep::Implicit(class, number)
    }

    pub const fn explicit(class: Class, number: u32) -> Self {
        TagStep::Explicit(class, number)
    }
}

impl Display for TagStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagStep::Implicit(class, number) => write!(f, "[{}{}] IMPLICIT", class.keyword(), number),
            TagStep::Explicit(class, number) => write!(f, "[{}{}] EXPLICIT", class.keyword(), number),
        }
    }
}

/// Effective tags of a type in encode order, outermost first
///
/// A plan with a single entry describes a type encoded as one TLV. Each
/// explicit tagging step adds one more entry at the front. The plan of a
/// CHOICE type is empty, as the tag on the wire is that of whichever
/// alternative is selected.
#[derive(Clone, Copy)]
pub struct TagPlan {
    tags: [Tag; MAX_TAG_DEPTH],
    len: usize,
}

impl TagPlan {
    pub const EMPTY: TagPlan = TagPlan {
        tags: [Tag::END_OF_CONTENTS; MAX_TAG_DEPTH],
        len: 0,
    };

    /// Plan of a universal type whose content octets are primitive
    pub const fn primitive(number: u32) -> Self {
        Self::single(Tag::primitive(Class::Universal, number))
    }

    /// Plan of a universal type whose content octets are constructed
    pub const fn constructed(number: u32) -> Self {
        Self::single(Tag::constructed(Class::Universal, number))
    }

    pub const fn single(tag: Tag) -> Self {
        let mut ret = Self::EMPTY;
        ret.tags[0] = tag;
        ret.len = 1;
        ret
    }

    /// Applies a single tagging step to this plan
    ///
    /// An implicit step applied to an empty plan (that of a CHOICE) is
    /// treated as explicit, as a CHOICE has no tag of its own to replace.
    ///
    /// # Panics
    ///
    /// Panics if an explicit step would grow the plan beyond [`MAX_TAG_DEPTH`].
    /// Plans are built in `const` items, so this surfaces as a compile-time error.
    pub const fn apply(self, step: TagStep) -> Self {
        match step {
            TagStep::Implicit(class, number) if self.len > 0 => {
                let mut ret = self;
                ret.tags[0] = Tag::new(class, number, self.tags[0].constructed);
                ret
            }
            TagStep::Implicit(class, number) | TagStep::Explicit(class, number) => {
                if self.len == MAX_TAG_DEPTH {
                    panic!("tagging chain exceeds MAX_TAG_DEPTH");
                }
                let mut ret = Self::EMPTY;
                ret.tags[0] = Tag::constructed(class, number);
                let mut ix = 0;
                while ix < self.len {
                    ret.tags[ix + 1] = self.tags[ix];
                    ix += 1;
                }
                ret.len = self.len + 1;
                ret
            }
        }
    }

    /// Applies a chain of tagging steps written outermost first, as they appear
    /// in ASN.1 notation, so that `[1] EXPLICIT [2] IMPLICIT INTEGER` is
    /// `TagPlan::primitive(INTEGER).with_steps(&[explicit(1), implicit(2)])`.
    pub const fn with_steps(self, steps: &[TagStep]) -> Self {
        let mut ret = self;
        let mut ix = steps.len();
        while ix > 0 {
            ix -= 1;
            ret = ret.apply(steps[ix]);
        }
        ret
    }

    #[inline]
    pub fn as_slice(&self) -> &[Tag] {
        &self.tags[..self.len]
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The first tag that appears on the wire, if the plan has one
    pub const fn outermost(&self) -> Option<Tag> {
        if self.len == 0 {
            None
        } else {
            Some(self.tags[0])
        }
    }
}

impl PartialEq for TagPlan {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for TagPlan {}

impl Debug for TagPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Class markers used as type arguments of [`Implicit`] and [`Explicit`]
pub trait ClassMarker {
    const CLASS: Class;
}

macro_rules! class_marker {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
            pub struct $name;

            impl ClassMarker for $name {
                const CLASS: Class = Class::$name;
            }
        )+
    };
}

class_marker!(Universal, Application, Context, Private);

/// Type-level tagging chain, read outermost first
///
/// `Explicit<Application, 2, Implicit<Context, 1>>` describes the chain
/// `[APPLICATION 2] EXPLICIT [1] IMPLICIT` applied to a container's natural tag.
pub trait TagMode {
    /// The outermost step of the chain, or `None` for [`Natural`]
    const STEP: Option<TagStep>;
    /// The remainder of the chain
    type Inner: TagMode;
}

/// Leaves a type's natural tag unchanged
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl TagMode for Natural {
    const STEP: Option<TagStep> = None;
    type Inner = Natural;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Implicit<C: ClassMarker, const N: u32, I: TagMode = Natural>(PhantomData<(C, I)>);

impl<C: ClassMarker, const N: u32, I: TagMode> TagMode for Implicit<C, N, I> {
    const STEP: Option<TagStep> = Some(TagStep::Implicit(C::CLASS, N));
    type Inner = I;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Explicit<C: ClassMarker, const N: u32, I: TagMode = Natural>(PhantomData<(C, I)>);

impl<C: ClassMarker, const N: u32, I: TagMode> TagMode for Explicit<C, N, I> {
    const STEP: Option<TagStep> = Some(TagStep::Explicit(C::CLASS, N));
    type Inner = I;
}

/// Applies the chain described by `K` to a natural plan
pub const fn apply_mode<K: TagMode>(natural: TagPlan) -> TagPlan {
    match K::STEP {
        None => natural,
        Some(step) => apply_mode::<K::Inner>(natural).apply(step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier(tag: Tag) -> Vec<u8> {
        let mut buf = Vec::new();
        let n = tag.write_identifier(&mut buf);
        assert_eq!(n, buf.len());
        assert_eq!(n, tag.identifier_len());
        buf
    }

    #[test]
    fn low_tag_numbers() {
        assert_eq!(identifier(Tag::primitive(Class::Universal, number::INTEGER)), [0x02]);
        assert_eq!(identifier(Tag::constructed(Class::Universal, number::SEQUENCE)), [0x30]);
        assert_eq!(identifier(Tag::constructed(Class::Context, 0)), [0xa0]);
        assert_eq!(identifier(Tag::primitive(Class::Application, 30)), [0x5e]);
        assert_eq!(identifier(Tag::primitive(Class::Private, 1)), [0xc1]);
    }

    #[test]
    fn high_tag_numbers() {
        assert_eq!(identifier(Tag::primitive(Class::Context, 31)), [0x9f, 0x1f]);
        assert_eq!(identifier(Tag::primitive(Class::Context, 128)), [0x9f, 0x81, 0x00]);
        assert_eq!(identifier(Tag::constructed(Class::Application, 0x3fff)), [0x7f, 0xff, 0x7f]);
        let max = Tag::primitive(Class::Private, u32::MAX);
        let bytes = identifier(max);
        assert_eq!(bytes, [0xdf, 0x8f, 0xff, 0xff, 0xff, 0x7f]);
        assert_eq!(Tag::read_identifier(&bytes), Ok((max, 6)));
    }

    #[test]
    fn identifier_roundtrip_with_trailing() {
        let tag = Tag::constructed(Class::Context, 200);
        let mut bytes = identifier(tag);
        let n = bytes.len();
        bytes.extend_from_slice(&[0x05, 0x00]);
        assert_eq!(Tag::read_identifier(&bytes), Ok((tag, n)));
    }

    #[test]
    fn malformed_identifiers() {
        use crate::error::ErrorKind;
        let kind = |bytes: &[u8]| Tag::read_identifier(bytes).unwrap_err().kind();
        assert_eq!(kind(&[]), ErrorKind::TruncatedInput);
        assert_eq!(kind(&[0x9f, 0x81]), ErrorKind::TruncatedInput);
        assert_eq!(kind(&[0x9f, 0x80, 0x01]), ErrorKind::InvalidTagEncoding);
        assert_eq!(kind(&[0x9f, 0x1e]), ErrorKind::InvalidTagEncoding);
        assert_eq!(kind(&[0x9f, 0x90, 0x80, 0x80, 0x80, 0x00]), ErrorKind::InvalidTagEncoding);
    }

    #[test]
    fn implicit_replaces_keeping_form() {
        let plan = TagPlan::primitive(number::INTEGER).with_steps(&[TagStep::implicit(Class::Context, 3)]);
        assert_eq!(plan.as_slice(), [Tag::primitive(Class::Context, 3)]);
        let plan = TagPlan::constructed(number::SEQUENCE).with_steps(&[TagStep::implicit(Class::Application, 1)]);
        assert_eq!(plan.as_slice(), [Tag::constructed(Class::Application, 1)]);
    }

    #[test]
    fn explicit_wraps() {
        let plan = TagPlan::primitive(number::INTEGER).with_steps(&[TagStep::explicit(Class::Context, 0)]);
        assert_eq!(
            plan.as_slice(),
            [
                Tag::constructed(Class::Context, 0),
                Tag::primitive(Class::Universal, number::INTEGER)
            ]
        );
    }

    #[test]
    fn chains_compose_outermost_first() {
        // [APPLICATION 5] EXPLICIT [1] EXPLICIT [2] IMPLICIT BOOLEAN
        let plan = TagPlan::primitive(number::BOOLEAN).with_steps(&[
            TagStep::explicit(Class::Application, 5),
            TagStep::explicit(Class::Context, 1),
            TagStep::implicit(Class::Context, 2),
        ]);
        assert_eq!(
            plan.as_slice(),
            [
                Tag::constructed(Class::Application, 5),
                Tag::constructed(Class::Context, 1),
                Tag::primitive(Class::Context, 2),
            ]
        );
    }

    #[test]
    fn implicit_on_choice_is_explicit() {
        let plan = TagPlan::EMPTY.with_steps(&[TagStep::implicit(Class::Context, 4)]);
        assert_eq!(plan.as_slice(), [Tag::constructed(Class::Context, 4)]);
    }

    #[test]
    fn type_level_modes() {
        const PLAN: TagPlan = apply_mode::<Explicit<Application, 2, Implicit<Context, 1>>>(
            TagPlan::constructed(number::SEQUENCE),
        );
        assert_eq!(
            PLAN,
            TagPlan::constructed(number::SEQUENCE).with_steps(&[
                TagStep::explicit(Class::Application, 2),
                TagStep::implicit(Class::Context, 1),
            ])
        );
        assert_eq!(apply_mode::<Natural>(TagPlan::primitive(number::NULL)), TagPlan::primitive(number::NULL));
    }

    #[test]
    fn canonical_order() {
        let mut tags = vec![
            Tag::primitive(Class::Context, 1),
            Tag::primitive(Class::Universal, 4),
            Tag::primitive(Class::Private, 0),
            Tag::primitive(Class::Context, 0),
            Tag::primitive(Class::Application, 9),
        ];
        tags.sort_by(Tag::canonical_cmp);
        let numbers: Vec<_> = tags.iter().map(|t| (t.class(), t.number())).collect();
        assert_eq!(
            numbers,
            [
                (Class::Universal, 4),
                (Class::Application, 9),
                (Class::Context, 0),
                (Class::Context, 1),
                (Class::Private, 0)
            ]
        );
    }
}
