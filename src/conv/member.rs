//! Building blocks for SEQUENCE, SET and CHOICE codecs
//!
//! The implementations generated by `#[derive(Encode, Decode)]` for
//! structured types are written almost entirely in terms of the functions in
//! this module. Each member is handled through its effective [`TagPlan`]: the
//! plan of its type with the member's own tagging applied.
//!
//! Decoding relies on one-identifier lookahead: before committing to a member,
//! the tag of the next TLV is peeked and compared against the outermost tag of
//! the member's plan (or, for CHOICE-typed members, against every alternative).

use std::cmp::Ordering;

use crate::conv::target::Target;
use crate::conv::{read_tagged, tagged_len, write_tagged, Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::tag::{Tag, TagPlan};
use crate::tlv;

pub use crate::tlv::peek_tag;

/// Whether a TLV with outermost tag `tag` can begin a member of type `T` under `plan`
pub fn accepts<T: Decode>(plan: &TagPlan, tag: Tag) -> bool {
    match plan.outermost() {
        Some(outer) => outer == tag,
        None => T::accepts_untagged(tag),
    }
}

pub fn member_len<M: Mode, T: Encode>(value: &T, plan: &TagPlan) -> CodecResult<usize> {
    tagged_len::<M, T>(value, plan.as_slice())
}

pub fn write_member<M: Mode, T: Encode, U: Target>(
    value: &T,
    plan: &TagPlan,
    buf: &mut U,
) -> CodecResult<usize> {
    write_tagged::<M, T, U>(value, plan.as_slice(), buf)
}

/// Reads a mandatory member, failing with `MissingField` if the next TLV
/// cannot begin it or the content is exhausted
pub fn read_required<M: Mode, T: Decode, P: Parser>(
    p: &mut P,
    plan: &TagPlan,
    ty: &'static str,
    field: &'static str,
) -> CodecResult<T> {
    match peek_tag(p)? {
        Some(tag) if accepts::<T>(plan, tag) => read_tagged::<M, T, P>(p, plan.as_slice()),
        _ => Err(missing(p, ty, field)),
    }
}

/// Reads an optional member if the next TLV can begin it, leaving it absent otherwise
pub fn read_optional<M: Mode, T: Decode, P: Parser>(
    p: &mut P,
    plan: &TagPlan,
) -> CodecResult<Option<T>> {
    match peek_tag(p)? {
        Some(tag) if accepts::<T>(plan, tag) => read_tagged::<M, T, P>(p, plan.as_slice()).map(Some),
        _ => Ok(None),
    }
}

/// Reads a member with a DEFAULT value, substituting `default()` when it is absent
///
/// Under DER an explicitly encoded default value is rejected.
pub fn read_defaulted<M: Mode, T: Decode + PartialEq, P: Parser>(
    p: &mut P,
    plan: &TagPlan,
    default: fn() -> T,
) -> CodecResult<T> {
    let offset = p.offset();
    match read_optional::<M, T, P>(p, plan)? {
        None => Ok(default()),
        Some(value) => {
            check_not_default::<M, T>(&value, default, offset)?;
            Ok(value)
        }
    }
}

/// Under DER, rejects a decoded member equal to its DEFAULT value
pub fn check_not_default<M: Mode, T: PartialEq>(
    value: &T,
    default: fn() -> T,
    offset: usize,
) -> CodecResult<()> {
    if M::IS_DER && *value == default() {
        Err(CodecError::bad_content(offset, "DEFAULT member", "default value encoded explicitly"))
    } else {
        Ok(())
    }
}

/// Skips every remaining TLV in the current window, for extension members
pub fn skip_remaining<M: Mode, P: Parser>(p: &mut P) -> CodecResult<()> {
    while p.remainder() > 0 {
        tlv::skip_tlv::<M, P>(p)?;
    }
    Ok(())
}

/// Tag of the next TLV, which must exist
pub fn next_tag<P: Parser>(p: &P) -> CodecResult<Tag> {
    peek_tag(p)?.ok_or(CodecError::truncated(p.offset(), 1, 0))
}

pub fn missing<P: Parser>(p: &P, ty: &'static str, field: &'static str) -> CodecError {
    CodecError::MissingField {
        offset: p.offset(),
        ty,
        field,
    }
}

pub fn no_alternative(offset: usize, ty: &'static str, found: Tag) -> CodecError {
    CodecError::NoMatchingAlternative { offset, ty, found }
}

pub fn duplicate_member(offset: usize, ty: &'static str) -> CodecError {
    CodecError::bad_content(offset, ty, "SET member occurs more than once")
}

pub fn unknown_member(offset: usize, ty: &'static str) -> CodecError {
    CodecError::bad_content(offset, ty, "no SET member accepts this tag")
}

pub fn unknown_enumeration(offset: usize, ty: &'static str) -> CodecError {
    CodecError::bad_content(offset, ty, "value not in enumeration")
}

/// Orders the present members of a SET for encoding
///
/// Each entry pairs a member's outermost tag (`None` when absent) with its
/// declaration index. Under DER the present members are sorted into canonical
/// tag order; otherwise declaration order is kept. Absent members sort last.
pub fn set_order<const K: usize>(mut members: [(Option<Tag>, usize); K], der: bool) -> [(Option<Tag>, usize); K] {
    if der {
        members.sort_by(|a, b| match (a.0, b.0) {
            (Some(x), Some(y)) => x.canonical_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.1.cmp(&b.1),
        });
    }
    members
}

/// Under DER, rejects SET members that do not appear in strictly ascending tag order
pub fn check_set_order<M: Mode>(prev: Option<Tag>, next: Tag, offset: usize) -> CodecResult<()> {
    match prev {
        Some(prev) if M::IS_DER && prev.canonical_cmp(&next) != Ordering::Less => Err(
            CodecError::bad_content(offset, "SET", "members not in canonical order"),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hex;
    use crate::mode::{Ber, Der};
    use crate::parse::SliceParser;
    use crate::prim::Integer;
    use crate::tag::{number, Class, TagStep};

    const CTX0: TagPlan = TagPlan::primitive(number::INTEGER).with_steps(&[TagStep::implicit(Class::Context, 0)]);

    #[test]
    fn optional_absent_when_tag_differs() {
        let bytes = hex!("020105");
        let mut p = SliceParser::new(&bytes);
        assert_eq!(read_optional::<Der, Integer, _>(&mut p, &CTX0), Ok(None));
        assert_eq!(p.offset(), 0);
        let v: Integer = read_required::<Der, _, _>(&mut p, &<Integer as crate::conv::Asn1Type>::TAGS, "T", "x").unwrap();
        assert_eq!(v, Integer::from(5));
    }

    #[test]
    fn required_reports_missing() {
        let bytes = hex!("020105");
        let mut p = SliceParser::new(&bytes);
        let err = read_required::<Der, Integer, _>(&mut p, &CTX0, "Thing", "first").unwrap_err();
        assert_eq!(
            err,
            CodecError::MissingField {
                offset: 0,
                ty: "Thing",
                field: "first"
            }
        );
    }

    #[test]
    fn defaulted_member() {
        fn three() -> Integer {
            Integer::from(3)
        }
        let absent = hex!("");
        let mut p = SliceParser::new(&absent);
        assert_eq!(read_defaulted::<Der, _, _>(&mut p, &CTX0, three), Ok(Integer::from(3)));

        let explicit_default = hex!("800103");
        let mut p = SliceParser::new(&explicit_default);
        assert_eq!(read_defaulted::<Ber, _, _>(&mut p, &CTX0, three), Ok(Integer::from(3)));
        let mut p = SliceParser::new(&explicit_default);
        assert_eq!(
            read_defaulted::<Der, _, _>(&mut p, &CTX0, three).unwrap_err().kind(),
            ErrorKind::InvalidEncoding
        );
    }

    #[test]
    fn set_ordering() {
        let a = Tag::primitive(Class::Context, 2);
        let b = Tag::primitive(Class::Universal, 2);
        let members = [(Some(a), 0), (None, 1), (Some(b), 2)];
        assert_eq!(set_order(members, false), members);
        assert_eq!(set_order(members, true), [(Some(b), 2), (Some(a), 0), (None, 1)]);
        assert!(check_set_order::<Der>(Some(b), a, 0).is_ok());
        assert!(check_set_order::<Der>(Some(a), b, 0).is_err());
        assert!(check_set_order::<Ber>(Some(a), b, 0).is_ok());
    }

    #[test]
    fn skips_extensions() {
        let bytes = hex!("0101ff 3080 0500 0000 0400");
        let mut p = SliceParser::new(&bytes);
        skip_remaining::<Ber, _>(&mut p).unwrap();
        assert_eq!(p.remainder(), 0);
    }
}
