//! ENUMERATED
//!
//! An ENUMERATED value is encoded exactly like an INTEGER holding its
//! number, under universal tag 10. `#[derive(Encode, Decode)]` on an enum
//! whose variants carry no data implements it in terms of the two functions
//! below, using each variant's discriminant as its number.

use crate::conv::member::unknown_enumeration;
use crate::conv::target::Target;
use crate::error::CodecResult;
use crate::mode::Mode;
use crate::parse::Parser;
use crate::tag::{number, TagPlan};

use super::integer;

/// Natural plan of ENUMERATED types
pub const TAGS: TagPlan = TagPlan::primitive(number::ENUMERATED);

pub fn write_enumerated<U: Target>(value: i64, buf: &mut U) -> usize {
    integer::write_i128(i128::from(value), buf)
}

/// Reads the number of an ENUMERATED value and maps it through `lookup`
///
/// # Errors
///
/// Fails with `InvalidEncoding` when `lookup` returns `None`.
pub fn read_enumerated<M: Mode, P: Parser, T>(
    p: &mut P,
    ty: &'static str,
    lookup: impl FnOnce(i64) -> Option<T>,
) -> CodecResult<T> {
    let (offset, bytes) = integer::read_content::<M, P>(p, "ENUMERATED")?;
    integer::decode_i128(bytes)
        .and_then(|v| i64::try_from(v).ok())
        .and_then(lookup)
        .ok_or(unknown_enumeration(offset, ty))
}
