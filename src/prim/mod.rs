//! Codecs for the built-in primitive types
//!
//! Each submodule implements [`Asn1Type`](crate::conv::Asn1Type),
//! [`Encode`](crate::conv::Encode) and [`Decode`](crate::conv::Decode) for
//! one universal type, in terms of content octets only; framing is applied
//! by [`conv`](crate::conv).
//!
//! | ASN.1 type | Rust type(s) |
//! |---|---|
//! | BOOLEAN | `bool` |
//! | INTEGER | [`Integer`], `i8`..`i128`, `u8`..`u128` |
//! | ENUMERATED | derived on field-less enums, via [`enumerated`] |
//! | NULL | [`Null`], `()` |
//! | OCTET STRING | [`OctetString<N>`] |
//! | BIT STRING | [`BitString<N>`] |
//! | OBJECT IDENTIFIER | [`ObjectIdentifier`] |
//! | UTCTime, GeneralizedTime | [`UtcTime`], [`GeneralizedTime`] |
//! | UTF8String, PrintableString, ... | [`CharString<K, N>`] and its aliases |
//!
//! Constructed (segmented) encodings of string types are not accepted; their
//! identifier carries the constructed bit and is rejected as `UnexpectedTag`.

pub mod bits;
pub mod boolean;
pub mod enumerated;
pub mod integer;
pub mod null;
pub mod octets;
pub mod oid;
pub mod strings;
pub mod time;

pub use bits::BitString;
pub use integer::Integer;
pub use null::Null;
pub use octets::OctetString;
pub use oid::ObjectIdentifier;
pub use strings::{
    CharString, Charset, Ia5String, NumericString, PrintableString, Utf8String, VisibleString,
};
pub use time::{GeneralizedTime, UtcTime, Zone};

/// Implements [`Asn1Type`](crate::conv::Asn1Type) with a single universal tag
macro_rules! universal {
    (<const $n:ident> $ty:ty, primitive $num:expr) => {
        impl<const $n: usize> $crate::conv::Asn1Type for $ty {
            const TAGS: $crate::tag::TagPlan = $crate::tag::TagPlan::primitive($num);
        }
    };
    ($ty:ty, primitive $num:expr) => {
        impl $crate::conv::Asn1Type for $ty {
            const TAGS: $crate::tag::TagPlan = $crate::tag::TagPlan::primitive($num);
        }
    };
}

pub(crate) use universal;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv::Asn1Type;
    use crate::tag::{number, TagPlan};

    #[test]
    fn universal_tags_of_sized_and_plain_types() {
        assert_eq!(<OctetString as Asn1Type>::TAGS, TagPlan::primitive(number::OCTET_STRING));
        assert_eq!(<OctetString<16> as Asn1Type>::TAGS, TagPlan::primitive(number::OCTET_STRING));
        assert_eq!(<BitString<4> as Asn1Type>::TAGS, TagPlan::primitive(number::BIT_STRING));
        assert_eq!(<bool as Asn1Type>::TAGS, TagPlan::primitive(number::BOOLEAN));
        assert_eq!(<u16 as Asn1Type>::TAGS, TagPlan::primitive(number::INTEGER));
    }
}
