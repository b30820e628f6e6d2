//! INTEGER
//!
//! The content octets of an INTEGER are the minimal big-endian two's
//! complement representation of its value: at least one octet, and never a
//! leading `00` before an octet whose high bit is clear, nor a leading `FF`
//! before one whose high bit is set. DER decoding rejects redundant leading
//! octets; BER decoding tolerates them.
//!
//! Values of unbounded magnitude are represented by [`Integer`]. The native
//! integer types are supported as well, failing with `ValueOutOfRange` when a
//! decoded value does not fit.

use std::fmt::Display;
use std::ops::Deref;

use num_bigint::BigInt;

use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::tag::number;

/// Arbitrary-precision INTEGER value
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct Integer(pub BigInt);

impl Integer {
    /// Constructs a value from its two's complement big-endian representation
    #[must_use]
    pub fn from_signed_bytes_be(bytes: &[u8]) -> Self {
        Self(BigInt::from_signed_bytes_be(bytes))
    }

    /// Minimal two's complement big-endian representation, as encoded
    #[must_use]
    pub fn to_signed_bytes_be(&self) -> Vec<u8> {
        self.0.to_signed_bytes_be()
    }

    #[must_use]
    pub fn into_inner(self) -> BigInt {
        self.0
    }
}

impl<T> From<T> for Integer
where
    BigInt: From<T>,
{
    fn from(value: T) -> Self {
        Self(BigInt::from(value))
    }
}

impl Deref for Integer {
    type Target = BigInt;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <BigInt as Display>::fmt(&self.0, f)
    }
}

macro_rules! impl_integer_coerce {
    ($($t:ty),+) => {
        $(
            impl TryFrom<&Integer> for $t {
                type Error = CodecError;

                fn try_from(value: &Integer) -> Result<Self, Self::Error> {
                    <$t>::try_from(&value.0).map_err(|_| CodecError::bad_value(stringify!($t), "out of range"))
                }
            }
        )+
    };
}

impl_integer_coerce!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

/// Returns the suffix of `bytes` without redundant sign-extension octets
pub fn minimal(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < bytes.len() {
        let (lead, next) = (bytes[start], bytes[start + 1]);
        if (lead == 0x00 && next & 0x80 == 0) || (lead == 0xff && next & 0x80 != 0) {
            start += 1;
        } else {
            break;
        }
    }
    &bytes[start..]
}

/// Consumes the content octets of an INTEGER-like value, checking they are
/// non-empty and, under DER, minimal
///
/// Returns the offset of the content alongside the octets.
pub fn read_content<'a, M: Mode, P: Parser>(
    p: &'a mut P,
    what: &'static str,
) -> CodecResult<(usize, &'a [u8])> {
    let offset = p.offset();
    let bytes = p.consume_rest()?;
    if bytes.is_empty() {
        return Err(CodecError::bad_content(offset, what, "empty content"));
    }
    if M::IS_DER && minimal(bytes).len() != bytes.len() {
        return Err(CodecError::bad_content(offset, what, "redundant leading octets"));
    }
    Ok((offset, bytes))
}

fn sign_extended(bytes: &[u8]) -> Option<[u8; 16]> {
    let bytes = minimal(bytes);
    if bytes.len() > 16 {
        return None;
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut buf = [fill; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    Some(buf)
}

/// Interprets non-empty content octets as an `i128`
pub fn decode_i128(bytes: &[u8]) -> Option<i128> {
    sign_extended(bytes).map(i128::from_be_bytes)
}

/// Interprets non-empty content octets as a `u128`
pub fn decode_u128(bytes: &[u8]) -> Option<u128> {
    if bytes[0] & 0x80 != 0 {
        return None;
    }
    let bytes = minimal(bytes);
    let bytes = match bytes {
        [0x00, rest @ ..] if rest.len() == 16 => rest,
        _ => bytes,
    };
    if bytes.len() > 16 {
        return None;
    }
    let mut buf = [0u8; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    Some(u128::from_be_bytes(buf))
}

/// Writes the minimal content octets of `value`
pub fn write_i128<U: Target>(value: i128, buf: &mut U) -> usize {
    buf.push_all(minimal(&value.to_be_bytes()))
}

pub fn write_u128<U: Target>(value: u128, buf: &mut U) -> usize {
    let mut wide = [0u8; 17];
    wide[1..].copy_from_slice(&value.to_be_bytes());
    buf.push_all(minimal(&wide))
}

super::universal!(Integer, primitive number::INTEGER);

impl Encode for Integer {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        Ok(buf.push_all(&self.0.to_signed_bytes_be()))
    }
}

impl Decode for Integer {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let (_, bytes) = read_content::<M, P>(p, "INTEGER")?;
        Ok(Self::from_signed_bytes_be(bytes))
    }
}

macro_rules! impl_native {
    (signed $($t:ty),+) => {
        $(
            super::universal!($t, primitive number::INTEGER);

            impl Encode for $t {
                fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
                    Ok(write_i128(i128::from(*self), buf))
                }
            }

            impl Decode for $t {
                fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
                    let (offset, bytes) = read_content::<M, P>(p, "INTEGER")?;
                    decode_i128(bytes)
                        .and_then(|v| <$t>::try_from(v).ok())
                        .ok_or(CodecError::out_of_range(offset, stringify!($t)))
                }
            }
        )+
    };
    (unsigned $($t:ty),+) => {
        $(
            super::universal!($t, primitive number::INTEGER);

            impl Encode for $t {
                fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
                    Ok(write_u128(u128::from(*self), buf))
                }
            }

            impl Decode for $t {
                fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
                    let (offset, bytes) = read_content::<M, P>(p, "INTEGER")?;
                    decode_u128(bytes)
                        .and_then(|v| <$t>::try_from(v).ok())
                        .ok_or(CodecError::out_of_range(offset, stringify!($t)))
                }
            }
        )+
    };
}

impl_native!(signed i8, i16, i32, i64, i128);
impl_native!(unsigned u8, u16, u32, u64, u128);
