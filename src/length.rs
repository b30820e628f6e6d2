//! Length octets
//!
//! Definite lengths below 128 are written in the short form, as a single
//! octet. Longer lengths use the long form: an initial octet `0x80 | n`
//! followed by `n` big-endian octets holding the length. The initial octet
//! `0x80` alone denotes the indefinite form, permitted only for constructed
//! encodings under BER, and `0xFF` is reserved.
//!
//! Lengths are always written in the minimal definite form, which is valid
//! under both BER and DER.

use crate::conv::target::Target;
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;

/// Decoded length octets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Length {
    Definite(usize),
    Indefinite,
}

impl Length {
    /// Parses length octets from the head of `bytes`, returning the length and the
    /// number of octets it occupied
    ///
    /// `constructed` is the constructed flag of the preceding identifier, as the
    /// indefinite form is only legal for constructed encodings. Offsets in
    /// returned errors are relative to the start of `bytes`.
    ///
    /// # Errors
    ///
    /// * `TruncatedInput` if `bytes` ends before the length octets do
    /// * `InvalidLength` for the reserved initial octet `0xFF`, for an
    ///   indefinite length on a primitive encoding or under DER, for lengths not
    ///   representable as a `usize`, and, under DER, for any non-minimal form
    pub fn read<M: Mode>(bytes: &[u8], constructed: bool) -> CodecResult<(Length, usize)> {
        let Some(&lead) = bytes.first() else {
            return Err(CodecError::truncated(0, 1, 0));
        };
        match lead {
            0x00..=0x7f => Ok((Length::Definite(lead as usize), 1)),
            0x80 => {
                if !M::ALLOW_INDEFINITE {
                    Err(CodecError::bad_length(0, "indefinite length not permitted"))
                } else if !constructed {
                    Err(CodecError::bad_length(0, "indefinite length on primitive encoding"))
                } else {
                    Ok((Length::Indefinite, 1))
                }
            }
            0xff => Err(CodecError::bad_length(0, "reserved initial length octet")),
            _ => {
                let count = (lead & 0x7f) as usize;
                let Some(octets) = bytes.get(1..=count) else {
                    return Err(CodecError::truncated(1, count, bytes.len() - 1));
                };
                if M::IS_DER && octets[0] == 0 {
                    return Err(CodecError::bad_length(1, "non-minimal long form"));
                }
                let significant = octets.iter().skip_while(|&&b| b == 0).count();
                if significant > std::mem::size_of::<usize>() {
                    return Err(CodecError::bad_length(1, "length exceeds addressable range"));
                }
                let value = octets.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
                if M::IS_DER && value < 0x80 {
                    return Err(CodecError::bad_length(0, "long form used for short length"));
                }
                Ok((Length::Definite(value), count + 1))
            }
        }
    }
}

/// Number of octets in the minimal definite encoding of `len`
pub const fn encoded_len(len: usize) -> usize {
    if len < 0x80 {
        1
    } else {
        let bits = usize::BITS - len.leading_zeros();
        1 + bits.div_ceil(8) as usize
    }
}

/// Writes the minimal definite encoding of `len`, returning the number of octets written
pub fn write_length<U: Target>(len: usize, buf: &mut U) -> usize {
    if len < 0x80 {
        return buf.push_one(len as u8);
    }
    let n = encoded_len(len) - 1;
    let be = len.to_be_bytes();
    buf.push_one(0x80 | n as u8) + buf.push_all(&be[be.len() - n..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mode::{Ber, Der};

    fn written(len: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        assert_eq!(write_length(len, &mut buf), encoded_len(len));
        buf
    }

    #[test]
    fn minimal_forms() {
        assert_eq!(written(0), [0x00]);
        assert_eq!(written(127), [0x7f]);
        assert_eq!(written(128), [0x81, 0x80]);
        assert_eq!(written(255), [0x81, 0xff]);
        assert_eq!(written(256), [0x82, 0x01, 0x00]);
        assert_eq!(written(0x01_00_00), [0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn reads_back() {
        for len in [0, 1, 127, 128, 200, 65535, 65536, 1 << 24] {
            let bytes = written(len);
            assert_eq!(Length::read::<Der>(&bytes, false), Ok((Length::Definite(len), bytes.len())));
            assert_eq!(Length::read::<Ber>(&bytes, true), Ok((Length::Definite(len), bytes.len())));
        }
    }

    #[test]
    fn indefinite_only_for_ber_constructed() {
        assert_eq!(Length::read::<Ber>(&[0x80], true), Ok((Length::Indefinite, 1)));
        assert_eq!(Length::read::<Ber>(&[0x80], false).unwrap_err().kind(), ErrorKind::InvalidLength);
        assert_eq!(Length::read::<Der>(&[0x80], true).unwrap_err().kind(), ErrorKind::InvalidLength);
    }

    #[test]
    fn reserved_octet() {
        assert_eq!(Length::read::<Ber>(&[0xff], true).unwrap_err().kind(), ErrorKind::InvalidLength);
        assert_eq!(Length::read::<Der>(&[0xff], false).unwrap_err().kind(), ErrorKind::InvalidLength);
    }

    #[test]
    fn non_minimal_only_rejected_under_der() {
        // 5 in long form, and 128 with a redundant leading zero
        for bytes in [&[0x81, 0x05][..], &[0x82, 0x00, 0x80][..]] {
            assert!(Length::read::<Ber>(bytes, false).is_ok());
            assert_eq!(Length::read::<Der>(bytes, false).unwrap_err().kind(), ErrorKind::InvalidLength);
        }
        assert_eq!(Length::read::<Ber>(&[0x82, 0x00, 0x80], false), Ok((Length::Definite(128), 3)));
    }

    #[test]
    fn truncated_and_oversized() {
        assert_eq!(Length::read::<Ber>(&[], false).unwrap_err().kind(), ErrorKind::TruncatedInput);
        assert_eq!(Length::read::<Ber>(&[0x83, 0x01], false).unwrap_err().kind(), ErrorKind::TruncatedInput);
        let mut huge = vec![0x80 | 9, 0x01];
        huge.extend_from_slice(&[0u8; 8]);
        assert_eq!(Length::read::<Ber>(&huge, false).unwrap_err().kind(), ErrorKind::InvalidLength);
    }
}
