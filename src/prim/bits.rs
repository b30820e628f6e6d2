//! BIT STRING
//!
//! The first content octet counts the unused bits (0 to 7) in the final
//! octet; it must be zero when there are no further octets. DER additionally
//! requires the unused bits to be zero, which encoding guarantees by masking.

use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::hexstring::Hex;
use crate::mode::Mode;
use crate::parse::Parser;
use crate::storage::Storage;
use crate::tag::number;

#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct BitString<const N: usize = 0> {
    bytes: Storage<u8, N>,
    unused: u8,
}

impl<const N: usize> BitString<N> {
    /// Bit string whose length is a whole number of octets
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: Storage::from(bytes),
            unused: 0,
        }
    }

    /// # Errors
    ///
    /// Fails with `InvalidValue` if `unused` exceeds 7, or is nonzero while
    /// `bytes` is empty.
    pub fn new(bytes: &[u8], unused: u8) -> CodecResult<Self> {
        if unused > 7 || (bytes.is_empty() && unused != 0) {
            return Err(CodecError::bad_value("BIT STRING", "invalid unused-bit count"));
        }
        Ok(Self {
            bytes: Storage::from(bytes),
            unused,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn unused_bits(&self) -> u8 {
        self.unused
    }

    /// Number of significant bits
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 - usize::from(self.unused)
    }

    /// Value of bit `ix`, counting from the most significant bit of the first octet
    pub fn get(&self, ix: usize) -> Option<bool> {
        if ix >= self.bit_len() {
            return None;
        }
        Some(self.bytes[ix / 8] & (0x80 >> (ix % 8)) != 0)
    }
}

impl<const N: usize> std::fmt::Debug for BitString<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitString")
            .field("bytes", &Hex(&self.bytes))
            .field("unused", &self.unused)
            .finish()
    }
}

super::universal!(<const N> BitString<N>, primitive number::BIT_STRING);

impl<const N: usize> Encode for BitString<N> {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        let mut n = buf.push_one(self.unused);
        match self.bytes.split_last() {
            None => {}
            Some((&last, init)) => {
                n += buf.push_all(init);
                n += buf.push_one(last & (0xff << self.unused));
            }
        }
        Ok(n)
    }
}

impl<const N: usize> Decode for BitString<N> {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let offset = p.offset();
        if p.remainder() == 0 {
            return Err(CodecError::bad_content(offset, "BIT STRING", "empty content"));
        }
        let unused = p.consume_byte()?;
        let bytes = p.consume_rest()?;
        if unused > 7 || (bytes.is_empty() && unused != 0) {
            return Err(CodecError::bad_content(offset, "BIT STRING", "invalid unused-bit count"));
        }
        if M::IS_DER {
            if let Some(&last) = bytes.last() {
                if last & !(0xff << unused) != 0 {
                    return Err(CodecError::bad_content(offset, "BIT STRING", "nonzero padding bits"));
                }
            }
        }
        Ok(Self {
            bytes: Storage::from(bytes),
            unused,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hex;

    #[test]
    fn unused_bits() {
        let bits = BitString::<4>::new(&[0b1010_1111], 4).unwrap();
        assert_eq!(bits.bit_len(), 4);
        assert_eq!(bits.get(0), Some(true));
        assert_eq!(bits.get(1), Some(false));
        assert_eq!(bits.get(4), None);
        // padding is cleared on the wire
        assert_eq!(bits.to_der().unwrap(), hex!("030204a0"));
        assert!(BitString::<0>::new(&[], 1).is_err());
        assert!(BitString::<0>::new(&[0], 8).is_err());
    }

    #[test]
    fn decode_checks() {
        assert_eq!(BitString::<0>::from_der(&hex!("030100")), Ok(BitString::from_bytes(&[])));
        assert_eq!(BitString::<0>::from_der(&hex!("030101")).unwrap_err().kind(), ErrorKind::InvalidEncoding);
        assert_eq!(BitString::<0>::from_ber(&hex!("0300")).unwrap_err().kind(), ErrorKind::InvalidEncoding);
        assert_eq!(BitString::<0>::from_der(&hex!("030208ff")).unwrap_err().kind(), ErrorKind::InvalidEncoding);
        let padded = hex!("030204af");
        assert_eq!(BitString::<0>::from_der(&padded).unwrap_err().kind(), ErrorKind::InvalidEncoding);
        assert_eq!(BitString::<0>::from_ber(&padded).map(|b| b.bit_len()), Ok(4));
    }
}
