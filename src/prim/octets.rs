use std::ops::{Deref, DerefMut};

use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::error::CodecResult;
use crate::hexstring::Hex;
use crate::mode::Mode;
use crate::parse::Parser;
use crate::storage::Storage;
use crate::tag::number;

/// OCTET STRING, holding up to `N` bytes inline
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct OctetString<const N: usize = 0>(pub Storage<u8, N>);

impl<const N: usize> OctetString<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self(Storage::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0.into_vec()
    }
}

impl<const N: usize> std::fmt::Debug for OctetString<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OctetString").field(&Hex(self.as_bytes())).finish()
    }
}

impl<const N: usize> Deref for OctetString<N> {
    type Target = Storage<u8, N>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for OctetString<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const N: usize> From<Vec<u8>> for OctetString<N> {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Storage::from(bytes))
    }
}

impl<const N: usize> From<&[u8]> for OctetString<N> {
    fn from(bytes: &[u8]) -> Self {
        Self(Storage::from(bytes))
    }
}

impl<const N: usize, const M: usize> From<&[u8; M]> for OctetString<N> {
    fn from(bytes: &[u8; M]) -> Self {
        Self(Storage::from(&bytes[..]))
    }
}

super::universal!(<const N> OctetString<N>, primitive number::OCTET_STRING);

impl<const N: usize> Encode for OctetString<N> {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        Ok(buf.push_all(self.as_bytes()))
    }
}

impl<const N: usize> Decode for OctetString<N> {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        Ok(Self::from(p.consume_rest()?))
    }
}
