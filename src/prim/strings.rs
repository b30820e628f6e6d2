//! Restricted character string types
//!
//! A [`CharString<K, N>`] holds text whose characters all belong to the
//! repertoire of the charset marker `K`. Values are validated on
//! construction and on decode, so encoding never fails.

use std::fmt::{Debug, Display};
use std::marker::PhantomData;

use crate::conv::target::Target;
use crate::conv::{Asn1Type, Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::storage::Storage;
use crate::tag::{number, TagPlan};

/// Repertoire and universal tag of a character string type
pub trait Charset {
    const NAME: &'static str;
    const TAG_NUMBER: u32;

    fn permits(ch: char) -> bool;
}

macro_rules! charset {
    ($name:ident, $asn1:literal, $num:expr, |$ch:ident| $permits:expr) => {
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name;

        impl Charset for $name {
            const NAME: &'static str = $asn1;
            const TAG_NUMBER: u32 = $num;

            fn permits($ch: char) -> bool {
                $permits
            }
        }
    };
}

charset!(Utf8, "UTF8String", number::UTF8_STRING, |_ch| true);
charset!(Printable, "PrintableString", number::PRINTABLE_STRING, |ch| {
    ch.is_ascii_alphanumeric() || " '()+,-./:=?".contains(ch)
});
charset!(Ia5, "IA5String", number::IA5_STRING, |ch| ch.is_ascii());
charset!(Visible, "VisibleString", number::VISIBLE_STRING, |ch| {
    (' '..='~').contains(&ch)
});
charset!(Numeric, "NumericString", number::NUMERIC_STRING, |ch| {
    ch.is_ascii_digit() || ch == ' '
});

/// Text restricted to the charset `K`, holding up to `N` bytes inline
pub struct CharString<K: Charset, const N: usize = 0> {
    bytes: Storage<u8, N>,
    _charset: PhantomData<K>,
}

pub type Utf8String<const N: usize = 0> = CharString<Utf8, N>;
pub type PrintableString<const N: usize = 0> = CharString<Printable, N>;
pub type Ia5String<const N: usize = 0> = CharString<Ia5, N>;
pub type VisibleString<const N: usize = 0> = CharString<Visible, N>;
pub type NumericString<const N: usize = 0> = CharString<Numeric, N>;

impl<K: Charset, const N: usize> CharString<K, N> {
    /// # Errors
    ///
    /// Fails with `InvalidValue` if `text` contains a character outside the repertoire of `K`.
    pub fn new(text: &str) -> CodecResult<Self> {
        if !text.chars().all(K::permits) {
            return Err(CodecError::bad_value(K::NAME, "character outside permitted repertoire"));
        }
        Ok(Self {
            bytes: Storage::from(text.as_bytes()),
            _charset: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        // content was validated as UTF-8 on construction
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<K: Charset, const N: usize> Default for CharString<K, N> {
    fn default() -> Self {
        Self {
            bytes: Storage::new(),
            _charset: PhantomData,
        }
    }
}

impl<K: Charset, const N: usize> Clone for CharString<K, N> {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
            _charset: PhantomData,
        }
    }
}

impl<K: Charset, const N: usize> PartialEq for CharString<K, N> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<K: Charset, const N: usize> Eq for CharString<K, N> {}

impl<K: Charset, const N: usize> PartialOrd for CharString<K, N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Charset, const N: usize> Ord for CharString<K, N> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl<K: Charset, const N: usize> std::hash::Hash for CharString<K, N> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state)
    }
}

impl<K: Charset, const N: usize> Debug for CharString<K, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", K::NAME, self.as_str())
    }
}

impl<K: Charset, const N: usize> Display for CharString<K, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<K: Charset, const N: usize> TryFrom<&str> for CharString<K, N> {
    type Error = CodecError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl<K: Charset, const N: usize> std::str::FromStr for CharString<K, N> {
    type Err = CodecError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::new(text)
    }
}

#[cfg(feature = "serde_impls")]
impl<K: Charset, const N: usize> serde::Serialize for CharString<K, N> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde_impls")]
impl<'de, K: Charset, const N: usize> serde::Deserialize<'de> for CharString<K, N> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::new(&text).map_err(serde::de::Error::custom)
    }
}

impl<K: Charset, const N: usize> Asn1Type for CharString<K, N> {
    const TAGS: TagPlan = TagPlan::primitive(K::TAG_NUMBER);
}

impl<K: Charset, const N: usize> Encode for CharString<K, N> {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        Ok(buf.push_all(&self.bytes))
    }
}

impl<K: Charset, const N: usize> Decode for CharString<K, N> {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let offset = p.offset();
        let bytes = p.consume_rest()?;
        let text = std::str::from_utf8(bytes)
            .map_err(|_| CodecError::bad_content(offset, K::NAME, "invalid UTF-8"))?;
        Self::new(text).map_err(|_| CodecError::bad_content(offset, K::NAME, "character outside permitted repertoire"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hex;

    #[test]
    fn repertoires() {
        assert!(PrintableString::<0>::new("Hello, World").is_ok());
        assert!(PrintableString::<0>::new("a@b").is_err());
        assert!(NumericString::<0>::new("12 34").is_ok());
        assert!(NumericString::<0>::new("12a").is_err());
        assert!(Ia5String::<0>::new("a@b").is_ok());
        assert!(VisibleString::<0>::new("tab\t").is_err());
        assert!(Utf8String::<0>::new("ünïcödé").is_ok());
    }

    #[test]
    fn tagged_by_charset() {
        let s = PrintableString::<8>::new("hi").unwrap();
        assert_eq!(s.to_der().unwrap(), hex!("13026869"));
        let u = Utf8String::<0>::new("é").unwrap();
        assert_eq!(u.to_der().unwrap(), hex!("0c02c3a9"));
        assert_eq!(Utf8String::<0>::from_der(&hex!("0c02c3a9")).map(|s| s.to_string()), Ok("é".to_owned()));
    }

    #[test]
    fn decode_validates() {
        assert_eq!(
            Utf8String::<0>::from_der(&hex!("0c01ff")).unwrap_err().kind(),
            ErrorKind::InvalidEncoding
        );
        assert_eq!(
            PrintableString::<0>::from_der(&hex!("130140")).unwrap_err().kind(),
            ErrorKind::InvalidEncoding
        );
    }
}
