//! Conversion between bytes and hexadecimal text
//!
//! Encoded values are most readable, in test vectors and in diagnostics, as
//! hex-strings: two case-insensitive hex digits per byte. Whitespace between
//! digit pairs is ignored when parsing, so that TLV boundaries can be marked
//! in literals (`"3003 020105"`).

use std::fmt::Write;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("odd number of hex digits in {0:?}")]
    Parity(String),
    #[error("invalid hex digit {digit:?} at position {position}")]
    Digit { digit: char, position: usize },
}

/// Formats a sequence of bytes into an undelimited lowercase hex-string
///
/// ```
/// # use berium::hexstring::hex_of_bytes;
/// assert_eq!(hex_of_bytes(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
/// ```
#[must_use]
pub fn hex_of_bytes(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        match write!(&mut hex, "{byte:02x}") {
            Ok(()) => (),
            Err(_) => unreachable!("write to String should never fail"),
        }
    }
    hex
}

/// Parses a hex-string into the bytes it represents, skipping whitespace
///
/// # Errors
///
/// Fails if the string contains anything other than hex digits and
/// whitespace, or if the number of digits is odd.
pub fn bytes_of_hex(src: &str) -> Result<Vec<u8>, HexError> {
    let mut dst = Vec::with_capacity(src.len() / 2);
    let mut high: Option<u8> = None;
    for (position, digit) in src.char_indices() {
        if digit.is_whitespace() {
            continue;
        }
        let nibble = digit
            .to_digit(16)
            .ok_or(HexError::Digit { digit, position })? as u8;
        match high.take() {
            None => high = Some(nibble),
            Some(hi) => dst.push(hi << 4 | nibble),
        }
    }
    match high {
        None => Ok(dst),
        Some(_) => Err(HexError::Parity(src.to_owned())),
    }
}

/// Wrapper that renders a byte slice as a hex-string in `Display` and `Debug`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Hex<'a>(pub &'a [u8]);

impl std::fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Parses a string-literal hex-string into a `Vec<u8>`
///
/// Panics if the argument is not a valid hex-string.
#[macro_export]
macro_rules! hex {
    ($s : expr) => {{
        $crate::hexstring::bytes_of_hex($s).expect("hex! macro encountered error")
    }};
}
