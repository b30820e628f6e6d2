//! Encoding-rule modes
//!
//! Every encode and decode operation in this crate is generic over a [`Mode`],
//! selected by the caller as a type argument. Generated types are mode-agnostic:
//! the same value can be written as BER or DER and read back under either.
//!
//! The constants on [`Mode`] let generic code branch on the rules in force, and
//! the unused branch disappears after monomorphization.

use std::fmt::Debug;

/// Basic Encoding Rules.
///
/// The permissive rules: indefinite lengths on constructed values, non-minimal
/// length octets, any nonzero octet as BOOLEAN true, SET members in any order.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ber;

/// Distinguished Encoding Rules.
///
/// Definite, minimal lengths only, minimal INTEGER content, `0xFF` as the
/// only BOOLEAN true, and canonically ordered SET and SET OF content.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Der;

pub trait Mode: Copy + Debug + Default + 'static {
    /// Human-readable name of the rule set
    const NAME: &'static str;
    /// Whether the canonical-form restrictions of DER apply
    const IS_DER: bool;
    /// Whether constructed values may use the indefinite length form
    const ALLOW_INDEFINITE: bool;
}

impl Mode for Ber {
    const NAME: &'static str = "BER";
    const IS_DER: bool = false;
    const ALLOW_INDEFINITE: bool = true;
}

impl Mode for Der {
    const NAME: &'static str = "DER";
    const IS_DER: bool = true;
    const ALLOW_INDEFINITE: bool = false;
}
