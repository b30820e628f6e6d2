//! Assorted imports for hand-written code working with generated types
//!
//! Generated modules import what they need individually; this module is for
//! code that consumes them, and brings the codec traits, both modes and the
//! common built-in types into scope at once.

pub use crate::conv::{Asn1Type, Decode, Encode};
pub use crate::error::{CodecError, CodecResult, ErrorKind};
pub use crate::mode::{Ber, Der, Mode};
pub use crate::prim::{
    BitString, GeneralizedTime, Ia5String, Integer, Null, NumericString, ObjectIdentifier,
    OctetString, PrintableString, UtcTime, Utf8String, VisibleString,
};
pub use crate::seq::{SequenceOf, SetOf};

pub mod tagging {
    //! Type-level tagging chains for SEQUENCE OF and SET OF aliases

    pub use crate::tag::{Application, Context, Explicit, Implicit, Natural, Private, Universal};
}

#[doc(inline)]
pub use tagging::*;
