//! ASN.1 BER/DER runtime and schema-to-Rust code generation
//!
//! # Overview
//!
//! This crate has two halves that are designed to be used together.
//!
//! The *runtime* is a tag-length-value codec for the Basic and Distinguished
//! Encoding Rules of X.690. Every schema-level type is modelled by a Rust
//! type implementing [`Asn1Type`], [`Encode`] and [`Decode`]: the first fixes
//! the chain of tags ([`TagPlan`]) under which the type is framed, the other
//! two read and write content octets. The encoding rules are selected at
//! compile time through a [`Mode`] type parameter ([`Ber`] or [`Der`]), so
//! that DER's stricter checks cost nothing when they are not wanted.
//!
//! Structured types are not written by hand. The derive macros
//! [`Encode`](macro@Encode) and [`Decode`](macro@Decode) accept `#[asn1(...)]`
//! attributes describing tagging, optionality and defaults, and emit the
//! member-by-member framing for SEQUENCE, SET, CHOICE and ENUMERATED types.
//!
//! The *generator* ([`gen`]) takes an already-parsed schema [`Module`]
//! (see [`schema`]) and emits Rust source text of a module whose types use
//! the runtime and its derives. Problems found in a schema are reported
//! through a [`Diagnostics`](gen::Diagnostics) sink rather than aborting on
//! the first error.
//!
//! # Background
//!
//! In BER, a value is framed by an identifier (class, constructed bit and
//! tag number), a length, and its content. Tagging in a schema either
//! replaces a type's identifier (`IMPLICIT`) or wraps the whole encoding in
//! a further constructed frame (`EXPLICIT`). DER additionally fixes every
//! choice left open by BER: definite minimal lengths, minimal integers,
//! canonical booleans, omitted default values, and sorted SET members.
//!
//! Encoding entry points write into caller-provided buffers and report
//! their outcome as an [`EncodeResult`]; decoding fills in a caller-provided
//! value and reports a [`DecodeResult`]. [`Encode::encode_to_vec`] and
//! [`Decode::decode_all`] wrap the same machinery in `Result`s.

extern crate self as berium;

extern crate decode_derive;
extern crate encode_derive;

pub mod autobox;
pub mod conv;
pub mod error;
pub mod gen;
pub mod hexstring;
mod internal;
pub mod length;
pub mod mode;
pub mod parse;
pub mod prelude;
pub mod prim;
pub mod schema;
pub mod seq;
pub mod storage;
pub mod tag;
pub mod tlv;


pub use crate::conv::target::Target;
pub use crate::conv::{decode, encode, Asn1Type, Decode, DecodeResult, Encode, EncodeResult};
pub use crate::error::{CodecError, CodecResult, ErrorKind, GenerationError};
pub use crate::mode::{Ber, Der, Mode};
pub use crate::parse::{Parser, SliceParser};
pub use crate::tag::{Class, Tag, TagPlan, TagStep};

pub use crate::prim::{
    BitString, CharString, GeneralizedTime, Ia5String, Integer, Null, NumericString,
    ObjectIdentifier, OctetString, PrintableString, UtcTime, Utf8String, VisibleString,
};
pub use crate::seq::{SequenceOf, SetOf};
pub use crate::storage::Storage;

pub use crate::gen::{Artifact, GenerateError, Generator, GeneratorConfig};
pub use crate::schema::Module;

pub use ::decode_derive::Decode;
pub use ::encode_derive::Encode;
pub use ::lazy_static::lazy_static;
