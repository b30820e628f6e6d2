//! OBJECT IDENTIFIER
//!
//! An object identifier is a sequence of at least two arcs. On the wire the
//! first two arcs share one subidentifier, `arc0 * 40 + arc1`, and every
//! subidentifier is written base-128, most significant group first, with the
//! high bit set on all but its final octet.

use std::fmt::{Debug, Display};
use std::str::FromStr;

use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::storage::Storage;
use crate::tag::number;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectIdentifier {
    arcs: Storage<u64, 10>,
}

impl ObjectIdentifier {
    /// Constructs an identifier from its arcs, without validation
    ///
    /// Arcs that do not form a valid identifier are reported when encoding.
    #[must_use]
    pub fn from_arcs(arcs: &[u64]) -> Self {
        Self {
            arcs: Storage::from(arcs),
        }
    }

    /// Constructs an identifier from its arcs, checking them with [`validate`](Self::validate)
    pub fn new(arcs: &[u64]) -> CodecResult<Self> {
        let ret = Self::from_arcs(arcs);
        ret.validate()?;
        Ok(ret)
    }

    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    /// Checks that there are at least two arcs, that the first is 0, 1 or 2,
    /// and that the second is at most 39 unless the first is 2
    ///
    /// # Errors
    ///
    /// Fails with `InvalidValue` describing the first violated condition.
    pub fn validate(&self) -> CodecResult<()> {
        match *self.arcs {
            [] | [_] => Err(CodecError::bad_value("OBJECT IDENTIFIER", "fewer than two arcs")),
            [arc0, _, ..] if arc0 > 2 => Err(CodecError::bad_value("OBJECT IDENTIFIER", "first arc exceeds 2")),
            [arc0, arc1, ..] if arc0 < 2 && arc1 > 39 => {
                Err(CodecError::bad_value("OBJECT IDENTIFIER", "second arc exceeds 39"))
            }
            [_, arc1, ..] if arc1 > u64::MAX - 80 => {
                Err(CodecError::bad_value("OBJECT IDENTIFIER", "second arc too large"))
            }
            _ => Ok(()),
        }
    }
}

fn write_subidentifier<U: Target>(value: u64, buf: &mut U) -> usize {
    let mut groups = [0u8; 10];
    let mut start = groups.len();
    let mut rest = value;
    loop {
        start -= 1;
        let continuation = if start == groups.len() - 1 { 0x00 } else { 0x80 };
        groups[start] = (rest & 0x7f) as u8 | continuation;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    buf.push_all(&groups[start..])
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut arcs = self.arcs.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{first}")?;
        }
        for arc in arcs {
            write!(f, ".{arc}")?;
        }
        Ok(())
    }
}

impl Debug for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectIdentifier({self})")
    }
}

impl FromStr for ObjectIdentifier {
    type Err = CodecError;

    /// Parses dotted notation, e.g. `"1.2.840.113549"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s
            .split('.')
            .map(|arc| {
                arc.parse::<u64>()
                    .map_err(|_| CodecError::bad_value("OBJECT IDENTIFIER", "malformed dotted notation"))
            })
            .collect::<CodecResult<Vec<u64>>>()?;
        Self::new(&arcs)
    }
}

super::universal!(ObjectIdentifier, primitive number::OBJECT_IDENTIFIER);

impl Encode for ObjectIdentifier {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        self.validate()?;
        let (first, rest) = self.arcs.split_at(2);
        let mut n = write_subidentifier(first[0] * 40 + first[1], buf);
        for &arc in rest {
            n += write_subidentifier(arc, buf);
        }
        Ok(n)
    }
}

impl Decode for ObjectIdentifier {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let offset = p.offset();
        let bytes = p.consume_rest()?;
        if bytes.is_empty() {
            return Err(CodecError::bad_content(offset, "OBJECT IDENTIFIER", "empty content"));
        }
        let mut arcs = Storage::new();
        let mut value: u64 = 0;
        let mut at_start = true;
        for (ix, &byte) in bytes.iter().enumerate() {
            if at_start && byte == 0x80 {
                return Err(CodecError::bad_content(
                    offset + ix,
                    "OBJECT IDENTIFIER",
                    "subidentifier with leading 0x80 octet",
                ));
            }
            if value > u64::MAX >> 7 {
                return Err(CodecError::out_of_range(offset + ix, "u64 arc"));
            }
            value = value << 7 | u64::from(byte & 0x7f);
            at_start = byte & 0x80 == 0;
            if at_start {
                if arcs.is_empty() {
                    let arc0 = (value / 40).min(2);
                    arcs.push(arc0);
                    arcs.push(value - arc0 * 40);
                } else {
                    arcs.push(value);
                }
                value = 0;
            }
        }
        if !at_start {
            return Err(CodecError::bad_content(
                offset + bytes.len() - 1,
                "OBJECT IDENTIFIER",
                "unterminated subidentifier",
            ));
        }
        Ok(Self { arcs })
    }
}
