use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::conv::target::Target;
use crate::conv::{Asn1Type, Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::storage::Storage;
use crate::tag::{apply_mode, number, TagMode, TagPlan};

use super::SetOf;

/// DER ordering of SET OF element encodings
///
/// Encodings compare as octet strings, the shorter being padded at its end
/// with zero octets.
pub fn canonical_order(a: &[u8], b: &[u8]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|ix| (a.get(ix).copied().unwrap_or(0), b.get(ix).copied().unwrap_or(0)))
        .find(|(x, y)| x != y)
        .map_or(Ordering::Equal, |(x, y)| x.cmp(&y))
}

/// Multiset equality: every element of one side is matched by a distinct
/// equal element of the other
impl<T: PartialEq, const N: usize, K: TagMode> PartialEq for SetOf<T, N, K> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut matched = vec![false; other.len()];
        self.iter().all(|item| {
            let found = other
                .iter()
                .zip(matched.iter_mut())
                .find(|(candidate, used)| !**used && *candidate == item);
            match found {
                Some((_, used)) => {
                    *used = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl<T: Eq, const N: usize, K: TagMode> Eq for SetOf<T, N, K> {}

impl<T: Hash, const N: usize, K: TagMode> Hash for SetOf<T, N, K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = self.iter().fold(0u64, |acc, item| {
            let mut hasher = DefaultHasher::new();
            item.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        });
        state.write_usize(self.len());
        state.write_u64(combined);
    }
}

impl<T, const N: usize, K: TagMode> Asn1Type for SetOf<T, N, K> {
    const TAGS: TagPlan = apply_mode::<K>(TagPlan::constructed(number::SET));
}

impl<T: Encode, const N: usize, K: TagMode> Encode for SetOf<T, N, K> {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        if !M::IS_DER || self.len() < 2 {
            let mut n = 0;
            for item in self.iter() {
                n += item.write_to::<M, U>(buf)?;
            }
            return Ok(n);
        }
        let mut encodings = self
            .iter()
            .map(|item| item.encode_to_vec::<M>())
            .collect::<CodecResult<Vec<Vec<u8>>>>()?;
        encodings.sort_by(|a, b| canonical_order(a, b));
        Ok(encodings.iter().map(|enc| buf.push_all(enc)).sum())
    }

    fn content_len<M: Mode>(&self) -> CodecResult<usize> {
        self.iter().map(|item| item.encoded_len::<M>()).sum()
    }
}

impl<T: Decode, const N: usize, K: TagMode> Decode for SetOf<T, N, K> {
    /// Under DER, elements out of canonical order are rejected
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let base = p.offset();
        let content = if M::IS_DER { p.peek().to_vec() } else { Vec::new() };
        let mut items = Storage::new();
        let mut prev: Option<(usize, usize)> = None;
        while p.remainder() > 0 {
            let start = p.offset();
            items.push(T::parse::<M, P>(p)?);
            let span = (start - base, p.offset() - base);
            if let Some((lo, hi)) = prev.filter(|_| M::IS_DER) {
                if canonical_order(&content[lo..hi], &content[span.0..span.1]) == Ordering::Greater {
                    return Err(CodecError::bad_content(start, "SET OF", "elements not in canonical order"));
                }
            }
            prev = Some(span);
        }
        Ok(Self {
            items,
            _mode: std::marker::PhantomData,
        })
    }
}
