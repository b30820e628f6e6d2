use crate::conv::target::Target;
use crate::conv::{Asn1Type, Decode, Encode};
use crate::error::CodecResult;
use crate::mode::Mode;
use crate::parse::Parser;
use crate::storage::Storage;
use crate::tag::{apply_mode, number, TagMode, TagPlan};

use super::SequenceOf;

impl<T, const N: usize, K: TagMode> Asn1Type for SequenceOf<T, N, K> {
    const TAGS: TagPlan = apply_mode::<K>(TagPlan::constructed(number::SEQUENCE));
}

impl<T: Encode, const N: usize, K: TagMode> Encode for SequenceOf<T, N, K> {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        let mut n = 0;
        for item in self.iter() {
            n += item.write_to::<M, U>(buf)?;
        }
        Ok(n)
    }

    fn content_len<M: Mode>(&self) -> CodecResult<usize> {
        self.iter().map(|item| item.encoded_len::<M>()).sum()
    }
}

impl<T: PartialEq, const N: usize, K: TagMode> PartialEq for SequenceOf<T, N, K> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq, const N: usize, K: TagMode> Eq for SequenceOf<T, N, K> {}

impl<T: std::hash::Hash, const N: usize, K: TagMode> std::hash::Hash for SequenceOf<T, N, K> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.items.hash(state)
    }
}

impl<T: Decode, const N: usize, K: TagMode> Decode for SequenceOf<T, N, K> {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let mut items = Storage::new();
        while p.remainder() > 0 {
            items.push(T::parse::<M, P>(p)?);
        }
        Ok(Self {
            items,
            _mode: std::marker::PhantomData,
        })
    }
}
