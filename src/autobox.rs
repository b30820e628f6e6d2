//! Codecs for boxed values
//!
//! Recursive schema types are broken up with `Box<T>`, which is transparent
//! on the wire: it shares the tagging of `T` and delegates every codec
//! method, including CHOICE alternative selection, to it.

use crate::conv::target::Target;
use crate::conv::{Asn1Type, Decode, Encode};
use crate::error::CodecResult;
use crate::mode::Mode;
use crate::parse::Parser;
use crate::tag::{Tag, TagPlan};

impl<T: Asn1Type> Asn1Type for Box<T> {
    const TAGS: TagPlan = T::TAGS;
}

impl<T: Encode> Encode for Box<T> {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        self.as_ref().write_content::<M, U>(buf)
    }

    fn content_len<M: Mode>(&self) -> CodecResult<usize> {
        self.as_ref().content_len::<M>()
    }

    fn selected_tag(&self) -> Option<Tag> {
        self.as_ref().selected_tag()
    }
}

impl<T: Decode> Decode for Box<T> {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        T::parse_content::<M, P>(p).map(Box::new)
    }

    fn accepts_untagged(tag: Tag) -> bool {
        T::accepts_untagged(tag)
    }

    fn parse_untagged<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        T::parse_untagged::<M, P>(p).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex;
    use crate::prim::Integer;

    #[test]
    fn transparent() {
        let boxed = Box::new(Integer::from(-2));
        assert_eq!(boxed.to_der().unwrap(), hex!("0201fe"));
        assert_eq!(Box::<Integer>::from_der(&hex!("0201fe")), Ok(boxed));
    }
}
