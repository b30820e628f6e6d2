use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::tag::number;

/// The NULL value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct Null;

fn parse_empty<P: Parser>(p: &mut P) -> CodecResult<()> {
    if p.remainder() != 0 {
        return Err(CodecError::bad_content(p.offset(), "NULL", "non-empty content"));
    }
    Ok(())
}

super::universal!(Null, primitive number::NULL);
super::universal!((), primitive number::NULL);

impl Encode for Null {
    fn write_content<M: Mode, U: Target>(&self, _: &mut U) -> CodecResult<usize> {
        Ok(0)
    }
}

impl Decode for Null {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        parse_empty(p).map(|()| Null)
    }
}

impl Encode for () {
    fn write_content<M: Mode, U: Target>(&self, _: &mut U) -> CodecResult<usize> {
        Ok(0)
    }
}

impl Decode for () {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        parse_empty(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv::encode;
    use crate::error::ErrorKind;
    use crate::hex;
    use crate::mode::{Ber, Der};

    #[test]
    fn two_byte_tlv() {
        let mut out = [0xffu8; 2];
        let res = encode::<Der, _>(&mut out, &Null);
        assert!(res.success);
        assert_eq!(res.bytes_written, 2);
        assert_eq!(out, [0x05, 0x00]);
        assert_eq!(().to_ber().unwrap(), hex!("0500"));
    }

    #[test]
    fn content_must_be_empty() {
        assert_eq!(Null::decode_all::<Ber>(&hex!("0500")), Ok(Null));
        assert_eq!(
            Null::decode_all::<Ber>(&hex!("050100")).unwrap_err().kind(),
            ErrorKind::InvalidEncoding
        );
        assert_eq!(<()>::from_der(&hex!("0500")), Ok(()));
    }
}
