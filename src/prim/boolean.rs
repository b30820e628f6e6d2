use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::tag::number;

super::universal!(bool, primitive number::BOOLEAN);

impl Encode for bool {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        Ok(buf.push_one(if *self { 0xff } else { 0x00 }))
    }
}

impl Decode for bool {
    /// BER accepts any nonzero octet as `true`; DER only `FF`
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let offset = p.offset();
        if p.remainder() != 1 {
            return Err(CodecError::bad_content(offset, "BOOLEAN", "content is not one octet"));
        }
        match p.consume_byte()? {
            0x00 => Ok(false),
            0xff => Ok(true),
            _ if M::IS_DER => Err(CodecError::bad_content(offset, "BOOLEAN", "non-canonical true")),
            _ => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hex;

    #[test]
    fn canonical_forms() {
        assert_eq!(true.to_der().unwrap(), hex!("0101ff"));
        assert_eq!(false.to_ber().unwrap(), hex!("010100"));
        assert_eq!(bool::from_der(&hex!("0101ff")), Ok(true));
        assert_eq!(bool::from_der(&hex!("010100")), Ok(false));
    }

    #[test]
    fn lenient_true_is_ber_only() {
        let bytes = hex!("010101");
        assert_eq!(bool::from_ber(&bytes), Ok(true));
        assert_eq!(bool::from_der(&bytes).unwrap_err().kind(), ErrorKind::InvalidEncoding);
    }

    #[test]
    fn wrong_length() {
        assert_eq!(bool::from_ber(&hex!("0100")).unwrap_err().kind(), ErrorKind::InvalidEncoding);
        assert_eq!(bool::from_ber(&hex!("0102ffff")).unwrap_err().kind(), ErrorKind::InvalidEncoding);
    }
}
