use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// The order groups are delivered in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupOrder {
    Publisher = 0x0,
    Ascending = 0x1,
    Descending = 0x2,
}

impl Encode for GroupOrder {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        let val = *self as u8;
        val.encode(w)?;
        Ok(())
    }
}

impl Decode for GroupOrder {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        match u8::decode(r)? {
            0x0 => Ok(Self::Publisher),
            0x1 => Ok(Self::Ascending),
            0x2 => Ok(Self::Descending),
            _ => Err(DecodeError::InvalidGroupOrder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        for go in [
            GroupOrder::Publisher,
            GroupOrder::Ascending,
            GroupOrder::Descending,
        ] {
            go.encode(&mut buf).unwrap();
            assert_eq!(buf.to_vec(), vec![go as u8]);
            let decoded = GroupOrder::decode(&mut buf).unwrap();
            assert_eq!(decoded, go);
        }
    }

    #[test]
    fn decode_bad_value() {
        let mut buf = Bytes::from_static(&[0x03]);
        let result = GroupOrder::decode(&mut buf);
        assert!(matches!(result, Err(DecodeError::InvalidGroupOrder)));
    }
}
