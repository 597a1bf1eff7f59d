use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Which range of a track a Subscribe requests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterType {
    LatestGroup = 0x1,
    LatestObject = 0x2,
    AbsoluteStart = 0x3,
    AbsoluteRange = 0x4,
}

impl Encode for FilterType {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        let val = *self as u64;
        val.encode(w)?;
        Ok(())
    }
}

impl Decode for FilterType {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        match u64::decode(r)? {
            0x1 => Ok(Self::LatestGroup),
            0x2 => Ok(Self::LatestObject),
            0x3 => Ok(Self::AbsoluteStart),
            0x4 => Ok(Self::AbsoluteRange),
            _ => Err(DecodeError::InvalidFilterType),
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

        for ft in [
            FilterType::LatestGroup,
            FilterType::LatestObject,
            FilterType::AbsoluteStart,
            FilterType::AbsoluteRange,
        ] {
            ft.encode(&mut buf).unwrap();
            assert_eq!(buf.to_vec(), vec![ft as u8]);
            let decoded = FilterType::decode(&mut buf).unwrap();
            assert_eq!(decoded, ft);
        }
    }

    #[test]
    fn decode_bad_value() {
        let mut buf = Bytes::from_static(&[0x05]);
        let result = FilterType::decode(&mut buf);
        assert!(matches!(result, Err(DecodeError::InvalidFilterType)));
    }
}
