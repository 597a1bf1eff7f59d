use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// The first varint on every unidirectional data stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataStreamType {
    SubgroupHeader = 0x4,
    FetchHeader = 0x5,
}

impl Encode for DataStreamType {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        let val = *self as u64;
        val.encode(w)?;
        Ok(())
    }
}

impl Decode for DataStreamType {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        match u64::decode(r)? {
            0x4 => Ok(Self::SubgroupHeader),
            0x5 => Ok(Self::FetchHeader),
            _ => Err(DecodeError::InvalidStreamType),
        }
    }
}
