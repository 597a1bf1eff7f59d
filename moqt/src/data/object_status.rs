use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// The status of an object, carried in place of a payload.
///
/// On the wire a zero payload length means a status varint follows instead
/// of bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjectStatus {
    Normal = 0x0,
    DoesNotExist = 0x1,
    EndOfGroup = 0x3,
    EndOfTrack = 0x4,
    EndOfSubgroup = 0x5,
}

impl Decode for ObjectStatus {
    fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
        match u64::decode(r)? {
            0x0 => Ok(Self::Normal),
            0x1 => Ok(Self::DoesNotExist),
            0x3 => Ok(Self::EndOfGroup),
            0x4 => Ok(Self::EndOfTrack),
            0x5 => Ok(Self::EndOfSubgroup),
            _ => Err(DecodeError::InvalidObjectStatus),
        }
    }
}

impl Encode for ObjectStatus {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        let val = *self as u64;
        val.encode(w)?;
        Ok(())
    }
}
