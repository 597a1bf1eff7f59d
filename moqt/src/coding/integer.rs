use super::{Decode, DecodeError, Encode, EncodeError};

impl Encode for u8 {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        Self::encode_remaining(w, 1)?;
        w.put_u8(*self);
        Ok(())
    }
}

impl Decode for u8 {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        Self::decode_remaining(r, 1)?;
        Ok(r.get_u8())
    }
}

impl Encode for u16 {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        Self::encode_remaining(w, 2)?;
        w.put_u16(*self);
        Ok(())
    }
}

impl Decode for u16 {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        Self::decode_remaining(r, 2)?;
        Ok(r.get_u16())
    }
}

impl Encode for bool {
    /// Encode a bool as a single byte.
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        Self::encode_remaining(w, 1)?;
        w.put_u8(*self as u8);
        Ok(())
    }
}

impl Decode for bool {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        match u8::decode(r)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(DecodeError::InvalidValue),
        }
    }
}
