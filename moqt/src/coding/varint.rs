// Based on the QUIC variable-length integer encoding.
// https://www.rfc-editor.org/rfc/rfc9000#section-16

use std::fmt;

use super::{Decode, DecodeError, Encode, EncodeError};

#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error("value out of range")]
pub struct BoundsExceeded;

/// An integer less than 2^62.
///
/// The two high bits of the first byte select the total length (1, 2, 4 or
/// 8 bytes); the remaining bits are the value, big-endian. Non-minimal
/// encodings are accepted on decode.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarInt(u64);

impl VarInt {
    pub const MAX: Self = Self((1 << 62) - 1);

    /// Create a VarInt without checking the value.
    pub const fn from_u32(v: u32) -> Self {
        Self(v as u64)
    }

    /// Extract the integer value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for VarInt {
    type Error = BoundsExceeded;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        if v <= Self::MAX.0 {
            Ok(Self(v))
        } else {
            Err(BoundsExceeded)
        }
    }
}

impl TryFrom<usize> for VarInt {
    type Error = BoundsExceeded;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        Self::try_from(v as u64)
    }
}

impl TryFrom<VarInt> for u32 {
    type Error = BoundsExceeded;

    fn try_from(v: VarInt) -> Result<Self, Self::Error> {
        u32::try_from(v.0).map_err(|_| BoundsExceeded)
    }
}

impl From<u32> for VarInt {
    fn from(v: u32) -> Self {
        Self(v as u64)
    }
}

impl From<VarInt> for u64 {
    fn from(v: VarInt) -> Self {
        v.0
    }
}

impl fmt::Display for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Decode for VarInt {
    fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
        Self::decode_remaining(r, 1)?;

        let first = r.get_u8();
        let size = 1usize << (first >> 6);
        let mut value = (first & 0b0011_1111) as u64;

        Self::decode_remaining(r, size - 1)?;
        for _ in 1..size {
            value = (value << 8) | r.get_u8() as u64;
        }

        Ok(Self(value))
    }
}

impl Encode for VarInt {
    /// Encode with the minimum number of bytes.
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        let v = self.0;
        if v < (1 << 6) {
            Self::encode_remaining(w, 1)?;
            w.put_u8(v as u8);
        } else if v < (1 << 14) {
            Self::encode_remaining(w, 2)?;
            w.put_u16((0b01u16 << 14) | v as u16);
        } else if v < (1 << 30) {
            Self::encode_remaining(w, 4)?;
            w.put_u32((0b10u32 << 30) | v as u32);
        } else if v < (1 << 62) {
            Self::encode_remaining(w, 8)?;
            w.put_u64((0b11u64 << 62) | v);
        } else {
            return Err(BoundsExceeded.into());
        }

        Ok(())
    }
}

impl Decode for u64 {
    fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
        Ok(VarInt::decode(r)?.into_inner())
    }
}

impl Encode for u64 {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        VarInt::try_from(*self)?.encode(w)
    }
}

impl Decode for usize {
    fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
        let v = VarInt::decode(r)?.into_inner();
        usize::try_from(v).map_err(|_| DecodeError::from(BoundsExceeded))
    }
}

impl Encode for usize {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        VarInt::try_from(*self)?.encode(w)
    }
}
