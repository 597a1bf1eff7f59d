use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent by the subscriber when it would exceed the peer's maximum
/// subscribe id.
#[derive(Clone, Debug)]
pub struct SubscribesBlocked {
    /// The maximum the subscriber is currently blocked on.
    pub maximum: u64,
}

impl Decode for SubscribesBlocked {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let maximum = u64::decode(r)?;
        Ok(Self { maximum })
    }
}

impl Encode for SubscribesBlocked {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.maximum.encode(w)
    }
}
