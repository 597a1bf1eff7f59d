use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Sent by the publisher to reject a Subscribe.
#[derive(Clone, Debug)]
pub struct SubscribeError {
    /// The id of the SUBSCRIBE this message is replying to.
    pub subscribe_id: u64,

    /// An error code.
    pub error_code: u64,

    /// The reason for the rejection.
    pub reason_phrase: ReasonPhrase,

    /// The alias the subscriber tried to claim, returned so it can retry.
    pub track_alias: u64,
}

impl Decode for SubscribeError {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        let error_code = u64::decode(r)?;
        let reason_phrase = ReasonPhrase::decode(r)?;
        let track_alias = u64::decode(r)?;

        Ok(Self {
            subscribe_id,
            error_code,
            reason_phrase,
            track_alias,
        })
    }
}

impl Encode for SubscribeError {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)?;
        self.error_code.encode(w)?;
        self.reason_phrase.encode(w)?;
        self.track_alias.encode(w)?;

        Ok(())
    }
}
