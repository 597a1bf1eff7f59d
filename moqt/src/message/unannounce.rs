use crate::coding::{Decode, DecodeError, Encode, EncodeError, TrackNamespace};

/// Sent by the publisher to withdraw a previously announced namespace.
#[derive(Clone, Debug)]
pub struct Unannounce {
    /// The namespace being withdrawn.
    pub track_namespace: TrackNamespace,
}

impl Decode for Unannounce {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        Ok(Self { track_namespace })
    }
}

impl Encode for Unannounce {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)
    }
}
