use crate::coding::{Decode, DecodeError, Encode, EncodeError, TrackNamespace};

/// Sent by the subscriber to accept an Announce.
#[derive(Clone, Debug)]
pub struct AnnounceOk {
    /// The namespace being accepted.
    pub track_namespace: TrackNamespace,
}

impl Decode for AnnounceOk {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        Ok(Self { track_namespace })
    }
}

impl Encode for AnnounceOk {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = AnnounceOk {
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = AnnounceOk::decode(&mut buf).unwrap();
        assert_eq!(decoded.track_namespace, msg.track_namespace);
    }
}
