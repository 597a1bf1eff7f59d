use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase, TrackNamespace};

/// Sent by the subscriber to reject an Announce.
#[derive(Clone, Debug)]
pub struct AnnounceError {
    /// The namespace being rejected.
    pub track_namespace: TrackNamespace,

    /// An error code.
    pub error_code: u64,

    /// The reason for the rejection.
    pub reason_phrase: ReasonPhrase,
}

impl Decode for AnnounceError {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        let error_code = u64::decode(r)?;
        let reason_phrase = ReasonPhrase::decode(r)?;

        Ok(Self {
            track_namespace,
            error_code,
            reason_phrase,
        })
    }
}

impl Encode for AnnounceError {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)?;
        self.error_code.encode(w)?;
        self.reason_phrase.encode(w)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = AnnounceError {
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
            error_code: 0x2,
            reason_phrase: ReasonPhrase("unauthorized".to_string()),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = AnnounceError::decode(&mut buf).unwrap();
        assert_eq!(decoded.track_namespace, msg.track_namespace);
        assert_eq!(decoded.error_code, msg.error_code);
        assert_eq!(decoded.reason_phrase, msg.reason_phrase);
    }
}
