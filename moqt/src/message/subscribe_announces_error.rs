use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase, TrackNamespace};

/// Sent by the publisher to reject a SubscribeAnnounces.
#[derive(Clone, Debug)]
pub struct SubscribeAnnouncesError {
    /// The namespace prefix being rejected.
    pub namespace_prefix: TrackNamespace,

    /// An error code.
    pub error_code: u64,

    /// The reason for the rejection.
    pub reason_phrase: ReasonPhrase,
}

impl Decode for SubscribeAnnouncesError {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let namespace_prefix = TrackNamespace::decode(r)?;
        let error_code = u64::decode(r)?;
        let reason_phrase = ReasonPhrase::decode(r)?;

        Ok(Self {
            namespace_prefix,
            error_code,
            reason_phrase,
        })
    }
}

impl Encode for SubscribeAnnouncesError {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.namespace_prefix.encode(w)?;
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

        let msg = SubscribeAnnouncesError {
            namespace_prefix: TrackNamespace::from_utf8_path("live"),
            error_code: 0x2,
            reason_phrase: ReasonPhrase("unauthorized".to_string()),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = SubscribeAnnouncesError::decode(&mut buf).unwrap();
        assert_eq!(decoded.namespace_prefix, msg.namespace_prefix);
        assert_eq!(decoded.error_code, msg.error_code);
    }
}
