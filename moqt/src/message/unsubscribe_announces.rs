use crate::coding::{Decode, DecodeError, Encode, EncodeError, TrackNamespace};

/// Sent by the subscriber to withdraw interest in a namespace prefix.
#[derive(Clone, Debug)]
pub struct UnsubscribeAnnounces {
    /// The namespace prefix being withdrawn.
    pub namespace_prefix: TrackNamespace,
}

impl Decode for UnsubscribeAnnounces {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let namespace_prefix = TrackNamespace::decode(r)?;
        Ok(Self { namespace_prefix })
    }
}

impl Encode for UnsubscribeAnnounces {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.namespace_prefix.encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = UnsubscribeAnnounces {
            namespace_prefix: TrackNamespace::from_utf8_path("live"),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = UnsubscribeAnnounces::decode(&mut buf).unwrap();
        assert_eq!(decoded.namespace_prefix, msg.namespace_prefix);
    }
}
