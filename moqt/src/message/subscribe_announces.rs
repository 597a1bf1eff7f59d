use crate::coding::{Decode, DecodeError, Encode, EncodeError, Params, TrackNamespace};

/// Sent by the subscriber to register interest in a namespace prefix.
///
/// While the registration lives, the peer forwards an Announce for every
/// matching namespace.
#[derive(Clone, Debug)]
pub struct SubscribeAnnounces {
    /// The namespace prefix.
    pub namespace_prefix: TrackNamespace,

    /// Optional parameters.
    pub params: Params,
}

impl Decode for SubscribeAnnounces {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let namespace_prefix = TrackNamespace::decode(r)?;
        let params = Params::decode(r)?;

        Ok(Self {
            namespace_prefix,
            params,
        })
    }
}

impl Encode for SubscribeAnnounces {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.namespace_prefix.encode(w)?;
        self.params.encode(w)?;

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

        let msg = SubscribeAnnounces {
            namespace_prefix: TrackNamespace::from_utf8_path("live"),
            params: Params::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = SubscribeAnnounces::decode(&mut buf).unwrap();
        assert_eq!(decoded.namespace_prefix, msg.namespace_prefix);
    }
}
