use crate::coding::{Decode, DecodeError, Encode, EncodeError, Params, TrackNamespace};

/// Sent by the publisher to declare it will serve a namespace.
#[derive(Clone, Debug)]
pub struct Announce {
    /// The track namespace.
    pub track_namespace: TrackNamespace,

    /// Optional parameters.
    pub params: Params,
}

impl Decode for Announce {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        let params = Params::decode(r)?;

        Ok(Self {
            track_namespace,
            params,
        })
    }
}

impl Encode for Announce {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)?;
        self.params.encode(w)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::ParamType;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let mut params = Params::new();
        params.set(ParamType::AuthorizationInfo, b"auth-token-123".to_vec());

        let msg = Announce {
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
            params,
        };
        msg.encode(&mut buf).unwrap();
        let decoded = Announce::decode(&mut buf).unwrap();
        assert_eq!(decoded.track_namespace, msg.track_namespace);
        assert_eq!(decoded.params, msg.params);
    }
}
