use crate::coding::{Decode, DecodeError, Encode, EncodeError, TrackNamespace};

/// Sent by the subscriber to query the status of a track.
#[derive(Clone, Debug)]
pub struct TrackStatusRequest {
    /// The track namespace.
    pub track_namespace: TrackNamespace,

    /// The track name.
    pub track_name: String,
}

impl Decode for TrackStatusRequest {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        let track_name = String::decode(r)?;

        Ok(Self {
            track_namespace,
            track_name,
        })
    }
}

impl Encode for TrackStatusRequest {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)?;
        self.track_name.encode(w)?;

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

        let msg = TrackStatusRequest {
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
            track_name: "track".to_string(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = TrackStatusRequest::decode(&mut buf).unwrap();
        assert_eq!(decoded.track_namespace, msg.track_namespace);
        assert_eq!(decoded.track_name, msg.track_name);
    }
}
