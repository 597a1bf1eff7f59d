use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, TrackNamespace};

/// Track status codes carried in [TrackStatus].
pub mod track_status_code {
    /// The track is in progress and the last location is valid.
    pub const IN_PROGRESS: u64 = 0x0;
    /// The track does not exist.
    pub const DOES_NOT_EXIST: u64 = 0x1;
    /// The track has not yet begun; the last location is zero.
    pub const NOT_YET_BEGUN: u64 = 0x2;
    /// The track has finished; the last location is final.
    pub const FINISHED: u64 = 0x3;
    /// The responder is a relay without current information.
    pub const RELAY_UNAVAILABLE: u64 = 0x4;
}

/// Sent by the publisher in response to a TrackStatusRequest.
#[derive(Clone, Debug)]
pub struct TrackStatus {
    /// The track namespace.
    pub track_namespace: TrackNamespace,

    /// The track name.
    pub track_name: String,

    /// One of the [track_status_code] values.
    pub status_code: u64,

    /// The last location the publisher knows about.
    pub last: Location,
}

impl Decode for TrackStatus {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        let track_name = String::decode(r)?;
        let status_code = u64::decode(r)?;
        let last = Location::decode(r)?;

        Ok(Self {
            track_namespace,
            track_name,
            status_code,
            last,
        })
    }
}

impl Encode for TrackStatus {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)?;
        self.track_name.encode(w)?;
        self.status_code.encode(w)?;
        self.last.encode(w)?;

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

        let msg = TrackStatus {
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
            track_name: "track".to_string(),
            status_code: track_status_code::IN_PROGRESS,
            last: Location::new(10, 42),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = TrackStatus::decode(&mut buf).unwrap();
        assert_eq!(decoded.track_namespace, msg.track_namespace);
        assert_eq!(decoded.status_code, msg.status_code);
        assert_eq!(decoded.last, msg.last);
    }
}
