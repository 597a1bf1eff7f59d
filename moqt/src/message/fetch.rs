use crate::coding::{
    Decode, DecodeError, Encode, EncodeError, Location, Params, TrackNamespace,
};
use crate::message::GroupOrder;

/// Sent by the subscriber to request a range of a track's past objects.
#[derive(Clone, Debug)]
pub struct Fetch {
    /// An id for this request, drawn from the same space as Subscribe ids.
    pub subscribe_id: u64,

    /// Subscriber priority, where **smaller** values are sent first.
    pub subscriber_priority: u8,

    /// The order groups should be delivered in.
    pub group_order: GroupOrder,

    /// The track namespace.
    pub track_namespace: TrackNamespace,

    /// The track name.
    pub track_name: String,

    /// The first location requested, inclusive.
    pub start: Location,

    /// The last location requested, inclusive.
    pub end: Location,

    /// Optional parameters.
    pub params: Params,
}

impl Decode for Fetch {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        let subscriber_priority = u8::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let track_namespace = TrackNamespace::decode(r)?;
        let track_name = String::decode(r)?;
        let start = Location::decode(r)?;
        let end = Location::decode(r)?;
        let params = Params::decode(r)?;

        Ok(Self {
            subscribe_id,
            subscriber_priority,
            group_order,
            track_namespace,
            track_name,
            start,
            end,
            params,
        })
    }
}

impl Encode for Fetch {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)?;
        self.subscriber_priority.encode(w)?;
        self.group_order.encode(w)?;
        self.track_namespace.encode(w)?;
        self.track_name.encode(w)?;
        self.start.encode(w)?;
        self.end.encode(w)?;
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

        let msg = Fetch {
            subscribe_id: 11,
            subscriber_priority: 128,
            group_order: GroupOrder::Ascending,
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
            track_name: "track".to_string(),
            start: Location::new(0, 0),
            end: Location::new(5, 100),
            params: Params::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = Fetch::decode(&mut buf).unwrap();
        assert_eq!(decoded.subscribe_id, msg.subscribe_id);
        assert_eq!(decoded.start, msg.start);
        assert_eq!(decoded.end, msg.end);
    }
}
