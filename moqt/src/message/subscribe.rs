use crate::coding::{
    Decode, DecodeError, Encode, EncodeError, Location, Params, TrackNamespace,
};
use crate::message::{FilterType, GroupOrder};

/// Sent by the subscriber to request all future objects for a track.
///
/// Objects will use the provided `track_alias` instead of the full track
/// name, to save bytes.
#[derive(Clone, Debug)]
pub struct Subscribe {
    /// An id for this subscription, unique for the session.
    pub subscribe_id: u64,

    /// The short alias objects will reference this track by.
    pub track_alias: u64,

    /// The track namespace.
    pub track_namespace: TrackNamespace,

    /// The track name.
    pub track_name: String,

    /// Subscriber priority, where **smaller** values are sent first.
    pub subscriber_priority: u8,

    /// The order groups should be delivered in.
    pub group_order: GroupOrder,

    /// Which range of the track is requested.
    pub filter_type: FilterType,

    /// The starting location, present for the absolute filters.
    pub start: Option<Location>,

    /// The final group, present for AbsoluteRange only.
    pub end_group: Option<u64>,

    /// Optional parameters.
    pub params: Params,
}

impl Decode for Subscribe {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        let track_alias = u64::decode(r)?;
        let track_namespace = TrackNamespace::decode(r)?;
        let track_name = String::decode(r)?;
        let subscriber_priority = u8::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let filter_type = FilterType::decode(r)?;

        let start = match filter_type {
            FilterType::AbsoluteStart | FilterType::AbsoluteRange => Some(Location::decode(r)?),
            _ => None,
        };
        let end_group = match filter_type {
            FilterType::AbsoluteRange => Some(u64::decode(r)?),
            _ => None,
        };

        let params = Params::decode(r)?;

        Ok(Self {
            subscribe_id,
            track_alias,
            track_namespace,
            track_name,
            subscriber_priority,
            group_order,
            filter_type,
            start,
            end_group,
            params,
        })
    }
}

impl Encode for Subscribe {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)?;
        self.track_alias.encode(w)?;
        self.track_namespace.encode(w)?;
        self.track_name.encode(w)?;
        self.subscriber_priority.encode(w)?;
        self.group_order.encode(w)?;
        self.filter_type.encode(w)?;

        if matches!(
            self.filter_type,
            FilterType::AbsoluteStart | FilterType::AbsoluteRange
        ) {
            match &self.start {
                Some(start) => start.encode(w)?,
                None => return Err(EncodeError::MissingField("Start".to_string())),
            }
        }
        if self.filter_type == FilterType::AbsoluteRange {
            match self.end_group {
                Some(end_group) => end_group.encode(w)?,
                None => return Err(EncodeError::MissingField("EndGroup".to_string())),
            }
        }

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

        let msg = Subscribe {
            subscribe_id: 1,
            track_alias: 1,
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
            track_name: "track".to_string(),
            subscriber_priority: 128,
            group_order: GroupOrder::Ascending,
            filter_type: FilterType::LatestGroup,
            start: None,
            end_group: None,
            params: Params::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = Subscribe::decode(&mut buf).unwrap();
        assert_eq!(decoded.subscribe_id, msg.subscribe_id);
        assert_eq!(decoded.track_namespace, msg.track_namespace);
        assert_eq!(decoded.track_name, msg.track_name);
        assert_eq!(decoded.filter_type, msg.filter_type);
        assert!(decoded.start.is_none());
    }

    #[test]
    fn encode_decode_range() {
        let mut buf = BytesMut::new();

        let msg = Subscribe {
            subscribe_id: 2,
            track_alias: 2,
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
            track_name: "track".to_string(),
            subscriber_priority: 0,
            group_order: GroupOrder::Descending,
            filter_type: FilterType::AbsoluteRange,
            start: Some(Location::new(10, 0)),
            end_group: Some(20),
            params: Params::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = Subscribe::decode(&mut buf).unwrap();
        assert_eq!(decoded.start, Some(Location::new(10, 0)));
        assert_eq!(decoded.end_group, Some(20));
    }

    #[test]
    fn encode_missing_start() {
        let mut buf = BytesMut::new();

        let msg = Subscribe {
            subscribe_id: 3,
            track_alias: 3,
            track_namespace: TrackNamespace::from_utf8_path("live/test"),
            track_name: "track".to_string(),
            subscriber_priority: 128,
            group_order: GroupOrder::Ascending,
            filter_type: FilterType::AbsoluteStart,
            start: None,
            end_group: None,
            params: Params::default(),
        };
        let encoded = msg.encode(&mut buf);
        assert!(matches!(encoded.unwrap_err(), EncodeError::MissingField(_)));
    }
}
