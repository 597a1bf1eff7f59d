use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, Params};
use crate::message::GroupOrder;

/// Sent by the publisher to accept a Fetch.
#[derive(Clone, Debug)]
pub struct FetchOk {
    /// The id of the FETCH this message is replying to.
    pub subscribe_id: u64,

    /// The order groups will be delivered in.
    pub group_order: GroupOrder,

    /// Whether the range extends to the end of the track.
    pub end_of_track: bool,

    /// The largest location that will actually be delivered.
    pub largest: Location,

    /// Optional parameters.
    pub params: Params,
}

impl Decode for FetchOk {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let end_of_track = bool::decode(r)?;
        let largest = Location::decode(r)?;
        let params = Params::decode(r)?;

        Ok(Self {
            subscribe_id,
            group_order,
            end_of_track,
            largest,
            params,
        })
    }
}

impl Encode for FetchOk {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)?;
        self.group_order.encode(w)?;
        self.end_of_track.encode(w)?;
        self.largest.encode(w)?;
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

        let msg = FetchOk {
            subscribe_id: 11,
            group_order: GroupOrder::Ascending,
            end_of_track: false,
            largest: Location::new(5, 100),
            params: Params::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = FetchOk::decode(&mut buf).unwrap();
        assert_eq!(decoded.subscribe_id, msg.subscribe_id);
        assert_eq!(decoded.largest, msg.largest);
    }
}
