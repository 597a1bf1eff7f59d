use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, Params};

/// Sent by the subscriber to adjust an active subscription in place.
#[derive(Clone, Debug)]
pub struct SubscribeUpdate {
    /// The id of the subscription being updated.
    pub subscribe_id: u64,

    /// The new starting location.
    pub start: Location,

    /// The new final group.
    pub end_group: u64,

    /// The new subscriber priority.
    pub subscriber_priority: u8,

    /// Optional parameters.
    pub params: Params,
}

impl Decode for SubscribeUpdate {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        let start = Location::decode(r)?;
        let end_group = u64::decode(r)?;
        let subscriber_priority = u8::decode(r)?;
        let params = Params::decode(r)?;

        Ok(Self {
            subscribe_id,
            start,
            end_group,
            subscriber_priority,
            params,
        })
    }
}

impl Encode for SubscribeUpdate {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)?;
        self.start.encode(w)?;
        self.end_group.encode(w)?;
        self.subscriber_priority.encode(w)?;
        self.params.encode(w)?;

        Ok(())
    }
}
