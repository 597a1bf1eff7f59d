use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, Params};
use crate::message::GroupOrder;

/// Sent by the publisher to accept a Subscribe.
#[derive(Clone, Debug)]
pub struct SubscribeOk {
    /// The id of the SUBSCRIBE this message is replying to.
    pub subscribe_id: u64,

    /// Time in milliseconds after which the subscription is no longer valid.
    /// Zero means it does not expire.
    pub expires: u64,

    /// The order groups will be delivered in.
    pub group_order: GroupOrder,

    /// Whether any content exists for this track yet.
    pub content_exists: bool,

    /// The largest location available, present iff content exists.
    pub largest: Option<Location>,

    /// Optional parameters.
    pub params: Params,
}

impl Decode for SubscribeOk {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        let expires = u64::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let content_exists = bool::decode(r)?;
        let largest = match content_exists {
            true => Some(Location::decode(r)?),
            false => None,
        };
        let params = Params::decode(r)?;

        Ok(Self {
            subscribe_id,
            expires,
            group_order,
            content_exists,
            largest,
            params,
        })
    }
}

impl Encode for SubscribeOk {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)?;
        self.expires.encode(w)?;
        self.group_order.encode(w)?;
        self.content_exists.encode(w)?;
        if self.content_exists {
            match &self.largest {
                Some(largest) => largest.encode(w)?,
                None => return Err(EncodeError::MissingField("Largest".to_string())),
            }
        }
        self.params.encode(w)?;

        Ok(())
    }
}
