use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent by the subscriber to terminate a Subscribe.
///
/// The publisher is still expected to send a SubscribeDone before the slot
/// is freed.
#[derive(Clone, Debug)]
pub struct Unsubscribe {
    /// The id of the subscription being terminated.
    pub subscribe_id: u64,
}

impl Decode for Unsubscribe {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        Ok(Self { subscribe_id })
    }
}

impl Encode for Unsubscribe {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = Unsubscribe { subscribe_id: 7 };
        msg.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x07]);
        let decoded = Unsubscribe::decode(&mut buf).unwrap();
        assert_eq!(decoded.subscribe_id, msg.subscribe_id);
    }
}
