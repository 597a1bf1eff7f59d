use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Sent by the publisher to cleanly terminate a subscription.
#[derive(Clone, Debug)]
pub struct SubscribeDone {
    /// The id of the subscription being terminated.
    pub subscribe_id: u64,

    /// The status code indicating why the subscription ended.
    pub status_code: u64,

    /// The number of data streams the publisher opened for this subscription.
    pub stream_count: u64,

    /// The reason the subscription ended.
    pub reason: ReasonPhrase,
}

impl Decode for SubscribeDone {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        let status_code = u64::decode(r)?;
        let stream_count = u64::decode(r)?;
        let reason = ReasonPhrase::decode(r)?;

        Ok(Self {
            subscribe_id,
            status_code,
            stream_count,
            reason,
        })
    }
}

impl Encode for SubscribeDone {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)?;
        self.status_code.encode(w)?;
        self.stream_count.encode(w)?;
        self.reason.encode(w)?;

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

        let msg = SubscribeDone {
            subscribe_id: 12345,
            status_code: 0x2,
            stream_count: 2,
            reason: ReasonPhrase("track ended".to_string()),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = SubscribeDone::decode(&mut buf).unwrap();
        assert_eq!(decoded.subscribe_id, msg.subscribe_id);
        assert_eq!(decoded.status_code, msg.status_code);
        assert_eq!(decoded.stream_count, msg.stream_count);
        assert_eq!(decoded.reason, msg.reason);
    }
}
