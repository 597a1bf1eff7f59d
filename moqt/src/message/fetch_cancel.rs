use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent by the subscriber to abandon an outstanding Fetch.
#[derive(Clone, Debug)]
pub struct FetchCancel {
    /// The id of the FETCH being cancelled.
    pub subscribe_id: u64,
}

impl Decode for FetchCancel {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        Ok(Self { subscribe_id })
    }
}

impl Encode for FetchCancel {
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

        let msg = FetchCancel { subscribe_id: 11 };
        msg.encode(&mut buf).unwrap();
        let decoded = FetchCancel::decode(&mut buf).unwrap();
        assert_eq!(decoded.subscribe_id, msg.subscribe_id);
    }
}
