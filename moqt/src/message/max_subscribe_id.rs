use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Raises the largest subscribe id the peer may use.
///
/// The value is only allowed to grow over the session's lifetime.
#[derive(Clone, Debug)]
pub struct MaxSubscribeId {
    pub id: u64,
}

impl Decode for MaxSubscribeId {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let id = u64::decode(r)?;
        Ok(Self { id })
    }
}

impl Encode for MaxSubscribeId {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.id.encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = MaxSubscribeId { id: 1000 };
        msg.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x43, 0xe8]);
        let decoded = MaxSubscribeId::decode(&mut buf).unwrap();
        assert_eq!(decoded.id, msg.id);
    }
}
