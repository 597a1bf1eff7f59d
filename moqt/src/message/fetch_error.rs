use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Sent by the publisher to reject a Fetch.
#[derive(Clone, Debug)]
pub struct FetchError {
    /// The id of the FETCH this message is replying to.
    pub subscribe_id: u64,

    /// An error code.
    pub error_code: u64,

    /// The reason for the rejection.
    pub reason_phrase: ReasonPhrase,
}

impl Decode for FetchError {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        let error_code = u64::decode(r)?;
        let reason_phrase = ReasonPhrase::decode(r)?;

        Ok(Self {
            subscribe_id,
            error_code,
            reason_phrase,
        })
    }
}

impl Encode for FetchError {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)?;
        self.error_code.encode(w)?;
        self.reason_phrase.encode(w)?;

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

        let msg = FetchError {
            subscribe_id: 11,
            error_code: 0x4,
            reason_phrase: ReasonPhrase("no such track".to_string()),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = FetchError::decode(&mut buf).unwrap();
        assert_eq!(decoded.subscribe_id, msg.subscribe_id);
        assert_eq!(decoded.error_code, msg.error_code);
    }
}
