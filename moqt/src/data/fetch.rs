use crate::coding::{Decode, DecodeError, Encode, EncodeError, Extensions};
use crate::data::ObjectStatus;

/// The header decoded once at the start of a fetch stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchHeader {
    /// The id of the FETCH this stream answers.
    pub subscribe_id: u64,
}

impl Decode for FetchHeader {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let subscribe_id = u64::decode(r)?;
        Ok(Self { subscribe_id })
    }
}

impl Encode for FetchHeader {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.subscribe_id.encode(w)
    }
}

/// A single object within a fetch stream.
///
/// Unlike a subgroup object it names its own group and subgroup, since a
/// fetch stream spans the whole requested range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchObject {
    /// The group sequence number.
    pub group_id: u64,

    /// The subgroup sequence number.
    pub subgroup_id: u64,

    /// The object sequence number.
    pub object_id: u64,

    /// Publisher priority, where **smaller** values are sent first.
    pub publisher_priority: u8,

    /// Extension headers.
    pub extensions: Extensions,

    /// The object status; Normal iff the payload is non-empty.
    pub status: ObjectStatus,

    /// The payload.
    pub payload: bytes::Bytes,
}

impl Decode for FetchObject {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let group_id = u64::decode(r)?;
        let subgroup_id = u64::decode(r)?;
        let object_id = u64::decode(r)?;
        let publisher_priority = u8::decode(r)?;
        let extensions = Extensions::decode(r)?;
        let payload_length = usize::decode(r)?;

        let (status, payload) = match payload_length {
            0 => (ObjectStatus::decode(r)?, bytes::Bytes::new()),
            _ => {
                Self::decode_remaining(r, payload_length)?;
                (ObjectStatus::Normal, r.copy_to_bytes(payload_length))
            }
        };

        Ok(Self {
            group_id,
            subgroup_id,
            object_id,
            publisher_priority,
            extensions,
            status,
            payload,
        })
    }
}

impl Encode for FetchObject {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.group_id.encode(w)?;
        self.subgroup_id.encode(w)?;
        self.object_id.encode(w)?;
        self.publisher_priority.encode(w)?;
        self.extensions.encode(w)?;

        if self.status == ObjectStatus::Normal && !self.payload.is_empty() {
            self.payload.len().encode(w)?;
            Self::encode_remaining(w, self.payload.len())?;
            w.put_slice(&self.payload);
        } else {
            0usize.encode(w)?;
            self.status.encode(w)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode_header() {
        let mut buf = BytesMut::new();

        let header = FetchHeader { subscribe_id: 42 };
        header.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x2a]);
        let decoded = FetchHeader::decode(&mut buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn encode_decode_object() {
        let mut buf = BytesMut::new();

        let object = FetchObject {
            group_id: 1,
            subgroup_id: 2,
            object_id: 3,
            publisher_priority: 5,
            extensions: Extensions::new(),
            status: ObjectStatus::Normal,
            payload: Bytes::from_static(b"Sample payload"),
        };
        object.encode(&mut buf).unwrap();
        let decoded = FetchObject::decode(&mut buf).unwrap();
        assert_eq!(decoded, object);
    }

    #[test]
    fn encode_decode_status() {
        let mut buf = BytesMut::new();

        let object = FetchObject {
            group_id: 1,
            subgroup_id: 0,
            object_id: 9,
            publisher_priority: 128,
            extensions: Extensions::new(),
            status: ObjectStatus::EndOfTrack,
            payload: Bytes::new(),
        };
        object.encode(&mut buf).unwrap();
        let decoded = FetchObject::decode(&mut buf).unwrap();
        assert_eq!(decoded, object);
    }
}
