use crate::coding::{Decode, DecodeError, Encode, EncodeError, Extensions};
use crate::data::ObjectStatus;

/// The header decoded once at the start of a subgroup stream.
///
/// The `(track_alias, group_id, subgroup_id)` triple is fixed for the
/// stream's lifetime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubgroupHeader {
    /// The track alias.
    pub track_alias: u64,

    /// The group sequence number.
    pub group_id: u64,

    /// The subgroup sequence number.
    pub subgroup_id: u64,

    /// Publisher priority, where **smaller** values are sent first.
    pub publisher_priority: u8,
}

impl Decode for SubgroupHeader {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_alias = u64::decode(r)?;
        let group_id = u64::decode(r)?;
        let subgroup_id = u64::decode(r)?;
        let publisher_priority = u8::decode(r)?;

        Ok(Self {
            track_alias,
            group_id,
            subgroup_id,
            publisher_priority,
        })
    }
}

impl Encode for SubgroupHeader {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_alias.encode(w)?;
        self.group_id.encode(w)?;
        self.subgroup_id.encode(w)?;
        self.publisher_priority.encode(w)?;

        Ok(())
    }
}

/// A single object within a subgroup stream.
///
/// The decoded object carries either a payload or a non-normal status, never
/// both: a zero payload length on the wire means a status varint follows.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectHeader {
    /// The object sequence number, strictly increasing within the stream.
    pub object_id: u64,

    /// Extension headers.
    pub extensions: Extensions,

    /// The object status; Normal iff the payload is non-empty.
    pub status: ObjectStatus,

    /// The payload.
    pub payload: bytes::Bytes,
}

impl ObjectHeader {
    pub fn new(object_id: u64, payload: bytes::Bytes) -> Self {
        Self {
            object_id,
            extensions: Extensions::new(),
            status: ObjectStatus::Normal,
            payload,
        }
    }

    pub fn status(object_id: u64, status: ObjectStatus) -> Self {
        Self {
            object_id,
            extensions: Extensions::new(),
            status,
            payload: bytes::Bytes::new(),
        }
    }
}

impl Decode for ObjectHeader {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let object_id = u64::decode(r)?;
        let extensions = Extensions::decode(r)?;
        let payload_length = usize::decode(r)?;

        let (status, payload) = match payload_length {
            0 => (ObjectStatus::decode(r)?, bytes::Bytes::new()),
            _ => {
                // A length claiming more bytes than buffered is a short read,
                // not corruption.
                Self::decode_remaining(r, payload_length)?;
                (ObjectStatus::Normal, r.copy_to_bytes(payload_length))
            }
        };

        Ok(Self {
            object_id,
            extensions,
            status,
            payload,
        })
    }
}

impl Encode for ObjectHeader {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.object_id.encode(w)?;
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

        let header = SubgroupHeader {
            track_alias: 1,
            group_id: 0,
            subgroup_id: 0,
            publisher_priority: 255,
        };
        header.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x01, 0x00, 0x00, 0xff]);
        let decoded = SubgroupHeader::decode(&mut buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn encode_decode_object() {
        let mut buf = BytesMut::new();

        let mut extensions = Extensions::new();
        extensions.set_varint(0, 8).unwrap();
        extensions.set_bytes(1, vec![0xfa, 0xce, 0xb0, 0x0c]).unwrap();

        let object = ObjectHeader {
            object_id: 1,
            extensions,
            status: ObjectStatus::Normal,
            payload: Bytes::from_static(b"Hello World"),
        };
        object.encode(&mut buf).unwrap();
        let decoded = ObjectHeader::decode(&mut buf).unwrap();
        assert_eq!(decoded, object);
    }

    #[test]
    fn encode_decode_status() {
        let mut buf = BytesMut::new();

        let object = ObjectHeader::status(60, ObjectStatus::EndOfGroup);
        object.encode(&mut buf).unwrap();
        // object_id, no extensions, zero length, status
        assert_eq!(buf.to_vec(), vec![0x3c, 0x00, 0x00, 0x03]);
        let decoded = ObjectHeader::decode(&mut buf).unwrap();
        assert_eq!(decoded, object);
    }

    #[test]
    fn decode_short_payload() {
        let mut buf = BytesMut::new();

        let object = ObjectHeader::new(0, Bytes::from_static(b"0123456789"));
        object.encode(&mut buf).unwrap();

        // Cut the payload short; the decoder must report More, and the full
        // buffer must still decode.
        let mut partial = std::io::Cursor::new(&buf[..buf.len() - 4]);
        let err = ObjectHeader::decode(&mut partial).unwrap_err();
        assert!(matches!(err, DecodeError::More(4)));

        let decoded = ObjectHeader::decode(&mut buf).unwrap();
        assert_eq!(decoded, object);
    }
}
