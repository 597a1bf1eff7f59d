use crate::coding::{Decode, DecodeError, Encode, EncodeError, Extensions};
use crate::data::ObjectStatus;

/// The first varint of every datagram.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DatagramType {
    ObjectDatagram = 0x1,
    ObjectDatagramStatus = 0x2,
}

impl Encode for DatagramType {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        let val = *self as u64;
        val.encode(w)?;
        Ok(())
    }
}

impl Decode for DatagramType {
    fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
        match u64::decode(r)? {
            0x1 => Ok(Self::ObjectDatagram),
            0x2 => Ok(Self::ObjectDatagramStatus),
            _ => Err(DecodeError::InvalidDatagramType),
        }
    }
}

/// A single object carried in a datagram.
///
/// The payload runs to the end of the datagram; there is no length prefix.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectDatagram {
    /// The track alias.
    pub track_alias: u64,

    /// The group sequence number.
    pub group_id: u64,

    /// The object sequence number.
    pub object_id: u64,

    /// Publisher priority, where **smaller** values are sent first.
    pub publisher_priority: u8,

    /// Extension headers.
    pub extensions: Extensions,

    /// The payload.
    pub payload: bytes::Bytes,
}

impl Decode for ObjectDatagram {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_alias = u64::decode(r)?;
        let group_id = u64::decode(r)?;
        let object_id = u64::decode(r)?;
        let publisher_priority = u8::decode(r)?;
        let extensions = Extensions::decode(r)?;
        let payload = r.copy_to_bytes(r.remaining());

        Ok(Self {
            track_alias,
            group_id,
            object_id,
            publisher_priority,
            extensions,
            payload,
        })
    }
}

impl Encode for ObjectDatagram {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        DatagramType::ObjectDatagram.encode(w)?;
        self.track_alias.encode(w)?;
        self.group_id.encode(w)?;
        self.object_id.encode(w)?;
        self.publisher_priority.encode(w)?;
        self.extensions.encode(w)?;
        Self::encode_remaining(w, self.payload.len())?;
        w.put_slice(&self.payload);

        Ok(())
    }
}

/// A status marker carried in a datagram, e.g. END_OF_GROUP.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectDatagramStatus {
    /// The track alias.
    pub track_alias: u64,

    /// The group sequence number.
    pub group_id: u64,

    /// The object sequence number.
    pub object_id: u64,

    /// Publisher priority, where **smaller** values are sent first.
    pub publisher_priority: u8,

    /// Extension headers.
    pub extensions: Extensions,

    /// The object status.
    pub status: ObjectStatus,
}

impl Decode for ObjectDatagramStatus {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_alias = u64::decode(r)?;
        let group_id = u64::decode(r)?;
        let object_id = u64::decode(r)?;
        let publisher_priority = u8::decode(r)?;
        let extensions = Extensions::decode(r)?;
        let status = ObjectStatus::decode(r)?;

        Ok(Self {
            track_alias,
            group_id,
            object_id,
            publisher_priority,
            extensions,
            status,
        })
    }
}

impl Encode for ObjectDatagramStatus {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        DatagramType::ObjectDatagramStatus.encode(w)?;
        self.track_alias.encode(w)?;
        self.group_id.encode(w)?;
        self.object_id.encode(w)?;
        self.publisher_priority.encode(w)?;
        self.extensions.encode(w)?;
        self.status.encode(w)?;

        Ok(())
    }
}

/// Either kind of datagram, decoded by its leading type varint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Datagram {
    Object(ObjectDatagram),
    Status(ObjectDatagramStatus),
}

impl Decode for Datagram {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        match DatagramType::decode(r)? {
            DatagramType::ObjectDatagram => Ok(Self::Object(ObjectDatagram::decode(r)?)),
            DatagramType::ObjectDatagramStatus => Ok(Self::Status(ObjectDatagramStatus::decode(r)?)),
        }
    }
}

impl Encode for Datagram {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        match self {
            Self::Object(datagram) => datagram.encode(w),
            Self::Status(datagram) => datagram.encode(w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode_object() {
        let mut buf = BytesMut::new();

        let mut extensions = Extensions::new();
        extensions
            .set_bytes(0x25, b"MOQT-TS: 1700000000000".to_vec())
            .unwrap();

        let datagram = ObjectDatagram {
            track_alias: 1,
            group_id: 0,
            object_id: 0,
            publisher_priority: 255,
            extensions,
            payload: Bytes::from(vec![b'X'; 1100]),
        };
        datagram.encode(&mut buf).unwrap();

        let decoded = match Datagram::decode(&mut buf).unwrap() {
            Datagram::Object(decoded) => decoded,
            Datagram::Status(_) => panic!("wrong datagram type"),
        };
        assert_eq!(decoded, datagram);

        // The extension value survives as a byte-string of length 22.
        match decoded.extensions.get(0x25) {
            Some(crate::coding::ExtensionValue::Bytes(bytes)) => assert_eq!(bytes.len(), 22),
            other => panic!("unexpected extension value: {:?}", other),
        }
    }

    #[test]
    fn encode_decode_status() {
        let mut buf = BytesMut::new();

        let datagram = ObjectDatagramStatus {
            track_alias: 1,
            group_id: 0,
            object_id: 60,
            publisher_priority: 255,
            extensions: Extensions::new(),
            status: ObjectStatus::EndOfGroup,
        };
        datagram.encode(&mut buf).unwrap();

        let decoded = match Datagram::decode(&mut buf).unwrap() {
            Datagram::Status(decoded) => decoded,
            Datagram::Object(_) => panic!("wrong datagram type"),
        };
        assert_eq!(decoded, datagram);
    }
}
