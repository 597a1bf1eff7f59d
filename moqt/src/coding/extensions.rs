use std::collections::BTreeMap;
use std::fmt;

use bytes::{Buf, BufMut};

use super::{Decode, DecodeError, Encode, EncodeError};

/// An extension value: even tags carry a varint, odd tags a byte-string.
#[derive(Clone, Eq, PartialEq)]
pub enum ExtensionValue {
    Varint(u64),
    Bytes(Vec<u8>),
}

impl fmt::Debug for ExtensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionValue::Varint(v) => write!(f, "{}", v),
            ExtensionValue::Bytes(bytes) => {
                let preview: Vec<String> =
                    bytes.iter().take(16).map(|b| format!("{:02x}", b)).collect();
                write!(f, "[{}]", preview.join(" "))
            }
        }
    }
}

/// Object extension headers.
///
/// Encoded as a count followed by tag/value pairs. An empty map encodes as
/// count 0.
#[derive(Default, Clone, Eq, PartialEq)]
pub struct Extensions(pub BTreeMap<u64, ExtensionValue>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_varint(&mut self, tag: u64, value: u64) -> Result<(), EncodeError> {
        if tag % 2 != 0 {
            return Err(EncodeError::InvalidValue);
        }
        self.0.insert(tag, ExtensionValue::Varint(value));
        Ok(())
    }

    pub fn set_bytes(&mut self, tag: u64, value: Vec<u8>) -> Result<(), EncodeError> {
        if tag % 2 == 0 {
            return Err(EncodeError::InvalidValue);
        }
        self.0.insert(tag, ExtensionValue::Bytes(value));
        Ok(())
    }

    pub fn get(&self, tag: u64) -> Option<&ExtensionValue> {
        self.0.get(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Decode for Extensions {
    fn decode<R: Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let count = usize::decode(r)?;
        let mut extensions = BTreeMap::new();

        for _ in 0..count {
            let tag = u64::decode(r)?;
            let value = if tag % 2 == 0 {
                ExtensionValue::Varint(u64::decode(r)?)
            } else {
                let size = usize::decode(r)?;
                Self::decode_remaining(r, size)?;
                let mut buf = vec![0; size];
                r.copy_to_slice(&mut buf);
                ExtensionValue::Bytes(buf)
            };
            extensions.insert(tag, value);
        }

        Ok(Self(extensions))
    }
}

impl Encode for Extensions {
    fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.0.len().encode(w)?;
        for (tag, value) in &self.0 {
            tag.encode(w)?;
            match value {
                ExtensionValue::Varint(v) => {
                    if tag % 2 != 0 {
                        return Err(EncodeError::InvalidValue);
                    }
                    v.encode(w)?;
                }
                ExtensionValue::Bytes(bytes) => {
                    if tag % 2 == 0 {
                        return Err(EncodeError::InvalidValue);
                    }
                    bytes.len().encode(w)?;
                    Self::encode_remaining(w, bytes.len())?;
                    w.put_slice(bytes);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for (i, (tag, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:?}", tag, value)?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let mut ext = Extensions::new();
        ext.set_varint(0, 8).unwrap();
        ext.set_bytes(1, vec![0xfa, 0xce, 0xb0, 0x0c]).unwrap();

        ext.encode(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf.to_vec(), vec![
            0x02, // 2 extensions
            0x00, 0x08, // tag 0, varint 8
            0x01, 0x04, 0xfa, 0xce, 0xb0, 0x0c]); // tag 1, 4 bytes
        let decoded = Extensions::decode(&mut buf).unwrap();
        assert_eq!(decoded, ext);
    }

    #[test]
    fn encode_empty() {
        let mut buf = BytesMut::new();

        let ext = Extensions::new();
        ext.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x00]);
        let decoded = Extensions::decode(&mut buf).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn parity() {
        let mut ext = Extensions::new();
        assert!(ext.set_varint(1, 8).is_err());
        assert!(ext.set_bytes(2, vec![0x01]).is_err());
    }
}
