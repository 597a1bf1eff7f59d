use std::collections::BTreeMap;
use std::fmt;

use bytes::{Buf, BufMut};

use super::{Decode, DecodeError, Encode, EncodeError, VarInt};

/// Well-known parameter tags.
///
/// Numeric parameters are varint-encoded inside their byte-string value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamType {
    Role = 0x0,
    Path = 0x1,
    MaxSubscribeId = 0x2,
    AuthorizationInfo = 0x3,
    DeliveryTimeout = 0x4,
    MaxCacheDuration = 0x5,
}

impl From<ParamType> for u64 {
    fn from(t: ParamType) -> Self {
        t as u64
    }
}

/// A parameter map: varint tag to opaque byte-string value.
///
/// Unknown tags are preserved and re-emitted unchanged. Each value is
/// length-prefixed on the wire; the map itself is a count followed by
/// tag/value pairs.
#[derive(Default, Clone, Eq, PartialEq)]
pub struct Params(pub BTreeMap<u64, Vec<u8>>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Into<u64>>(&mut self, tag: T, value: Vec<u8>) {
        self.0.insert(tag.into(), value);
    }

    pub fn get<T: Into<u64>>(&self, tag: T) -> Option<&Vec<u8>> {
        self.0.get(&tag.into())
    }

    pub fn has<T: Into<u64>>(&self, tag: T) -> bool {
        self.0.contains_key(&tag.into())
    }

    /// Store a numeric parameter as a varint-encoded value.
    pub fn set_varint<T: Into<u64>>(&mut self, tag: T, value: u64) -> Result<(), EncodeError> {
        let mut buf = Vec::new();
        VarInt::try_from(value)?.encode(&mut buf)?;
        self.0.insert(tag.into(), buf);
        Ok(())
    }

    /// Read back a numeric parameter.
    pub fn varint<T: Into<u64>>(&self, tag: T) -> Result<Option<u64>, DecodeError> {
        match self.0.get(&tag.into()) {
            Some(value) => {
                let mut buf = bytes::Bytes::copy_from_slice(value);
                Ok(Some(VarInt::decode(&mut buf)?.into_inner()))
            }
            None => Ok(None),
        }
    }
}

impl Decode for Params {
    fn decode<R: Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let count = usize::decode(r)?;
        let mut params = BTreeMap::new();

        for _ in 0..count {
            let tag = u64::decode(r)?;
            let size = usize::decode(r)?;
            Self::decode_remaining(r, size)?;

            let mut value = vec![0; size];
            r.copy_to_slice(&mut value);

            if params.insert(tag, value).is_some() {
                return Err(DecodeError::DuplicateParameter(tag));
            }
        }

        Ok(Self(params))
    }
}

impl Encode for Params {
    fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.0.len().encode(w)?;
        for (tag, value) in &self.0 {
            tag.encode(w)?;
            value.len().encode(w)?;
            Self::encode_remaining(w, value.len())?;
            w.put_slice(value);
        }
        Ok(())
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for (i, (tag, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let preview: Vec<String> = value.iter().take(16).map(|b| format!("{:02x}", b)).collect();
            write!(f, "{}: [{}]", tag, preview.join(" "))?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let mut params = Params::new();
        params.set(ParamType::AuthorizationInfo, b"auth-token-123".to_vec());
        params.set_varint(ParamType::MaxSubscribeId, 100).unwrap();

        params.encode(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf.to_vec(), vec![
            0x02, // 2 parameters
            0x02, 0x01, 0x64, // MaxSubscribeId = 100
            0x03, 0x0e, // AuthorizationInfo, 14 bytes
            0x61, 0x75, 0x74, 0x68, 0x2d, 0x74, 0x6f, 0x6b,
            0x65, 0x6e, 0x2d, 0x31, 0x32, 0x33]);

        let decoded = Params::decode(&mut buf).unwrap();
        assert_eq!(decoded, params);
        assert_eq!(decoded.varint(ParamType::MaxSubscribeId).unwrap(), Some(100));
    }

    #[test]
    fn preserve_unknown() {
        let mut buf = BytesMut::new();

        let mut params = Params::new();
        params.set(0x1337u64, vec![0xde, 0xad]);
        params.encode(&mut buf).unwrap();

        let wire = buf.to_vec();
        let decoded = Params::decode(&mut buf).unwrap();
        assert_eq!(decoded.get(0x1337u64), Some(&vec![0xde, 0xad]));

        // Re-emitted unchanged.
        let mut again = BytesMut::new();
        decoded.encode(&mut again).unwrap();
        assert_eq!(again.to_vec(), wire);
    }

    #[test]
    fn decode_duplicate() {
        // Tag 0 twice.
        let mut buf = Bytes::from_static(&[0x02, 0x00, 0x01, 0x01, 0x00, 0x01, 0x02]);
        let decoded = Params::decode(&mut buf);
        assert!(matches!(
            decoded.unwrap_err(),
            DecodeError::DuplicateParameter(0)
        ));
    }

    #[test]
    fn decode_short() {
        // Claims a 5-byte value with only 2 buffered.
        let mut buf = Bytes::from_static(&[0x01, 0x00, 0x05, 0xaa, 0xbb]);
        let decoded = Params::decode(&mut buf);
        assert!(matches!(decoded.unwrap_err(), DecodeError::More(3)));
    }
}
