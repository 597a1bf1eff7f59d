use super::{Decode, DecodeError, Encode, EncodeError};
use core::hash::{Hash, Hasher};

/// A single element of a namespace tuple.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TupleField {
    pub value: Vec<u8>,
}

impl TupleField {
    pub fn from_utf8(part: &str) -> Self {
        Self {
            value: part.as_bytes().to_vec(),
        }
    }
}

impl Decode for TupleField {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let size = usize::decode(r)?;
        Self::decode_remaining(r, size)?;
        let mut buf = vec![0; size];
        r.copy_to_slice(&mut buf);
        Ok(Self { value: buf })
    }
}

impl Encode for TupleField {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.value.len().encode(w)?;
        Self::encode_remaining(w, self.value.len())?;
        w.put_slice(&self.value);
        Ok(())
    }
}

/// A track namespace: an ordered tuple of byte-strings.
///
/// Equality is structural. The convenience constructors split textual input
/// on '/', but the wire form is always the tuple.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrackNamespace {
    pub fields: Vec<TupleField>,
}

impl TrackNamespace {
    pub const MAX_FIELDS: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: TupleField) {
        self.fields.push(field);
    }

    pub fn from_utf8_path(path: &str) -> Self {
        let mut tuple = TrackNamespace::new();
        for part in path.split('/') {
            tuple.add(TupleField::from_utf8(part));
        }
        tuple
    }

    pub fn to_utf8_path(&self) -> String {
        let mut path = String::new();
        for field in &self.fields {
            path.push('/');
            path.push_str(&String::from_utf8_lossy(&field.value));
        }
        path
    }

    /// True if `self` is a prefix of `other`, element for element.
    pub fn is_prefix_of(&self, other: &TrackNamespace) -> bool {
        self.fields.len() <= other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(a, b)| a == b)
    }
}

impl Hash for TrackNamespace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.hash(state);
    }
}

impl Decode for TrackNamespace {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let count = usize::decode(r)?;
        if count > Self::MAX_FIELDS {
            return Err(DecodeError::FieldBoundsExceeded(
                "TrackNamespace tuples".to_string(),
            ));
        }

        let mut fields = Vec::new();
        for _ in 0..count {
            fields.push(TupleField::decode(r)?);
        }
        Ok(Self { fields })
    }
}

impl Encode for TrackNamespace {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        if self.fields.len() > Self::MAX_FIELDS {
            return Err(EncodeError::FieldBoundsExceeded(
                "TrackNamespace tuples".to_string(),
            ));
        }
        self.fields.len().encode(w)?;
        for field in &self.fields {
            field.encode(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let t = TrackNamespace::from_utf8_path("live/test");
        t.encode(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf.to_vec(), vec![
            0x02, // 2 tuple fields
            0x04, 0x6c, 0x69, 0x76, 0x65, // "live"
            0x04, 0x74, 0x65, 0x73, 0x74]); // "test"
        let decoded = TrackNamespace::decode(&mut buf).unwrap();
        assert_eq!(decoded, t);
    }

    #[test]
    fn prefix() {
        let prefix = TrackNamespace::from_utf8_path("live");
        let full = TrackNamespace::from_utf8_path("live/test");
        let other = TrackNamespace::from_utf8_path("vod/test");

        assert!(prefix.is_prefix_of(&full));
        assert!(prefix.is_prefix_of(&prefix));
        assert!(!prefix.is_prefix_of(&other));
        assert!(!full.is_prefix_of(&prefix));
    }

    #[test]
    fn encode_too_large() {
        let mut buf = BytesMut::new();

        let mut t = TrackNamespace::new();
        for i in 0..TrackNamespace::MAX_FIELDS + 1 {
            t.add(TupleField::from_utf8(&format!("field{}", i)));
        }

        let encoded = t.encode(&mut buf);
        assert!(matches!(
            encoded.unwrap_err(),
            EncodeError::FieldBoundsExceeded(_)
        ));
    }

    #[test]
    fn decode_too_large() {
        let mut data: Vec<u8> = vec![0x00; 256];
        data[0] = (TrackNamespace::MAX_FIELDS + 1) as u8;
        let mut buf: Bytes = data.into();
        let decoded = TrackNamespace::decode(&mut buf);
        assert!(matches!(
            decoded.unwrap_err(),
            DecodeError::FieldBoundsExceeded(_)
        ));
    }
}
