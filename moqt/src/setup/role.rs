use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Indicates whether the endpoint produces media, consumes it, or both.
///
/// Carried in the ROLE setup parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Publisher = 0x1,
    Subscriber = 0x2,
    Both = 0x3,
}

impl Role {
    pub fn is_publisher(&self) -> bool {
        matches!(self, Self::Publisher | Self::Both)
    }

    pub fn is_subscriber(&self) -> bool {
        matches!(self, Self::Subscriber | Self::Both)
    }

    /// True if the two endpoints can exchange any media at all.
    pub fn is_compatible(&self, other: Role) -> bool {
        (self.is_publisher() && other.is_subscriber())
            || (self.is_subscriber() && other.is_publisher())
    }
}

impl From<Role> for u64 {
    fn from(r: Role) -> Self {
        r as u64
    }
}

impl TryFrom<u64> for Role {
    type Error = DecodeError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        match v {
            0x1 => Ok(Self::Publisher),
            0x2 => Ok(Self::Subscriber),
            0x3 => Ok(Self::Both),
            _ => Err(DecodeError::InvalidRole(v)),
        }
    }
}

impl Decode for Role {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        u64::decode(r)?.try_into()
    }
}

impl Encode for Role {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        u64::from(*self).encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatible() {
        assert!(Role::Publisher.is_compatible(Role::Subscriber));
        assert!(Role::Subscriber.is_compatible(Role::Publisher));
        assert!(Role::Both.is_compatible(Role::Both));
        assert!(!Role::Publisher.is_compatible(Role::Publisher));
        assert!(!Role::Subscriber.is_compatible(Role::Subscriber));
    }

    #[test]
    fn decode_invalid() {
        let mut buf = bytes::Bytes::from_static(&[0x04]);
        let decoded = Role::decode(&mut buf);
        assert!(matches!(decoded.unwrap_err(), DecodeError::InvalidRole(4)));
    }
}
