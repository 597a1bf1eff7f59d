use super::{Role, Version};
use crate::coding::{Decode, DecodeError, Encode, EncodeError, ParamType, Params};

/// Sent by the server in response to a CLIENT_SETUP.
#[derive(Debug, Clone)]
pub struct Server {
    /// The version picked from the client's list.
    pub version: Version,

    /// Indicate if the server is a publisher, a subscriber, or both.
    pub role: Role,

    /// Remaining setup parameters, unknown ones included.
    pub params: Params,
}

impl Server {
    pub const TYPE: u64 = 0x41;
}

impl Decode for Server {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let typ = u64::decode(r)?;
        if typ != Self::TYPE {
            return Err(DecodeError::InvalidMessage(typ));
        }

        let len = usize::decode(r)?;
        Self::decode_remaining(r, len)?;
        let mut payload = r.copy_to_bytes(len);

        let version = Version::decode(&mut payload)?;
        let params = Params::decode(&mut payload)?;

        let role = params
            .varint(ParamType::Role)?
            .ok_or(DecodeError::MissingParameter)?
            .try_into()?;

        Ok(Self {
            version,
            role,
            params,
        })
    }
}

impl Encode for Server {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        Self::TYPE.encode(w)?;

        let mut buf = Vec::new();
        self.version.encode(&mut buf)?;

        let mut params = self.params.clone();
        params.set_varint(ParamType::Role, self.role.into())?;
        params.encode(&mut buf)?;

        buf.len().encode(w)?;
        Self::encode_remaining(w, buf.len())?;
        w.put_slice(&buf);

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

        let mut params = Params::default();
        params.set_varint(ParamType::MaxSubscribeId, 1000).unwrap();

        let server = Server {
            version: Version::DRAFT_07,
            role: Role::Publisher,
            params,
        };

        server.encode(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(
            buf.to_vec(),
            vec![
                0x40, 0x41, // type
                0x10, // length
                0xc0, 0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x07, // version
                0x02, // 2 params
                0x00, 0x01, 0x01, // role = publisher
                0x02, 0x02, 0x43, 0xe8, // max subscribe id = 1000
            ]
        );

        let decoded = Server::decode(&mut buf).unwrap();
        assert_eq!(decoded.version, server.version);
        assert_eq!(decoded.role, server.role);
        assert_eq!(
            decoded.params.varint(ParamType::MaxSubscribeId).unwrap(),
            Some(1000)
        );
    }
}
