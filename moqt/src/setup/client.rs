use super::{Role, Versions};
use crate::coding::{Decode, DecodeError, Encode, EncodeError, ParamType, Params};

/// Sent by the client immediately after the control stream opens.
#[derive(Debug, Clone)]
pub struct Client {
    /// The list of supported versions in preferred order.
    pub versions: Versions,

    /// Indicate if the client is a publisher, a subscriber, or both.
    pub role: Role,

    /// Remaining setup parameters, unknown ones included.
    pub params: Params,
}

impl Client {
    pub const TYPE: u64 = 0x40;
}

impl Decode for Client {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let typ = u64::decode(r)?;
        if typ != Self::TYPE {
            return Err(DecodeError::InvalidMessage(typ));
        }

        let len = usize::decode(r)?;
        Self::decode_remaining(r, len)?;
        let mut payload = r.copy_to_bytes(len);

        let versions = Versions::decode(&mut payload)?;
        let params = Params::decode(&mut payload)?;

        let role = params
            .varint(ParamType::Role)?
            .ok_or(DecodeError::MissingParameter)?
            .try_into()?;

        Ok(Self {
            versions,
            role,
            params,
        })
    }
}

impl Encode for Client {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        Self::TYPE.encode(w)?;

        // Encode the payload into a scratch buffer first to learn its length.
        let mut buf = Vec::new();
        self.versions.encode(&mut buf)?;

        let mut params = self.params.clone();
        params.set_varint(ParamType::Role, self.role.into())?;
        params.encode(&mut buf)?;

        buf.len().encode(w)?;
        Self::encode_remaining(w, buf.len())?;
        w.put_slice(&buf);

        Ok(())
    }
}
