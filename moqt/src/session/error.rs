use crate::{cache, coding, setup};

/// Session close codes sent on the wire.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorCode {
    NoError = 0x0,
    InternalError = 0x1,
    Unauthorized = 0x2,
    ProtocolViolation = 0x3,
    DuplicateTrackAlias = 0x4,
    ParameterLengthMismatch = 0x5,
    UnsupportedVersion = 0x6,
    SessionClosed = 0x7,
    GoawayTimeout = 0x10,
}

impl From<ErrorCode> for u64 {
    fn from(code: ErrorCode) -> Self {
        code as u64
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum SessionError {
    #[error("webtransport session: {0}")]
    Session(#[from] web_transport::SessionError),

    #[error("webtransport write: {0}")]
    Write(#[from] web_transport::WriteError),

    #[error("webtransport read: {0}")]
    Read(#[from] web_transport::ReadError),

    #[error("encode error: {0}")]
    Encode(#[from] coding::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] coding::DecodeError),

    #[error("cache error: {0}")]
    Cache(#[from] cache::CacheError),

    /// No overlap between the offered and supported versions.
    #[error("unsupported versions: offered={0:?} supported={1:?}")]
    Version(setup::Versions, setup::Versions),

    /// Neither side can send the other anything.
    #[error("incompatible roles: local={0:?} peer={1:?}")]
    RoleIncompatible(setup::Role, setup::Role),

    /// A duplicate id or alias was used.
    #[error("duplicate")]
    Duplicate,

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Setup did not complete within the allowed time.
    #[error("setup timed out")]
    Timeout,

    /// The session was closed with the given code and reason.
    #[error("session closed: code={0} reason={1}")]
    Closed(u64, String),

    /// A data stream or datagram referenced an alias we do not know.
    #[error("unknown track alias: {0}")]
    UnknownAlias(u64),

    /// Some VarInt was too large for the field it was used in.
    #[error("varint bounds exceeded")]
    BoundsExceeded(#[from] coding::BoundsExceeded),

    #[error("wrong size")]
    WrongSize,

    #[error("internal error")]
    Internal,
}

impl SessionError {
    /// The close code sent over the wire when this error tears down the
    /// session.
    pub fn code(&self) -> u64 {
        match self {
            Self::Version(..) => ErrorCode::UnsupportedVersion.into(),
            Self::RoleIncompatible(..) => ErrorCode::ProtocolViolation.into(),
            Self::Decode(_) => ErrorCode::ProtocolViolation.into(),
            Self::ProtocolViolation(_) => ErrorCode::ProtocolViolation.into(),
            Self::WrongSize => ErrorCode::ProtocolViolation.into(),
            Self::Duplicate => ErrorCode::DuplicateTrackAlias.into(),
            Self::Closed(code, _) => *code,
            _ => ErrorCode::InternalError.into(),
        }
    }
}
