use super::BoundsExceeded;

/// A type that can be decoded from the wire.
pub trait Decode: Sized {
    fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError>;

    /// Check that the buffer holds at least `required` more bytes.
    ///
    /// Underflow is reported as [DecodeError::More] so the caller can rewind
    /// the cursor and retry once more data has arrived.
    fn decode_remaining<B: bytes::Buf>(r: &B, required: usize) -> Result<(), DecodeError> {
        let needed = required.saturating_sub(r.remaining());
        if needed > 0 {
            Err(DecodeError::More(needed))
        } else {
            Ok(())
        }
    }
}

/// A decode error.
#[derive(thiserror::Error, Debug, Clone)]
pub enum DecodeError {
    /// Not an error: the buffer ran short and at least this many more bytes
    /// are needed before the decode can be retried.
    #[error("short read: {0} more bytes required")]
    More(usize),

    #[error("invalid message type: {0:#x}")]
    InvalidMessage(u64),

    /// The message type is not in our registry; the payload was skipped by
    /// length so the caller can log once and continue.
    #[error("unknown message type: {0:#x}")]
    UnknownMessage(u64),

    /// The declared payload length was reached before the payload was fully
    /// decoded.
    #[error("message payload truncated")]
    Truncated,

    #[error("invalid value")]
    InvalidValue,

    #[error("invalid filter type")]
    InvalidFilterType,

    #[error("invalid group order")]
    InvalidGroupOrder,

    #[error("invalid object status")]
    InvalidObjectStatus,

    #[error("invalid data stream type")]
    InvalidStreamType,

    #[error("invalid datagram type")]
    InvalidDatagramType,

    #[error("invalid role: {0:#x}")]
    InvalidRole(u64),

    #[error("missing parameter")]
    MissingParameter,

    #[error("duplicate parameter: {0}")]
    DuplicateParameter(u64),

    #[error("field bounds exceeded: {0}")]
    FieldBoundsExceeded(String),

    #[error("invalid string")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("varint bounds exceeded")]
    BoundsExceeded(#[from] BoundsExceeded),
}
