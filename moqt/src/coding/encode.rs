use super::BoundsExceeded;

/// A type that can be encoded to the wire.
pub trait Encode {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError>;

    /// Check that the writer can hold at least `required` more bytes.
    fn encode_remaining<W: bytes::BufMut>(w: &W, required: usize) -> Result<(), EncodeError> {
        let needed = required.saturating_sub(w.remaining_mut());
        if needed > 0 {
            Err(EncodeError::More(needed))
        } else {
            Ok(())
        }
    }
}

/// An encode error.
#[derive(thiserror::Error, Debug, Clone)]
pub enum EncodeError {
    #[error("short write: {0} more bytes required")]
    More(usize),

    #[error("invalid value")]
    InvalidValue,

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("field bounds exceeded: {0}")]
    FieldBoundsExceeded(String),

    #[error("varint bounds exceeded")]
    BoundsExceeded(#[from] BoundsExceeded),
}
