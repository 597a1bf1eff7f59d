use std::io;

use bytes::{Buf, BytesMut};

use crate::coding::{Decode, DecodeError};

use super::SessionError;

pub struct Reader {
    stream: web_transport::RecvStream,
    buffer: BytesMut,
}

impl Reader {
    pub fn new(stream: web_transport::RecvStream) -> Self {
        Self {
            stream,
            buffer: Default::default(),
        }
    }

    /// Decode a message, reading more from the stream on a short buffer.
    ///
    /// The cursor only advances on success, so a partial decode is retried
    /// from the start once the missing bytes arrive. Unknown control
    /// messages are consumed by length, logged once, and skipped.
    pub async fn decode<T: Decode>(&mut self) -> Result<T, SessionError> {
        loop {
            let mut cursor = io::Cursor::new(&self.buffer);

            let required = match T::decode(&mut cursor) {
                Ok(msg) => {
                    let consumed = cursor.position() as usize;
                    self.buffer.advance(consumed);
                    return Ok(msg);
                }
                Err(DecodeError::More(required)) => self.buffer.len() + required,
                Err(DecodeError::UnknownMessage(t)) => {
                    // The payload was skipped by length.
                    let consumed = cursor.position() as usize;
                    self.buffer.advance(consumed);
                    log::warn!("skipping unknown message: type={:#x}", t);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            // Read in more data until we reach the requested amount.
            // We always read at least once to avoid an infinite loop if some dingus puts remain=0
            loop {
                if !self.stream.read_buf(&mut self.buffer).await? {
                    return Err(DecodeError::More(required - self.buffer.len()).into());
                };

                if self.buffer.len() >= required {
                    break;
                }
            }
        }
    }

    /// True once the stream has ended and the buffer is drained.
    pub async fn done(&mut self) -> Result<bool, SessionError> {
        if !self.buffer.is_empty() {
            return Ok(false);
        }

        Ok(!self.stream.read_buf(&mut self.buffer).await?)
    }
}
