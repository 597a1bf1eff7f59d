use crate::coding::Encode;

use super::SessionError;

pub struct Writer {
    stream: web_transport::SendStream,
    buffer: bytes::BytesMut,
}

impl Writer {
    pub fn new(stream: web_transport::SendStream) -> Self {
        Self {
            stream,
            buffer: Default::default(),
        }
    }

    /// Encode and flush a message to the stream.
    pub async fn encode<T: Encode>(&mut self, msg: &T) -> Result<(), SessionError> {
        self.buffer.clear();
        msg.encode(&mut self.buffer)?;

        while !self.buffer.is_empty() {
            self.stream.write_buf(&mut self.buffer).await?;
        }

        Ok(())
    }

    /// Lower the QUIC send priority; smaller runs later.
    pub fn set_priority(&mut self, priority: i32) {
        self.stream.set_priority(priority);
    }
}
