use crate::data::{self, DataStreamType, ObjectStatus};
use crate::mlog;

use super::{SessionError, Writer};

/// An outbound subgroup stream.
///
/// The header is written when the stream is opened; every object after it
/// must use a strictly larger object id. Dropping the stream (or calling
/// [SubgroupStream::finish]) ends it.
pub struct SubgroupStream {
    writer: Writer,
    header: data::SubgroupHeader,
    last_object_id: Option<u64>,
    mlog: Option<std::sync::Arc<std::sync::Mutex<mlog::MlogWriter>>>,
}

impl SubgroupStream {
    pub(super) async fn open(
        mut writer: Writer,
        header: data::SubgroupHeader,
        mlog: Option<std::sync::Arc<std::sync::Mutex<mlog::MlogWriter>>>,
    ) -> Result<Self, SessionError> {
        // QUIC priority: smaller publisher priority preempts.
        writer.set_priority(256 - header.publisher_priority as i32);
        writer.encode(&DataStreamType::SubgroupHeader).await?;
        writer.encode(&header).await?;

        if let Some(mlog) = &mlog {
            if let Ok(mut mlog) = mlog.lock() {
                let time = mlog.elapsed_ms();
                mlog.add_event(mlog::subgroup_header_created(time, &header)).ok();
            }
        }

        Ok(Self {
            writer,
            header,
            last_object_id: None,
            mlog,
        })
    }

    pub fn header(&self) -> &data::SubgroupHeader {
        &self.header
    }

    /// Send one object. Ids must be strictly increasing.
    pub async fn write_object(&mut self, object: &data::ObjectHeader) -> Result<(), SessionError> {
        if self.last_object_id >= Some(object.object_id) {
            return Err(SessionError::ProtocolViolation(format!(
                "object id {} is not increasing within the subgroup",
                object.object_id
            )));
        }
        self.last_object_id = Some(object.object_id);

        self.writer.encode(object).await?;

        if let Some(mlog) = &self.mlog {
            if let Ok(mut mlog) = mlog.lock() {
                let time = mlog.elapsed_ms();
                mlog.add_event(mlog::subgroup_object_created(time, &self.header, object))
                    .ok();
            }
        }

        Ok(())
    }

    /// Send a terminal END_OF_GROUP marker and end the stream.
    pub async fn finish_group(mut self, object_id: u64) -> Result<(), SessionError> {
        let marker = data::ObjectHeader::status(object_id, ObjectStatus::EndOfGroup);
        self.write_object(&marker).await?;
        Ok(())
    }

    /// End the stream without a status marker.
    pub async fn finish(self) -> Result<(), SessionError> {
        // Dropping the writer finishes the QUIC stream.
        Ok(())
    }
}

/// An outbound fetch stream, answering an accepted Fetch.
pub struct FetchStream {
    writer: Writer,
}

impl FetchStream {
    pub(super) async fn open(
        mut writer: Writer,
        header: data::FetchHeader,
        priority: u8,
    ) -> Result<Self, SessionError> {
        writer.set_priority(256 - priority as i32);
        writer.encode(&DataStreamType::FetchHeader).await?;
        writer.encode(&header).await?;

        Ok(Self { writer })
    }

    pub async fn write_object(&mut self, object: &data::FetchObject) -> Result<(), SessionError> {
        self.writer.encode(object).await
    }

    pub async fn finish(self) -> Result<(), SessionError> {
        Ok(())
    }
}
