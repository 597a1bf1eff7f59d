use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::cache::{CacheError, Tracks};
use crate::coding::{Decode, TrackNamespace};
use crate::data::{self, DataStreamType, ObjectStatus};
use crate::mlog;

use super::{Reader, SessionError, Shared};

/// A decoded object handed to the application, alongside the cache insert.
#[derive(Debug, Clone)]
pub struct ObjectDelivery {
    pub track_namespace: TrackNamespace,
    pub track_name: String,
    pub group_id: u64,
    pub subgroup_id: Option<u64>,
    pub object_id: u64,
    pub status: ObjectStatus,
    pub payload: Bytes,
}

/// What a unidirectional stream is carrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StreamRole {
    Subgroup,
    Fetch,
}

/// One entry in the stream table, bound when the header is decoded.
#[derive(Debug, Clone)]
pub(super) struct StreamContext {
    pub role: StreamRole,
    pub track_alias: u64,
    pub group_id: u64,
    pub subgroup_id: u64,
    pub priority: u8,
    pub received: u64,
    pub last_object_id: Option<u64>,
}

/// All live inbound data streams.
///
/// An entry is inserted on the first header and removed exactly once: on
/// clean end-of-stream, on an END_OF_GROUP status, or on session teardown.
#[derive(Default)]
pub(super) struct StreamTable {
    next_id: u64,
    entries: HashMap<u64, StreamContext>,
}

impl StreamTable {
    pub fn insert(&mut self, ctx: StreamContext) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, ctx);
        id
    }

    pub fn with<R>(&mut self, id: u64, f: impl FnOnce(&mut StreamContext) -> R) -> Option<R> {
        self.entries.get_mut(&id).map(f)
    }

    pub fn remove(&mut self, id: u64) -> Option<StreamContext> {
        self.entries.remove(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Enforce strictly increasing object ids within one subgroup stream.
pub(super) fn check_object_order(
    last: Option<u64>,
    object_id: u64,
) -> Result<(), SessionError> {
    if last >= Some(object_id) {
        return Err(SessionError::ProtocolViolation(format!(
            "object id {} is not increasing within the subgroup",
            object_id
        )));
    }
    Ok(())
}

/// Apply one decoded subgroup object to the track cache.
pub(super) fn apply_object(
    cache: &mut Tracks,
    track_namespace: &TrackNamespace,
    track_name: &str,
    group_id: u64,
    object_id: u64,
    status: ObjectStatus,
    payload: &Bytes,
) -> Result<(), CacheError> {
    match status {
        ObjectStatus::Normal => {
            cache.insert_object(track_namespace, track_name, group_id, object_id, payload.clone())
        }
        status => cache.insert_status(track_namespace, track_name, group_id, object_id, status),
    }
}

/// Handle one inbound unidirectional stream, from header to end.
pub(super) async fn recv_stream(
    shared: Arc<Shared>,
    stream: web_transport::RecvStream,
) -> Result<(), SessionError> {
    let mut reader = Reader::new(stream);

    let stream_type: DataStreamType = reader.decode().await?;
    match stream_type {
        DataStreamType::SubgroupHeader => recv_subgroup(shared, reader).await,
        DataStreamType::FetchHeader => recv_fetch(shared, reader).await,
    }
}

async fn recv_subgroup(shared: Arc<Shared>, mut reader: Reader) -> Result<(), SessionError> {
    let header: data::SubgroupHeader = reader.decode().await?;
    log::debug!(
        "subgroup stream: alias={} group={} subgroup={} priority={}",
        header.track_alias,
        header.group_id,
        header.subgroup_id,
        header.publisher_priority
    );

    shared.mlog_event(|time| mlog::subgroup_header_parsed(time, &header));

    let (track_namespace, track_name) = shared
        .state
        .lock()
        .unwrap()
        .lookup_alias(header.track_alias)
        .ok_or(SessionError::UnknownAlias(header.track_alias))?;

    let key = shared.streams.lock().unwrap().insert(StreamContext {
        role: StreamRole::Subgroup,
        track_alias: header.track_alias,
        group_id: header.group_id,
        subgroup_id: header.subgroup_id,
        priority: header.publisher_priority,
        received: 0,
        last_object_id: None,
    });

    let res = recv_subgroup_objects(
        &shared,
        &mut reader,
        &header,
        key,
        &track_namespace,
        &track_name,
    )
    .await;

    if let Some(ctx) = shared.streams.lock().unwrap().remove(key) {
        log::debug!(
            "closed {:?} stream: alias={} group={} subgroup={} priority={} objects={}",
            ctx.role,
            ctx.track_alias,
            ctx.group_id,
            ctx.subgroup_id,
            ctx.priority,
            ctx.received
        );
    }
    res
}

async fn recv_subgroup_objects(
    shared: &Arc<Shared>,
    reader: &mut Reader,
    header: &data::SubgroupHeader,
    key: u64,
    track_namespace: &TrackNamespace,
    track_name: &str,
) -> Result<(), SessionError> {
    let mut last_object_id = None;

    while !reader.done().await? {
        let object: data::ObjectHeader = reader.decode().await?;

        check_object_order(last_object_id, object.object_id)?;
        last_object_id = Some(object.object_id);

        shared.streams.lock().unwrap().with(key, |ctx| {
            ctx.received += 1;
            ctx.last_object_id = last_object_id;
        });

        let applied = apply_object(
            &mut shared.cache.lock().unwrap(),
            track_namespace,
            track_name,
            header.group_id,
            object.object_id,
            object.status,
            &object.payload,
        );
        if let Err(err) = applied {
            log::warn!("dropping object rejected by the cache: {}", err);
            break;
        }

        shared.deliver(ObjectDelivery {
            track_namespace: track_namespace.clone(),
            track_name: track_name.to_string(),
            group_id: header.group_id,
            subgroup_id: Some(header.subgroup_id),
            object_id: object.object_id,
            status: object.status,
            payload: object.payload,
        });

        // A terminal status closes the stream early.
        if matches!(
            object.status,
            ObjectStatus::EndOfGroup | ObjectStatus::EndOfSubgroup | ObjectStatus::EndOfTrack
        ) {
            break;
        }
    }

    Ok(())
}

async fn recv_fetch(shared: Arc<Shared>, mut reader: Reader) -> Result<(), SessionError> {
    let header: data::FetchHeader = reader.decode().await?;
    log::debug!("fetch stream: id={}", header.subscribe_id);

    let (track_namespace, track_name) = shared
        .state
        .lock()
        .unwrap()
        .lookup_fetch(header.subscribe_id)
        .ok_or_else(|| {
            SessionError::ProtocolViolation(format!(
                "fetch stream for unknown request {}",
                header.subscribe_id
            ))
        })?;

    let key = shared.streams.lock().unwrap().insert(StreamContext {
        role: StreamRole::Fetch,
        track_alias: 0,
        group_id: 0,
        subgroup_id: 0,
        priority: 0,
        received: 0,
        last_object_id: None,
    });

    let res = recv_fetch_objects(&shared, &mut reader, key, &track_namespace, &track_name).await;

    if let Some(ctx) = shared.streams.lock().unwrap().remove(key) {
        log::debug!(
            "closed {:?} stream: id={} objects={}",
            ctx.role,
            header.subscribe_id,
            ctx.received
        );
    }
    res
}

async fn recv_fetch_objects(
    shared: &Arc<Shared>,
    reader: &mut Reader,
    key: u64,
    track_namespace: &TrackNamespace,
    track_name: &str,
) -> Result<(), SessionError> {
    while !reader.done().await? {
        let object: data::FetchObject = reader.decode().await?;

        shared.streams.lock().unwrap().with(key, |ctx| {
            ctx.received += 1;
            ctx.group_id = object.group_id;
            ctx.subgroup_id = object.subgroup_id;
        });

        let applied = apply_object(
            &mut shared.cache.lock().unwrap(),
            track_namespace,
            track_name,
            object.group_id,
            object.object_id,
            object.status,
            &object.payload,
        );
        if let Err(err) = applied {
            log::warn!("dropping fetched object rejected by the cache: {}", err);
            continue;
        }

        shared.deliver(ObjectDelivery {
            track_namespace: track_namespace.clone(),
            track_name: track_name.to_string(),
            group_id: object.group_id,
            subgroup_id: Some(object.subgroup_id),
            object_id: object.object_id,
            status: object.status,
            payload: object.payload,
        });
    }

    Ok(())
}

/// Handle one inbound datagram.
///
/// Datagrams are best-effort and may arrive reordered; the cache accepts
/// inserts in any order, but rejects objects for terminated groups.
pub(super) fn recv_datagram(shared: &Arc<Shared>, payload: Bytes) -> Result<(), SessionError> {
    let mut cursor = std::io::Cursor::new(payload);
    let datagram = data::Datagram::decode(&mut cursor)?;

    shared.mlog_event(|time| mlog::object_datagram_parsed(time, &datagram));

    let (track_alias, group_id, object_id, status, payload) = match &datagram {
        data::Datagram::Object(object) => (
            object.track_alias,
            object.group_id,
            object.object_id,
            ObjectStatus::Normal,
            object.payload.clone(),
        ),
        data::Datagram::Status(status) => (
            status.track_alias,
            status.group_id,
            status.object_id,
            status.status,
            Bytes::new(),
        ),
    };

    let Some((track_namespace, track_name)) =
        shared.state.lock().unwrap().lookup_alias(track_alias)
    else {
        log::warn!("discarding datagram for unknown track alias: {}", track_alias);
        return Ok(());
    };

    let applied = apply_object(
        &mut shared.cache.lock().unwrap(),
        &track_namespace,
        &track_name,
        group_id,
        object_id,
        status,
        &payload,
    );
    if let Err(err) = applied {
        log::warn!("dropping datagram rejected by the cache: {}", err);
        return Ok(());
    }

    shared.deliver(ObjectDelivery {
        track_namespace,
        track_name,
        group_id,
        subgroup_id: None,
        object_id,
        status,
        payload,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::Encode;
    use bytes::BytesMut;

    fn namespace() -> TrackNamespace {
        TrackNamespace::from_utf8_path("live/test")
    }

    /// Decode a full subgroup stream image from a buffer and apply it, the
    /// way the stream intake does.
    fn run_subgroup(cache: &mut Tracks, buf: &mut BytesMut) -> Result<(), SessionError> {
        let stream_type = DataStreamType::decode(buf).unwrap();
        assert_eq!(stream_type, DataStreamType::SubgroupHeader);
        let header = data::SubgroupHeader::decode(buf).unwrap();

        let mut last = None;
        while !buf.is_empty() {
            let object = data::ObjectHeader::decode(buf)?;
            check_object_order(last, object.object_id)?;
            last = Some(object.object_id);

            apply_object(
                cache,
                &namespace(),
                "track",
                header.group_id,
                object.object_id,
                object.status,
                &object.payload,
            )
            .map_err(SessionError::Cache)?;

            if object.status == ObjectStatus::EndOfGroup {
                break;
            }
        }
        Ok(())
    }

    #[test]
    fn subgroup_stream_into_cache() {
        let mut buf = BytesMut::new();

        DataStreamType::SubgroupHeader.encode(&mut buf).unwrap();
        data::SubgroupHeader {
            track_alias: 1,
            group_id: 0,
            subgroup_id: 0,
            publisher_priority: 255,
        }
        .encode(&mut buf)
        .unwrap();

        let payload = format!("| 0.0.0 |{}", " ".repeat(32));
        data::ObjectHeader::new(0, payload.clone().into())
            .encode(&mut buf)
            .unwrap();
        data::ObjectHeader::status(1, ObjectStatus::EndOfGroup)
            .encode(&mut buf)
            .unwrap();

        let mut cache = Tracks::new();
        run_subgroup(&mut cache, &mut buf).unwrap();

        let track = cache.get(&namespace(), "track").unwrap();
        let group = track.group(0).unwrap();
        assert!(group.get(0).unwrap().starts_with(b"| 0.0.0 |"));
        assert!(group.is_closed());
    }

    #[test]
    fn out_of_order_object_rejected() {
        let mut buf = BytesMut::new();

        DataStreamType::SubgroupHeader.encode(&mut buf).unwrap();
        data::SubgroupHeader {
            track_alias: 1,
            group_id: 0,
            subgroup_id: 0,
            publisher_priority: 128,
        }
        .encode(&mut buf)
        .unwrap();

        data::ObjectHeader::new(2, "b".into()).encode(&mut buf).unwrap();
        data::ObjectHeader::new(1, "a".into()).encode(&mut buf).unwrap();

        let mut cache = Tracks::new();
        let err = run_subgroup(&mut cache, &mut buf).unwrap_err();
        assert!(matches!(err, SessionError::ProtocolViolation(_)));
    }

    #[test]
    fn stream_table_lifecycle() {
        let mut table = StreamTable::default();

        let key = table.insert(StreamContext {
            role: StreamRole::Subgroup,
            track_alias: 1,
            group_id: 0,
            subgroup_id: 0,
            priority: 255,
            received: 0,
            last_object_id: None,
        });
        assert_eq!(table.len(), 1);

        table.with(key, |ctx| ctx.received += 1);
        assert_eq!(table.remove(key).unwrap().received, 1);

        // Removal happens exactly once.
        assert!(table.remove(key).is_none());
        assert_eq!(table.len(), 0);
    }
}
