//! End-to-end scenarios driven over the public wire surface.
//!
//! Two peers are simulated by byte buffers standing in for the control
//! stream, a subgroup stream, and datagrams; everything on them goes
//! through the real codecs and lands in the real cache. Session-level
//! state-machine behavior is covered by the unit tests next to
//! `session::state`; a live transport would be required to drive
//! `Session::connect`/`accept` themselves.

use bytes::{BufMut, Bytes, BytesMut};

use moqt::cache::{CacheError, Tracks};
use moqt::coding::{Decode, DecodeError, Encode, Location, ParamType, Params, TrackNamespace};
use moqt::data;
use moqt::message::{self, FilterType, GroupOrder, Message};
use moqt::session::{ErrorCode, SessionError};
use moqt::setup::{self, Role, Version, Versions};

fn namespace() -> TrackNamespace {
    TrackNamespace::from_utf8_path("live/test")
}

/// Append a framed control message to the wire.
fn send<M: Into<Message>>(wire: &mut BytesMut, msg: M) {
    msg.into().encode(wire).unwrap();
}

/// Decode the next framed control message off the wire.
fn recv(wire: &mut BytesMut) -> Message {
    Message::decode(wire).unwrap()
}

#[test]
fn setup_announce_subscribe_one_object_group() {
    let mut wire = BytesMut::new();

    // Client offers DRAFT_07; the server echoes it back.
    setup::Client {
        versions: [Version::DRAFT_07].into(),
        role: Role::Both,
        params: Params::default(),
    }
    .encode(&mut wire)
    .unwrap();

    let client = setup::Client::decode(&mut wire).unwrap();
    assert!(client.versions.contains(&Version::DRAFT_07));

    setup::Server {
        version: Version::DRAFT_07,
        role: Role::Both,
        params: Params::default(),
    }
    .encode(&mut wire)
    .unwrap();

    let server = setup::Server::decode(&mut wire).unwrap();
    assert_eq!(server.version, Version::DRAFT_07);
    assert!(client.role.is_compatible(server.role));

    // ANNOUNCE with an authorization token; the subscriber accepts.
    let mut params = Params::new();
    params.set(ParamType::AuthorizationInfo, b"auth-token-123".to_vec());
    send(
        &mut wire,
        message::Announce {
            track_namespace: namespace(),
            params,
        },
    );

    let announce = match recv(&mut wire) {
        Message::Announce(announce) => announce,
        msg => panic!("unexpected message: {:?}", msg),
    };
    assert_eq!(
        announce.params.get(ParamType::AuthorizationInfo),
        Some(&b"auth-token-123".to_vec())
    );
    send(
        &mut wire,
        message::AnnounceOk {
            track_namespace: announce.track_namespace,
        },
    );
    assert!(matches!(recv(&mut wire), Message::AnnounceOk(_)));

    // SUBSCRIBE id=1 alias=1; the publisher accepts with no content yet.
    send(
        &mut wire,
        message::Subscribe {
            subscribe_id: 1,
            track_alias: 1,
            track_namespace: namespace(),
            track_name: "track".to_string(),
            subscriber_priority: 128,
            group_order: GroupOrder::Ascending,
            filter_type: FilterType::LatestGroup,
            start: None,
            end_group: None,
            params: Params::default(),
        },
    );
    let subscribe = match recv(&mut wire) {
        Message::Subscribe(subscribe) => subscribe,
        msg => panic!("unexpected message: {:?}", msg),
    };

    send(
        &mut wire,
        message::SubscribeOk {
            subscribe_id: subscribe.subscribe_id,
            expires: 0,
            group_order: GroupOrder::Ascending,
            content_exists: false,
            largest: None,
            params: Params::default(),
        },
    );
    assert!(matches!(recv(&mut wire), Message::SubscribeOk(_)));

    // The publisher opens one subgroup stream: header, one object, then
    // END_OF_GROUP.
    let mut stream = BytesMut::new();
    data::DataStreamType::SubgroupHeader.encode(&mut stream).unwrap();
    data::SubgroupHeader {
        track_alias: subscribe.track_alias,
        group_id: 0,
        subgroup_id: 0,
        publisher_priority: 255,
    }
    .encode(&mut stream)
    .unwrap();

    let payload = format!("| 0.0.0 |{}", " ".repeat(32));
    data::ObjectHeader::new(0, payload.into())
        .encode(&mut stream)
        .unwrap();
    data::ObjectHeader::status(1, data::ObjectStatus::EndOfGroup)
        .encode(&mut stream)
        .unwrap();

    // The subscriber parses the stream into its cache, in order.
    let mut cache = Tracks::new();
    let stream_type = data::DataStreamType::decode(&mut stream).unwrap();
    assert_eq!(stream_type, data::DataStreamType::SubgroupHeader);
    let header = data::SubgroupHeader::decode(&mut stream).unwrap();
    assert_eq!(header.track_alias, subscribe.track_alias);

    while !stream.is_empty() {
        let object = data::ObjectHeader::decode(&mut stream).unwrap();
        match object.status {
            data::ObjectStatus::Normal => cache
                .insert_object(
                    &subscribe.track_namespace,
                    &subscribe.track_name,
                    header.group_id,
                    object.object_id,
                    object.payload,
                )
                .unwrap(),
            status => cache
                .insert_status(
                    &subscribe.track_namespace,
                    &subscribe.track_name,
                    header.group_id,
                    object.object_id,
                    status,
                )
                .unwrap(),
        }
    }

    let track = cache.get(&namespace(), "track").unwrap();
    let group = track.group(0).unwrap();
    assert!(group.get(0).unwrap().starts_with(b"| 0.0.0 |"));
    assert!(group.is_closed());
    assert_eq!(track.largest(), Some(Location::new(0, 1)));
}

#[test]
fn datagram_extension_round_trip() {
    let mut extensions = moqt::coding::Extensions::new();
    extensions
        .set_bytes(0x25, b"MOQT-TS: 1700000000000".to_vec())
        .unwrap();

    let mut wire = BytesMut::new();
    data::ObjectDatagram {
        track_alias: 1,
        group_id: 0,
        object_id: 0,
        publisher_priority: 255,
        extensions,
        payload: Bytes::from(vec![b'X'; 1100]),
    }
    .encode(&mut wire)
    .unwrap();

    let object = match data::Datagram::decode(&mut wire).unwrap() {
        data::Datagram::Object(object) => object,
        data::Datagram::Status(_) => panic!("wrong datagram type"),
    };

    match object.extensions.get(0x25) {
        Some(moqt::coding::ExtensionValue::Bytes(bytes)) => assert_eq!(bytes.len(), 22),
        other => panic!("unexpected extension value: {:?}", other),
    }

    let mut cache = Tracks::new();
    cache
        .insert_object(
            &namespace(),
            "track",
            object.group_id,
            object.object_id,
            object.payload,
        )
        .unwrap();
    assert_eq!(
        cache.get(&namespace(), "track").unwrap().largest(),
        Some(Location::new(0, 0))
    );
}

#[test]
fn end_of_group_datagram_status() {
    let mut wire = BytesMut::new();
    data::ObjectDatagramStatus {
        track_alias: 1,
        group_id: 0,
        object_id: 60,
        publisher_priority: 255,
        extensions: Default::default(),
        status: data::ObjectStatus::EndOfGroup,
    }
    .encode(&mut wire)
    .unwrap();

    let status = match data::Datagram::decode(&mut wire).unwrap() {
        data::Datagram::Status(status) => status,
        data::Datagram::Object(_) => panic!("wrong datagram type"),
    };

    let mut cache = Tracks::new();
    cache
        .insert_status(
            &namespace(),
            "track",
            status.group_id,
            status.object_id,
            status.status,
        )
        .unwrap();

    // Post-termination objects for the group are rejected.
    let err = cache
        .insert_object(&namespace(), "track", 0, 61, Bytes::from_static(b"late"))
        .unwrap_err();
    assert_eq!(err, CacheError::GroupClosed(0));
}

#[test]
fn unknown_control_message_skipped() {
    let mut wire = BytesMut::new();

    send(&mut wire, message::Unsubscribe { subscribe_id: 1 });

    // An unknown type with a 5 byte body, from some future draft.
    0x7fffffffu64.encode(&mut wire).unwrap();
    5usize.encode(&mut wire).unwrap();
    wire.put_slice(b"hello");

    send(&mut wire, message::MaxSubscribeId { id: 50 });

    assert!(matches!(recv(&mut wire), Message::Unsubscribe(_)));

    // The receiver logs once and continues with the next message.
    let err = Message::decode(&mut wire).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownMessage(0x7fffffff)));
    match recv(&mut wire) {
        Message::MaxSubscribeId(msg) => assert_eq!(msg.id, 50),
        msg => panic!("unexpected message: {:?}", msg),
    }
    assert!(wire.is_empty());
}

#[test]
fn version_mismatch_close_code() {
    let offered: Versions = [Version(0x11111111)].into();
    let supported: Versions = [Version::DRAFT_07].into();

    assert!(!offered.iter().any(|version| supported.contains(version)));

    // The server closes the connection with UNSUPPORTED_VERSION; the
    // client's closed() resolves with that tuple.
    let err = SessionError::Version(offered, supported);
    assert_eq!(err.code(), u64::from(ErrorCode::UnsupportedVersion));
}

#[test]
fn control_stream_reassembly() {
    let mut full = BytesMut::new();
    send(
        &mut full,
        message::TrackStatusRequest {
            track_namespace: namespace(),
            track_name: "track".to_string(),
        },
    );

    // The first half alone is a recoverable short read; appending the rest
    // and retrying succeeds, the way the control stream reader does.
    let half = full.len() / 2;
    let mut partial = BytesMut::from(&full[..half]);

    let mut cursor = std::io::Cursor::new(&partial[..]);
    let err = Message::decode(&mut cursor).unwrap_err();
    assert!(matches!(err, DecodeError::More(_)));

    partial.extend_from_slice(&full[half..]);
    let msg = recv(&mut partial);
    assert!(matches!(msg, Message::TrackStatusRequest(_)));
    assert!(partial.is_empty());
}
