use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::data;
use crate::message::Message;

/// A MoQ Transport event following qlog patterns.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Milliseconds since the session started.
    pub time: f64,

    /// Event name in "moqt:event_name" form.
    pub name: String,

    /// Event-specific data.
    pub data: JsonValue,
}

impl Event {
    fn new(time: f64, name: &str, data: JsonValue) -> Self {
        Self {
            time,
            name: format!("moqt:{}", name),
            data,
        }
    }
}

pub fn control_message_created(time: f64, msg: &Message) -> Event {
    Event::new(
        time,
        "control_message_created",
        json!({
            "message_type": msg.name(),
            "message_type_id": msg.id(),
        }),
    )
}

pub fn control_message_parsed(time: f64, msg: &Message) -> Event {
    Event::new(
        time,
        "control_message_parsed",
        json!({
            "message_type": msg.name(),
            "message_type_id": msg.id(),
        }),
    )
}

pub fn subgroup_header_created(time: f64, header: &data::SubgroupHeader) -> Event {
    Event::new(
        time,
        "subgroup_header_created",
        json!({
            "track_alias": header.track_alias,
            "group_id": header.group_id,
            "subgroup_id": header.subgroup_id,
            "publisher_priority": header.publisher_priority,
        }),
    )
}

pub fn subgroup_header_parsed(time: f64, header: &data::SubgroupHeader) -> Event {
    Event::new(
        time,
        "subgroup_header_parsed",
        json!({
            "track_alias": header.track_alias,
            "group_id": header.group_id,
            "subgroup_id": header.subgroup_id,
            "publisher_priority": header.publisher_priority,
        }),
    )
}

pub fn subgroup_object_created(
    time: f64,
    header: &data::SubgroupHeader,
    object: &data::ObjectHeader,
) -> Event {
    Event::new(
        time,
        "subgroup_object_created",
        json!({
            "track_alias": header.track_alias,
            "group_id": header.group_id,
            "subgroup_id": header.subgroup_id,
            "object_id": object.object_id,
            "object_status": object.status as u64,
            "payload_length": object.payload.len(),
        }),
    )
}

pub fn object_datagram_parsed(time: f64, datagram: &data::Datagram) -> Event {
    let data = match datagram {
        data::Datagram::Object(object) => json!({
            "track_alias": object.track_alias,
            "group_id": object.group_id,
            "object_id": object.object_id,
            "publisher_priority": object.publisher_priority,
            "payload_length": object.payload.len(),
        }),
        data::Datagram::Status(status) => json!({
            "track_alias": status.track_alias,
            "group_id": status.group_id,
            "object_id": status.object_id,
            "publisher_priority": status.publisher_priority,
            "object_status": status.status as u64,
        }),
    };

    Event::new(time, "object_datagram_parsed", data)
}
