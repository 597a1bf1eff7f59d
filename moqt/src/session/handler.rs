use std::collections::HashMap;
use std::sync::Arc;

use crate::message::Message;

use super::{Peer, SessionError};

/// An application override for one control message type.
///
/// Overrides receive the decoded message and the session handle, and replace
/// the default handler for that type. The default table itself is immutable;
/// overrides live in a per-session map consulted first.
pub type Handler = Arc<dyn Fn(&Peer, &Message) -> Result<(), SessionError> + Send + Sync>;

#[derive(Default)]
pub(super) struct Handlers {
    overrides: HashMap<u64, Handler>,
}

impl Handlers {
    pub fn register(&mut self, msg_type: u64, handler: Handler) {
        self.overrides.insert(msg_type, handler);
    }

    pub fn get(&self, msg_type: u64) -> Option<Handler> {
        self.overrides.get(&msg_type).cloned()
    }
}
