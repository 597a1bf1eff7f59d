use std::marker::PhantomData;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::coding::TrackNamespace;
use crate::message::Message;

use super::ErrorCode;

/// The correlation key installed for an outbound request.
///
/// The canonical key is the subscribe id; announces correlate on the
/// namespace tuple and track status on (namespace, name).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum RequestKey {
    Subscribe(u64),
    Fetch(u64),
    Announce(TrackNamespace),
    AnnouncePrefix(TrackNamespace),
    TrackStatus(TrackNamespace, String),
}

/// Why an awaited request did not resolve to its OK message.
#[derive(thiserror::Error, Debug, Clone)]
pub enum RequestError {
    /// The peer answered with the matching ERROR message.
    #[error("rejected by peer: code={code} reason={reason}")]
    Rejected { code: u64, reason: String },

    /// The session closed while the request was pending.
    #[error("session closed: code={code} reason={reason}")]
    Closed { code: u64, reason: String },

    /// The per-request timeout elapsed; the session remains open.
    #[error("timed out")]
    Timeout,

    /// A GOAWAY is in effect; no new requests are accepted.
    #[error("session is draining")]
    GoingAway,

    /// The peer's MAX_SUBSCRIBE_ID does not allow another subscribe.
    #[error("blocked by the peer's maximum subscribe id")]
    Blocked,

    /// A request with the same key is already outstanding.
    #[error("duplicate request")]
    Duplicate,

    /// The slot resolved with a message of the wrong type.
    #[error("unexpected response type")]
    Unexpected,
}

pub(super) type ResponseTx = oneshot::Sender<Result<Message, RequestError>>;
pub(super) type ResponseRx = oneshot::Receiver<Result<Message, RequestError>>;

/// A one-shot response slot returned by every request method.
///
/// Await [Pending::response] to suspend until the matching OK/ERROR arrives
/// or the session closes. Dropping it instead makes the request
/// fire-and-forget; a response arriving afterwards is logged and discarded.
#[must_use = "drop to fire-and-forget, await response() otherwise"]
pub struct Pending<T> {
    recv: ResponseRx,
    timeout: Option<Duration>,
    _marker: PhantomData<T>,
}

impl<T: TryFrom<Message>> Pending<T> {
    pub(super) fn new(recv: ResponseRx) -> Self {
        Self {
            recv,
            timeout: None,
            _marker: PhantomData,
        }
    }

    /// Resolve with [RequestError::Timeout] if no response arrives in time.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Suspend until the matching OK/ERROR arrives or the session closes.
    pub async fn response(self) -> Result<T, RequestError> {
        let res = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.recv)
                .await
                .map_err(|_| RequestError::Timeout)?,
            None => self.recv.await,
        };

        // The sender only disappears without resolving when the session is
        // dropped outright.
        let msg = res.map_err(|_| RequestError::Closed {
            code: ErrorCode::SessionClosed.into(),
            reason: "session dropped".to_string(),
        })??;

        T::try_from(msg).map_err(|_| RequestError::Unexpected)
    }
}
