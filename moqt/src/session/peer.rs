use std::sync::{Arc, MutexGuard};

use tokio::sync::mpsc;

use crate::cache::Tracks;
use crate::coding::{Location, Params, SessionUri, TrackNamespace};
use crate::data;
use crate::message::{self, Message};
use crate::setup::{Role, Version};

use super::{
    ErrorCode, FetchOptions, FetchStream, Handler, ObjectDelivery, Pending, RequestError,
    SessionError, Shared, SubgroupStream, SubscribeOptions, SubscribeRequest,
};

/// The application's handle to a running session.
///
/// The handle is symmetric: the same methods serve the client and the
/// server role. Request methods buffer a control frame and return a
/// [Pending] slot; drop it for fire-and-forget, await it to suspend until
/// the matching OK/ERROR or the session closes.
#[derive(Clone)]
pub struct Peer {
    shared: Arc<Shared>,
}

impl Peer {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Our negotiated role.
    pub fn role(&self) -> Role {
        self.shared.state.lock().unwrap().role()
    }

    /// The peer's negotiated role.
    pub fn peer_role(&self) -> Option<Role> {
        self.shared.state.lock().unwrap().peer_role()
    }

    /// The setup parameters the peer sent, unknown ones included.
    pub fn peer_params(&self) -> Params {
        self.shared.state.lock().unwrap().peer_params()
    }

    /// True once a GOAWAY was sent or received.
    pub fn draining(&self) -> bool {
        self.shared.state.lock().unwrap().draining()
    }

    /// The negotiated version, once setup has completed.
    pub fn version(&self) -> Option<Version> {
        self.shared.state.lock().unwrap().version()
    }

    /// The redirect URI from a received GOAWAY, if any.
    pub fn goaway_uri(&self) -> Option<SessionUri> {
        self.shared.state.lock().unwrap().goaway_uri()
    }

    // ---- requests ---------------------------------------------------------

    /// Declare that we will serve a namespace.
    pub fn announce(
        &self,
        track_namespace: TrackNamespace,
        params: Params,
    ) -> Result<Pending<message::AnnounceOk>, RequestError> {
        let (msg, recv) = self
            .shared
            .state
            .lock()
            .unwrap()
            .announce_request(track_namespace, params)?;
        self.shared.send(msg.into());
        Ok(Pending::new(recv))
    }

    /// Withdraw a previously announced namespace.
    pub fn unannounce(&self, track_namespace: &TrackNamespace) {
        let msg = self
            .shared
            .state
            .lock()
            .unwrap()
            .unannounce_request(track_namespace);
        if let Some(msg) = msg {
            self.shared.send(msg.into());
        }
    }

    /// Subscribe to a track. Returns the allocated subscribe id and the
    /// response slot.
    pub fn subscribe(
        &self,
        track_namespace: TrackNamespace,
        track_name: &str,
        options: SubscribeOptions,
    ) -> Result<(u64, Pending<message::SubscribeOk>), RequestError> {
        let res = self.shared.state.lock().unwrap().subscribe_request(
            track_namespace,
            track_name,
            &options,
        );

        match res {
            Ok((msg, subscribe_id, recv)) => {
                self.shared.send(msg.into());
                Ok((subscribe_id, Pending::new(recv)))
            }
            Err(RequestError::Blocked) => {
                // Tell the peer we are starved before failing locally.
                let maximum = self.shared.state.lock().unwrap().peer_max_subscribe_id();
                self.shared
                    .send(message::SubscribesBlocked { maximum }.into());
                Err(RequestError::Blocked)
            }
            Err(err) => Err(err),
        }
    }

    /// Terminate one of our subscriptions. The record is freed once the
    /// peer's SUBSCRIBE_DONE arrives.
    pub fn unsubscribe(&self, subscribe_id: u64) {
        let msg = self
            .shared
            .state
            .lock()
            .unwrap()
            .unsubscribe_request(subscribe_id);
        if let Some(msg) = msg {
            self.shared.send(msg.into());
        }
    }

    /// Register interest in a namespace prefix.
    pub fn subscribe_announces(
        &self,
        namespace_prefix: TrackNamespace,
        params: Params,
    ) -> Result<Pending<message::SubscribeAnnouncesOk>, RequestError> {
        let (msg, recv) = self
            .shared
            .state
            .lock()
            .unwrap()
            .subscribe_announces_request(namespace_prefix, params)?;
        self.shared.send(msg.into());
        Ok(Pending::new(recv))
    }

    /// Withdraw interest in a namespace prefix.
    pub fn unsubscribe_announces(&self, namespace_prefix: TrackNamespace) {
        self.shared
            .send(message::UnsubscribeAnnounces { namespace_prefix }.into());
    }

    /// Request a range of a track's past objects.
    pub fn fetch(
        &self,
        track_namespace: TrackNamespace,
        track_name: &str,
        start: Location,
        end: Location,
        options: FetchOptions,
    ) -> Result<(u64, Pending<message::FetchOk>), RequestError> {
        let (msg, subscribe_id, recv) = self.shared.state.lock().unwrap().fetch_request(
            track_namespace,
            track_name,
            start,
            end,
            &options,
        )?;
        self.shared.send(msg.into());
        Ok((subscribe_id, Pending::new(recv)))
    }

    /// Abandon an outstanding fetch.
    pub fn fetch_cancel(&self, subscribe_id: u64) {
        let msg = self
            .shared
            .state
            .lock()
            .unwrap()
            .fetch_cancel_request(subscribe_id);
        if let Some(msg) = msg {
            self.shared.send(msg.into());
        }
    }

    /// Query the status of a track.
    pub fn track_status(
        &self,
        track_namespace: TrackNamespace,
        track_name: &str,
    ) -> Result<Pending<message::TrackStatus>, RequestError> {
        let (msg, recv) = self
            .shared
            .state
            .lock()
            .unwrap()
            .track_status_request(track_namespace, track_name)?;
        self.shared.send(msg.into());
        Ok(Pending::new(recv))
    }

    /// Begin a graceful shutdown, optionally redirecting the peer.
    pub fn goaway(&self, uri: SessionUri) {
        let msg = self.shared.state.lock().unwrap().goaway_request(uri);
        self.shared.send(msg.into());
    }

    /// Raise the maximum subscribe id the peer may use. Lowering is ignored.
    pub fn max_subscribe_id(&self, id: u64) {
        let msg = self
            .shared
            .state
            .lock()
            .unwrap()
            .max_subscribe_id_request(id);
        if let Some(msg) = msg {
            self.shared.send(msg.into());
        }
    }

    /// Receive inbound Subscribes for the application to decide on.
    ///
    /// A subscription stays PENDING until [Peer::accept_subscribe] or
    /// [Peer::reject_subscribe] answers it; the session still does the
    /// bookkeeping (id monotonicity, alias uniqueness, draining) before a
    /// request is delivered. Without a receiver, the default handler
    /// accepts every valid Subscribe. Calling this again replaces the
    /// previous receiver.
    pub fn subscribes(&self) -> mpsc::UnboundedReceiver<SubscribeRequest> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.subscribed_tx.lock().unwrap() = Some(tx);
        self.shared.state.lock().unwrap().set_defer_subscribes(true);
        rx
    }

    /// Accept a PENDING subscription, sending the SUBSCRIBE_OK that must
    /// precede any object on the track.
    pub fn accept_subscribe(&self, subscribe_id: u64) {
        let ok = {
            let cache = self.shared.cache.lock().unwrap();
            self.shared
                .state
                .lock()
                .unwrap()
                .accept_subscribed(subscribe_id, &cache)
        };
        if let Some(ok) = ok {
            self.shared.send(ok.into());
        }
    }

    /// Reject a PENDING subscription with SUBSCRIBE_ERROR, freeing its slot.
    pub fn reject_subscribe(&self, subscribe_id: u64, error_code: u64, reason: &str) {
        let msg = self
            .shared
            .state
            .lock()
            .unwrap()
            .reject_subscribed(subscribe_id, error_code, reason);
        if let Some(msg) = msg {
            self.shared.send(msg.into());
        }
    }

    /// Terminate one of the peer's subscriptions with SUBSCRIBE_DONE.
    pub fn subscribe_done(&self, subscribe_id: u64, status_code: u64, reason: &str) {
        let stream_count = {
            let mut state = self.shared.state.lock().unwrap();
            let count = state
                .subscribed_mut(subscribe_id)
                .map(|subscribed| subscribed.stream_count)
                .unwrap_or(0);
            state.remove_subscribed(subscribe_id);
            count
        };

        self.shared.send(
            message::SubscribeDone {
                subscribe_id,
                status_code,
                stream_count,
                reason: crate::coding::ReasonPhrase(reason.to_string()),
            }
            .into(),
        );
    }

    /// Buffer an arbitrary control frame, bypassing correlation.
    pub fn send_message<M: Into<Message>>(&self, msg: M) {
        self.shared.send(msg.into());
    }

    /// Replace the default handler for one control message type.
    pub fn register_handler<F>(&self, msg_type: u64, handler: F)
    where
        F: Fn(&Peer, &Message) -> Result<(), SessionError> + Send + Sync + 'static,
    {
        self.shared
            .handlers
            .lock()
            .unwrap()
            .register(msg_type, Arc::new(handler) as Handler);
    }

    // ---- data plane -------------------------------------------------------

    /// Open a unidirectional stream carrying one subgroup.
    pub async fn open_subgroup(
        &self,
        header: data::SubgroupHeader,
    ) -> Result<SubgroupStream, SessionError> {
        let stream = self.shared.open_uni().await?;
        self.shared.count_stream(header.track_alias);
        SubgroupStream::open(stream, header, self.shared.mlog()).await
    }

    /// Open a unidirectional stream answering an accepted fetch.
    pub async fn open_fetch(
        &self,
        subscribe_id: u64,
        priority: u8,
    ) -> Result<FetchStream, SessionError> {
        let stream = self.shared.open_uni().await?;
        FetchStream::open(stream, data::FetchHeader { subscribe_id }, priority).await
    }

    /// Send one object as a datagram. Delivery is best-effort.
    pub async fn send_datagram(&self, datagram: data::Datagram) -> Result<(), SessionError> {
        self.shared.send_datagram(datagram).await
    }

    /// Receive decoded objects as they arrive, alongside the cache.
    ///
    /// Only one receiver exists at a time; calling this again replaces the
    /// previous one.
    pub fn objects(&self) -> mpsc::UnboundedReceiver<ObjectDelivery> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.delivery.lock().unwrap() = Some(tx);
        rx
    }

    /// The received-object cache.
    pub fn cache(&self) -> MutexGuard<'_, Tracks> {
        self.shared.cache.lock().unwrap()
    }

    // ---- lifecycle --------------------------------------------------------

    /// Close the session: cancel pending requests, tear down streams, and
    /// tell the transport.
    pub fn close(&self, code: ErrorCode, reason: &str) {
        self.shared.close(code.into(), reason);
    }

    /// Suspend until the session closes, returning the close tuple.
    pub async fn closed(&self) -> (u64, String) {
        self.shared.closed().await
    }
}
