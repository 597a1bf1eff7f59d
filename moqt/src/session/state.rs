use std::collections::{HashMap, HashSet};

use tokio::sync::oneshot;

use crate::cache::Tracks;
use crate::coding::{Location, ParamType, Params, ReasonPhrase, SessionUri, TrackNamespace};
use crate::message::{self, track_status_code, FilterType, GroupOrder, Message};
use crate::setup::{Role, Version};

use super::{ErrorCode, RequestError, RequestKey, ResponseRx, ResponseTx, SessionError};

/// How many subscribe ids we allow the peer by default.
pub const DEFAULT_MAX_SUBSCRIBE_ID: u64 = 100;

/// Default subscriber priority.
pub const DEFAULT_PRIORITY: u8 = 128;

/// Status code sent in SUBSCRIBE_DONE after an UNSUBSCRIBE.
pub const SUBSCRIBE_DONE_UNSUBSCRIBED: u64 = 0x0;

/// Lifecycle of a subscription the peer requested from us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribedState {
    Pending,
    Active,
    Ending,
}

/// A subscription the peer requested from us (we are the publisher).
#[derive(Debug, Clone)]
pub struct Subscribed {
    pub track_namespace: TrackNamespace,
    pub track_name: String,
    pub track_alias: u64,
    pub priority: u8,
    pub group_order: GroupOrder,
    pub state: SubscribedState,

    /// Data streams opened so far, reported in SUBSCRIBE_DONE.
    pub stream_count: u64,
}

/// A subscription we requested from the peer (we are the subscriber).
#[derive(Debug, Clone)]
pub struct Subscribe {
    pub track_namespace: TrackNamespace,
    pub track_name: String,
    pub track_alias: u64,
    pub active: bool,
}

/// An inbound Subscribe awaiting the application's decision.
///
/// Delivered through [super::Peer::subscribes]; answer it with
/// [super::Peer::accept_subscribe] or [super::Peer::reject_subscribe]. The
/// session has already done the bookkeeping (id monotonicity, alias
/// uniqueness, draining) before the request reaches the application.
#[derive(Debug, Clone)]
pub struct SubscribeRequest {
    pub subscribe_id: u64,
    pub track_namespace: TrackNamespace,
    pub track_name: String,
    pub track_alias: u64,
    pub priority: u8,
    pub group_order: GroupOrder,
}

/// Options for an outbound Subscribe.
#[derive(Clone, Debug)]
pub struct SubscribeOptions {
    pub priority: u8,
    pub group_order: GroupOrder,
    pub filter_type: FilterType,
    pub start: Option<Location>,
    pub end_group: Option<u64>,
    pub params: Params,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            group_order: GroupOrder::Ascending,
            filter_type: FilterType::LatestGroup,
            start: None,
            end_group: None,
            params: Params::default(),
        }
    }
}

/// Options for an outbound Fetch.
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    pub priority: Option<u8>,
    pub group_order: Option<GroupOrder>,
    pub params: Params,
}

/// The control-plane state machine.
///
/// All of this is mutated only from the session task; the mutex around it
/// exists for the application-facing handles, not for concurrency within
/// the protocol itself.
pub(super) struct State {
    role: Role,
    peer_role: Option<Role>,
    version: Option<Version>,
    peer_params: Params,

    /// Issues the next outbound subscribe id.
    next_subscribe_id: u64,

    /// What we advertised to the peer.
    local_max_subscribe_id: u64,

    /// What the peer advertised to us; grows via MAX_SUBSCRIBE_ID.
    peer_max_subscribe_id: u64,

    /// The largest inbound subscribe id seen, to enforce monotonicity.
    peer_last_subscribe_id: Option<u64>,

    /// One-shot response slots, keyed by request.
    pending: HashMap<RequestKey, ResponseTx>,

    /// Our subscriptions, keyed by subscribe id.
    subscribes: HashMap<u64, Subscribe>,

    /// Our outstanding fetches, for routing their answer streams.
    fetches: HashMap<u64, (TrackNamespace, String)>,

    /// The peer's subscriptions, keyed by subscribe id.
    subscribed: HashMap<u64, Subscribed>,

    /// Alias to outbound subscribe id, for data-plane routing.
    aliases: HashMap<u64, u64>,

    /// Namespaces we have announced.
    announces: HashSet<TrackNamespace>,

    /// Namespaces the peer has announced.
    announced: HashSet<TrackNamespace>,

    /// Namespace prefixes the peer wants Announces forwarded for.
    prefixes: HashSet<TrackNamespace>,

    /// Inbound fetches the session should serve from the cache.
    serve_fetches: Vec<ServeFetch>,

    /// When set, inbound Subscribes stay PENDING until the application
    /// accepts or rejects them instead of being answered by the default.
    defer_subscribes: bool,

    /// Pending inbound Subscribes waiting to reach the application.
    subscribe_requests: Vec<SubscribeRequest>,

    /// Set after a GOAWAY in either direction.
    draining: bool,
    goaway_uri: Option<SessionUri>,

    /// Set exactly once when the session closes.
    close: Option<(u64, String)>,
}

/// An accepted inbound Fetch, queued for the data plane.
#[derive(Debug, Clone)]
pub(super) struct ServeFetch {
    pub subscribe_id: u64,
    pub track_namespace: TrackNamespace,
    pub track_name: String,
    pub priority: u8,
    pub start: Location,
    pub end: Location,
}

impl State {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            peer_role: None,
            version: None,
            peer_params: Params::default(),
            next_subscribe_id: 1,
            local_max_subscribe_id: DEFAULT_MAX_SUBSCRIBE_ID,
            peer_max_subscribe_id: u64::MAX,
            peer_last_subscribe_id: None,
            pending: HashMap::new(),
            subscribes: HashMap::new(),
            fetches: HashMap::new(),
            subscribed: HashMap::new(),
            aliases: HashMap::new(),
            announces: HashSet::new(),
            announced: HashSet::new(),
            prefixes: HashSet::new(),
            serve_fetches: Vec::new(),
            defer_subscribes: false,
            subscribe_requests: Vec::new(),
            draining: false,
            goaway_uri: None,
            close: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn peer_role(&self) -> Option<Role> {
        self.peer_role
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn local_max_subscribe_id(&self) -> u64 {
        self.local_max_subscribe_id
    }

    pub fn peer_max_subscribe_id(&self) -> u64 {
        self.peer_max_subscribe_id
    }

    pub fn peer_params(&self) -> Params {
        self.peer_params.clone()
    }

    pub fn draining(&self) -> bool {
        self.draining
    }

    pub fn goaway_uri(&self) -> Option<SessionUri> {
        self.goaway_uri.clone()
    }

    /// Record the peer's half of the setup exchange.
    pub fn set_peer(
        &mut self,
        role: Role,
        version: Version,
        params: Params,
    ) -> Result<(), SessionError> {
        if !self.role.is_compatible(role) {
            return Err(SessionError::RoleIncompatible(self.role, role));
        }

        if let Some(max) = params.varint(ParamType::MaxSubscribeId)? {
            self.peer_max_subscribe_id = max;
        }

        self.peer_role = Some(role);
        self.version = Some(version);
        self.peer_params = params;

        Ok(())
    }

    /// True once SERVER_SETUP/CLIENT_SETUP has been consumed.
    pub fn ready(&self) -> bool {
        self.version.is_some()
    }

    fn install(&mut self, key: RequestKey) -> Result<ResponseRx, RequestError> {
        let (tx, rx) = oneshot::channel();
        if self.pending.contains_key(&key) {
            return Err(RequestError::Duplicate);
        }
        self.pending.insert(key, tx);
        Ok(rx)
    }

    fn resolve(&mut self, key: &RequestKey, res: Result<Message, RequestError>) {
        match self.pending.remove(key) {
            Some(slot) => {
                // The receiver may have been dropped (fire-and-forget).
                slot.send(res).ok();
            }
            None => log::warn!("dropping response without a pending request: {:?}", key),
        }
    }

    // ---- outbound requests ------------------------------------------------

    pub fn subscribe_request(
        &mut self,
        track_namespace: TrackNamespace,
        track_name: &str,
        options: &SubscribeOptions,
    ) -> Result<(message::Subscribe, u64, ResponseRx), RequestError> {
        if self.draining {
            return Err(RequestError::GoingAway);
        }

        let subscribe_id = self.next_subscribe_id;
        if subscribe_id >= self.peer_max_subscribe_id {
            return Err(RequestError::Blocked);
        }

        let recv = self.install(RequestKey::Subscribe(subscribe_id))?;
        self.next_subscribe_id += 1;

        // The alias only needs to be unique per session; reusing the id is
        // the simplest way to get that.
        let track_alias = subscribe_id;

        let msg = message::Subscribe {
            subscribe_id,
            track_alias,
            track_namespace: track_namespace.clone(),
            track_name: track_name.to_string(),
            subscriber_priority: options.priority,
            group_order: options.group_order,
            filter_type: options.filter_type,
            start: options.start,
            end_group: options.end_group,
            params: options.params.clone(),
        };

        self.subscribes.insert(
            subscribe_id,
            Subscribe {
                track_namespace,
                track_name: track_name.to_string(),
                track_alias,
                active: false,
            },
        );

        Ok((msg, subscribe_id, recv))
    }

    pub fn unsubscribe_request(&mut self, subscribe_id: u64) -> Option<message::Unsubscribe> {
        // The record stays until SUBSCRIBE_DONE arrives.
        self.subscribes
            .contains_key(&subscribe_id)
            .then_some(message::Unsubscribe { subscribe_id })
    }

    pub fn announce_request(
        &mut self,
        track_namespace: TrackNamespace,
        params: Params,
    ) -> Result<(message::Announce, ResponseRx), RequestError> {
        if self.draining {
            return Err(RequestError::GoingAway);
        }
        if !self.announces.insert(track_namespace.clone()) {
            return Err(RequestError::Duplicate);
        }

        let recv = self.install(RequestKey::Announce(track_namespace.clone()))?;

        Ok((
            message::Announce {
                track_namespace,
                params,
            },
            recv,
        ))
    }

    pub fn unannounce_request(
        &mut self,
        track_namespace: &TrackNamespace,
    ) -> Option<message::Unannounce> {
        self.announces.remove(track_namespace).then(|| message::Unannounce {
            track_namespace: track_namespace.clone(),
        })
    }

    pub fn subscribe_announces_request(
        &mut self,
        namespace_prefix: TrackNamespace,
        params: Params,
    ) -> Result<(message::SubscribeAnnounces, ResponseRx), RequestError> {
        if self.draining {
            return Err(RequestError::GoingAway);
        }
        let recv = self.install(RequestKey::AnnouncePrefix(namespace_prefix.clone()))?;

        Ok((
            message::SubscribeAnnounces {
                namespace_prefix,
                params,
            },
            recv,
        ))
    }

    pub fn fetch_request(
        &mut self,
        track_namespace: TrackNamespace,
        track_name: &str,
        start: Location,
        end: Location,
        options: &FetchOptions,
    ) -> Result<(message::Fetch, u64, ResponseRx), RequestError> {
        if self.draining {
            return Err(RequestError::GoingAway);
        }

        let subscribe_id = self.next_subscribe_id;
        if subscribe_id >= self.peer_max_subscribe_id {
            return Err(RequestError::Blocked);
        }

        let recv = self.install(RequestKey::Fetch(subscribe_id))?;
        self.next_subscribe_id += 1;

        self.fetches.insert(
            subscribe_id,
            (track_namespace.clone(), track_name.to_string()),
        );

        Ok((
            message::Fetch {
                subscribe_id,
                subscriber_priority: options.priority.unwrap_or(DEFAULT_PRIORITY),
                group_order: options.group_order.unwrap_or(GroupOrder::Ascending),
                track_namespace,
                track_name: track_name.to_string(),
                start,
                end,
                params: options.params.clone(),
            },
            subscribe_id,
            recv,
        ))
    }

    pub fn track_status_request(
        &mut self,
        track_namespace: TrackNamespace,
        track_name: &str,
    ) -> Result<(message::TrackStatusRequest, ResponseRx), RequestError> {
        let recv = self.install(RequestKey::TrackStatus(
            track_namespace.clone(),
            track_name.to_string(),
        ))?;

        Ok((
            message::TrackStatusRequest {
                track_namespace,
                track_name: track_name.to_string(),
            },
            recv,
        ))
    }

    pub fn goaway_request(&mut self, uri: SessionUri) -> message::GoAway {
        self.draining = true;
        message::GoAway { uri }
    }

    /// Raise the maximum subscribe id we allow the peer. Never lowers it.
    pub fn max_subscribe_id_request(&mut self, id: u64) -> Option<message::MaxSubscribeId> {
        if id <= self.local_max_subscribe_id {
            return None;
        }
        self.local_max_subscribe_id = id;
        Some(message::MaxSubscribeId { id })
    }

    // ---- data-plane lookups ----------------------------------------------

    /// Resolve a track alias to the track it belongs to.
    pub fn lookup_alias(&self, track_alias: u64) -> Option<(TrackNamespace, String)> {
        let id = self.aliases.get(&track_alias)?;
        let subscribe = self.subscribes.get(id)?;
        Some((subscribe.track_namespace.clone(), subscribe.track_name.clone()))
    }

    /// Resolve an outbound fetch id to its track.
    pub fn lookup_fetch(&self, subscribe_id: u64) -> Option<(TrackNamespace, String)> {
        self.fetches.get(&subscribe_id).cloned()
    }

    /// Abandon one of our fetches.
    pub fn fetch_cancel_request(&mut self, subscribe_id: u64) -> Option<message::FetchCancel> {
        self.fetches
            .remove(&subscribe_id)
            .map(|_| message::FetchCancel { subscribe_id })
    }

    pub fn subscribed_mut(&mut self, subscribe_id: u64) -> Option<&mut Subscribed> {
        self.subscribed.get_mut(&subscribe_id)
    }

    pub fn remove_subscribed(&mut self, subscribe_id: u64) -> Option<Subscribed> {
        self.subscribed.remove(&subscribe_id)
    }

    /// Count a data stream opened for the peer's subscription on this alias,
    /// reported later in SUBSCRIBE_DONE.
    pub fn count_stream(&mut self, track_alias: u64) {
        if let Some(subscribed) = self
            .subscribed
            .values_mut()
            .find(|subscribed| subscribed.track_alias == track_alias)
        {
            subscribed.stream_count += 1;
        }
    }

    pub fn take_serve_fetches(&mut self) -> Vec<ServeFetch> {
        std::mem::take(&mut self.serve_fetches)
    }

    // ---- close ------------------------------------------------------------

    /// Mark the session closed and cancel every pending slot.
    ///
    /// Idempotent; only the first close tuple wins.
    pub fn set_close(&mut self, code: u64, reason: &str) -> bool {
        if self.close.is_some() {
            return false;
        }
        self.close = Some((code, reason.to_string()));

        for (_, slot) in self.pending.drain() {
            slot.send(Err(RequestError::Closed {
                code,
                reason: reason.to_string(),
            }))
            .ok();
        }

        true
    }

    // ---- inbound dispatch -------------------------------------------------

    /// Apply an inbound control message, returning the protocol-correct
    /// responses to send. Errors are fatal at session scope.
    pub fn recv_message(
        &mut self,
        msg: Message,
        cache: &Tracks,
    ) -> Result<Vec<Message>, SessionError> {
        if !self.ready() {
            return Err(SessionError::ProtocolViolation(format!(
                "{} before setup completed",
                msg.name()
            )));
        }

        match msg {
            // Responses to our requests.
            Message::SubscribeOk(msg) => self.recv_subscribe_ok(msg),
            Message::SubscribeError(msg) => self.recv_subscribe_error(msg),
            Message::AnnounceOk(msg) => self.recv_announce_ok(msg),
            Message::AnnounceError(msg) => self.recv_announce_error(msg),
            Message::SubscribeAnnouncesOk(msg) => self.recv_subscribe_announces_ok(msg),
            Message::SubscribeAnnouncesError(msg) => self.recv_subscribe_announces_error(msg),
            Message::FetchOk(msg) => self.recv_fetch_ok(msg),
            Message::FetchError(msg) => self.recv_fetch_error(msg),
            Message::TrackStatus(msg) => self.recv_track_status(msg),

            // Requests from the peer.
            Message::Subscribe(msg) => self.recv_subscribe(msg, cache),
            Message::SubscribeUpdate(msg) => self.recv_subscribe_update(msg),
            Message::Unsubscribe(msg) => self.recv_unsubscribe(msg),
            Message::Announce(msg) => self.recv_announce(msg),
            Message::Unannounce(msg) => self.recv_unannounce(msg),
            Message::AnnounceCancel(msg) => self.recv_announce_cancel(msg),
            Message::SubscribeAnnounces(msg) => self.recv_subscribe_announces(msg),
            Message::UnsubscribeAnnounces(msg) => self.recv_unsubscribe_announces(msg),
            Message::TrackStatusRequest(msg) => self.recv_track_status_request(msg, cache),
            Message::Fetch(msg) => self.recv_fetch(msg, cache),
            Message::FetchCancel(msg) => self.recv_fetch_cancel(msg),
            Message::SubscribeDone(msg) => self.recv_subscribe_done(msg),
            Message::MaxSubscribeId(msg) => self.recv_max_subscribe_id(msg),
            Message::SubscribesBlocked(msg) => self.recv_subscribes_blocked(msg),
            Message::GoAway(msg) => self.recv_goaway(msg),
        }
    }

    fn recv_subscribe_ok(&mut self, msg: message::SubscribeOk) -> Result<Vec<Message>, SessionError> {
        if let Some(subscribe) = self.subscribes.get_mut(&msg.subscribe_id) {
            if subscribe.active {
                log::warn!("duplicate SUBSCRIBE_OK: id={}", msg.subscribe_id);
            }
            subscribe.active = true;
            self.aliases.insert(subscribe.track_alias, msg.subscribe_id);
        }

        self.resolve(&RequestKey::Subscribe(msg.subscribe_id), Ok(msg.into()));
        Ok(vec![])
    }

    fn recv_subscribe_error(
        &mut self,
        msg: message::SubscribeError,
    ) -> Result<Vec<Message>, SessionError> {
        if let Some(subscribe) = self.subscribes.remove(&msg.subscribe_id) {
            self.aliases.remove(&subscribe.track_alias);
        }

        self.resolve(
            &RequestKey::Subscribe(msg.subscribe_id),
            Err(RequestError::Rejected {
                code: msg.error_code,
                reason: msg.reason_phrase.0.clone(),
            }),
        );
        Ok(vec![])
    }

    fn recv_announce_ok(&mut self, msg: message::AnnounceOk) -> Result<Vec<Message>, SessionError> {
        self.resolve(
            &RequestKey::Announce(msg.track_namespace.clone()),
            Ok(msg.into()),
        );
        Ok(vec![])
    }

    fn recv_announce_error(
        &mut self,
        msg: message::AnnounceError,
    ) -> Result<Vec<Message>, SessionError> {
        self.announces.remove(&msg.track_namespace);
        self.resolve(
            &RequestKey::Announce(msg.track_namespace.clone()),
            Err(RequestError::Rejected {
                code: msg.error_code,
                reason: msg.reason_phrase.0.clone(),
            }),
        );
        Ok(vec![])
    }

    fn recv_subscribe_announces_ok(
        &mut self,
        msg: message::SubscribeAnnouncesOk,
    ) -> Result<Vec<Message>, SessionError> {
        self.resolve(
            &RequestKey::AnnouncePrefix(msg.namespace_prefix.clone()),
            Ok(msg.into()),
        );
        Ok(vec![])
    }

    fn recv_subscribe_announces_error(
        &mut self,
        msg: message::SubscribeAnnouncesError,
    ) -> Result<Vec<Message>, SessionError> {
        self.resolve(
            &RequestKey::AnnouncePrefix(msg.namespace_prefix.clone()),
            Err(RequestError::Rejected {
                code: msg.error_code,
                reason: msg.reason_phrase.0.clone(),
            }),
        );
        Ok(vec![])
    }

    fn recv_fetch_ok(&mut self, msg: message::FetchOk) -> Result<Vec<Message>, SessionError> {
        self.resolve(&RequestKey::Fetch(msg.subscribe_id), Ok(msg.into()));
        Ok(vec![])
    }

    fn recv_fetch_error(&mut self, msg: message::FetchError) -> Result<Vec<Message>, SessionError> {
        self.fetches.remove(&msg.subscribe_id);
        self.resolve(
            &RequestKey::Fetch(msg.subscribe_id),
            Err(RequestError::Rejected {
                code: msg.error_code,
                reason: msg.reason_phrase.0.clone(),
            }),
        );
        Ok(vec![])
    }

    fn recv_track_status(&mut self, msg: message::TrackStatus) -> Result<Vec<Message>, SessionError> {
        self.resolve(
            &RequestKey::TrackStatus(msg.track_namespace.clone(), msg.track_name.clone()),
            Ok(msg.into()),
        );
        Ok(vec![])
    }

    fn recv_subscribe(
        &mut self,
        msg: message::Subscribe,
        cache: &Tracks,
    ) -> Result<Vec<Message>, SessionError> {
        if !self.role.is_publisher() {
            return Err(SessionError::ProtocolViolation(
                "subscribe sent to a non-publisher".to_string(),
            ));
        }

        // Ids are monotonically increasing; reuse is a protocol error.
        if self.peer_last_subscribe_id >= Some(msg.subscribe_id) {
            return Err(SessionError::ProtocolViolation(format!(
                "subscribe id {} is not increasing",
                msg.subscribe_id
            )));
        }
        if msg.subscribe_id >= self.local_max_subscribe_id {
            return Err(SessionError::ProtocolViolation(format!(
                "subscribe id {} exceeds the advertised maximum",
                msg.subscribe_id
            )));
        }
        self.peer_last_subscribe_id = Some(msg.subscribe_id);

        if self.draining {
            return Ok(vec![message::SubscribeError {
                subscribe_id: msg.subscribe_id,
                error_code: ErrorCode::GoawayTimeout.into(),
                reason_phrase: ReasonPhrase("going away".to_string()),
                track_alias: msg.track_alias,
            }
            .into()]);
        }

        // The alias must be unique among active subscriptions.
        if self.subscribed.values().any(|subscribed| {
            subscribed.track_alias == msg.track_alias
                && subscribed.state != SubscribedState::Ending
        }) {
            return Err(SessionError::Duplicate);
        }

        let group_order = match msg.group_order {
            GroupOrder::Publisher => GroupOrder::Ascending,
            order => order,
        };

        self.subscribed.insert(
            msg.subscribe_id,
            Subscribed {
                track_namespace: msg.track_namespace.clone(),
                track_name: msg.track_name.clone(),
                track_alias: msg.track_alias,
                priority: msg.subscriber_priority,
                group_order,
                state: SubscribedState::Pending,
                stream_count: 0,
            },
        );

        // The application decides OK or ERROR when it asked to; otherwise
        // the default accepts on its behalf.
        if self.defer_subscribes {
            self.subscribe_requests.push(SubscribeRequest {
                subscribe_id: msg.subscribe_id,
                track_namespace: msg.track_namespace,
                track_name: msg.track_name,
                track_alias: msg.track_alias,
                priority: msg.subscriber_priority,
                group_order,
            });
            return Ok(vec![]);
        }

        match self.accept_subscribed(msg.subscribe_id, cache) {
            Some(ok) => Ok(vec![ok.into()]),
            None => Err(SessionError::Internal),
        }
    }

    /// Move a PENDING inbound subscription to ACTIVE, producing the
    /// SUBSCRIBE_OK that must precede any object on the track.
    pub fn accept_subscribed(
        &mut self,
        subscribe_id: u64,
        cache: &Tracks,
    ) -> Option<message::SubscribeOk> {
        let subscribed = self.subscribed.get_mut(&subscribe_id)?;
        if subscribed.state != SubscribedState::Pending {
            log::warn!("subscription {} was already decided", subscribe_id);
            return None;
        }
        subscribed.state = SubscribedState::Active;

        let group_order = subscribed.group_order;
        let largest = cache
            .get(&subscribed.track_namespace, &subscribed.track_name)
            .and_then(|track| track.largest());

        Some(message::SubscribeOk {
            subscribe_id,
            expires: 0,
            group_order,
            content_exists: largest.is_some(),
            largest,
            params: Params::default(),
        })
    }

    /// Reject a PENDING inbound subscription, freeing its slot.
    pub fn reject_subscribed(
        &mut self,
        subscribe_id: u64,
        error_code: u64,
        reason: &str,
    ) -> Option<message::SubscribeError> {
        let subscribed = self.subscribed.get(&subscribe_id)?;
        if subscribed.state != SubscribedState::Pending {
            log::warn!("subscription {} was already decided", subscribe_id);
            return None;
        }

        let track_alias = subscribed.track_alias;
        self.subscribed.remove(&subscribe_id);

        Some(message::SubscribeError {
            subscribe_id,
            error_code,
            reason_phrase: ReasonPhrase(reason.to_string()),
            track_alias,
        })
    }

    /// Route inbound Subscribes to the application instead of the default
    /// accept.
    pub fn set_defer_subscribes(&mut self, defer: bool) {
        self.defer_subscribes = defer;
    }

    pub fn take_subscribe_requests(&mut self) -> Vec<SubscribeRequest> {
        std::mem::take(&mut self.subscribe_requests)
    }

    fn recv_subscribe_update(
        &mut self,
        msg: message::SubscribeUpdate,
    ) -> Result<Vec<Message>, SessionError> {
        // Adjusts the subscription in place without changing its state.
        if let Some(subscribed) = self.subscribed.get_mut(&msg.subscribe_id) {
            subscribed.priority = msg.subscriber_priority;
        } else {
            log::warn!(
                "subscribe update for unknown subscription: id={}",
                msg.subscribe_id
            );
        }
        Ok(vec![])
    }

    fn recv_unsubscribe(&mut self, msg: message::Unsubscribe) -> Result<Vec<Message>, SessionError> {
        let Some(subscribed) = self.subscribed.get_mut(&msg.subscribe_id) else {
            log::warn!("unsubscribe for unknown subscription: id={}", msg.subscribe_id);
            return Ok(vec![]);
        };

        subscribed.state = SubscribedState::Ending;
        let stream_count = subscribed.stream_count;

        // The publisher still sends SUBSCRIBE_DONE, after which the slot is
        // freed.
        self.subscribed.remove(&msg.subscribe_id);

        Ok(vec![message::SubscribeDone {
            subscribe_id: msg.subscribe_id,
            status_code: SUBSCRIBE_DONE_UNSUBSCRIBED,
            stream_count,
            reason: ReasonPhrase("unsubscribed".to_string()),
        }
        .into()])
    }

    fn recv_announce(&mut self, msg: message::Announce) -> Result<Vec<Message>, SessionError> {
        if !self.announced.insert(msg.track_namespace.clone()) {
            return Err(SessionError::Duplicate);
        }

        Ok(vec![message::AnnounceOk {
            track_namespace: msg.track_namespace,
        }
        .into()])
    }

    fn recv_unannounce(&mut self, msg: message::Unannounce) -> Result<Vec<Message>, SessionError> {
        self.announced.remove(&msg.track_namespace);
        Ok(vec![])
    }

    fn recv_announce_cancel(
        &mut self,
        msg: message::AnnounceCancel,
    ) -> Result<Vec<Message>, SessionError> {
        self.announces.remove(&msg.track_namespace);
        Ok(vec![])
    }

    fn recv_subscribe_announces(
        &mut self,
        msg: message::SubscribeAnnounces,
    ) -> Result<Vec<Message>, SessionError> {
        if self.draining {
            return Ok(vec![message::SubscribeAnnouncesError {
                namespace_prefix: msg.namespace_prefix,
                error_code: ErrorCode::GoawayTimeout.into(),
                reason_phrase: ReasonPhrase("going away".to_string()),
            }
            .into()]);
        }

        self.prefixes.insert(msg.namespace_prefix.clone());

        // Replay matching announces so a late subscriber catches up.
        let mut responses: Vec<Message> = vec![message::SubscribeAnnouncesOk {
            namespace_prefix: msg.namespace_prefix.clone(),
        }
        .into()];

        for namespace in &self.announces {
            if msg.namespace_prefix.is_prefix_of(namespace) {
                responses.push(
                    message::Announce {
                        track_namespace: namespace.clone(),
                        params: Params::default(),
                    }
                    .into(),
                );
            }
        }

        Ok(responses)
    }

    fn recv_unsubscribe_announces(
        &mut self,
        msg: message::UnsubscribeAnnounces,
    ) -> Result<Vec<Message>, SessionError> {
        self.prefixes.remove(&msg.namespace_prefix);
        Ok(vec![])
    }

    fn recv_track_status_request(
        &mut self,
        msg: message::TrackStatusRequest,
        cache: &Tracks,
    ) -> Result<Vec<Message>, SessionError> {
        let (status_code, last) = match cache
            .get(&msg.track_namespace, &msg.track_name)
            .and_then(|track| track.largest())
        {
            Some(last) => (track_status_code::IN_PROGRESS, last),
            None => (track_status_code::DOES_NOT_EXIST, Location::default()),
        };

        Ok(vec![message::TrackStatus {
            track_namespace: msg.track_namespace,
            track_name: msg.track_name,
            status_code,
            last,
        }
        .into()])
    }

    fn recv_fetch(
        &mut self,
        msg: message::Fetch,
        cache: &Tracks,
    ) -> Result<Vec<Message>, SessionError> {
        if !self.role.is_publisher() {
            return Err(SessionError::ProtocolViolation(
                "fetch sent to a non-publisher".to_string(),
            ));
        }

        let Some(largest) = cache
            .get(&msg.track_namespace, &msg.track_name)
            .and_then(|track| track.largest())
        else {
            return Ok(vec![message::FetchError {
                subscribe_id: msg.subscribe_id,
                error_code: 0x4, // track does not exist
                reason_phrase: ReasonPhrase("track does not exist".to_string()),
            }
            .into()]);
        };

        let end = msg.end.min(largest);
        self.serve_fetches.push(ServeFetch {
            subscribe_id: msg.subscribe_id,
            track_namespace: msg.track_namespace.clone(),
            track_name: msg.track_name.clone(),
            priority: msg.subscriber_priority,
            start: msg.start,
            end,
        });

        Ok(vec![message::FetchOk {
            subscribe_id: msg.subscribe_id,
            group_order: match msg.group_order {
                GroupOrder::Publisher => GroupOrder::Ascending,
                order => order,
            },
            end_of_track: end >= largest,
            largest: end,
            params: Params::default(),
        }
        .into()])
    }

    fn recv_fetch_cancel(&mut self, msg: message::FetchCancel) -> Result<Vec<Message>, SessionError> {
        self.serve_fetches
            .retain(|fetch| fetch.subscribe_id != msg.subscribe_id);
        Ok(vec![])
    }

    fn recv_subscribe_done(
        &mut self,
        msg: message::SubscribeDone,
    ) -> Result<Vec<Message>, SessionError> {
        if let Some(subscribe) = self.subscribes.remove(&msg.subscribe_id) {
            self.aliases.remove(&subscribe.track_alias);
            log::debug!(
                "subscription done: id={} status={} streams={} reason={}",
                msg.subscribe_id,
                msg.status_code,
                msg.stream_count,
                msg.reason.0
            );
        }
        Ok(vec![])
    }

    fn recv_max_subscribe_id(
        &mut self,
        msg: message::MaxSubscribeId,
    ) -> Result<Vec<Message>, SessionError> {
        // Only allowed to grow.
        if msg.id < self.peer_max_subscribe_id && self.peer_max_subscribe_id != u64::MAX {
            return Err(SessionError::ProtocolViolation(
                "max subscribe id decreased".to_string(),
            ));
        }
        self.peer_max_subscribe_id = msg.id;
        Ok(vec![])
    }

    fn recv_subscribes_blocked(
        &mut self,
        msg: message::SubscribesBlocked,
    ) -> Result<Vec<Message>, SessionError> {
        log::warn!("peer is blocked on max subscribe id: {}", msg.maximum);
        Ok(vec![])
    }

    fn recv_goaway(&mut self, msg: message::GoAway) -> Result<Vec<Message>, SessionError> {
        // Outstanding work continues; only new subscriptions are refused.
        self.draining = true;
        self.goaway_uri = Some(msg.uri);
        Ok(vec![])
    }
}
