//! The session runtime: a symmetric MoQT peer over one WebTransport session.
//!
//! [Session::connect] / [Session::accept] perform the setup exchange and
//! return the driver plus a cloneable [Peer] handle. The driver's
//! [Session::run] must be polled for anything to happen: it reads the
//! control stream, fans out unidirectional data streams, and owns every
//! piece of protocol state.

mod error;
mod handler;
mod intake;
mod peer;
mod reader;
mod request;
mod state;
mod stream;
mod writer;

pub use error::*;
pub use handler::Handler;
pub use intake::ObjectDelivery;
pub use peer::*;
pub use request::*;
pub use state::{
    FetchOptions, SubscribeOptions, SubscribeRequest, SubscribedState, DEFAULT_MAX_SUBSCRIBE_ID,
    DEFAULT_PRIORITY, SUBSCRIBE_DONE_UNSUBSCRIBED,
};
pub use stream::*;

use reader::*;
use writer::*;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::BytesMut;
use futures::{stream::FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, watch};

use crate::cache::Tracks;
use crate::coding::{Encode, ParamType, Params};
use crate::data;
use crate::message::Message;
use crate::mlog::{self, MlogWriter};
use crate::setup::{self, Role, Version, Versions};

use intake::StreamTable;
use state::{ServeFetch, State};

/// How long the setup exchange may take before the connection is abandoned.
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(5);

/// The versions this peer speaks, in preference order.
pub fn supported_versions() -> Versions {
    [Version::DRAFT_07].into()
}

fn select_version(offered: &Versions, supported: &Versions) -> Option<Version> {
    supported
        .0
        .iter()
        .find(|version| offered.0.contains(version))
        .copied()
}

/// State shared between the driver, the [Peer] handles, and stream tasks.
pub(crate) struct Shared {
    webtransport: web_transport::Session,
    outgoing: mpsc::UnboundedSender<Message>,

    pub(super) state: Mutex<State>,
    pub(super) cache: Mutex<Tracks>,
    pub(super) handlers: Mutex<handler::Handlers>,
    pub(super) delivery: Mutex<Option<mpsc::UnboundedSender<ObjectDelivery>>>,
    pub(super) subscribed_tx: Mutex<Option<mpsc::UnboundedSender<SubscribeRequest>>>,
    pub(super) streams: Mutex<StreamTable>,

    closed_tx: watch::Sender<Option<(u64, String)>>,
    mlog: Option<Arc<Mutex<MlogWriter>>>,
}

impl Shared {
    /// Buffer a control frame; the run_send arm flushes it in order.
    pub(super) fn send(&self, msg: Message) {
        self.mlog_event(|time| mlog::control_message_created(time, &msg));
        log::debug!("queueing message: {:?}", msg);
        self.outgoing.send(msg).ok();
    }

    pub(super) fn deliver(&self, delivery: ObjectDelivery) {
        let mut guard = self.delivery.lock().unwrap();
        if let Some(tx) = guard.as_ref() {
            if tx.send(delivery).is_err() {
                *guard = None;
            }
        }
    }

    pub(super) async fn open_uni(&self) -> Result<Writer, SessionError> {
        let mut webtransport = self.webtransport.clone();
        let stream = webtransport.open_uni().await?;
        Ok(Writer::new(stream))
    }

    pub(super) async fn send_datagram(&self, datagram: data::Datagram) -> Result<(), SessionError> {
        let mut buf = BytesMut::new();
        datagram.encode(&mut buf)?;

        let mut webtransport = self.webtransport.clone();
        webtransport.send_datagram(buf.freeze()).await?;
        Ok(())
    }

    pub(super) fn count_stream(&self, track_alias: u64) {
        self.state.lock().unwrap().count_stream(track_alias);
    }

    pub(super) fn mlog(&self) -> Option<Arc<Mutex<MlogWriter>>> {
        self.mlog.clone()
    }

    pub(super) fn mlog_event(&self, f: impl FnOnce(f64) -> mlog::Event) {
        if let Some(mlog) = &self.mlog {
            if let Ok(mut mlog) = mlog.lock() {
                let time = mlog.elapsed_ms();
                let event = f(time);
                mlog.add_event(event).ok();
            }
        }
    }

    /// Tear the session down. Idempotent; only the first close tuple wins.
    pub(super) fn close(&self, code: u64, reason: &str) {
        if !self.state.lock().unwrap().set_close(code, reason) {
            return;
        }

        log::info!("closing session: code={} reason={}", code, reason);
        self.streams.lock().unwrap().clear();

        let mut webtransport = self.webtransport.clone();
        webtransport.close(code as u32, reason);

        self.closed_tx.send(Some((code, reason.to_string()))).ok();
    }

    pub(super) async fn closed(&self) -> (u64, String) {
        let mut rx = self.closed_tx.subscribe();
        loop {
            let current = rx.borrow().clone();
            if let Some(close) = current {
                return close;
            }
            if rx.changed().await.is_err() {
                return (ErrorCode::SessionClosed.into(), "session dropped".to_string());
            }
        }
    }
}

/// The session driver. Owns the control stream and must be run.
#[must_use = "run() must be called"]
pub struct Session {
    shared: Arc<Shared>,
    sender: Writer,
    recver: Reader,
    outgoing: mpsc::UnboundedReceiver<Message>,
}

impl Session {
    fn new(
        webtransport: web_transport::Session,
        sender: Writer,
        recver: Reader,
        state: State,
        mlog: Option<Arc<Mutex<MlogWriter>>>,
    ) -> (Self, Peer) {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (closed_tx, _) = watch::channel(None);

        // Honor the peer's MAX_CACHE_DURATION, in seconds.
        let mut cache = Tracks::new();
        if let Ok(Some(seconds)) = state.peer_params().varint(ParamType::MaxCacheDuration) {
            cache.set_max_cache_duration(Some(Duration::from_secs(seconds)));
        }

        let shared = Arc::new(Shared {
            webtransport,
            outgoing: outgoing_tx,
            state: Mutex::new(state),
            cache: Mutex::new(cache),
            handlers: Mutex::new(Default::default()),
            delivery: Mutex::new(None),
            subscribed_tx: Mutex::new(None),
            streams: Mutex::new(Default::default()),
            closed_tx,
            mlog,
        });

        let session = Self {
            shared: shared.clone(),
            sender,
            recver,
            outgoing: outgoing_rx,
        };

        (session, Peer::new(shared))
    }

    fn local_params(state: &State) -> Result<Params, SessionError> {
        let mut params = Params::default();
        params.set_varint(ParamType::MaxSubscribeId, state.local_max_subscribe_id())?;
        Ok(params)
    }

    /// Establish a session as the client: open the control stream and
    /// perform the CLIENT_SETUP / SERVER_SETUP exchange.
    pub async fn connect(
        mut session: web_transport::Session,
        role: Role,
        mlog: Option<Arc<Mutex<MlogWriter>>>,
    ) -> Result<(Session, Peer), SessionError> {
        let control = session.open_bi().await?;
        let mut sender = Writer::new(control.0);
        let mut recver = Reader::new(control.1);

        let mut state = State::new(role);

        let client = setup::Client {
            versions: supported_versions(),
            role,
            params: Self::local_params(&state)?,
        };
        log::debug!("sending CLIENT_SETUP: {:?}", client);
        sender.encode(&client).await?;

        // The session is READY only once SERVER_SETUP is consumed.
        let server: setup::Server = tokio::time::timeout(SETUP_TIMEOUT, recver.decode())
            .await
            .map_err(|_| SessionError::Timeout)??;
        log::debug!("received SERVER_SETUP: {:?}", server);

        if !supported_versions().0.contains(&server.version) {
            let err = SessionError::Version(
                Versions(vec![server.version]),
                supported_versions(),
            );
            session.close(err.code() as u32, &err.to_string());
            return Err(err);
        }

        state.set_peer(server.role, server.version, server.params)?;

        Ok(Self::new(session, sender, recver, state, mlog))
    }

    /// Establish a session as the server: accept the control stream, pick a
    /// version, and answer with SERVER_SETUP.
    pub async fn accept(
        mut session: web_transport::Session,
        role: Role,
        mlog: Option<Arc<Mutex<MlogWriter>>>,
    ) -> Result<(Session, Peer), SessionError> {
        let control = session.accept_bi().await?;
        let mut sender = Writer::new(control.0);
        let mut recver = Reader::new(control.1);

        let mut state = State::new(role);

        let client: setup::Client = tokio::time::timeout(SETUP_TIMEOUT, recver.decode())
            .await
            .map_err(|_| SessionError::Timeout)??;
        log::debug!("received CLIENT_SETUP: {:?}", client);

        let Some(version) = select_version(&client.versions, &supported_versions()) else {
            let err = SessionError::Version(client.versions, supported_versions());
            session.close(err.code() as u32, &err.to_string());
            return Err(err);
        };

        let server = setup::Server {
            version,
            role,
            params: Self::local_params(&state)?,
        };
        log::debug!("sending SERVER_SETUP: {:?}", server);
        sender.encode(&server).await?;

        state.set_peer(client.role, version, client.params)?;

        Ok(Self::new(session, sender, recver, state, mlog))
    }

    /// The application handle; cloneable, also returned by connect/accept.
    pub fn peer(&self) -> Peer {
        Peer::new(self.shared.clone())
    }

    /// Drive the session until it closes or fails.
    ///
    /// All protocol state is mutated from this task; application handles
    /// only enqueue work towards it.
    pub async fn run(self) -> Result<(), SessionError> {
        let shared = self.shared;

        let res = tokio::select! {
            res = Self::run_recv(shared.clone(), self.recver) => res,
            res = Self::run_send(self.sender, self.outgoing) => res,
            res = Self::run_streams(shared.clone()) => res,
            res = Self::run_datagrams(shared.clone()) => res,
        };

        // Teardown: resolve every pending slot and waiter with the close
        // tuple, exactly once.
        match &res {
            Ok(()) => shared.close(ErrorCode::NoError.into(), "closed"),
            Err(SessionError::Closed(code, reason)) => shared.close(*code, reason),
            Err(err) => shared.close(err.code(), &err.to_string()),
        }

        res
    }

    async fn run_recv(shared: Arc<Shared>, mut recver: Reader) -> Result<(), SessionError> {
        loop {
            let msg: Message = recver.decode().await?;
            log::debug!("received message: {:?}", msg);
            shared.mlog_event(|time| mlog::control_message_parsed(time, &msg));

            // An application override replaces the default handler.
            let handler = shared.handlers.lock().unwrap().get(msg.id());
            if let Some(handler) = handler {
                let peer = Peer::new(shared.clone());
                // A handler failure is scoped to the message, not the session.
                if let Err(err) = handler(&peer, &msg) {
                    log::warn!("handler failed for {}: {}", msg.name(), err);
                }
                continue;
            }

            let responses = {
                let cache = shared.cache.lock().unwrap();
                shared.state.lock().unwrap().recv_message(msg, &cache)?
            };
            for response in responses {
                shared.send(response);
            }

            // Hand deferred Subscribes to the application for a decision.
            for request in shared.state.lock().unwrap().take_subscribe_requests() {
                let sent = {
                    let mut guard = shared.subscribed_tx.lock().unwrap();
                    let sent = match guard.as_ref() {
                        Some(tx) => tx.send(request.clone()).is_ok(),
                        None => false,
                    };
                    if !sent {
                        *guard = None;
                    }
                    sent
                };

                // The receiver is gone; answer with the default accept so
                // the peer is not left waiting forever.
                if !sent {
                    log::warn!("subscribe receiver dropped, reverting to auto-accept");
                    shared.state.lock().unwrap().set_defer_subscribes(false);
                    let ok = {
                        let cache = shared.cache.lock().unwrap();
                        shared
                            .state
                            .lock()
                            .unwrap()
                            .accept_subscribed(request.subscribe_id, &cache)
                    };
                    if let Some(ok) = ok {
                        shared.send(ok.into());
                    }
                }
            }

            // Serve any fetch the default handler just accepted.
            for fetch in shared.state.lock().unwrap().take_serve_fetches() {
                let shared = shared.clone();
                tokio::spawn(async move {
                    if let Err(err) = Self::serve_fetch(shared, fetch).await {
                        log::warn!("failed serving fetch: {}", err);
                    }
                });
            }
        }
    }

    async fn run_send(
        mut sender: Writer,
        mut outgoing: mpsc::UnboundedReceiver<Message>,
    ) -> Result<(), SessionError> {
        while let Some(msg) = outgoing.recv().await {
            log::debug!("sending message: {:?}", msg);
            sender.encode(&msg).await?;
        }

        Ok(())
    }

    async fn run_streams(shared: Arc<Shared>) -> Result<(), SessionError> {
        let mut webtransport = shared.webtransport.clone();
        let mut tasks = FuturesUnordered::new();

        loop {
            tokio::select! {
                res = webtransport.accept_uni() => {
                    let stream = res?;
                    let shared = shared.clone();

                    tasks.push(async move {
                        if let Err(err) = intake::recv_stream(shared.clone(), stream).await {
                            // Protocol errors are fatal at session scope.
                            if err.code() == u64::from(ErrorCode::ProtocolViolation) {
                                shared.close(err.code(), &err.to_string());
                            } else {
                                log::warn!("failed to serve stream: {}", err);
                            }
                        }
                    });
                },
                _ = tasks.next(), if !tasks.is_empty() => {},
            };
        }
    }

    async fn run_datagrams(shared: Arc<Shared>) -> Result<(), SessionError> {
        let mut webtransport = shared.webtransport.clone();

        loop {
            let datagram = webtransport.recv_datagram().await?;
            intake::recv_datagram(&shared, datagram)?;
        }
    }

    /// Replay a cached range onto a fetch stream.
    async fn serve_fetch(shared: Arc<Shared>, fetch: ServeFetch) -> Result<(), SessionError> {
        let objects: Vec<_> = {
            let cache = shared.cache.lock().unwrap();
            let track = cache
                .get(&fetch.track_namespace, &fetch.track_name)
                .ok_or(SessionError::Internal)?;
            track
                .range(fetch.start, fetch.end)
                .map(|(location, payload)| (location, payload.clone()))
                .collect()
        };

        let peer = Peer::new(shared.clone());
        let mut stream = peer.open_fetch(fetch.subscribe_id, fetch.priority).await?;

        for (location, payload) in objects {
            stream
                .write_object(&data::FetchObject {
                    group_id: location.group_id,
                    subgroup_id: 0,
                    object_id: location.object_id,
                    publisher_priority: fetch.priority,
                    extensions: Default::default(),
                    status: data::ObjectStatus::Normal,
                    payload,
                })
                .await?;
        }

        stream.finish().await
    }
}
