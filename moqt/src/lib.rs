//! An implementation of Media over QUIC Transport.
//!
//! The peer is symmetric: the same [session::Session] engine serves both the
//! client and the server role, and only the connection establishment differs.
//! A single bidirectional WebTransport stream carries control messages while
//! media objects flow over many unidirectional streams and datagrams.

pub mod cache;
pub mod coding;
pub mod data;
pub mod message;
pub mod mlog;
pub mod session;
pub mod setup;
