//! Control messages sent over the wire.
//!
//! Every control message is framed as `type (varint) | length (varint) |
//! payload`, and all of them share the single bidirectional control stream.
//! This introduces some head-of-line blocking but preserves ordering.
//! Media objects are NOT control messages; they flow over dedicated
//! unidirectional streams and datagrams (see [crate::data]).

mod announce;
mod announce_cancel;
mod announce_error;
mod announce_ok;
mod fetch;
mod fetch_cancel;
mod fetch_error;
mod fetch_ok;
mod filter_type;
mod go_away;
mod group_order;
mod max_subscribe_id;
mod subscribe;
mod subscribe_announces;
mod subscribe_announces_error;
mod subscribe_announces_ok;
mod subscribe_done;
mod subscribe_error;
mod subscribe_ok;
mod subscribe_update;
mod subscribes_blocked;
mod track_status;
mod track_status_request;
mod unannounce;
mod unsubscribe;
mod unsubscribe_announces;

pub use announce::*;
pub use announce_cancel::*;
pub use announce_error::*;
pub use announce_ok::*;
pub use fetch::*;
pub use fetch_cancel::*;
pub use fetch_error::*;
pub use fetch_ok::*;
pub use filter_type::*;
pub use go_away::*;
pub use group_order::*;
pub use max_subscribe_id::*;
pub use subscribe::*;
pub use subscribe_announces::*;
pub use subscribe_announces_error::*;
pub use subscribe_announces_ok::*;
pub use subscribe_done::*;
pub use subscribe_error::*;
pub use subscribe_ok::*;
pub use subscribe_update::*;
pub use subscribes_blocked::*;
pub use track_status::*;
pub use track_status_request::*;
pub use unannounce::*;
pub use unsubscribe::*;
pub use unsubscribe_announces::*;

use crate::coding::{Decode, DecodeError, Encode, EncodeError};
use std::fmt;

// Use a macro to generate the message types rather than copy-paste.
// This implements a decode/encode method that uses the specified type.
macro_rules! message_types {
    {$($name:ident = $val:expr,)*} => {
		/// All supported message types.
		#[derive(Clone)]
		pub enum Message {
			$($name($name)),*
		}

		impl Decode for Message {
			fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
				let t = u64::decode(r)?;
				let len = usize::decode(r)?;

				// The whole payload must be buffered before we commit to
				// decoding; this is what lets the caller skip unknown types.
				Self::decode_remaining(r, len)?;
				let mut payload = r.copy_to_bytes(len);

				match t {
					$($val => {
						// A short read inside a complete payload is a framing
						// bug, not a resumable condition.
						let msg = $name::decode(&mut payload).map_err(|err| match err {
							DecodeError::More(_) => DecodeError::Truncated,
							err => err,
						})?;
						Ok(Self::$name(msg))
					})*
					_ => Err(DecodeError::UnknownMessage(t)),
				}
			}
		}

		impl Encode for Message {
			fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
				match self {
					$(Self::$name(ref m) => {
						self.id().encode(w)?;

						// Encode into a scratch buffer first to learn the
						// payload length, then write it out once.
						let mut buf = Vec::new();
						m.encode(&mut buf)?;
						buf.len().encode(w)?;

						Self::encode_remaining(w, buf.len())?;
						w.put_slice(&buf);
						Ok(())
					},)*
				}
			}
		}

		impl Message {
			pub fn id(&self) -> u64 {
				match self {
					$(Self::$name(_) => {
						$val
					},)*
				}
			}

			pub fn name(&self) -> &'static str {
				match self {
					$(Self::$name(_) => {
						stringify!($name)
					},)*
				}
			}
		}

		$(impl From<$name> for Message {
			fn from(m: $name) -> Self {
				Message::$name(m)
			}
		})*

		$(impl TryFrom<Message> for $name {
			type Error = Message;

			fn try_from(m: Message) -> Result<Self, Self::Error> {
				match m {
					Message::$name(m) => Ok(m),
					m => Err(m),
				}
			}
		})*

		impl fmt::Debug for Message {
			// Delegate to the message formatter
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				match self {
					$(Self::$name(ref m) => m.fmt(f),)*
				}
			}
		}
    }
}

// Each message is prefixed with the given VarInt type.
message_types! {
    // NOTE: Setup messages are in another module.
    // ClientSetup = 0x40
    // ServerSetup = 0x41

    // SUBSCRIBE family, sent by subscriber
    SubscribeUpdate = 0x2,
    Subscribe = 0x3,
    Unsubscribe = 0xa,
    // SUBSCRIBE family, sent by publisher
    SubscribeOk = 0x4,
    SubscribeError = 0x5,
    SubscribeDone = 0xb,

    // ANNOUNCE family, sent by publisher
    Announce = 0x6,
    Unannounce = 0x9,
    // ANNOUNCE family, sent by subscriber
    AnnounceOk = 0x7,
    AnnounceError = 0x8,
    AnnounceCancel = 0xc,

    // TRACK_STATUS family
    TrackStatusRequest = 0xd,
    TrackStatus = 0xe,

    // Misc
    GoAway = 0x10,
    MaxSubscribeId = 0x15,
    SubscribesBlocked = 0x1a,

    // NAMESPACE family, sent by subscriber
    SubscribeAnnounces = 0x11,
    UnsubscribeAnnounces = 0x14,
    // NAMESPACE family, sent by publisher
    SubscribeAnnouncesOk = 0x12,
    SubscribeAnnouncesError = 0x13,

    // FETCH family, sent by subscriber
    Fetch = 0x16,
    FetchCancel = 0x17,
    // FETCH family, sent by publisher
    FetchOk = 0x18,
    FetchError = 0x19,
}
