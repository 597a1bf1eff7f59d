//! In-memory accumulation of received media objects.
//!
//! Objects may arrive out of order across streams and datagrams; the cache
//! reconciles them by `(group_id, object_id)` key. All mutation happens from
//! the session task, so no internal locking is needed here.

mod error;
mod track;
mod tracks;

pub use error::*;
pub use track::*;
pub use tracks::*;
