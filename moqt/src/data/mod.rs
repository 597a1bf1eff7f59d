//! Media objects sent over dedicated streams and datagrams.
//!
//! A unidirectional stream begins with a [DataStreamType] and the matching
//! header; everything after it is a run of objects for a single subgroup or
//! fetch. Datagrams are self-contained.

mod datagram;
mod fetch;
mod object_status;
mod stream;
mod subgroup;

pub use datagram::*;
pub use fetch::*;
pub use object_status::*;
pub use stream::*;
pub use subgroup::*;
