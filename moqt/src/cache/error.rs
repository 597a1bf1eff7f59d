#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The group was terminated by END_OF_GROUP; later inserts are rejected.
    #[error("group {0} is closed")]
    GroupClosed(u64),

    /// The track was terminated by END_OF_TRACK.
    #[error("track is closed")]
    TrackClosed,

    /// An object id was inserted twice with different payloads.
    #[error("duplicate object {1} in group {0}")]
    Duplicate(u64, u64),
}
