use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;

use crate::coding::TrackNamespace;
use crate::data::ObjectStatus;

use super::{CacheError, Track};

/// All cached tracks for a session, keyed by (namespace, name).
#[derive(Debug, Default)]
pub struct Tracks {
    tracks: HashMap<(TrackNamespace, String), Track>,

    /// Eviction age, from the MAX_CACHE_DURATION parameter. None disables
    /// eviction.
    max_cache_duration: Option<Duration>,
}

impl Tracks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_cache_duration(&mut self, duration: Option<Duration>) {
        self.max_cache_duration = duration;
    }

    pub fn get(&self, namespace: &TrackNamespace, name: &str) -> Option<&Track> {
        self.tracks.get(&(namespace.clone(), name.to_string()))
    }

    fn track_mut(&mut self, namespace: &TrackNamespace, name: &str) -> &mut Track {
        self.tracks
            .entry((namespace.clone(), name.to_string()))
            .or_insert_with(|| Track::new(namespace.clone(), name.to_string()))
    }

    pub fn insert_object(
        &mut self,
        namespace: &TrackNamespace,
        name: &str,
        group_id: u64,
        object_id: u64,
        payload: Bytes,
    ) -> Result<(), CacheError> {
        let max_age = self.max_cache_duration;
        let track = self.track_mut(namespace, name);
        track.insert_object(group_id, object_id, payload)?;

        // Opportunistic eviction; never blocks I/O.
        if let Some(max_age) = max_age {
            track.evict_expired(max_age);
        }
        Ok(())
    }

    pub fn insert_status(
        &mut self,
        namespace: &TrackNamespace,
        name: &str,
        group_id: u64,
        object_id: u64,
        status: ObjectStatus,
    ) -> Result<(), CacheError> {
        self.track_mut(namespace, name)
            .insert_status(group_id, object_id, status)
    }

    pub fn remove(&mut self, namespace: &TrackNamespace, name: &str) -> Option<Track> {
        self.tracks.remove(&(namespace.clone(), name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_query() {
        let mut tracks = Tracks::new();
        let namespace = TrackNamespace::from_utf8_path("live/test");

        tracks
            .insert_object(&namespace, "track", 0, 0, Bytes::from_static(b"| 0.0.0 |"))
            .unwrap();

        let track = tracks.get(&namespace, "track").unwrap();
        assert!(track.group(0).unwrap().get(0).unwrap().starts_with(b"| 0.0.0 |"));
        assert!(tracks.get(&namespace, "other").is_none());
    }
}
