use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::coding::{Location, TrackNamespace};
use crate::data::ObjectStatus;

use super::CacheError;

/// Accumulates the objects of one group, in ascending object id order.
#[derive(Debug, Clone)]
pub struct Group {
    pub group_id: u64,

    /// Objects keyed by id; insertion may arrive out of order.
    pub objects: BTreeMap<u64, Bytes>,

    /// The largest object id seen, including status-only markers.
    max_object_id: Option<u64>,

    /// When the group last changed, used for eviction.
    last_update: Instant,

    /// Set once END_OF_GROUP is seen; later inserts are rejected.
    closed: bool,
}

impl Group {
    fn new(group_id: u64) -> Self {
        Self {
            group_id,
            objects: BTreeMap::new(),
            max_object_id: None,
            last_update: Instant::now(),
            closed: false,
        }
    }

    pub fn insert(&mut self, object_id: u64, payload: Bytes) -> Result<(), CacheError> {
        if self.closed {
            return Err(CacheError::GroupClosed(self.group_id));
        }
        if let Some(existing) = self.objects.get(&object_id) {
            if *existing != payload {
                return Err(CacheError::Duplicate(self.group_id, object_id));
            }
        }

        self.objects.insert(object_id, payload);
        // max_object_id never decreases
        if self.max_object_id < Some(object_id) {
            self.max_object_id = Some(object_id);
        }
        self.last_update = Instant::now();
        Ok(())
    }

    pub fn close(&mut self, object_id: u64) {
        if self.max_object_id < Some(object_id) {
            self.max_object_id = Some(object_id);
        }
        self.closed = true;
        self.last_update = Instant::now();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn max_object_id(&self) -> Option<u64> {
        self.max_object_id
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }

    pub fn get(&self, object_id: u64) -> Option<&Bytes> {
        self.objects.get(&object_id)
    }
}

/// Accumulates the groups of one track, in ascending group id order.
#[derive(Debug, Clone)]
pub struct Track {
    pub namespace: TrackNamespace,
    pub name: String,

    /// Groups keyed by id.
    pub groups: BTreeMap<u64, Group>,

    /// The largest group id seen.
    max_group_id: Option<u64>,

    /// Set once END_OF_TRACK is seen.
    closed: bool,
}

impl Track {
    pub fn new(namespace: TrackNamespace, name: String) -> Self {
        Self {
            namespace,
            name,
            groups: BTreeMap::new(),
            max_group_id: None,
            closed: false,
        }
    }

    fn group_mut(&mut self, group_id: u64) -> &mut Group {
        if self.max_group_id < Some(group_id) {
            self.max_group_id = Some(group_id);
        }
        self.groups
            .entry(group_id)
            .or_insert_with(|| Group::new(group_id))
    }

    /// Insert a media payload.
    pub fn insert_object(
        &mut self,
        group_id: u64,
        object_id: u64,
        payload: Bytes,
    ) -> Result<(), CacheError> {
        if self.closed {
            return Err(CacheError::TrackClosed);
        }
        self.group_mut(group_id).insert(object_id, payload)
    }

    /// Insert a status marker.
    pub fn insert_status(
        &mut self,
        group_id: u64,
        object_id: u64,
        status: ObjectStatus,
    ) -> Result<(), CacheError> {
        if self.closed {
            return Err(CacheError::TrackClosed);
        }

        match status {
            ObjectStatus::Normal | ObjectStatus::DoesNotExist => {}
            ObjectStatus::EndOfGroup | ObjectStatus::EndOfSubgroup => {
                self.group_mut(group_id).close(object_id);
            }
            ObjectStatus::EndOfTrack => {
                self.group_mut(group_id).close(object_id);
                self.closed = true;
            }
        }

        Ok(())
    }

    pub fn group(&self, group_id: u64) -> Option<&Group> {
        self.groups.get(&group_id)
    }

    /// The largest group id seen so far.
    pub fn max_group_id(&self) -> Option<u64> {
        self.max_group_id
    }

    /// The largest (group, object) location, if any content exists.
    pub fn largest(&self) -> Option<Location> {
        let group_id = self.max_group_id?;
        let group = self.groups.get(&group_id)?;
        Some(Location::new(group_id, group.max_object_id().unwrap_or(0)))
    }

    /// Iterate objects in `[start, end]` inclusive, in ascending order.
    pub fn range(
        &self,
        start: Location,
        end: Location,
    ) -> impl Iterator<Item = (Location, &Bytes)> {
        self.groups
            .range(start.group_id..=end.group_id)
            .flat_map(move |(group_id, group)| {
                let first = match *group_id == start.group_id {
                    true => start.object_id,
                    false => 0,
                };
                let last = match *group_id == end.group_id {
                    true => end.object_id,
                    false => u64::MAX,
                };
                group
                    .objects
                    .range(first..=last)
                    .map(move |(object_id, payload)| {
                        (Location::new(*group_id, *object_id), payload)
                    })
            })
    }

    /// Drop groups that have not changed within `max_age`.
    ///
    /// Runs opportunistically on insertion; it never blocks I/O.
    pub fn evict_expired(&mut self, max_age: Duration) {
        let now = Instant::now();
        self.groups
            .retain(|_, group| now.duration_since(group.last_update()) <= max_age);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track::new(TrackNamespace::from_utf8_path("live/test"), "track".into())
    }

    #[test]
    fn out_of_order_insert() {
        let mut track = track();

        // Objects arrive shuffled; the cache reconciles by key.
        for object_id in [3u64, 0, 2, 1] {
            track
                .insert_object(0, object_id, Bytes::from(format!("{}", object_id)))
                .unwrap();
        }

        let group = track.group(0).unwrap();
        let ids: Vec<u64> = group.objects.keys().copied().collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(group.max_object_id(), Some(3));
        assert_eq!(track.largest(), Some(Location::new(0, 3)));
    }

    #[test]
    fn group_close_rejects_late_objects() {
        let mut track = track();

        track.insert_object(0, 0, Bytes::from_static(b"a")).unwrap();
        track
            .insert_status(0, 60, ObjectStatus::EndOfGroup)
            .unwrap();

        let err = track
            .insert_object(0, 61, Bytes::from_static(b"late"))
            .unwrap_err();
        assert_eq!(err, CacheError::GroupClosed(0));

        // Other groups are unaffected.
        track.insert_object(1, 0, Bytes::from_static(b"b")).unwrap();
        assert_eq!(track.max_group_id(), Some(1));
    }

    #[test]
    fn end_of_track() {
        let mut track = track();

        track.insert_object(2, 5, Bytes::from_static(b"a")).unwrap();
        track.insert_status(2, 6, ObjectStatus::EndOfTrack).unwrap();

        let err = track
            .insert_object(3, 0, Bytes::from_static(b"x"))
            .unwrap_err();
        assert_eq!(err, CacheError::TrackClosed);
    }

    #[test]
    fn range_query() {
        let mut track = track();

        for group_id in 0..3u64 {
            for object_id in 0..4u64 {
                track
                    .insert_object(group_id, object_id, Bytes::from_static(b"x"))
                    .unwrap();
            }
        }

        let collected: Vec<Location> = track
            .range(Location::new(0, 2), Location::new(2, 1))
            .map(|(loc, _)| loc)
            .collect();

        assert_eq!(collected.first(), Some(&Location::new(0, 2)));
        assert_eq!(collected.last(), Some(&Location::new(2, 1)));
        assert_eq!(collected.len(), 8);
    }

    #[test]
    fn eviction() {
        let mut track = track();

        track.insert_object(0, 0, Bytes::from_static(b"a")).unwrap();
        track.insert_object(1, 0, Bytes::from_static(b"b")).unwrap();

        // Nothing is older than an hour.
        track.evict_expired(Duration::from_secs(3600));
        assert_eq!(track.groups.len(), 2);

        // Everything is older than a millisecond after a short nap.
        std::thread::sleep(Duration::from_millis(5));
        track.evict_expired(Duration::from_millis(1));
        assert!(track.groups.is_empty());

        // max_group_id is monotone even across eviction.
        assert_eq!(track.max_group_id(), Some(1));
    }
}
