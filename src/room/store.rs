//! Room store: the registry of rooms and the operations clients invoke
//!
//! Each room sits behind its own mutex so requests against different rooms
//! never wait on each other. The registry map is only write-locked to insert
//! a room. The dedup key set is either process-wide, behind its own mutex, or
//! owned by each room, depending on [`DedupScope`].
//!
//! Lock order is registry, then room, then shared key set. The registry read
//! lock is released before a room lock is taken.

use crate::config::RoomSettings;
use crate::error::{Result, RoomError};
use crate::metrics::MetricsCollector;
use crate::room::instance::Room;
use crate::room::{ranking, reconcile};
use crate::types::{
    DedupScope, IncomingSong, JoinSnapshot, RoomCode, RoomSnapshot, RoomSummary, Song,
    VoteDirection, VoteOutcome,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

type RoomHandle = Arc<Mutex<Room>>;

/// Statistics about room store operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomStoreStats {
    /// Total setup calls
    pub rooms_created: u64,
    /// Setup calls that replaced an existing room
    pub rooms_overwritten: u64,
    /// Rooms currently registered
    pub active_rooms: usize,
    /// Guests admitted through join
    pub participants_joined: u64,
    /// Songs appended by reconciliation
    pub songs_admitted: u64,
    /// Entries dropped by the display-name collapse
    pub songs_collapsed: u64,
    /// Votes applied
    pub votes_cast: u64,
    /// Queue entries removed by track identifier
    pub songs_removed: u64,
}

/// The in-memory room registry
#[derive(Clone)]
pub struct RoomStore {
    /// Rooms by client-supplied code
    rooms: Arc<RwLock<HashMap<RoomCode, RoomHandle>>>,
    /// Process-wide known track identifiers, used under `DedupScope::Shared`
    shared_keys: Arc<Mutex<HashSet<String>>>,
    /// Dedup scope and vote ordering
    settings: RoomSettings,
    /// Store statistics
    stats: Arc<RwLock<RoomStoreStats>>,
    /// Metrics collector for recording performance data
    metrics_collector: Arc<MetricsCollector>,
}

impl RoomStore {
    /// Create a store with its own metrics collector
    pub fn new(settings: RoomSettings) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(settings, metrics_collector)
    }

    /// Create a store that records into the given metrics collector
    pub fn with_metrics(settings: RoomSettings, metrics_collector: Arc<MetricsCollector>) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            shared_keys: Arc::new(Mutex::new(HashSet::new())),
            settings,
            stats: Arc::new(RwLock::new(RoomStoreStats::default())),
            metrics_collector,
        }
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    /// Register a room under `code` with `host_name` as its only participant.
    ///
    /// An existing room at the same code is replaced; the last setup wins.
    pub fn create_room(&self, code: RoomCode, host_name: &str) -> Result<RoomSnapshot> {
        self.instrumented("setup", || {
            let room = Room::new(code, host_name);
            let snapshot = room.snapshot();

            let (replaced, active_rooms) = {
                let mut rooms = self
                    .rooms
                    .write()
                    .map_err(|_| RoomError::lock_poisoned("rooms"))?;
                let replaced = rooms.insert(code, Arc::new(Mutex::new(room))).is_some();
                (replaced, rooms.len())
            };

            if replaced {
                warn!("Room {} set up again, previous queue and roster replaced", code);
            }

            self.update_stats(|stats| {
                stats.rooms_created += 1;
                if replaced {
                    stats.rooms_overwritten += 1;
                }
                stats.active_rooms = active_rooms;
            })?;
            self.metrics_collector.record_room_created(active_rooms);

            info!("Room {} created by host '{}'", code, host_name);
            Ok(snapshot)
        })
    }

    /// Append a guest to an existing room's roster
    pub fn join_room(&self, code: RoomCode, guest_name: &str) -> Result<JoinSnapshot> {
        self.instrumented("join", || {
            let handle = self.room_handle(code)?;
            let mut room = lock_room(&handle)?;
            room.admit_guest(guest_name);

            self.update_stats(|stats| stats.participants_joined += 1)?;
            self.metrics_collector.record_guest_joined();

            info!(
                "Guest '{}' joined room {} ({} participants)",
                guest_name,
                code,
                room.participants().len()
            );

            // Queue and roster are created together, so a joinable room
            // always has a queue.
            Ok(JoinSnapshot {
                queue_exists: true,
                room: room.snapshot(),
            })
        })
    }

    /// Merge a client's reported songs into the room queue
    pub fn reconcile(&self, code: RoomCode, incoming: &[IncomingSong]) -> Result<RoomSnapshot> {
        self.instrumented("reconcile", || {
            let handle = self.room_handle(code)?;
            let mut room = lock_room(&handle)?;

            let (admitted, collapsed) = match self.settings.dedup_scope {
                DedupScope::Shared => {
                    let mut keys = self.lock_shared_keys()?;
                    let merge = reconcile::merge(room.songs(), &keys, incoming)?;
                    let counts = (merge.admitted, merge.collapsed);
                    room.apply_merge(merge, Some(&mut *keys));
                    counts
                }
                DedupScope::PerRoom => {
                    let merge = reconcile::merge(room.songs(), room.keys(), incoming)?;
                    let counts = (merge.admitted, merge.collapsed);
                    room.apply_merge(merge, None);
                    counts
                }
            };

            self.update_stats(|stats| {
                stats.songs_admitted += admitted as u64;
                stats.songs_collapsed += collapsed as u64;
            })?;
            self.metrics_collector.record_reconcile(admitted, collapsed);

            if admitted > 0 || collapsed > 0 {
                info!(
                    "Room {} reconciled - incoming: {}, admitted: {}, collapsed: {}, queue: {}",
                    code,
                    incoming.len(),
                    admitted,
                    collapsed,
                    room.songs().len()
                );
            } else {
                debug!(
                    "Room {} reconciled with no changes - incoming: {}",
                    code,
                    incoming.len()
                );
            }

            Ok(room.snapshot())
        })
    }

    /// Apply one vote to every song named `song_name` and re-rank the queue
    pub fn vote(
        &self,
        code: RoomCode,
        song_name: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome> {
        self.instrumented("vote", || {
            let handle = self.room_handle(code)?;
            let mut room = lock_room(&handle)?;

            let songs = room.songs_mut();
            let matched = ranking::apply_vote(songs, song_name, direction);
            ranking::rank(songs, self.settings.vote_order);
            let songs = songs.clone();

            self.update_stats(|stats| stats.votes_cast += 1)?;
            self.metrics_collector.record_vote(direction);

            if matched == 0 {
                debug!("Vote in room {} matched no song named '{}'", code, song_name);
            } else {
                debug!(
                    "Vote {:?} on '{}' in room {} - {} entries updated",
                    direction, song_name, code, matched
                );
            }

            Ok(VoteOutcome {
                songs,
                song_name: song_name.to_string(),
                matched,
            })
        })
    }

    /// Drop a track from the room queue and from the known key set.
    ///
    /// Returns the key set remaining in scope, sorted. Under shared scope the
    /// key is forgotten for every room, even ones still queueing it.
    pub fn remove_song(&self, code: RoomCode, track_uri: &str) -> Result<Vec<String>> {
        self.instrumented("remove", || {
            let handle = self.room_handle(code)?;
            let mut room = lock_room(&handle)?;

            let removed = room.remove_track(track_uri);
            let remaining = match self.settings.dedup_scope {
                DedupScope::Shared => {
                    let mut keys = self.lock_shared_keys()?;
                    keys.remove(track_uri);
                    sorted(&keys)
                }
                DedupScope::PerRoom => sorted(room.keys()),
            };

            self.update_stats(|stats| stats.songs_removed += removed as u64)?;
            self.metrics_collector.record_songs_removed(removed);

            info!(
                "Removed '{}' from room {} - entries dropped: {}, queue: {}",
                track_uri,
                code,
                removed,
                room.songs().len()
            );

            Ok(remaining)
        })
    }

    /// Current queue for `code`, or `None` if the room was never set up
    pub fn queue(&self, code: RoomCode) -> Result<Option<Vec<Song>>> {
        self.instrumented("get_queue", || match self.find_room(code)? {
            Some(handle) => {
                let room = lock_room(&handle)?;
                Ok(Some(room.songs().to_vec()))
            }
            None => {
                debug!("Queue requested for unknown room {}", code);
                Ok(None)
            }
        })
    }

    /// Full snapshot of a room, if it exists
    pub fn room_snapshot(&self, code: RoomCode) -> Result<Option<RoomSnapshot>> {
        let Some(handle) = self.find_room(code)? else {
            return Ok(None);
        };
        let room = lock_room(&handle)?;
        Ok(Some(room.snapshot()))
    }

    /// Known track identifiers as seen by room `code`, sorted
    pub fn known_keys(&self, code: RoomCode) -> Result<Vec<String>> {
        match self.settings.dedup_scope {
            DedupScope::Shared => {
                let keys = self.lock_shared_keys()?;
                Ok(sorted(&keys))
            }
            DedupScope::PerRoom => {
                let handle = self.room_handle(code)?;
                let room = lock_room(&handle)?;
                Ok(sorted(room.keys()))
            }
        }
    }

    /// Occupancy and activity of every room, by ascending code
    pub fn room_summaries(&self) -> Result<Vec<RoomSummary>> {
        let handles: Vec<RoomHandle> = {
            let rooms = self
                .rooms
                .read()
                .map_err(|_| RoomError::lock_poisoned("rooms"))?;
            rooms.values().cloned().collect()
        };

        let mut summaries = handles
            .iter()
            .map(|handle| lock_room(handle).map(|room| room.summary()))
            .collect::<Result<Vec<_>>>()?;
        summaries.sort_by_key(|summary| summary.code);
        Ok(summaries)
    }

    /// Codes of every registered room, ascending
    pub fn room_codes(&self) -> Result<Vec<RoomCode>> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| RoomError::lock_poisoned("rooms"))?;
        let mut codes: Vec<RoomCode> = rooms.keys().copied().collect();
        codes.sort_unstable();
        Ok(codes)
    }

    /// Get current store statistics
    pub fn stats(&self) -> Result<RoomStoreStats> {
        let stats = self
            .stats
            .read()
            .map_err(|_| RoomError::lock_poisoned("stats"))?;

        Ok(stats.clone())
    }

    fn find_room(&self, code: RoomCode) -> Result<Option<RoomHandle>> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| RoomError::lock_poisoned("rooms"))?;
        Ok(rooms.get(&code).cloned())
    }

    fn room_handle(&self, code: RoomCode) -> Result<RoomHandle> {
        self.find_room(code)?
            .ok_or_else(|| RoomError::RoomNotFound { code }.into())
    }

    fn lock_shared_keys(&self) -> Result<MutexGuard<'_, HashSet<String>>> {
        Ok(self
            .shared_keys
            .lock()
            .map_err(|_| RoomError::lock_poisoned("dedup keys"))?)
    }

    fn update_stats(&self, update: impl FnOnce(&mut RoomStoreStats)) -> Result<()> {
        let mut stats = self
            .stats
            .write()
            .map_err(|_| RoomError::lock_poisoned("stats"))?;
        update(&mut stats);
        Ok(())
    }

    /// Run an operation, recording its duration and any typed failure
    fn instrumented<T>(&self, operation: &str, run: impl FnOnce() -> Result<T>) -> Result<T> {
        let timer = self.metrics_collector.start_timer();
        let result = run();
        self.metrics_collector
            .record_room_operation(operation, timer.stop());

        if let Err(e) = &result {
            let kind = e
                .downcast_ref::<RoomError>()
                .map(RoomError::kind)
                .unwrap_or("unknown");
            self.metrics_collector.record_room_error(operation, kind);
            debug!("Room operation '{}' failed: {}", operation, e);
        }

        result
    }
}

fn lock_room(handle: &RoomHandle) -> Result<MutexGuard<'_, Room>> {
    Ok(handle
        .lock()
        .map_err(|_| RoomError::lock_poisoned("room"))?)
}

fn sorted(keys: &HashSet<String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.iter().cloned().collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Participant, VoteOrder};

    fn shared_store() -> RoomStore {
        RoomStore::new(RoomSettings::default())
    }

    fn per_room_store() -> RoomStore {
        RoomStore::new(RoomSettings {
            dedup_scope: DedupScope::PerRoom,
            vote_order: VoteOrder::Descending,
        })
    }

    fn incoming(name: &str, uri: &str) -> IncomingSong {
        IncomingSong {
            name: name.to_string(),
            artist: "Artist".to_string(),
            artwork: "https://img".to_string(),
            uri: uri.to_string(),
        }
    }

    fn room_error(err: &anyhow::Error) -> &RoomError {
        err.downcast_ref::<RoomError>().expect("typed room error")
    }

    #[test]
    fn test_create_room() {
        let store = shared_store();
        let snapshot = store.create_room(101, "Alice").unwrap();

        assert_eq!(snapshot.code, 101);
        assert!(snapshot.songs.is_empty());
        assert_eq!(snapshot.participants, vec![Participant::host("Alice")]);
        assert_eq!(store.stats().unwrap().active_rooms, 1);
    }

    #[test]
    fn test_create_room_overwrites() {
        let store = shared_store();
        store.create_room(5, "Alice").unwrap();
        store.join_room(5, "Bob").unwrap();
        store.reconcile(5, &[incoming("Song1", "u1")]).unwrap();

        let snapshot = store.create_room(5, "Carol").unwrap();
        assert_eq!(snapshot.participants, vec![Participant::host("Carol")]);
        assert_eq!(store.queue(5).unwrap(), Some(vec![]));

        let stats = store.stats().unwrap();
        assert_eq!(stats.rooms_created, 2);
        assert_eq!(stats.rooms_overwritten, 1);
        assert_eq!(stats.active_rooms, 1);
    }

    #[test]
    fn test_join_room() {
        let store = shared_store();
        store.create_room(101, "Alice").unwrap();
        let joined = store.join_room(101, "Bob").unwrap();

        assert!(joined.queue_exists);
        assert_eq!(joined.room.code, 101);
        assert_eq!(
            joined.room.participants,
            vec![Participant::host("Alice"), Participant::guest("Bob")]
        );
    }

    #[test]
    fn test_join_unknown_room() {
        let store = shared_store();
        let err = store.join_room(404, "Bob").unwrap_err();
        assert_eq!(room_error(&err), &RoomError::RoomNotFound { code: 404 });
    }

    #[test]
    fn test_reconcile_unknown_room() {
        let store = shared_store();
        let err = store.reconcile(9, &[incoming("Song1", "u1")]).unwrap_err();
        assert_eq!(room_error(&err), &RoomError::RoomNotFound { code: 9 });
        // Nothing leaked into the key set
        assert!(store.known_keys(9).unwrap().is_empty());
    }

    #[test]
    fn test_reconcile_returns_roster() {
        let store = shared_store();
        store.create_room(1, "Alice").unwrap();
        store.join_room(1, "Bob").unwrap();

        let snapshot = store.reconcile(1, &[incoming("Song1", "u1")]).unwrap();
        assert_eq!(snapshot.songs.len(), 1);
        assert_eq!(snapshot.participants.len(), 2);
    }

    #[test]
    fn test_rejected_reconcile_leaves_state_untouched() {
        let store = shared_store();
        store.create_room(1, "Alice").unwrap();

        let err = store
            .reconcile(1, &[incoming("Song1", "u1"), incoming("Broken", "")])
            .unwrap_err();
        assert!(matches!(
            room_error(&err),
            RoomError::PreconditionViolation { .. }
        ));
        assert_eq!(store.queue(1).unwrap(), Some(vec![]));
        assert!(store.known_keys(1).unwrap().is_empty());
    }

    #[test]
    fn test_shared_scope_leaks_across_rooms() {
        let store = shared_store();
        store.create_room(1, "Alice").unwrap();
        store.create_room(2, "Zed").unwrap();

        store.reconcile(1, &[incoming("Song1", "u1")]).unwrap();
        let other = store.reconcile(2, &[incoming("Song1", "u1")]).unwrap();

        // The key is already known process-wide, so room 2 never admits it
        assert!(other.songs.is_empty());
    }

    #[test]
    fn test_per_room_scope_isolates_rooms() {
        let store = per_room_store();
        store.create_room(1, "Alice").unwrap();
        store.create_room(2, "Zed").unwrap();

        store.reconcile(1, &[incoming("Song1", "u1")]).unwrap();
        let other = store.reconcile(2, &[incoming("Song1", "u1")]).unwrap();
        assert_eq!(other.songs.len(), 1);

        assert_eq!(store.remove_song(1, "u1").unwrap(), Vec::<String>::new());
        assert_eq!(store.known_keys(2).unwrap(), vec!["u1"]);
    }

    #[test]
    fn test_vote_and_rank() {
        let store = shared_store();
        store.create_room(1, "Alice").unwrap();
        store
            .reconcile(
                1,
                &[incoming("A", "u1"), incoming("B", "u2"), incoming("C", "u3")],
            )
            .unwrap();

        let outcome = store.vote(1, "C", VoteDirection::Up).unwrap();
        assert_eq!(outcome.song_name, "C");
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.songs[0].name, "C");
        assert_eq!(outcome.songs[0].vote_count, 1);

        let outcome = store.vote(1, "C", VoteDirection::Down).unwrap();
        let names: Vec<_> = outcome.songs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert!(outcome.songs.iter().all(|s| s.vote_count == 0));
    }

    #[test]
    fn test_vote_unknown_room() {
        let store = shared_store();
        let err = store.vote(3, "A", VoteDirection::Up).unwrap_err();
        assert_eq!(room_error(&err), &RoomError::RoomNotFound { code: 3 });
    }

    #[test]
    fn test_remove_song_returns_shared_keys() {
        let store = shared_store();
        store.create_room(1, "Alice").unwrap();
        store
            .reconcile(1, &[incoming("A", "u1"), incoming("B", "u2")])
            .unwrap();

        let remaining = store.remove_song(1, "u1").unwrap();
        assert_eq!(remaining, vec!["u2"]);

        let queue = store.queue(1).unwrap().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].track_uri, "u2");

        // Re-submitting the removed track admits it again
        let snapshot = store.reconcile(1, &[incoming("A", "u1")]).unwrap();
        assert_eq!(snapshot.songs.len(), 2);
        assert_eq!(snapshot.songs[1].track_uri, "u1");
    }

    #[test]
    fn test_remove_from_unknown_room_keeps_keys() {
        let store = shared_store();
        store.create_room(1, "Alice").unwrap();
        store.reconcile(1, &[incoming("A", "u1")]).unwrap();

        let err = store.remove_song(2, "u1").unwrap_err();
        assert_eq!(room_error(&err), &RoomError::RoomNotFound { code: 2 });
        assert_eq!(store.known_keys(1).unwrap(), vec!["u1"]);
    }

    #[test]
    fn test_queue_of_unknown_room_is_absent() {
        let store = shared_store();
        assert_eq!(store.queue(77).unwrap(), None);
    }

    #[test]
    fn test_stats_tracking() {
        let store = shared_store();
        store.create_room(1, "Alice").unwrap();
        store.join_room(1, "Bob").unwrap();
        store
            .reconcile(1, &[incoming("Same", "u1"), incoming("Same", "u2")])
            .unwrap();
        store.vote(1, "Same", VoteDirection::Up).unwrap();
        store.remove_song(1, "u1").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.rooms_created, 1);
        assert_eq!(stats.participants_joined, 1);
        assert_eq!(stats.songs_admitted, 2);
        assert_eq!(stats.songs_collapsed, 1);
        assert_eq!(stats.votes_cast, 1);
        assert_eq!(stats.songs_removed, 1);
    }

    #[test]
    fn test_metrics_integration() {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap());
        let store = RoomStore::with_metrics(RoomSettings::default(), metrics_collector.clone());

        store.create_room(1, "Alice").unwrap();
        store.reconcile(1, &[incoming("A", "u1")]).unwrap();
        store.join_room(2, "Nobody").unwrap_err();

        assert_eq!(metrics_collector.room().rooms_created_total.get(), 1);
        assert_eq!(metrics_collector.queue().songs_admitted_total.get(), 1);
        assert_eq!(
            metrics_collector
                .performance()
                .room_errors_total
                .with_label_values(&["join", "room_not_found"])
                .get(),
            1
        );
    }

    #[test]
    fn test_room_codes() {
        let store = shared_store();
        store.create_room(30, "A").unwrap();
        store.create_room(-2, "B").unwrap();
        store.create_room(7, "C").unwrap();
        assert_eq!(store.room_codes().unwrap(), vec![-2, 7, 30]);
    }

    #[test]
    fn test_known_keys_under_shared_scope() {
        let store = shared_store();
        store.create_room(1, "A").unwrap();
        store.create_room(2, "B").unwrap();
        store
            .reconcile(1, &[incoming("Z", "uz"), incoming("M", "um")])
            .unwrap();

        // Every room sees the same process-wide keys
        assert_eq!(store.known_keys(1).unwrap(), vec!["um", "uz"]);
        assert_eq!(store.known_keys(2).unwrap(), vec!["um", "uz"]);
    }

    #[test]
    fn test_room_summaries() {
        let store = shared_store();
        store.create_room(20, "Host B").unwrap();
        store.create_room(10, "Host A").unwrap();
        store.join_room(10, "Guest").unwrap();
        store.reconcile(10, &[incoming("A", "ua")]).unwrap();

        let summaries = store.room_summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].code, 10);
        assert_eq!(summaries[0].host.as_deref(), Some("Host A"));
        assert_eq!(summaries[0].participants, 2);
        assert_eq!(summaries[0].songs, 1);
        assert!(summaries[0].last_activity >= summaries[0].created_at);
        assert_eq!(summaries[1].code, 20);
        assert_eq!(summaries[1].songs, 0);
    }
}
