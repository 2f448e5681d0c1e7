//! Session store: per-room locked entries in a shared registry.
//!
//! The registry itself is behind a `std::sync::RwLock` that is held only
//! long enough to clone out a room's `Arc`, so unrelated rooms never
//! serialize against each other. Each session sits behind its own
//! `tokio::sync::Mutex`, and every decision-and-write runs inside one
//! [`SessionStore::mutate`] call so a "read, then act" sequence can
//! never interleave with another mutation of the same room.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use molehunt_protocol::{PlayerId, RoomId};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::EngineError;
use crate::session::Session;

/// Thread-safe map from room id to its session.
#[derive(Default)]
pub struct SessionStore {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session for `room_id`.
    ///
    /// # Errors
    /// [`EngineError::AlreadyActive`] if the room already has one.
    pub fn create(&self, room_id: RoomId, host: PlayerId) -> Result<(), EngineError> {
        let mut rooms = self.rooms.write().expect("session registry poisoned");
        if rooms.contains_key(&room_id) {
            return Err(EngineError::AlreadyActive(room_id));
        }
        rooms.insert(room_id, Arc::new(Mutex::new(Session::new(room_id, host))));
        info!(%room_id, %host, "session created");
        Ok(())
    }

    /// Runs `f` against the room's session under its lock.
    ///
    /// The registry lock is released before the session lock is awaited,
    /// so one busy room cannot stall operations on others.
    ///
    /// # Errors
    /// [`EngineError::NotFound`] if the room has no session; otherwise
    /// whatever `f` returns.
    pub async fn mutate<T>(
        &self,
        room_id: RoomId,
        f: impl FnOnce(&mut Session) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let entry = {
            let rooms = self.rooms.read().expect("session registry poisoned");
            rooms
                .get(&room_id)
                .cloned()
                .ok_or(EngineError::NotFound(room_id))?
        };
        let mut session = entry.lock().await;
        f(&mut session)
    }

    /// Removes the room's session. Idempotent.
    ///
    /// Callers cancel the room's timers *before* removing, so a stale
    /// expiry that slips through finds no session and drops out in the
    /// `mutate` NotFound path.
    pub fn remove(&self, room_id: RoomId) {
        let mut rooms = self.rooms.write().expect("session registry poisoned");
        if rooms.remove(&room_id).is_some() {
            info!(%room_id, "session removed");
        }
    }

    /// Whether the room currently has a session.
    pub fn contains(&self, room_id: RoomId) -> bool {
        self.rooms
            .read()
            .expect("session registry poisoned")
            .contains_key(&room_id)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.rooms.read().expect("session registry poisoned").len()
    }

    /// Whether no sessions exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    #[tokio::test]
    async fn test_create_and_mutate() {
        let store = SessionStore::new();
        store.create(RoomId(1), pid(10)).unwrap();

        let host = store
            .mutate(RoomId(1), |s| {
                assert_eq!(s.phase, Phase::ModeSelect);
                Ok(s.host)
            })
            .await
            .unwrap();
        assert_eq!(host, pid(10));
    }

    #[tokio::test]
    async fn test_create_twice_is_rejected() {
        let store = SessionStore::new();
        store.create(RoomId(1), pid(10)).unwrap();

        let result = store.create(RoomId(1), pid(11));
        assert!(matches!(result, Err(EngineError::AlreadyActive(r)) if r == RoomId(1)));
    }

    #[tokio::test]
    async fn test_mutate_unknown_room_is_not_found() {
        let store = SessionStore::new();
        let result = store.mutate(RoomId(9), |_| Ok(())).await;
        assert!(matches!(result, Err(EngineError::NotFound(r)) if r == RoomId(9)));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = SessionStore::new();
        store.create(RoomId(1), pid(10)).unwrap();

        store.remove(RoomId(1));
        store.remove(RoomId(1));
        assert!(!store.contains(RoomId(1)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_mutations_of_same_room_serialize() {
        // Two tasks each read-modify-write a counter-ish field; with the
        // lock held across both halves, no update can be lost.
        let store = Arc::new(SessionStore::new());
        store.create(RoomId(1), pid(10)).unwrap();

        let mut handles = Vec::new();
        for i in 0..20u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .mutate(RoomId(1), |s| {
                        let seen = s.roster.len();
                        s.roster.push(crate::session::PlayerEntry {
                            id: pid(100 + i),
                            display_name: format!("p{seen}"),
                        });
                        Ok(())
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let count = store.mutate(RoomId(1), |s| Ok(s.roster.len())).await.unwrap();
        assert_eq!(count, 20);
    }
}
