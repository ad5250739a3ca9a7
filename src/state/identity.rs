//! Session identity registry.
//!
//! The only identity mechanism in the system: an opaque session token issued on
//! create/join, mapped to the name and flags the client registered with. This is
//! the server-side counterpart of the original per-room local storage keys,
//! including the `deletingRoom` marker that distinguishes a self-initiated
//! deletion from an external one.

use dashmap::DashMap;

/// Identity record for one participant in one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Room the session belongs to.
    pub room_code: String,
    /// Opaque session token, also the participant id inside the room tree.
    pub session_id: String,
    /// Registered display name.
    pub user_name: String,
    /// Whether this session created the room.
    pub is_host: bool,
    /// Whether this session votes (false for facilitators).
    pub is_participant: bool,
}

/// Registry of live session identities, keyed by session token.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionIdentity>,
    /// room code -> session that initiated the room's deletion.
    deleting: DashMap<String, String>,
}

impl SessionStore {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an identity.
    pub fn save(&self, identity: SessionIdentity) {
        self.sessions
            .insert(identity.session_id.clone(), identity);
    }

    /// Look up an identity by session token.
    pub fn get(&self, session_id: &str) -> Option<SessionIdentity> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    /// Look up an identity and check it belongs to the given room.
    pub fn get_for_room(&self, session_id: &str, room_code: &str) -> Option<SessionIdentity> {
        self.get(session_id)
            .filter(|identity| identity.room_code == room_code)
    }

    /// Drop a single identity (self-leave or kick).
    pub fn remove(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Drop every identity and marker attached to a room (room deletion).
    pub fn clear_room(&self, room_code: &str) {
        self.sessions
            .retain(|_, identity| identity.room_code != room_code);
        self.deleting.remove(room_code);
    }

    /// Record that `session_id` is deleting `room_code` so its own watcher skips
    /// the deletion notice.
    pub fn mark_deleting(&self, room_code: &str, session_id: &str) {
        self.deleting
            .insert(room_code.to_owned(), session_id.to_owned());
    }

    /// Whether this session initiated the deletion of the room.
    pub fn is_deleting(&self, room_code: &str, session_id: &str) -> bool {
        self.deleting
            .get(room_code)
            .is_some_and(|entry| entry.value() == session_id)
    }

    /// Remove the deletion marker, e.g. after a failed delete was rolled back.
    pub fn clear_deleting(&self, room_code: &str) {
        self.deleting.remove(room_code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(room: &str, session: &str, is_host: bool) -> SessionIdentity {
        SessionIdentity {
            room_code: room.into(),
            session_id: session.into(),
            user_name: "Someone".into(),
            is_host,
            is_participant: true,
        }
    }

    #[test]
    fn identities_are_scoped_to_their_room() {
        let store = SessionStore::new();
        store.save(identity("AAAAAA", "s1", true));

        assert!(store.get_for_room("s1", "AAAAAA").is_some());
        assert!(store.get_for_room("s1", "BBBBBB").is_none());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn clearing_a_room_drops_sessions_and_markers() {
        let store = SessionStore::new();
        store.save(identity("AAAAAA", "s1", true));
        store.save(identity("AAAAAA", "s2", false));
        store.save(identity("BBBBBB", "s3", true));
        store.mark_deleting("AAAAAA", "s1");

        store.clear_room("AAAAAA");
        assert!(store.get("s1").is_none());
        assert!(store.get("s2").is_none());
        assert!(store.get("s3").is_some());
        assert!(!store.is_deleting("AAAAAA", "s1"));
    }

    #[test]
    fn deletion_marker_names_a_single_session() {
        let store = SessionStore::new();
        store.mark_deleting("AAAAAA", "s1");
        assert!(store.is_deleting("AAAAAA", "s1"));
        assert!(!store.is_deleting("AAAAAA", "s2"));

        store.clear_deleting("AAAAAA");
        assert!(!store.is_deleting("AAAAAA", "s1"));
    }
}
