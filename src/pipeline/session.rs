use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{CardError, CardResult};

/// Candidate portraits from one fan-out, held until the user picks one.
/// Never persisted; the card only becomes durable after selection.
#[derive(Debug, Clone)]
pub struct PortraitSession {
    pub images: Vec<String>,
    pub name: String,
    pub title: String,
    pub skills: Vec<String>,
    created_at: Instant,
}

impl PortraitSession {
    pub fn new(images: Vec<String>, name: String, title: String, skills: Vec<String>) -> Self {
        PortraitSession {
            images,
            name,
            title,
            skills,
            created_at: Instant::now(),
        }
    }
}

/// In-memory store keyed by opaque tokens. Entries are written once when a
/// fan-out completes and consumed by the first successful lookup; stale
/// entries are swept on insert and rejected on lookup.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, PortraitSession>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, session: PortraitSession) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock();
        sessions.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        sessions.insert(session_id.clone(), session);
        session_id
    }

    /// Consume the session. Concurrent lookups race on the lock; the loser
    /// simply sees `SessionNotFound`.
    pub fn take(&self, session_id: &str) -> CardResult<PortraitSession> {
        let session = self
            .sessions
            .lock()
            .remove(session_id)
            .ok_or(CardError::SessionNotFound)?;
        if session.created_at.elapsed() >= self.ttl {
            return Err(CardError::SessionExpired);
        }
        Ok(session)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(images: &[&str]) -> PortraitSession {
        PortraitSession::new(
            images.iter().map(|i| i.to_string()).collect(),
            "Ada Lovelace".to_string(),
            "Staff Engineer".to_string(),
            vec!["Rust".to_string()],
        )
    }

    #[test]
    fn issued_id_returns_the_same_images_in_order_exactly_once() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.insert(session(&["a", "b", "c"]));

        let found = store.take(&id).unwrap();
        assert_eq!(found.images, vec!["a", "b", "c"]);
        assert_eq!(found.name, "Ada Lovelace");

        // Consumed: a second lookup is a recoverable miss, not a panic.
        assert!(matches!(store.take(&id), Err(CardError::SessionNotFound)));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(matches!(
            store.take("no-such-session"),
            Err(CardError::SessionNotFound)
        ));
    }

    #[test]
    fn expired_sessions_are_rejected_on_lookup() {
        let store = SessionStore::new(Duration::ZERO);
        let id = store.insert(session(&["a"]));
        assert!(matches!(store.take(&id), Err(CardError::SessionExpired)));
    }

    #[test]
    fn stale_entries_are_swept_on_insert() {
        let store = SessionStore::new(Duration::ZERO);
        store.insert(session(&["a"]));
        store.insert(session(&["b"]));
        // The second insert sweeps the first, already-expired entry.
        assert_eq!(store.len(), 1);
    }
}
