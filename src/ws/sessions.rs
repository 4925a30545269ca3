use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

pub enum InternalSignal {
    Shutdown,
}

struct SessionHandle {
    session_id: u64,
    tx: UnboundedSender<InternalSignal>,
}

/// Live sessions keyed by principal email.
///
/// A principal owns at most one session: registering a new one shuts the
/// previous one down, so its feed subscription is released before the new
/// session starts receiving events.
pub struct SessionMap {
    sessions: DashMap<String, SessionHandle>,
    next_id: AtomicU64,
}

impl Default for SessionMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMap {
    pub fn new() -> Self {
        SessionMap {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers `tx` for `email` and returns the new session id.
    #[instrument(skip(self, tx))]
    pub fn register_online(&self, email: &str, tx: UnboundedSender<InternalSignal>) -> u64 {
        let session_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .sessions
            .insert(email.to_string(), SessionHandle { session_id, tx });

        if let Some(previous) = previous {
            info!(previous = previous.session_id, "Replacing existing session");
            if previous.tx.send(InternalSignal::Shutdown).is_err() {
                warn!("Previous session already gone");
            }
        }

        info!(session_id, online = self.sessions.len(), "Session registered");
        session_id
    }

    /// Removes the entry only if it still belongs to `session_id`, so a
    /// replaced session cannot unregister its successor.
    #[instrument(skip(self))]
    pub fn remove_from_online(&self, email: &str, session_id: u64) {
        let removed = self
            .sessions
            .remove_if(email, |_, handle| handle.session_id == session_id);
        if removed.is_some() {
            info!("Session removed");
        }
    }

    pub fn online_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_user_online(&self, email: &str) -> bool {
        self.sessions.contains_key(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_duplicate_session_replaces_and_shuts_down_previous() {
        let map = SessionMap::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let first = map.register_online("a@x.org", tx1);

        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let second = map.register_online("a@x.org", tx2);

        assert_ne!(first, second);
        assert_eq!(map.online_count(), 1);
        assert!(matches!(rx1.try_recv(), Ok(InternalSignal::Shutdown)));
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_stale_session_cannot_remove_successor() {
        let map = SessionMap::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let first = map.register_online("a@x.org", tx1);
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let second = map.register_online("a@x.org", tx2);

        map.remove_from_online("a@x.org", first);
        assert!(map.is_user_online("a@x.org"));

        map.remove_from_online("a@x.org", second);
        assert!(!map.is_user_online("a@x.org"));
    }
}
