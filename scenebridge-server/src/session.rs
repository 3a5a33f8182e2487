//! Session registry
//!
//! Tracks live WebSocket connections. Owned by the connection hub; each
//! connection task registers itself on accept and deregisters on exit.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use tracing::debug;

/// Unique per-connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

/// Entry for a connected session
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub peer: SocketAddr,
    pub connected_at: Instant,
}

/// Registry of open sessions
///
/// Safe for concurrent use from every connection task.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionEntry>,
    next_id: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new connection and return its id
    pub fn register(&self, peer: SocketAddr) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sessions.insert(
            id,
            SessionEntry {
                peer,
                connected_at: Instant::now(),
            },
        );
        debug!(session = %id, %peer, "Registered session");
        id
    }

    /// Remove a session
    ///
    /// Returns `false` if it was already gone; calling twice is harmless.
    pub fn deregister(&self, id: SessionId) -> bool {
        match self.sessions.remove(&id) {
            Some((_, entry)) => {
                debug!(
                    session = %id,
                    peer = %entry.peer,
                    duration_ms = entry.connected_at.elapsed().as_millis() as u64,
                    "Deregistered session"
                );
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = SessionRegistry::new();
        let a = registry.register(peer(1000));
        let b = registry.register(peer(1000));

        assert_ne!(a, b);
        assert_eq!(registry.session_count(), 2);
        assert_eq!(a.to_string(), "Session(1)");
        assert_eq!(b.to_string(), "Session(2)");
    }

    #[test]
    fn test_deregister_is_idempotent() {
        let registry = SessionRegistry::new();
        let id = registry.register(peer(2000));
        assert_eq!(registry.session_count(), 1);

        assert!(registry.deregister(id));
        assert!(!registry.deregister(id));
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn test_deregister_leaves_others() {
        let registry = SessionRegistry::new();
        let a = registry.register(peer(1));
        let b = registry.register(peer(2));

        registry.deregister(a);
        assert_eq!(registry.session_count(), 1);
        assert!(registry.deregister(b));
    }
}
