//! Connection registry for the chat server
//!
//! This module tracks which connections have completed the nickname
//! handshake and are currently taking part in the chat:
//! - Connection handles shared between the owning session and broadcasters
//! - Registration and removal of (connection, nickname) records
//! - Point-in-time snapshots used for fan-out and the WHO listing
//!
//! The map itself is private. Callers only ever see copies, and the lock is
//! never held across a socket write.

use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Identity of a single accepted connection, assigned by the listener
pub type ConnectionId = u64;

/// Write half of a client socket, boxed so tests can substitute in-memory streams
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Cloneable handle to the write side of a client connection
///
/// The owning session and any number of broadcasters may hold clones at the
/// same time. Writes go through a per-connection async mutex so that each
/// line reaches the socket whole and in issue order.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Arc<tokio::sync::Mutex<BoxedWriter>>,
}

impl Connection {
    /// Wraps the write half of an accepted socket
    pub fn new<W>(id: ConnectionId, peer: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id,
            peer,
            writer: Arc::new(tokio::sync::Mutex::new(Box::new(writer))),
        }
    }

    /// Listener-assigned identity, unique for the lifetime of the server
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote endpoint of the connection
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Writes the whole message and flushes it
    pub async fn send(&self, message: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(message.as_bytes()).await?;
        writer.flush().await
    }

    /// Closes the write side of the connection
    pub async fn shutdown(&self) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish()
    }
}

/// A registered connection together with its display name
#[derive(Debug, Clone)]
pub struct Member {
    pub connection: Connection,
    pub nickname: String,
}

/// Thread-safe store of every connection that finished its handshake
///
/// Entries are kept ordered by connection id, which is also join order since
/// the listener hands out ids monotonically. Nicknames are not required to be
/// unique.
#[derive(Default)]
pub struct Registry {
    members: Mutex<BTreeMap<ConnectionId, Member>>,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection under the given nickname
    ///
    /// A connection appears at most once. Registering the same id again
    /// replaces the earlier record.
    pub fn add(&self, connection: Connection, nickname: impl Into<String>) {
        let id = connection.id();
        let member = Member {
            connection,
            nickname: nickname.into(),
        };

        let previous = self.members.lock().insert(id, member);
        if let Some(previous) = previous {
            warn!(
                "Connection {} re-registered, replacing nickname {}",
                id, previous.nickname
            );
        }
    }

    /// Removes a connection, returning the nickname it was registered with
    ///
    /// Removing a connection that is not present is a no-op and returns None.
    pub fn remove(&self, id: ConnectionId) -> Option<String> {
        let removed = self.members.lock().remove(&id);
        removed.map(|member| {
            debug!("Connection {} ({}) unregistered", id, member.nickname);
            member.nickname
        })
    }

    /// Copies the current members in join order
    ///
    /// The returned vector is detached from the registry and can be iterated
    /// while other tasks keep mutating it.
    pub fn snapshot(&self) -> Vec<Member> {
        self.members.lock().values().cloned().collect()
    }

    /// Current nicknames in join order
    pub fn nicknames(&self) -> Vec<String> {
        self.members
            .lock()
            .values()
            .map(|member| member.nickname.clone())
            .collect()
    }

    /// Returns true if the connection is currently registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members.lock().contains_key(&id)
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    /// Returns true if nobody is registered
    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn test_addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn test_connection(id: ConnectionId) -> Connection {
        Connection::new(id, test_addr(40000 + id as u16), tokio::io::sink())
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_add_and_remove() {
        let registry = Registry::new();
        registry.add(test_connection(1), "alice");

        assert!(registry.contains(1));
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.remove(1), Some("alice".to_string()));
        assert!(!registry.contains(1));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let registry = Registry::new();
        registry.add(test_connection(1), "alice");

        assert_eq!(registry.remove(999), None);
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.remove(1), Some("alice".to_string()));
        assert_eq!(registry.remove(1), None);
    }

    #[test]
    fn test_readd_replaces_entry() {
        let registry = Registry::new();
        registry.add(test_connection(7), "first");
        registry.add(test_connection(7), "second");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.nicknames(), vec!["second".to_string()]);
    }

    #[test]
    fn test_duplicate_nicknames_allowed() {
        let registry = Registry::new();
        registry.add(test_connection(1), "sam");
        registry.add(test_connection(2), "sam");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.nicknames(), vec!["sam", "sam"]);
    }

    #[test]
    fn test_snapshot_in_join_order() {
        let registry = Registry::new();
        registry.add(test_connection(3), "carol");
        registry.add(test_connection(1), "alice");
        registry.add(test_connection(2), "bob");

        let snapshot = registry.snapshot();
        let ids: Vec<ConnectionId> = snapshot.iter().map(|m| m.connection.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(snapshot[0].connection.peer(), test_addr(40001));
        assert_eq!(registry.nicknames(), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = Registry::new();
        registry.add(test_connection(1), "alice");
        registry.add(test_connection(2), "bob");

        let snapshot = registry.snapshot();
        registry.remove(1);
        registry.add(test_connection(3), "carol");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].nickname, "alice");
        assert_eq!(registry.nicknames(), vec!["bob", "carol"]);
    }

    #[test]
    fn test_concurrent_add_remove() {
        let registry = Arc::new(Registry::new());
        let threads = 8;
        let per_thread = 200u64;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let id = t * per_thread + i + 1;
                        registry.add(test_connection(id), format!("user{}", id));
                        // Drop every even id again straight away
                        if id % 2 == 0 {
                            assert!(registry.remove(id).is_some());
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        let expected: Vec<ConnectionId> = (1..=threads * per_thread)
            .filter(|id| id % 2 == 1)
            .collect();
        let ids: Vec<ConnectionId> = snapshot.iter().map(|m| m.connection.id()).collect();
        assert_eq!(ids, expected);
    }
}
