use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Outbound handle for one connection. Frames pushed here are drained by
/// that connection's writer task, so concurrent senders to the same
/// recipient cannot interleave partial writes.
pub type FrameSender = mpsc::UnboundedSender<Value>;

struct Session {
    conn_id: Uuid,
    tx: FrameSender,
}

/// Tracks which usernames currently have a live connection.
///
/// This map is the only mutable state shared between connection tasks;
/// all access goes through the lock held inside.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Bind a username to a fresh outbound channel, replacing any prior
    /// binding. A displaced connection keeps running but no longer
    /// receives relayed frames. Returns the conn-id that owns the new
    /// binding plus the receiving half for the writer task.
    pub async fn register(&self, username: &str) -> (Uuid, mpsc::UnboundedReceiver<Value>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .write()
            .await
            .insert(username.to_string(), Session { conn_id, tx });
        (conn_id, rx)
    }

    /// Remove the binding, but only if `conn_id` still owns it. A stale
    /// disconnect must not evict a newer session for the same username.
    /// No-op if the username is absent.
    pub async fn unregister(&self, username: &str, conn_id: Uuid) {
        let mut sessions = self.inner.write().await;
        if let Some(session) = sessions.get(username) {
            if session.conn_id == conn_id {
                sessions.remove(username);
            }
        }
    }

    /// Current outbound handle for a username, if they are online.
    pub async fn lookup(&self, username: &str) -> Option<FrameSender> {
        self.inner
            .read()
            .await
            .get(username)
            .map(|session| session.tx.clone())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn lookup_absent_returns_none() {
        let registry = SessionRegistry::new();
        assert!(registry.lookup("alice").await.is_none());
    }

    #[tokio::test]
    async fn register_then_lookup_delivers() {
        let registry = SessionRegistry::new();
        let (_conn_id, mut rx) = registry.register("alice").await;

        let tx = registry.lookup("alice").await.unwrap();
        tx.send(json!({"type": "chat"})).unwrap();

        assert_eq!(rx.recv().await.unwrap(), json!({"type": "chat"}));
    }

    #[tokio::test]
    async fn second_register_replaces_first() {
        let registry = SessionRegistry::new();
        let (_old_id, mut old_rx) = registry.register("alice").await;
        let (_new_id, mut new_rx) = registry.register("alice").await;

        let tx = registry.lookup("alice").await.unwrap();
        tx.send(json!({"n": 1})).unwrap();

        assert_eq!(new_rx.recv().await.unwrap(), json!({"n": 1}));
        // The displaced channel is closed once its sender is dropped.
        assert!(old_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn stale_unregister_does_not_evict_newer_session() {
        let registry = SessionRegistry::new();
        let (old_id, _old_rx) = registry.register("alice").await;
        let (_new_id, mut new_rx) = registry.register("alice").await;

        // The old connection's cleanup races in after the reconnect.
        registry.unregister("alice", old_id).await;

        let tx = registry.lookup("alice").await.expect("newer session evicted");
        tx.send(json!({"still": "here"})).unwrap();
        assert_eq!(new_rx.recv().await.unwrap(), json!({"still": "here"}));
    }

    #[tokio::test]
    async fn matching_unregister_removes_binding() {
        let registry = SessionRegistry::new();
        let (conn_id, _rx) = registry.register("alice").await;

        registry.unregister("alice", conn_id).await;
        assert!(registry.lookup("alice").await.is_none());

        // Unregistering an absent username is a no-op.
        registry.unregister("alice", conn_id).await;
    }
}
