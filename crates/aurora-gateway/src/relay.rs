use std::sync::Arc;

use tracing::{debug, error};

use aurora_db::Database;
use aurora_types::events::{Envelope, EventKind};

use crate::registry::SessionRegistry;

/// Routes each inbound frame from a connected client.
///
/// Chat frames are appended to the message log before delivery; every
/// frame is then forwarded to the addressed recipient if they are
/// online. Offline recipients drop the frame — no queue, no retry.
#[derive(Clone)]
pub struct Relay {
    registry: SessionRegistry,
    db: Arc<Database>,
}

impl Relay {
    pub fn new(registry: SessionRegistry, db: Arc<Database>) -> Self {
        Self { registry, db }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub async fn handle_event(&self, from: &str, event: Envelope) {
        if *event.kind() == EventKind::Chat {
            self.persist_chat(from, &event).await;
        }
        self.deliver(from, &event).await;
    }

    /// Append the chat line to the message log. A write failure is
    /// logged and relay continues; the log is an audit of accepted chat
    /// events, and losing a write must not block delivery. The blocking
    /// insert runs on the blocking pool, so it also completes even if
    /// the sending connection is torn down mid-event.
    async fn persist_chat(&self, from: &str, event: &Envelope) {
        let db = self.db.clone();
        let sender = from.to_string();
        let receiver = event.to().to_string();
        let text = event.text().unwrap_or_default().to_string();

        let result =
            tokio::task::spawn_blocking(move || db.insert_message(&sender, &receiver, &text))
                .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("failed to persist chat from {from}: {e}"),
            Err(e) => error!("message log task failed: {e}"),
        }
    }

    async fn deliver(&self, from: &str, event: &Envelope) {
        match self.registry.lookup(event.to()).await {
            Some(tx) => {
                // A closed channel here means the recipient hung up
                // between lookup and send — same outcome as offline.
                let _ = tx.send(event.stamped(from));
            }
            None => debug!(
                "recipient {} offline, dropping {} frame from {from}",
                event.to(),
                event.kind().as_str()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay_with_memory_db() -> Relay {
        let db = Arc::new(Database::open_in_memory().unwrap());
        Relay::new(SessionRegistry::new(), db)
    }

    fn chat(to: &str, text: &str) -> Envelope {
        Envelope::parse(&format!(r#"{{"type":"chat","to":"{to}","text":"{text}"}}"#)).unwrap()
    }

    #[tokio::test]
    async fn chat_is_persisted_and_delivered_with_sender() {
        let relay = relay_with_memory_db();
        let (_conn_id, mut bob_rx) = relay.registry().register("bob").await;

        relay.handle_event("alice", chat("bob", "hi")).await;

        let frame = bob_rx.recv().await.unwrap();
        assert_eq!(frame["type"], "chat");
        assert_eq!(frame["from"], "alice");
        assert_eq!(frame["to"], "bob");
        assert_eq!(frame["text"], "hi");

        let rows = relay.db.messages_between("alice", "bob", 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sender, "alice");
        assert_eq!(rows[0].receiver, "bob");
        assert_eq!(rows[0].text, "hi");
    }

    #[tokio::test]
    async fn chat_to_offline_recipient_is_logged_but_dropped() {
        let relay = relay_with_memory_db();

        relay.handle_event("alice", chat("bob", "hi")).await;

        let rows = relay.db.messages_between("alice", "bob", 10).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn typing_is_delivered_but_not_persisted() {
        let relay = relay_with_memory_db();
        let (_conn_id, mut bob_rx) = relay.registry().register("bob").await;

        let event = Envelope::parse(r#"{"type":"typing","to":"bob"}"#).unwrap();
        relay.handle_event("alice", event).await;

        let frame = bob_rx.recv().await.unwrap();
        assert_eq!(frame["type"], "typing");
        assert_eq!(frame["from"], "alice");

        assert!(relay.db.messages_between("alice", "bob", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_type_is_forwarded_unchanged() {
        let relay = relay_with_memory_db();
        let (_conn_id, mut bob_rx) = relay.registry().register("bob").await;

        let event =
            Envelope::parse(r#"{"type":"read_receipt","to":"bob","msg_id":42}"#).unwrap();
        relay.handle_event("alice", event).await;

        let frame = bob_rx.recv().await.unwrap();
        assert_eq!(frame["type"], "read_receipt");
        assert_eq!(frame["msg_id"], 42);
        assert_eq!(frame["from"], "alice");

        assert!(relay.db.messages_between("alice", "bob", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn events_from_one_sender_arrive_in_order() {
        let relay = relay_with_memory_db();
        let (_conn_id, mut bob_rx) = relay.registry().register("bob").await;

        for i in 0..5 {
            relay.handle_event("alice", chat("bob", &format!("m{i}"))).await;
        }

        for i in 0..5 {
            let frame = bob_rx.recv().await.unwrap();
            assert_eq!(frame["text"], format!("m{i}"));
        }
    }
}
