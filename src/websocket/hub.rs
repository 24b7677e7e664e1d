use dashmap::DashMap;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;

pub type WsSender = mpsc::UnboundedSender<String>;

/// Fan-out of notification payloads to every live socket of a member.
#[derive(Clone, Default)]
pub struct NotificationHub {
    connections: Arc<DashMap<i32, Vec<(u64, WsSender)>>>,
    next_conn_id: Arc<AtomicU64>,
}

/// Wire envelope pushed over the socket.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: &'a str,
    data: &'a T,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, member_id: i32) -> (u64, mpsc::UnboundedReceiver<String>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .entry(member_id)
            .or_default()
            .push((conn_id, tx));
        (conn_id, rx)
    }

    pub fn unsubscribe(&self, member_id: i32, conn_id: u64) {
        self.connections
            .remove_if_mut(&member_id, |_, senders| {
                senders.retain(|(id, _)| *id != conn_id);
                senders.is_empty()
            });
    }

    pub fn connection_count(&self, member_id: i32) -> usize {
        self.connections
            .get(&member_id)
            .map(|senders| senders.len())
            .unwrap_or(0)
    }

    /// Serialize `data` once and deliver it to every socket of the member.
    /// Closed channels are pruned on the way.
    pub fn push<T: Serialize>(&self, member_id: i32, kind: &str, data: &T) {
        let message = match serde_json::to_string(&Envelope { kind, data }) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failed to serialize {} push: {}", kind, e);
                return;
            }
        };

        self.connections.remove_if_mut(&member_id, |_, senders| {
            senders.retain(|(_, sender)| sender.send(message.clone()).is_ok());
            senders.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_reaches_every_socket_of_member() {
        let hub = NotificationHub::new();
        let (_, mut rx1) = hub.subscribe(1);
        let (_, mut rx2) = hub.subscribe(1);
        let (_, mut other) = hub.subscribe(2);

        hub.push(1, "notification", &serde_json::json!({ "id": 9 }));

        let msg = rx1.recv().await.unwrap();
        assert_eq!(msg, rx2.recv().await.unwrap());
        let value: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(value["type"], "notification");
        assert_eq!(value["data"]["id"], 9);
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn unsubscribe_drops_empty_entry() {
        let hub = NotificationHub::new();
        let (conn_id, _rx) = hub.subscribe(5);
        assert_eq!(hub.connection_count(5), 1);
        hub.unsubscribe(5, conn_id);
        assert_eq!(hub.connection_count(5), 0);
    }

    #[test]
    fn closed_receivers_are_pruned_on_push() {
        let hub = NotificationHub::new();
        let (_, rx) = hub.subscribe(3);
        drop(rx);
        hub.push(3, "notification", &1);
        assert_eq!(hub.connection_count(3), 0);
    }
}
