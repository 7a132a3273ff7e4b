//! In-memory fan-out of freshly appended session log entries.

use std::collections::HashMap;

use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use anivps_entity::log::SessionLogEntry;

/// Default per-session channel capacity.
const DEFAULT_BUFFER: usize = 64;

/// Per-session broadcast channels feeding the live log stream.
///
/// Channels are created on first subscription and dropped by the next
/// publish once every receiver is gone.
#[derive(Debug)]
pub struct LogBus {
    /// Session id → broadcast sender
    channels: RwLock<HashMap<Uuid, broadcast::Sender<SessionLogEntry>>>,
    /// Buffer size for channels
    buffer_size: usize,
}

impl Default for LogBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

impl LogBus {
    /// Create a bus whose channels buffer `buffer_size` entries.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Deliver `entry` to every subscriber of its session.
    pub async fn publish(&self, entry: SessionLogEntry) {
        let session_id = entry.session_id;
        let orphaned = {
            let channels = self.channels.read().await;
            match channels.get(&session_id) {
                Some(tx) => tx.send(entry).is_err(),
                None => false,
            }
        };

        if orphaned {
            let mut channels = self.channels.write().await;
            if channels
                .get(&session_id)
                .is_some_and(|tx| tx.receiver_count() == 0)
            {
                channels.remove(&session_id);
            }
        }
    }

    /// Subscribe to the entries of one session.
    pub async fn subscribe(&self, session_id: Uuid) -> broadcast::Receiver<SessionLogEntry> {
        let mut channels = self.channels.write().await;
        channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }

    /// Number of sessions with an open channel.
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anivps_entity::log::LogType;
    use chrono::Utc;

    fn entry(session_id: Uuid, message: &str) -> SessionLogEntry {
        SessionLogEntry {
            id: Uuid::new_v4(),
            session_id,
            log_type: LogType::Info,
            message: message.to_string(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_only_its_session() {
        let bus = LogBus::default();
        let mine = Uuid::new_v4();
        let mut rx = bus.subscribe(mine).await;

        bus.publish(entry(Uuid::new_v4(), "other")).await;
        bus.publish(entry(mine, "hello")).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "hello");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_dropped_after_last_receiver() {
        let bus = LogBus::default();
        let id = Uuid::new_v4();
        let rx = bus.subscribe(id).await;
        assert_eq!(bus.channel_count().await, 1);

        drop(rx);
        bus.publish(entry(id, "nobody listening")).await;
        assert_eq!(bus.channel_count().await, 0);
    }
}
