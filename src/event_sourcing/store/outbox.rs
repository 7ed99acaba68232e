use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

// ============================================================================
// Transactional Outbox
// ============================================================================
//
// Every append to an event stream also enqueues one message per event here.
// The OutboxDispatcher actor drains the queue and delivers messages to
// subscribers (audit log, profile cache rebuild).
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub event_id: Uuid,
    pub event_type: String,
    pub payload: String,
    pub correlation_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
}

#[derive(Default)]
pub struct Outbox {
    queue: Mutex<VecDeque<OutboxMessage>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, messages: Vec<OutboxMessage>) {
        let mut queue = self.queue.lock().await;
        queue.extend(messages);
    }

    /// Take up to `max` messages in FIFO order
    pub async fn take_batch(&self, max: usize) -> Vec<OutboxMessage> {
        let mut queue = self.queue.lock().await;
        let count = max.min(queue.len());
        queue.drain(..count).collect()
    }

    /// Put messages back at the front, keeping their original order
    pub async fn requeue(&self, messages: Vec<OutboxMessage>) {
        let mut queue = self.queue.lock().await;
        for message in messages.into_iter().rev() {
            queue.push_front(message);
        }
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(event_type: &str) -> OutboxMessage {
        OutboxMessage {
            id: Uuid::new_v4(),
            aggregate_id: Uuid::new_v4(),
            aggregate_type: "Wallet".to_string(),
            event_id: Uuid::new_v4(),
            event_type: event_type.to_string(),
            payload: "{}".to_string(),
            correlation_id: Uuid::new_v4(),
            created_at: Utc::now(),
            attempts: 0,
        }
    }

    #[tokio::test]
    async fn test_take_batch_is_fifo_and_bounded() {
        let outbox = Outbox::new();
        outbox.enqueue(vec![message("A"), message("B"), message("C")]).await;

        let batch = outbox.take_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].event_type, "A");
        assert_eq!(batch[1].event_type, "B");
        assert_eq!(outbox.len().await, 1);
    }

    #[tokio::test]
    async fn test_requeue_preserves_order() {
        let outbox = Outbox::new();
        outbox.enqueue(vec![message("A"), message("B"), message("C")]).await;

        let mut batch = outbox.take_batch(2).await;
        batch[0].attempts += 1;
        outbox.requeue(batch).await;

        let all = outbox.take_batch(10).await;
        let types: Vec<_> = all.iter().map(|m| m.event_type.as_str()).collect();
        assert_eq!(types, vec!["A", "B", "C"]);
        assert_eq!(all[0].attempts, 1);
        assert_eq!(all[2].attempts, 0);
        assert!(outbox.is_empty().await);
    }
}
