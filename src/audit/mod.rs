use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event_sourcing::OutboxMessage;

// ============================================================================
// Audit Log
// ============================================================================
//
// One entry per delivered outbox message. Entries are written by the outbox
// dispatcher and removed only by the retention sweep.
//
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub message_id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub correlation_id: Uuid,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Default)]
struct AuditState {
    entries: Vec<AuditEntry>,
    seen: HashSet<Uuid>,
}

#[derive(Default)]
pub struct AuditLog {
    state: RwLock<AuditState>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry for `message`. Redelivered messages are ignored.
    /// Returns whether a new entry was written.
    pub async fn record(&self, message: &OutboxMessage) -> Result<bool> {
        let payload: serde_json::Value = serde_json::from_str(&message.payload)
            .with_context(|| format!("Outbox message {} has an invalid payload", message.id))?;

        let mut state = self.state.write().await;
        if !state.seen.insert(message.id) {
            return Ok(false);
        }
        state.entries.push(AuditEntry {
            message_id: message.id,
            aggregate_type: message.aggregate_type.clone(),
            aggregate_id: message.aggregate_id,
            event_type: message.event_type.clone(),
            correlation_id: message.correlation_id,
            payload,
            occurred_at: message.created_at,
            recorded_at: Utc::now(),
        });
        Ok(true)
    }

    /// Remove entries whose event happened before `cutoff`
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut state = self.state.write().await;
        let AuditState { entries, seen } = &mut *state;

        let before = entries.len();
        entries.retain(|entry| {
            let keep = entry.occurred_at >= cutoff;
            if !keep {
                seen.remove(&entry.message_id);
            }
            keep
        });
        before - entries.len()
    }

    pub async fn for_aggregate(&self, aggregate_id: Uuid) -> Vec<AuditEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .filter(|entry| entry.aggregate_id == aggregate_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn message(created_at: DateTime<Utc>) -> OutboxMessage {
        OutboxMessage {
            id: Uuid::new_v4(),
            aggregate_id: Uuid::new_v4(),
            aggregate_type: "Membership".to_string(),
            event_id: Uuid::new_v4(),
            event_type: "MembershipSubmitted".to_string(),
            payload: r#"{"plan":"Annual"}"#.to_string(),
            correlation_id: Uuid::new_v4(),
            created_at,
            attempts: 0,
        }
    }

    #[tokio::test]
    async fn test_record_ignores_redelivery() {
        let log = AuditLog::new();
        let msg = message(Utc::now());

        assert!(log.record(&msg).await.unwrap());
        assert!(!log.record(&msg).await.unwrap());

        let entries = log.for_aggregate(msg.aggregate_id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload["plan"], "Annual");
    }

    #[tokio::test]
    async fn test_invalid_payload_is_an_error() {
        let log = AuditLog::new();
        let mut msg = message(Utc::now());
        msg.payload = "not json".to_string();

        assert!(log.record(&msg).await.is_err());
        assert_eq!(log.len().await, 0);
    }

    #[tokio::test]
    async fn test_purge_keeps_entries_inside_retention() {
        let log = AuditLog::new();
        let now = Utc::now();
        log.record(&message(now - Duration::days(45))).await.unwrap();
        log.record(&message(now - Duration::days(31))).await.unwrap();
        log.record(&message(now - Duration::days(2))).await.unwrap();

        let purged = log.purge_older_than(now - Duration::days(30)).await;

        assert_eq!(purged, 2);
        assert_eq!(log.len().await, 1);
    }
}
