use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use anyhow::{Result, bail};
use tokio::sync::RwLock;

use crate::event_sourcing::core::{DomainEvent, EventEnvelope, Aggregate, serialize_event};
use super::outbox::{Outbox, OutboxMessage};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// Type Parameter:
// - `E`: The domain event type (must implement DomainEvent trait)
//
// Responsibilities:
// 1. Append events to per-aggregate streams (append-only)
// 2. Load event history for aggregates
// 3. Ensure optimistic concurrency control
// 4. Write to the shared outbox for background subscribers
// 5. Keep an owner index (alumni -> aggregates) for per-owner rules
//
// ============================================================================

pub struct EventStore<E: DomainEvent> {
    streams: RwLock<HashMap<Uuid, Vec<EventEnvelope<E>>>>,
    owners: RwLock<HashMap<Uuid, Vec<Uuid>>>,
    aggregate_type_name: String,  // e.g., "Membership", "Wallet", "Shipment"
    outbox: Arc<Outbox>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(aggregate_type_name: &str, outbox: Arc<Outbox>) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
            aggregate_type_name: aggregate_type_name.to_string(),
            outbox,
        }
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type_name
    }

    /// Append events to the event store
    /// Returns the new version number after appending
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
        publish_to_outbox: bool,
    ) -> Result<i64> {
        if events.is_empty() {
            bail!("Cannot append empty event list");
        }

        let mut streams = self.streams.write().await;
        let stream = streams.entry(aggregate_id).or_default();

        // Check optimistic concurrency under the write lock
        let current_version = stream.last().map(|e| e.sequence_number).unwrap_or(0);
        if current_version != expected_version {
            bail!(
                "Concurrency conflict on {} {}: expected version {}, but current is {}",
                self.aggregate_type_name,
                aggregate_id,
                expected_version,
                current_version
            );
        }

        // Serialize everything before mutating so a bad payload leaves no trace
        let mut outbox_messages = Vec::with_capacity(events.len());
        let mut new_version = expected_version;
        let mut prepared = Vec::with_capacity(events.len());

        for mut envelope in events {
            new_version += 1;
            envelope.aggregate_id = aggregate_id;
            envelope.sequence_number = new_version;

            if publish_to_outbox {
                outbox_messages.push(OutboxMessage {
                    id: Uuid::now_v7(),
                    aggregate_id,
                    aggregate_type: self.aggregate_type_name.clone(),
                    event_id: envelope.event_id,
                    event_type: envelope.event_type.clone(),
                    payload: serialize_event(&envelope.event_data)?,
                    correlation_id: envelope.correlation_id,
                    created_at: envelope.occurred_at,
                    attempts: 0,
                });
            }

            prepared.push(envelope);
        }

        let event_count = prepared.len();
        stream.extend(prepared);

        if publish_to_outbox {
            self.outbox.enqueue(outbox_messages).await;
        }

        tracing::debug!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = event_count,
            "Appended events to event store"
        );

        Ok(new_version)
    }

    /// Wrap domain events in envelopes and append them with outbox publishing
    pub async fn commit(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<E>,
        correlation_id: Uuid,
    ) -> Result<i64> {
        if events.is_empty() {
            return Ok(expected_version);
        }

        let envelopes = events
            .into_iter()
            .map(|event| EventEnvelope::new(aggregate_id, event, correlation_id))
            .collect();

        self.append_events(aggregate_id, expected_version, envelopes, true).await
    }

    /// Load all events for an aggregate, in sequence order
    pub async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>> {
        let streams = self.streams.read().await;
        let events = streams.get(&aggregate_id).cloned().unwrap_or_default();

        tracing::trace!("Loaded {} events for aggregate {}", events.len(), aggregate_id);
        Ok(events)
    }

    /// Get current version of aggregate (0 = does not exist)
    pub async fn get_current_version(&self, aggregate_id: Uuid) -> Result<i64> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map(|e| e.sequence_number)
            .unwrap_or(0))
    }

    /// Load aggregate from events
    pub async fn load_aggregate<A>(&self, aggregate_id: Uuid) -> Result<A>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let events = self.load_events(aggregate_id).await?;

        if events.is_empty() {
            bail!("{} not found: {}", self.aggregate_type_name, aggregate_id);
        }

        A::load_from_events(events)
    }

    /// Load aggregate if its stream exists
    pub async fn find_aggregate<A>(&self, aggregate_id: Uuid) -> Result<Option<A>>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        if !self.aggregate_exists(aggregate_id).await? {
            return Ok(None);
        }
        self.load_aggregate(aggregate_id).await.map(Some)
    }

    pub async fn aggregate_exists(&self, aggregate_id: Uuid) -> Result<bool> {
        let version = self.get_current_version(aggregate_id).await?;
        Ok(version > 0)
    }

    /// Record that `aggregate_id` belongs to `owner_id`
    pub async fn link_owner(&self, owner_id: Uuid, aggregate_id: Uuid) {
        let mut owners = self.owners.write().await;
        let ids = owners.entry(owner_id).or_default();
        if !ids.contains(&aggregate_id) {
            ids.push(aggregate_id);
        }
    }

    /// Aggregates owned by `owner_id`, oldest first
    pub async fn aggregates_for_owner(&self, owner_id: Uuid) -> Vec<Uuid> {
        self.owners.read().await.get(&owner_id).cloned().unwrap_or_default()
    }

    pub async fn aggregate_ids(&self) -> Vec<Uuid> {
        self.streams
            .read()
            .await
            .iter()
            .filter(|(_, stream)| !stream.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Load every aggregate in this store
    pub async fn load_all<A>(&self) -> Result<Vec<A>>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let mut aggregates = Vec::new();
        for id in self.aggregate_ids().await {
            aggregates.push(self.load_aggregate(id).await?);
        }
        Ok(aggregates)
    }

    /// Load every aggregate owned by `owner_id`
    pub async fn load_for_owner<A>(&self, owner_id: Uuid) -> Result<Vec<A>>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let mut aggregates = Vec::new();
        for id in self.aggregates_for_owner(owner_id).await {
            if let Some(aggregate) = self.find_aggregate(id).await? {
                aggregates.push(aggregate);
            }
        }
        Ok(aggregates)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::shared::Money;
    use crate::domain::wallet::{WalletAggregate, WalletEvent, WalletOpened, WalletCredited};

    fn store() -> (EventStore<WalletEvent>, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::new());
        (EventStore::new("Wallet", outbox.clone()), outbox)
    }

    fn opened(alumni_id: Uuid) -> WalletEvent {
        WalletEvent::Opened(WalletOpened { alumni_id, opened_at: Utc::now() })
    }

    fn credited(amount: u32) -> WalletEvent {
        WalletEvent::Credited(WalletCredited {
            amount: Money::from_major(amount),
            reference: "top-up".to_string(),
            credited_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_commit_assigns_sequence_and_writes_outbox() {
        let (store, outbox) = store();
        let id = Uuid::new_v4();

        let version = store
            .commit(id, 0, vec![opened(id), credited(100)], Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(version, 2);
        let events = store.load_events(id).await.unwrap();
        assert_eq!(events[0].sequence_number, 1);
        assert_eq!(events[1].sequence_number, 2);
        assert_eq!(events[1].event_type, "WalletCredited");

        let messages = outbox.take_batch(10).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].aggregate_type, "Wallet");
        assert!(messages[1].payload.contains("Credited"));
    }

    #[tokio::test]
    async fn test_stale_expected_version_is_rejected() {
        let (store, outbox) = store();
        let id = Uuid::new_v4();
        store.commit(id, 0, vec![opened(id)], Uuid::new_v4()).await.unwrap();
        let before = outbox.len().await;

        let result = store.commit(id, 0, vec![credited(5)], Uuid::new_v4()).await;

        assert!(result.unwrap_err().to_string().contains("Concurrency conflict"));
        assert_eq!(store.get_current_version(id).await.unwrap(), 1);
        assert_eq!(outbox.len().await, before);
    }

    #[tokio::test]
    async fn test_commit_with_no_events_is_a_noop() {
        let (store, _) = store();
        let id = Uuid::new_v4();
        assert_eq!(store.commit(id, 0, vec![], Uuid::new_v4()).await.unwrap(), 0);
        assert!(!store.aggregate_exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_aggregate_rebuilds_state() {
        let (store, _) = store();
        let id = Uuid::new_v4();
        store
            .commit(id, 0, vec![opened(id), credited(40), credited(2)], Uuid::new_v4())
            .await
            .unwrap();

        let wallet: WalletAggregate = store.load_aggregate(id).await.unwrap();
        assert_eq!(wallet.version, 3);
        assert_eq!(wallet.balance, Money::from_major(42));
    }

    #[tokio::test]
    async fn test_missing_aggregate() {
        let (store, _) = store();
        let id = Uuid::new_v4();
        assert!(store.load_aggregate::<WalletAggregate>(id).await.is_err());
        assert!(store.find_aggregate::<WalletAggregate>(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_index() {
        let (store, _) = store();
        let owner = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.link_owner(owner, a).await;
        store.link_owner(owner, b).await;
        store.link_owner(owner, a).await;

        assert_eq!(store.aggregates_for_owner(owner).await, vec![a, b]);
        assert!(store.aggregates_for_owner(Uuid::new_v4()).await.is_empty());
    }
}
