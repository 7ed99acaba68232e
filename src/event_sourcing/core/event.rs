use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use anyhow::Result;

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps domain events with the metadata the store and the outbox need.
// Generic over ANY event type.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,

    pub event_type: String,
    pub event_version: i32,
    pub event_data: E,

    /// Shared by every event one user action produced, across aggregates
    pub correlation_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    /// Stream position is assigned by the store on append
    pub fn new(aggregate_id: Uuid, event_data: E, correlation_id: Uuid) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            sequence_number: 0,
            event_type: event_data.event_type().to_string(),
            event_version: event_data.event_version(),
            event_data,
            correlation_id,
            occurred_at: Utc::now(),
        }
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// All domain events implement this trait to be stored in the event store.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    /// Fully qualified event name, e.g. "MembershipApproved"
    fn event_type(&self) -> &'static str;

    fn event_version(&self) -> i32 {
        1
    }
}

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str { "TestEvent" }
        fn event_version(&self) -> i32 { 2 }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let event = TestEvent { data: "test".to_string() };

        let envelope = EventEnvelope::new(aggregate_id, event, correlation_id);

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 0);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.event_version, 2);
        assert_eq!(envelope.correlation_id, correlation_id);
    }

    #[test]
    fn test_event_serialization() {
        let event = TestEvent { data: "test data".to_string() };

        let json = serialize_event(&event).unwrap();
        let deserialized: TestEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event.data, deserialized.data);
    }
}
