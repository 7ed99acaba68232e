use uuid::Uuid;
use anyhow::Result;
use super::event::EventEnvelope;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Commands are validated before emitting events
// 3. Events represent facts that have already happened
// 4. Aggregates enforce business invariants (legal status transitions)
//
// ============================================================================

/// Generic Aggregate trait - all event-sourced aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Stream name used for the outbox and the audit trail
    const AGGREGATE_TYPE: &'static str;

    /// Validate a creation command and emit the opening events.
    /// Non-creation commands are rejected with the aggregate's "not initialized" error.
    fn create(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Create new aggregate from first event
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> Uuid;

    /// Current version (sequence number of the last applied event)
    fn version(&self) -> i64;

    fn set_version(&mut self, version: i64);

    /// Fold a freshly emitted batch of opening events into a new aggregate
    fn from_events(events: &[Self::Event]) -> Result<Self, Self::Error>
    where
        Self::Error: From<NotInitialized>,
    {
        let (first, rest) = events.split_first().ok_or(NotInitialized)?;
        let mut aggregate = Self::apply_first_event(first)?;
        for event in rest {
            aggregate.apply_event(event)?;
        }
        aggregate.set_version(events.len() as i64);
        Ok(aggregate)
    }

    /// Apply events emitted by `handle_command` to the in-memory state
    fn apply_all(&mut self, events: &[Self::Event]) -> Result<(), Self::Error> {
        for event in events {
            self.apply_event(event)?;
        }
        self.set_version(self.version() + events.len() as i64);
        Ok(())
    }

    /// Load aggregate from event history (reconstruct from events)
    fn load_from_events(events: Vec<EventEnvelope<Self::Event>>) -> Result<Self>
    where
        Self::Error: std::fmt::Display,
    {
        let Some((first, rest)) = events.split_first() else {
            anyhow::bail!("No events to load");
        };

        let mut aggregate = Self::apply_first_event(&first.event_data)
            .map_err(|e| anyhow::anyhow!("Failed to apply first event: {}", e))?;
        aggregate.set_version(first.sequence_number);

        for envelope in rest {
            aggregate.apply_event(&envelope.event_data)
                .map_err(|e| anyhow::anyhow!("Failed to apply event: {}", e))?;
            aggregate.set_version(envelope.sequence_number);
        }

        Ok(aggregate)
    }
}

/// Marker error for folding an empty event list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotInitialized;
