// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================
//
// In-process persistence for event streams, the shared outbox and the
// idempotency registry. All components work with ANY aggregate/event type.
//
// ============================================================================

pub mod event_store;
pub mod idempotency;
pub mod outbox;

pub use event_store::EventStore;
pub use idempotency::{IdempotencyRegistry, IdempotencyScope, Reservation};
pub use outbox::{Outbox, OutboxMessage};
