// ============================================================================
// Event Sourcing Core - Generic Infrastructure Abstractions
// ============================================================================
//
// No domain-specific code lives here (no Membership, Wallet, Shipment...).
// Everything is generic over the aggregate and event types.
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::{Aggregate, NotInitialized};
pub use event::{DomainEvent, EventEnvelope, serialize_event};
