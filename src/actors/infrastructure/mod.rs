// ============================================================================
// Infrastructure Actors
// ============================================================================
//
// Actors for system concerns:
// - Outbox dispatch to subscribers (audit trail, summary cache)
// - Nightly housekeeping (audit retention, membership expiry)
// - Health monitoring
// - Coordination and supervision
//
// ============================================================================

// Private module declarations
mod coordinator;
mod health_monitor;
mod nightly_sweep;
mod outbox_dispatcher;
mod subscribers;

// Re-export for public API
pub use coordinator::{CoordinatorActor, GetHealthMonitor, GetNightlySweep, GetOutboxDispatcher, Shutdown};
pub use health_monitor::{GetSystemHealth, HealthMonitorActor, UpdateHealth};
pub use nightly_sweep::RunSweep;
pub use outbox_dispatcher::FlushOutbox;
