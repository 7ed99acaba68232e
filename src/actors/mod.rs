// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for background work.
//
// Structure:
// - core/           - Health types shared by the actors
// - infrastructure/ - Outbox dispatch, nightly sweep, health and coordination
//
// Note: Domain logic (alumni, wallet, membership, ...) uses CommandHandlers,
//       NOT actors. Actors are reserved for infrastructure concerns only.
//
// ============================================================================

// Private module declarations
mod core;
mod infrastructure;

// Re-export only what's needed in the public API
pub use infrastructure::{
    CoordinatorActor, FlushOutbox, GetHealthMonitor, GetNightlySweep, GetOutboxDispatcher, GetSystemHealth,
    HealthMonitorActor, RunSweep, Shutdown,
};
