// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Command handler
//
// `shared` holds the money / fee-split building blocks, `execution` the
// command pipeline every handler runs through, `payments` the ledger and the
// fee collector that ties wallet deductions to ledger entries.
//
// ============================================================================

pub mod shared;
pub mod execution;
pub mod payments;

pub mod alumni;
pub mod wallet;
pub mod membership;
pub mod certificate;
pub mod syndicate;
pub mod delivery;
