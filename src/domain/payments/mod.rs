// ============================================================================
// Payments Domain - Append-only Transaction Ledger
// ============================================================================
//
// Every charge against a request fee is written once and never changed.
// Refunds are separate negative entries pointing at the charge they reverse.
//
// ============================================================================

pub mod errors;
pub mod transaction;
pub mod ledger;
pub mod collector;

pub use errors::*;
pub use transaction::*;
pub use ledger::*;
pub use collector::*;
