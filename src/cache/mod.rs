// ============================================================================
// Alumni Summary Cache
// ============================================================================
//
// Cache-aside read model combining the alumni profile with the wallet
// balance. Reads go through `get_or_load`; the outbox dispatcher rebuilds
// an entry whenever an alumni or wallet event for it is delivered.
//
// ============================================================================

mod summary;

pub use summary::{AlumniSummary, AlumniSummaryCache};
