// ============================================================================
// Shared Domain Building Blocks
// ============================================================================
//
// Value objects and rules used by more than one aggregate:
// - Money (non-negative, 2 decimal places)
// - FeeSplit (wallet deduction against a fee)
// - FeeSchedule (configured request fees)
// - BusinessRule (stable error codes)
// - IdempotencyKey / RequestKind
//
// ============================================================================

pub mod errors;
pub mod fee_schedule;
pub mod fee_split;
pub mod money;
pub mod request;

pub use errors::*;
pub use fee_schedule::FeeSchedule;
pub use fee_split::FeeSplit;
pub use money::{Money, MoneyError};
pub use request::{IdempotencyKey, RequestKind};
