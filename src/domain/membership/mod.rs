// ============================================================================
// Membership Domain - Association Requests
// ============================================================================
//
// Submit → Pending ─RecordPayment→ Paid ─Approve→ Approved ─Expire→ Expired
//            │                      │
//            ├─Cancel→ Cancelled    └─Reject→ Rejected
//            └─Reject→ Rejected
//
// A fully wallet-covered submission starts out Paid.
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
