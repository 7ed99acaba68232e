// ============================================================================
// Syndicate Domain - Professional Syndicate Subscriptions
// ============================================================================
//
// Submit → Pending → Paid → UnderReview → Approved
// Reject from Pending/Paid/UnderReview, Cancel from Pending.
//
// Requires an active membership and at most one open subscription per year.
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
