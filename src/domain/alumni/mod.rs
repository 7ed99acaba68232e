// ============================================================================
// Alumni Domain - Graduate Profiles
// ============================================================================
//
// An alumni must be registered and active before submitting any request.
// The alumni id is also the wallet id.
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
