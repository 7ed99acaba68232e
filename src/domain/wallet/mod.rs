// ============================================================================
// Wallet Domain - Prepaid Alumni Balance
// ============================================================================
//
// One wallet per alumni (wallet id == alumni id). Fees are deducted from the
// wallet first; refunds of wallet-paid amounts flow back into it.
//
// ============================================================================

pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
