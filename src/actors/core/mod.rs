// ============================================================================
// Core Actor Abstractions
// ============================================================================
//
// Types shared by every infrastructure actor.
//
// ============================================================================

pub mod health;

pub use health::*;
