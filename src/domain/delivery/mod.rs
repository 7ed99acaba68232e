// ============================================================================
// Delivery Domain - Providers, Fee Strategies, Shipments
// ============================================================================
//
// - ProviderDirectory: configured couriers (active / inactive)
// - FeeStrategyRegistry: resolves a provider's fee-strategy type to a calculator
// - ShipmentAggregate: Requested → PickedUp → OutForDelivery → Delivered | Returned
//
// ============================================================================

pub mod value_objects;
pub mod provider;
pub mod fee_strategy;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

pub use value_objects::*;
pub use provider::*;
pub use fee_strategy::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
