// ============================================================================
// Certificate Domain - Certificate Requests
// ============================================================================
//
// Pending → Paid → InProgress → ReadyForPickup ─┬─ConfirmDelivered→ Delivered   (pickup)
//                                               └─Dispatch→ OutForDelivery → Delivered (courier)
//
// Courier requests carry the delivery fee in their total; dispatching opens
// a shipment billed to the certificate.
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
