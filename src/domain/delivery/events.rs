use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::{FeeSplit, Money};
use crate::event_sourcing::DomainEvent;
use super::value_objects::{Parcel, ShippingAddress};

// ============================================================================
// Shipment Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShipmentEvent {
    Requested(ShipmentRequested),
    PickedUp(ShipmentPickedUp),
    OutForDelivery(ShipmentOutForDelivery),
    Delivered(ShipmentDelivered),
    Returned(ShipmentReturned),
    Cancelled(ShipmentCancelled),
}

impl DomainEvent for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::Requested(_) => "ShipmentRequested",
            ShipmentEvent::PickedUp(_) => "ShipmentPickedUp",
            ShipmentEvent::OutForDelivery(_) => "ShipmentOutForDelivery",
            ShipmentEvent::Delivered(_) => "ShipmentDelivered",
            ShipmentEvent::Returned(_) => "ShipmentReturned",
            ShipmentEvent::Cancelled(_) => "ShipmentCancelled",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShipmentRequested {
    pub shipment_id: Uuid,
    pub alumni_id: Uuid,
    pub provider_id: Uuid,
    pub address: ShippingAddress,
    pub parcel: Parcel,
    /// Price quoted by the provider's fee strategy
    pub quoted_fee: Money,
    /// What this shipment itself charges; zero when `billed_to` paid for it
    pub fee: FeeSplit,
    pub billed_to: Option<Uuid>,
    pub idempotency_key: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShipmentPickedUp {
    pub tracking_number: String,
    pub picked_up_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShipmentOutForDelivery {
    pub dispatched_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShipmentDelivered {
    pub received_by: String,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShipmentReturned {
    pub reason: String,
    pub returned_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShipmentCancelled {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}
