use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::{FeeSplit, Money};
use super::value_objects::{Parcel, ShippingAddress};

// ============================================================================
// Shipment Commands
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShipmentCommand {
    Request {
        shipment_id: Uuid,
        alumni_id: Uuid,
        provider_id: Uuid,
        address: ShippingAddress,
        parcel: Parcel,
        quoted_fee: Money,
        fee: FeeSplit,
        billed_to: Option<Uuid>,
        idempotency_key: String,
    },
    MarkAsPickedUp {
        tracking_number: String,
    },
    MarkOutForDelivery,
    MarkDelivered {
        received_by: String,
    },
    MarkReturned {
        reason: String,
    },
    Cancel {
        reason: String,
    },
}
