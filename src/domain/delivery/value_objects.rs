use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::DeliveryError;

// ============================================================================
// Delivery Value Objects
// ============================================================================

/// Longest distance a courier quote accepts
pub const MAX_DISTANCE_KM: i64 = 20_000;
/// Heaviest parcel a courier quote accepts
pub const MAX_WEIGHT_KG: i64 = 1_000;

/// What is being shipped and how far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    pub distance_km: Decimal,
    pub weight_kg: Decimal,
}

impl Parcel {
    pub fn new(distance_km: Decimal, weight_kg: Decimal) -> Result<Self, DeliveryError> {
        let parcel = Self { distance_km, weight_kg };
        parcel.validate()?;
        Ok(parcel)
    }

    pub fn validate(&self) -> Result<(), DeliveryError> {
        let distance_ok = self.distance_km >= Decimal::ZERO && self.distance_km <= Decimal::from(MAX_DISTANCE_KM);
        let weight_ok = self.weight_kg > Decimal::ZERO && self.weight_kg <= Decimal::from(MAX_WEIGHT_KG);
        if !distance_ok || !weight_ok {
            return Err(DeliveryError::InvalidParcel);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Requested,
    PickedUp,
    OutForDelivery,
    Delivered,
    Returned,
    Cancelled,
}

impl ShipmentStatus {
    /// Configured successors of each state
    pub fn can_become(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Requested, PickedUp)
                | (Requested, Cancelled)
                | (PickedUp, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (OutForDelivery, Returned)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered | ShipmentStatus::Returned | ShipmentStatus::Cancelled
        )
    }
}
