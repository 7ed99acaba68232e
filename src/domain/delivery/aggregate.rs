use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::{FeeSplit, Money};
use crate::event_sourcing::Aggregate;
use super::commands::ShipmentCommand;
use super::errors::DeliveryError;
use super::events::*;
use super::value_objects::{Parcel, ShipmentStatus, ShippingAddress};

// ============================================================================
// Shipment Aggregate - Business Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentAggregate {
    pub shipment_id: Uuid,
    pub version: i64,
    pub alumni_id: Uuid,
    pub provider_id: Uuid,
    pub address: ShippingAddress,
    pub parcel: Parcel,
    pub status: ShipmentStatus,
    pub quoted_fee: Money,
    pub fee: FeeSplit,
    pub billed_to: Option<Uuid>,
    pub tracking_number: Option<String>,
    pub received_by: Option<String>,
    pub status_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentAggregate {
    fn transition(&self, next: ShipmentStatus, action: &'static str) -> Result<(), DeliveryError> {
        if self.status.can_become(next) {
            Ok(())
        } else {
            Err(DeliveryError::InvalidTransition { from: self.status, action })
        }
    }
}

fn required(value: &str, err: DeliveryError) -> Result<String, DeliveryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(err);
    }
    Ok(value.to_string())
}

impl Aggregate for ShipmentAggregate {
    type Event = ShipmentEvent;
    type Command = ShipmentCommand;
    type Error = DeliveryError;

    const AGGREGATE_TYPE: &'static str = "Shipment";

    fn create(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let ShipmentCommand::Request {
            shipment_id,
            alumni_id,
            provider_id,
            address,
            parcel,
            quoted_fee,
            fee,
            billed_to,
            idempotency_key,
        } = command
        else {
            return Err(DeliveryError::NotInitialized);
        };

        parcel.validate()?;

        // A shipment billed to another request charges nothing itself
        let expected_total = if billed_to.is_some() { Money::zero() } else { *quoted_fee };
        if !fee.is_consistent() || fee.total != expected_total {
            return Err(DeliveryError::InvalidFee);
        }

        Ok(vec![ShipmentEvent::Requested(ShipmentRequested {
            shipment_id: *shipment_id,
            alumni_id: *alumni_id,
            provider_id: *provider_id,
            address: address.clone(),
            parcel: *parcel,
            quoted_fee: *quoted_fee,
            fee: *fee,
            billed_to: *billed_to,
            idempotency_key: idempotency_key.clone(),
            requested_at: Utc::now(),
        })])
    }

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            ShipmentEvent::Requested(e) => Ok(Self {
                shipment_id: e.shipment_id,
                version: 0,
                alumni_id: e.alumni_id,
                provider_id: e.provider_id,
                address: e.address.clone(),
                parcel: e.parcel,
                status: ShipmentStatus::Requested,
                quoted_fee: e.quoted_fee,
                fee: e.fee,
                billed_to: e.billed_to,
                tracking_number: None,
                received_by: None,
                status_reason: None,
                created_at: e.requested_at,
                updated_at: e.requested_at,
            }),
            _ => Err(DeliveryError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            ShipmentEvent::Requested(_) => {}
            ShipmentEvent::PickedUp(e) => {
                self.status = ShipmentStatus::PickedUp;
                self.tracking_number = Some(e.tracking_number.clone());
                self.updated_at = e.picked_up_at;
            }
            ShipmentEvent::OutForDelivery(e) => {
                self.status = ShipmentStatus::OutForDelivery;
                self.updated_at = e.dispatched_at;
            }
            ShipmentEvent::Delivered(e) => {
                self.status = ShipmentStatus::Delivered;
                self.received_by = Some(e.received_by.clone());
                self.updated_at = e.delivered_at;
            }
            ShipmentEvent::Returned(e) => {
                self.status = ShipmentStatus::Returned;
                self.status_reason = Some(e.reason.clone());
                self.updated_at = e.returned_at;
            }
            ShipmentEvent::Cancelled(e) => {
                self.status = ShipmentStatus::Cancelled;
                self.status_reason = Some(e.reason.clone());
                self.updated_at = e.cancelled_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();
        match command {
            ShipmentCommand::Request { .. } => Err(DeliveryError::InvalidTransition {
                from: self.status,
                action: "request",
            }),

            ShipmentCommand::MarkAsPickedUp { tracking_number } => {
                self.transition(ShipmentStatus::PickedUp, "pick up")?;
                Ok(vec![ShipmentEvent::PickedUp(ShipmentPickedUp {
                    tracking_number: required(tracking_number, DeliveryError::TrackingNumberRequired)?,
                    picked_up_at: now,
                })])
            }

            ShipmentCommand::MarkOutForDelivery => {
                self.transition(ShipmentStatus::OutForDelivery, "dispatch")?;
                Ok(vec![ShipmentEvent::OutForDelivery(ShipmentOutForDelivery { dispatched_at: now })])
            }

            ShipmentCommand::MarkDelivered { received_by } => {
                self.transition(ShipmentStatus::Delivered, "deliver")?;
                Ok(vec![ShipmentEvent::Delivered(ShipmentDelivered {
                    received_by: received_by.trim().to_string(),
                    delivered_at: now,
                })])
            }

            ShipmentCommand::MarkReturned { reason } => {
                self.transition(ShipmentStatus::Returned, "return")?;
                Ok(vec![ShipmentEvent::Returned(ShipmentReturned {
                    reason: required(reason, DeliveryError::ReasonRequired)?,
                    returned_at: now,
                })])
            }

            ShipmentCommand::Cancel { reason } => {
                self.transition(ShipmentStatus::Cancelled, "cancel")?;
                Ok(vec![ShipmentEvent::Cancelled(ShipmentCancelled {
                    reason: required(reason, DeliveryError::ReasonRequired)?,
                    cancelled_at: now,
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.shipment_id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
