use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::delivery::{Parcel, ShippingAddress};
use crate::domain::shared::{FeeSplit, Money};
use crate::event_sourcing::Aggregate;
use super::commands::CertificateCommand;
use super::errors::CertificateError;
use super::events::*;
use super::value_objects::{CertificateStatus, CertificateType, DeliveryMethod, MAX_COPIES};

// ============================================================================
// Certificate Aggregate - Business Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateAggregate {
    pub request_id: Uuid,
    pub version: i64,
    pub alumni_id: Uuid,
    pub certificate_type: CertificateType,
    pub copies: u8,
    pub delivery: DeliveryMethod,
    pub status: CertificateStatus,
    pub unit_fee: Money,
    pub delivery_fee: Money,
    pub fee: FeeSplit,
    pub paid_externally: Money,
    pub shipment_id: Option<Uuid>,
    pub status_reason: Option<String>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a courier request goes
pub struct CourierDetails<'a> {
    pub provider_id: Uuid,
    pub address: &'a ShippingAddress,
    pub parcel: &'a Parcel,
}

/// `unit_fee × copies + delivery_fee`
pub fn certificate_total(unit_fee: Money, copies: u8, delivery_fee: Money) -> Result<Money, CertificateError> {
    let copies_total = unit_fee
        .times(Decimal::from(copies))
        .map_err(|_| CertificateError::InvalidFee)?;
    copies_total
        .checked_add(delivery_fee)
        .ok_or(CertificateError::InvalidFee)
}

impl CertificateAggregate {
    fn transition(&self, next: CertificateStatus, action: &'static str) -> Result<(), CertificateError> {
        if self.status.can_become(next) {
            Ok(())
        } else {
            Err(CertificateError::InvalidTransition { from: self.status, action })
        }
    }

    /// A courier request that is ready to hand to the provider
    pub fn courier_details(&self) -> Result<CourierDetails<'_>, CertificateError> {
        self.transition(CertificateStatus::OutForDelivery, "dispatch")?;
        match &self.delivery {
            DeliveryMethod::Courier { provider_id, address, parcel } => Ok(CourierDetails {
                provider_id: *provider_id,
                address,
                parcel,
            }),
            DeliveryMethod::Pickup => Err(CertificateError::DeliveryMethodMismatch { expected: "courier" }),
        }
    }
}

fn reason(value: &str) -> Result<String, CertificateError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CertificateError::ReasonRequired);
    }
    Ok(value.to_string())
}

impl Aggregate for CertificateAggregate {
    type Event = CertificateEvent;
    type Command = CertificateCommand;
    type Error = CertificateError;

    const AGGREGATE_TYPE: &'static str = "Certificate";

    fn create(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let CertificateCommand::Submit {
            request_id,
            alumni_id,
            certificate_type,
            copies,
            delivery,
            unit_fee,
            delivery_fee,
            fee,
            idempotency_key,
        } = command
        else {
            return Err(CertificateError::NotInitialized);
        };

        if !(1..=MAX_COPIES).contains(copies) {
            return Err(CertificateError::InvalidCopies { requested: *copies });
        }
        if !delivery.is_courier() && !delivery_fee.is_zero() {
            return Err(CertificateError::InvalidFee);
        }
        let expected = certificate_total(*unit_fee, *copies, *delivery_fee)?;
        if fee.total.is_zero() || fee.total != expected || !fee.is_consistent() {
            return Err(CertificateError::InvalidFee);
        }

        Ok(vec![CertificateEvent::Submitted(CertificateSubmitted {
            request_id: *request_id,
            alumni_id: *alumni_id,
            certificate_type: *certificate_type,
            copies: *copies,
            delivery: delivery.clone(),
            unit_fee: *unit_fee,
            delivery_fee: *delivery_fee,
            fee: *fee,
            idempotency_key: idempotency_key.clone(),
            submitted_at: Utc::now(),
        })])
    }

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            CertificateEvent::Submitted(e) => Ok(Self {
                request_id: e.request_id,
                version: 0,
                alumni_id: e.alumni_id,
                certificate_type: e.certificate_type,
                copies: e.copies,
                delivery: e.delivery.clone(),
                status: if e.fee.is_settled() {
                    CertificateStatus::Paid
                } else {
                    CertificateStatus::Pending
                },
                unit_fee: e.unit_fee,
                delivery_fee: e.delivery_fee,
                fee: e.fee,
                paid_externally: Money::zero(),
                shipment_id: None,
                status_reason: None,
                idempotency_key: e.idempotency_key.clone(),
                created_at: e.submitted_at,
                updated_at: e.submitted_at,
            }),
            _ => Err(CertificateError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            CertificateEvent::Submitted(_) => {}
            CertificateEvent::PaymentRecorded(e) => {
                self.status = CertificateStatus::Paid;
                self.paid_externally = e.amount;
                self.updated_at = e.paid_at;
            }
            CertificateEvent::ProcessingStarted(e) => {
                self.status = CertificateStatus::InProgress;
                self.updated_at = e.started_at;
            }
            CertificateEvent::MarkedReady(e) => {
                self.status = CertificateStatus::ReadyForPickup;
                self.updated_at = e.ready_at;
            }
            CertificateEvent::DispatchedForDelivery(e) => {
                self.status = CertificateStatus::OutForDelivery;
                self.shipment_id = Some(e.shipment_id);
                self.updated_at = e.dispatched_at;
            }
            CertificateEvent::Delivered(e) => {
                self.status = CertificateStatus::Delivered;
                self.updated_at = e.delivered_at;
            }
            CertificateEvent::Rejected(e) => {
                self.status = CertificateStatus::Rejected;
                self.status_reason = Some(e.reason.clone());
                self.updated_at = e.rejected_at;
            }
            CertificateEvent::Cancelled(e) => {
                self.status = CertificateStatus::Cancelled;
                self.status_reason = Some(e.reason.clone());
                self.updated_at = e.cancelled_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();
        match command {
            CertificateCommand::Submit { .. } => Err(CertificateError::InvalidTransition {
                from: self.status,
                action: "resubmit",
            }),

            CertificateCommand::RecordPayment { amount, reference } => {
                self.transition(CertificateStatus::Paid, "record payment for")?;
                if *amount != self.fee.remaining {
                    return Err(CertificateError::PaymentMismatch {
                        expected: self.fee.remaining,
                        received: *amount,
                    });
                }
                Ok(vec![CertificateEvent::PaymentRecorded(CertificatePaymentRecorded {
                    amount: *amount,
                    reference: reference.clone(),
                    paid_at: now,
                })])
            }

            CertificateCommand::StartProcessing => {
                self.transition(CertificateStatus::InProgress, "start processing")?;
                Ok(vec![CertificateEvent::ProcessingStarted(CertificateProcessingStarted { started_at: now })])
            }

            CertificateCommand::MarkReady => {
                self.transition(CertificateStatus::ReadyForPickup, "mark ready")?;
                Ok(vec![CertificateEvent::MarkedReady(CertificateMarkedReady { ready_at: now })])
            }

            CertificateCommand::DispatchForDelivery { shipment_id } => {
                self.courier_details()?;
                Ok(vec![CertificateEvent::DispatchedForDelivery(CertificateDispatched {
                    shipment_id: *shipment_id,
                    dispatched_at: now,
                })])
            }

            CertificateCommand::ConfirmDelivered => {
                self.transition(CertificateStatus::Delivered, "confirm delivery of")?;
                // Courier requests must go through a shipment first
                if self.status == CertificateStatus::ReadyForPickup && self.delivery.is_courier() {
                    return Err(CertificateError::DeliveryMethodMismatch { expected: "pickup" });
                }
                Ok(vec![CertificateEvent::Delivered(CertificateDelivered { delivered_at: now })])
            }

            CertificateCommand::Reject { reason: why } => {
                self.transition(CertificateStatus::Rejected, "reject")?;
                Ok(vec![CertificateEvent::Rejected(CertificateRejected {
                    reason: reason(why)?,
                    previous_status: self.status,
                    rejected_at: now,
                })])
            }

            CertificateCommand::Cancel { reason: why } => {
                self.transition(CertificateStatus::Cancelled, "cancel")?;
                Ok(vec![CertificateEvent::Cancelled(CertificateCancelled {
                    reason: reason(why)?,
                    cancelled_at: now,
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.request_id
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

#[cfg(test)]
mod tests {
    use super::*;

    fn courier() -> DeliveryMethod {
        DeliveryMethod::Courier {
            provider_id: Uuid::new_v4(),
            address: ShippingAddress {
                recipient: "Hana Fathy".to_string(),
                street: "5 Nile Corniche".to_string(),
                city: "Giza".to_string(),
                phone: "+201200000000".to_string(),
            },
            parcel: Parcel::new(Decimal::from(8), Decimal::ONE).unwrap(),
        }
    }

    fn submit_command(copies: u8, delivery: DeliveryMethod, delivery_fee: Money, balance: Money) -> CertificateCommand {
        let unit_fee = Money::from_major(100);
        let total = certificate_total(unit_fee, copies.max(1), delivery_fee).unwrap();
        CertificateCommand::Submit {
            request_id: Uuid::new_v4(),
            alumni_id: Uuid::new_v4(),
            certificate_type: CertificateType::Transcript,
            copies,
            delivery,
            unit_fee,
            delivery_fee,
            fee: FeeSplit::compute(total, balance),
            idempotency_key: "k".to_string(),
        }
    }

    fn submitted(delivery: DeliveryMethod, delivery_fee: Money) -> CertificateAggregate {
        let events =
            CertificateAggregate::create(&submit_command(2, delivery, delivery_fee, Money::from_major(1_000))).unwrap();
        CertificateAggregate::from_events(&events).unwrap()
    }

    fn execute(certificate: &mut CertificateAggregate, command: CertificateCommand) -> Result<(), CertificateError> {
        let events = certificate.handle_command(&command)?;
        certificate.apply_all(&events)
    }

    fn ready(delivery: DeliveryMethod, delivery_fee: Money) -> CertificateAggregate {
        let mut certificate = submitted(delivery, delivery_fee);
        execute(&mut certificate, CertificateCommand::StartProcessing).unwrap();
        execute(&mut certificate, CertificateCommand::MarkReady).unwrap();
        certificate
    }

    #[test]
    fn test_copies_bounds() {
        for copies in [0u8, 11] {
            let result = CertificateAggregate::create(&submit_command(copies, DeliveryMethod::Pickup, Money::zero(), Money::zero()));
            assert_eq!(result.unwrap_err(), CertificateError::InvalidCopies { requested: copies });
        }
    }

    #[test]
    fn test_fee_includes_delivery() {
        let certificate = submitted(courier(), Money::from_major(35));
        assert_eq!(certificate.fee.total, Money::from_major(235));
        assert_eq!(certificate.status, CertificateStatus::Paid);

        let mut command = submit_command(2, courier(), Money::from_major(35), Money::zero());
        if let CertificateCommand::Submit { fee, .. } = &mut command {
            *fee = FeeSplit::without_wallet(Money::from_major(200));
        }
        assert_eq!(CertificateAggregate::create(&command).unwrap_err(), CertificateError::InvalidFee);
    }

    #[test]
    fn test_pickup_cannot_carry_delivery_fee() {
        let command = submit_command(1, DeliveryMethod::Pickup, Money::from_major(10), Money::zero());
        assert_eq!(CertificateAggregate::create(&command).unwrap_err(), CertificateError::InvalidFee);
    }

    #[test]
    fn test_pickup_path() {
        let mut certificate = ready(DeliveryMethod::Pickup, Money::zero());
        let err = certificate
            .handle_command(&CertificateCommand::DispatchForDelivery { shipment_id: Uuid::new_v4() })
            .unwrap_err();
        assert_eq!(err, CertificateError::DeliveryMethodMismatch { expected: "courier" });

        execute(&mut certificate, CertificateCommand::ConfirmDelivered).unwrap();
        assert_eq!(certificate.status, CertificateStatus::Delivered);
    }

    #[test]
    fn test_courier_path() {
        let mut certificate = ready(courier(), Money::from_major(35));
        let err = certificate.handle_command(&CertificateCommand::ConfirmDelivered).unwrap_err();
        assert_eq!(err, CertificateError::DeliveryMethodMismatch { expected: "pickup" });

        let shipment_id = Uuid::new_v4();
        execute(&mut certificate, CertificateCommand::DispatchForDelivery { shipment_id }).unwrap();
        assert_eq!(certificate.shipment_id, Some(shipment_id));

        execute(&mut certificate, CertificateCommand::ConfirmDelivered).unwrap();
        assert_eq!(certificate.status, CertificateStatus::Delivered);
        assert_eq!(certificate.version, 5);
    }

    #[test]
    fn test_ready_can_be_rejected_until_dispatched() {
        let mut certificate = ready(courier(), Money::from_major(35));
        execute(&mut certificate, CertificateCommand::Reject { reason: "courier withdrawn".into() }).unwrap();
        assert_eq!(certificate.status, CertificateStatus::Rejected);

        let mut dispatched = ready(courier(), Money::from_major(35));
        execute(&mut dispatched, CertificateCommand::DispatchForDelivery { shipment_id: Uuid::new_v4() }).unwrap();
        let err = dispatched
            .handle_command(&CertificateCommand::Reject { reason: "damaged".into() })
            .unwrap_err();
        assert_eq!(
            err,
            CertificateError::InvalidTransition { from: CertificateStatus::OutForDelivery, action: "reject" }
        );
    }

    #[test]
    fn test_pending_payment_then_processing() {
        let events = CertificateAggregate::create(&submit_command(
            3,
            DeliveryMethod::Pickup,
            Money::zero(),
            Money::from_major(50),
        ))
        .unwrap();
        let mut certificate = CertificateAggregate::from_events(&events).unwrap();
        assert_eq!(certificate.status, CertificateStatus::Pending);

        let err = certificate.handle_command(&CertificateCommand::StartProcessing).unwrap_err();
        assert!(matches!(err, CertificateError::InvalidTransition { .. }));

        execute(
            &mut certificate,
            CertificateCommand::RecordPayment { amount: Money::from_major(250), reference: "pos-9".into() },
        )
        .unwrap();
        execute(&mut certificate, CertificateCommand::StartProcessing).unwrap();
        assert_eq!(certificate.status, CertificateStatus::InProgress);
    }
}
