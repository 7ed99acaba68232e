use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::{FeeSplit, Money};
use crate::event_sourcing::DomainEvent;
use super::value_objects::{CertificateStatus, CertificateType, DeliveryMethod};

// ============================================================================
// Certificate Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CertificateEvent {
    Submitted(CertificateSubmitted),
    PaymentRecorded(CertificatePaymentRecorded),
    ProcessingStarted(CertificateProcessingStarted),
    MarkedReady(CertificateMarkedReady),
    DispatchedForDelivery(CertificateDispatched),
    Delivered(CertificateDelivered),
    Rejected(CertificateRejected),
    Cancelled(CertificateCancelled),
}

impl DomainEvent for CertificateEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CertificateEvent::Submitted(_) => "CertificateSubmitted",
            CertificateEvent::PaymentRecorded(_) => "CertificatePaymentRecorded",
            CertificateEvent::ProcessingStarted(_) => "CertificateProcessingStarted",
            CertificateEvent::MarkedReady(_) => "CertificateMarkedReady",
            CertificateEvent::DispatchedForDelivery(_) => "CertificateDispatchedForDelivery",
            CertificateEvent::Delivered(_) => "CertificateDelivered",
            CertificateEvent::Rejected(_) => "CertificateRejected",
            CertificateEvent::Cancelled(_) => "CertificateCancelled",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CertificateSubmitted {
    pub request_id: Uuid,
    pub alumni_id: Uuid,
    pub certificate_type: CertificateType,
    pub copies: u8,
    pub delivery: DeliveryMethod,
    pub unit_fee: Money,
    pub delivery_fee: Money,
    pub fee: FeeSplit,
    pub idempotency_key: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CertificatePaymentRecorded {
    pub amount: Money,
    pub reference: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CertificateProcessingStarted {
    pub started_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CertificateMarkedReady {
    pub ready_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CertificateDispatched {
    pub shipment_id: Uuid,
    pub dispatched_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CertificateDelivered {
    pub delivered_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CertificateRejected {
    pub reason: String,
    pub previous_status: CertificateStatus,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CertificateCancelled {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}
