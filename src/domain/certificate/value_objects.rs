use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::delivery::{Parcel, ShippingAddress};
use crate::domain::shared::{FeeSchedule, Money};

pub const MAX_COPIES: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateStatus {
    Pending,
    Paid,
    InProgress,
    ReadyForPickup,
    OutForDelivery,
    Delivered,
    Rejected,
    Cancelled,
}

impl CertificateStatus {
    pub fn can_become(self, next: CertificateStatus) -> bool {
        use CertificateStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Paid, InProgress)
                | (Paid, Rejected)
                | (InProgress, ReadyForPickup)
                | (InProgress, Rejected)
                | (ReadyForPickup, OutForDelivery)
                | (ReadyForPickup, Rejected)
                | (ReadyForPickup, Delivered)
                | (OutForDelivery, Delivered)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateType {
    Graduation,
    Transcript,
    Enrollment,
}

impl CertificateType {
    pub fn unit_fee(&self, schedule: &FeeSchedule) -> Money {
        match self {
            CertificateType::Graduation => schedule.certificate_graduation,
            CertificateType::Transcript => schedule.certificate_transcript,
            CertificateType::Enrollment => schedule.certificate_enrollment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMethod {
    Pickup,
    Courier {
        provider_id: Uuid,
        address: ShippingAddress,
        parcel: Parcel,
    },
}

impl DeliveryMethod {
    pub fn is_courier(&self) -> bool {
        matches!(self, DeliveryMethod::Courier { .. })
    }
}
