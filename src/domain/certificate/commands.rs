use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::{FeeSplit, Money};
use super::value_objects::{CertificateType, DeliveryMethod};

// ============================================================================
// Certificate Commands
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CertificateCommand {
    Submit {
        request_id: Uuid,
        alumni_id: Uuid,
        certificate_type: CertificateType,
        copies: u8,
        delivery: DeliveryMethod,
        unit_fee: Money,
        delivery_fee: Money,
        fee: FeeSplit,
        idempotency_key: String,
    },
    RecordPayment {
        amount: Money,
        reference: String,
    },
    StartProcessing,
    MarkReady,
    DispatchForDelivery {
        shipment_id: Uuid,
    },
    ConfirmDelivered,
    Reject {
        reason: String,
    },
    Cancel {
        reason: String,
    },
}
