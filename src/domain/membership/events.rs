use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::{FeeSplit, Money};
use crate::event_sourcing::DomainEvent;
use super::value_objects::{MembershipPlan, MembershipStatus};

// ============================================================================
// Membership Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MembershipEvent {
    Submitted(MembershipSubmitted),
    PaymentRecorded(MembershipPaymentRecorded),
    Approved(MembershipApproved),
    Rejected(MembershipRejected),
    Cancelled(MembershipCancelled),
    Expired(MembershipExpired),
}

impl DomainEvent for MembershipEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MembershipEvent::Submitted(_) => "MembershipSubmitted",
            MembershipEvent::PaymentRecorded(_) => "MembershipPaymentRecorded",
            MembershipEvent::Approved(_) => "MembershipApproved",
            MembershipEvent::Rejected(_) => "MembershipRejected",
            MembershipEvent::Cancelled(_) => "MembershipCancelled",
            MembershipEvent::Expired(_) => "MembershipExpired",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MembershipSubmitted {
    pub request_id: Uuid,
    pub alumni_id: Uuid,
    pub plan: MembershipPlan,
    pub fee: FeeSplit,
    pub idempotency_key: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MembershipPaymentRecorded {
    pub amount: Money,
    pub reference: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MembershipApproved {
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MembershipRejected {
    pub reason: String,
    pub rejected_by: String,
    pub previous_status: MembershipStatus,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MembershipCancelled {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MembershipExpired {
    pub expired_at: DateTime<Utc>,
}
