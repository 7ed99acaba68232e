use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::{FeeSplit, Money};
use crate::event_sourcing::DomainEvent;
use super::value_objects::{SupportingDocument, SyndicateStatus};

// ============================================================================
// Syndicate Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SyndicateEvent {
    Submitted(SyndicateSubmitted),
    PaymentRecorded(SyndicatePaymentRecorded),
    ReviewStarted(SyndicateReviewStarted),
    Approved(SyndicateApproved),
    Rejected(SyndicateRejected),
    Cancelled(SyndicateCancelled),
}

impl DomainEvent for SyndicateEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SyndicateEvent::Submitted(_) => "SyndicateSubmitted",
            SyndicateEvent::PaymentRecorded(_) => "SyndicatePaymentRecorded",
            SyndicateEvent::ReviewStarted(_) => "SyndicateReviewStarted",
            SyndicateEvent::Approved(_) => "SyndicateApproved",
            SyndicateEvent::Rejected(_) => "SyndicateRejected",
            SyndicateEvent::Cancelled(_) => "SyndicateCancelled",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SyndicateSubmitted {
    pub request_id: Uuid,
    pub alumni_id: Uuid,
    pub syndicate: String,
    pub year: i32,
    pub documents: Vec<SupportingDocument>,
    pub fee: FeeSplit,
    pub idempotency_key: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SyndicatePaymentRecorded {
    pub amount: Money,
    pub reference: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SyndicateReviewStarted {
    pub reviewer: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SyndicateApproved {
    pub card_number: String,
    pub approved_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SyndicateRejected {
    pub reason: String,
    pub previous_status: SyndicateStatus,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SyndicateCancelled {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}
