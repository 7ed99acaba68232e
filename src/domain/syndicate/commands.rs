use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::{FeeSplit, Money};
use super::value_objects::SupportingDocument;

// ============================================================================
// Syndicate Commands
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SyndicateCommand {
    Submit {
        request_id: Uuid,
        alumni_id: Uuid,
        syndicate: String,
        year: i32,
        documents: Vec<SupportingDocument>,
        fee: FeeSplit,
        idempotency_key: String,
    },
    RecordPayment {
        amount: Money,
        reference: String,
    },
    StartReview {
        reviewer: String,
    },
    Approve {
        card_number: String,
    },
    Reject {
        reason: String,
    },
    Cancel {
        reason: String,
    },
}
