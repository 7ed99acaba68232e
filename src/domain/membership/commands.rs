use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::{FeeSplit, Money};
use super::value_objects::MembershipPlan;

// ============================================================================
// Membership Commands
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MembershipCommand {
    Submit {
        request_id: Uuid,
        alumni_id: Uuid,
        plan: MembershipPlan,
        fee: FeeSplit,
        idempotency_key: String,
    },
    RecordPayment {
        amount: Money,
        reference: String,
    },
    Approve {
        approved_by: String,
    },
    Reject {
        reason: String,
        rejected_by: String,
    },
    Cancel {
        reason: String,
    },
    Expire {
        as_of: DateTime<Utc>,
    },
}
