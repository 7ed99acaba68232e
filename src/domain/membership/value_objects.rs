use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{FeeSchedule, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipStatus {
    Pending,
    Paid,
    Approved,
    Rejected,
    Cancelled,
    Expired,
}

impl MembershipStatus {
    pub fn can_become(self, next: MembershipStatus) -> bool {
        use MembershipStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Paid, Approved)
                | (Paid, Rejected)
                | (Approved, Expired)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipPlan {
    Annual,
    Lifetime,
}

impl MembershipPlan {
    pub fn fee(&self, schedule: &FeeSchedule) -> Money {
        match self {
            MembershipPlan::Annual => schedule.membership_annual,
            MembershipPlan::Lifetime => schedule.membership_lifetime,
        }
    }

    /// End of validity for a membership approved at `approved_at`; lifetime never ends
    pub fn valid_until(&self, approved_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            MembershipPlan::Annual => approved_at.checked_add_months(Months::new(12)),
            MembershipPlan::Lifetime => None,
        }
    }
}
