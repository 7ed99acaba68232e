use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyndicateStatus {
    Pending,
    Paid,
    UnderReview,
    Approved,
    Rejected,
    Cancelled,
}

impl SyndicateStatus {
    pub fn can_become(self, next: SyndicateStatus) -> bool {
        use SyndicateStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Paid, UnderReview)
                | (Paid, Rejected)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
        )
    }

    /// Counts against the one-subscription-per-year rule
    pub fn is_open(self) -> bool {
        matches!(
            self,
            SyndicateStatus::Pending | SyndicateStatus::Paid | SyndicateStatus::UnderReview | SyndicateStatus::Approved
        )
    }
}

/// A supporting document already uploaded elsewhere; only its reference is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingDocument {
    pub name: String,
    pub reference: String,
}
