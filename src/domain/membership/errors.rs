use crate::domain::shared::{BusinessRule, Money};
use crate::event_sourcing::NotInitialized;
use super::value_objects::MembershipStatus;

// ============================================================================
// Membership Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MembershipError {
    #[error("Cannot {action} a membership request in status {from:?}")]
    InvalidTransition { from: MembershipStatus, action: &'static str },

    #[error("An open membership request already exists for this alumni")]
    OpenRequestExists,

    #[error("Membership fee must be positive and wallet + remaining must equal the fee")]
    InvalidFee,

    #[error("Wallet balance is insufficient for the deduction")]
    InsufficientWalletBalance,

    #[error("Payment of {received} does not match the remaining amount {expected}")]
    PaymentMismatch { expected: Money, received: Money },

    #[error("Membership is still valid")]
    NotYetExpired,

    #[error("A reason is required")]
    ReasonRequired,

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl BusinessRule for MembershipError {
    fn code(&self) -> &'static str {
        match self {
            MembershipError::InvalidTransition { .. } => "Alumni:Membership:001",
            MembershipError::OpenRequestExists => "Alumni:Membership:002",
            MembershipError::InvalidFee => "Alumni:Membership:003",
            MembershipError::InsufficientWalletBalance => "Alumni:Membership:004",
            MembershipError::PaymentMismatch { .. } => "Alumni:Membership:005",
            MembershipError::NotYetExpired => "Alumni:Membership:006",
            MembershipError::ReasonRequired => "Alumni:Membership:007",
            MembershipError::NotInitialized => "Alumni:Membership:008",
        }
    }
}

impl From<NotInitialized> for MembershipError {
    fn from(_: NotInitialized) -> Self {
        MembershipError::NotInitialized
    }
}
