use crate::domain::shared::{BusinessRule, Money};
use crate::event_sourcing::NotInitialized;
use super::value_objects::SyndicateStatus;

// ============================================================================
// Syndicate Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyndicateError {
    #[error("Cannot {action} a syndicate subscription in status {from:?}")]
    InvalidTransition { from: SyndicateStatus, action: &'static str },

    #[error("At least one supporting document is required")]
    DocumentsRequired,

    #[error("Syndicate fee must be positive and wallet + remaining must equal the fee")]
    InvalidFee,

    #[error("Wallet balance is insufficient for the deduction")]
    InsufficientWalletBalance,

    #[error("Payment of {received} does not match the remaining amount {expected}")]
    PaymentMismatch { expected: Money, received: Money },

    #[error("An approved, unexpired membership is required")]
    MembershipRequired,

    #[error("A syndicate subscription for {year} is already open")]
    DuplicateSubscription { year: i32 },

    #[error("A syndicate card number is required to approve")]
    CardNumberRequired,

    #[error("A reason is required")]
    ReasonRequired,

    #[error("Aggregate not initialized")]
    NotInitialized,

    #[error("Syndicate name is required")]
    SyndicateNameRequired,
}

impl BusinessRule for SyndicateError {
    fn code(&self) -> &'static str {
        match self {
            SyndicateError::InvalidTransition { .. } => "Alumni:Syndicate:001",
            SyndicateError::DocumentsRequired => "Alumni:Syndicate:002",
            SyndicateError::InvalidFee => "Alumni:Syndicate:003",
            SyndicateError::InsufficientWalletBalance => "Alumni:Syndicate:004",
            SyndicateError::PaymentMismatch { .. } => "Alumni:Syndicate:005",
            SyndicateError::MembershipRequired => "Alumni:Syndicate:006",
            SyndicateError::DuplicateSubscription { .. } => "Alumni:Syndicate:007",
            SyndicateError::CardNumberRequired => "Alumni:Syndicate:008",
            SyndicateError::ReasonRequired => "Alumni:Syndicate:009",
            SyndicateError::NotInitialized => "Alumni:Syndicate:010",
            SyndicateError::SyndicateNameRequired => "Alumni:Syndicate:011",
        }
    }
}

impl From<NotInitialized> for SyndicateError {
    fn from(_: NotInitialized) -> Self {
        SyndicateError::NotInitialized
    }
}
