use crate::domain::shared::{BusinessRule, Money};
use crate::event_sourcing::NotInitialized;
use super::value_objects::{CertificateStatus, MAX_COPIES};

// ============================================================================
// Certificate Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CertificateError {
    #[error("Cannot {action} a certificate request in status {from:?}")]
    InvalidTransition { from: CertificateStatus, action: &'static str },

    #[error("Copies must be between 1 and {max}, got {requested}", max = MAX_COPIES)]
    InvalidCopies { requested: u8 },

    #[error("Certificate fee does not match unit fee × copies + delivery fee")]
    InvalidFee,

    #[error("Wallet balance is insufficient for the deduction")]
    InsufficientWalletBalance,

    #[error("Payment of {received} does not match the remaining amount {expected}")]
    PaymentMismatch { expected: Money, received: Money },

    #[error("This action requires {expected} delivery")]
    DeliveryMethodMismatch { expected: &'static str },

    #[error("A reason is required")]
    ReasonRequired,

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl BusinessRule for CertificateError {
    fn code(&self) -> &'static str {
        match self {
            CertificateError::InvalidTransition { .. } => "Alumni:Certificate:001",
            CertificateError::InvalidCopies { .. } => "Alumni:Certificate:002",
            CertificateError::InvalidFee => "Alumni:Certificate:003",
            CertificateError::InsufficientWalletBalance => "Alumni:Certificate:004",
            CertificateError::PaymentMismatch { .. } => "Alumni:Certificate:005",
            CertificateError::DeliveryMethodMismatch { .. } => "Alumni:Certificate:006",
            CertificateError::ReasonRequired => "Alumni:Certificate:007",
            CertificateError::NotInitialized => "Alumni:Certificate:008",
        }
    }
}

impl From<NotInitialized> for CertificateError {
    fn from(_: NotInitialized) -> Self {
        CertificateError::NotInitialized
    }
}
