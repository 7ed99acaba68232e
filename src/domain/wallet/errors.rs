use crate::domain::shared::{codes, BusinessRule, Money};
use crate::event_sourcing::NotInitialized;

// ============================================================================
// Wallet Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet amounts must be greater than zero")]
    InvalidAmount,

    #[error("Insufficient wallet balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Money, available: Money },

    #[error("Wallet not found for alumni {0}")]
    NotFound(uuid::Uuid),

    #[error("Wallet is already opened")]
    AlreadyOpened,

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl BusinessRule for WalletError {
    fn code(&self) -> &'static str {
        match self {
            WalletError::InvalidAmount => "Alumni:Wallet:001",
            WalletError::InsufficientBalance { .. } => codes::WALLET_INSUFFICIENT_BALANCE,
            WalletError::NotFound(_) => "Alumni:Wallet:003",
            WalletError::AlreadyOpened => "Alumni:Wallet:004",
            WalletError::NotInitialized => "Alumni:Wallet:005",
        }
    }
}

impl From<NotInitialized> for WalletError {
    fn from(_: NotInitialized) -> Self {
        WalletError::NotInitialized
    }
}
