// ============================================================================
// Business Rule Errors - Stable Codes
// ============================================================================
//
// Every domain error enum implements BusinessRule so the application layer
// can surface "Alumni:<Area>:<NNN>" codes to callers unchanged.
//
// ============================================================================

/// A user-facing business-rule violation with a stable code
pub trait BusinessRule: std::error::Error {
    fn code(&self) -> &'static str;
}

pub mod codes {
    pub const IDEMPOTENCY_KEY_REQUIRED: &str = "Alumni:Common:001";
    pub const IDEMPOTENCY_KEY_TOO_LONG: &str = "Alumni:Common:002";
    pub const SUBMISSION_IN_PROGRESS: &str = "Alumni:Common:003";
    pub const WALLET_INSUFFICIENT_BALANCE: &str = "Alumni:Wallet:002";
    pub const NOT_FOUND: &str = "Alumni:Common:404";
    pub const INFRASTRUCTURE: &str = "Alumni:Common:500";
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SharedError {
    #[error("An idempotency key is required")]
    IdempotencyKeyRequired,

    #[error("Idempotency key is longer than {max} characters")]
    IdempotencyKeyTooLong { max: usize },

    #[error("A request with this idempotency key is still being processed")]
    SubmissionInProgress,
}

impl BusinessRule for SharedError {
    fn code(&self) -> &'static str {
        match self {
            SharedError::IdempotencyKeyRequired => codes::IDEMPOTENCY_KEY_REQUIRED,
            SharedError::IdempotencyKeyTooLong { .. } => codes::IDEMPOTENCY_KEY_TOO_LONG,
            SharedError::SubmissionInProgress => codes::SUBMISSION_IN_PROGRESS,
        }
    }
}
