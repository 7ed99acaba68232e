use uuid::Uuid;

use crate::domain::alumni::AlumniError;
use crate::domain::certificate::CertificateError;
use crate::domain::delivery::DeliveryError;
use crate::domain::membership::MembershipError;
use crate::domain::payments::PaymentError;
use crate::domain::shared::{codes, BusinessRule, MoneyError, SharedError};
use crate::domain::syndicate::SyndicateError;
use crate::domain::wallet::WalletError;

// ============================================================================
// Application Error
// ============================================================================
//
// What command handlers return. Business-rule violations keep their stable
// code; infrastructure failures (event store, serialization) are wrapped.
//
// ============================================================================

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("[{code}] {message}")]
    BusinessRule { code: &'static str, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl AppError {
    pub fn rule<E: BusinessRule>(err: E) -> Self {
        AppError::BusinessRule {
            code: err.code(),
            message: err.to_string(),
        }
    }

    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        AppError::NotFound { entity, id }
    }

    /// Stable code for API responses and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BusinessRule { code, .. } => code,
            AppError::NotFound { .. } => codes::NOT_FOUND,
            AppError::Infrastructure(_) => codes::INFRASTRUCTURE,
        }
    }

    pub fn is_business_rule(&self) -> bool {
        matches!(self, AppError::BusinessRule { .. })
    }

    /// Swap a rule violation with `code` for a more specific one
    pub fn refine<E: BusinessRule>(self, code: &str, replacement: impl FnOnce() -> E) -> AppError {
        if self.code() == code {
            AppError::rule(replacement())
        } else {
            self
        }
    }
}

macro_rules! business_rule_errors {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for AppError {
                fn from(err: $error) -> Self {
                    AppError::rule(err)
                }
            }
        )*
    };
}

business_rule_errors!(
    SharedError,
    AlumniError,
    WalletError,
    MembershipError,
    CertificateError,
    SyndicateError,
    DeliveryError,
    PaymentError,
);

impl From<MoneyError> for AppError {
    fn from(err: MoneyError) -> Self {
        AppError::Infrastructure(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rule_keeps_code_and_message() {
        let err: AppError = SharedError::IdempotencyKeyRequired.into();
        assert_eq!(err.code(), "Alumni:Common:001");
        assert!(err.is_business_rule());
        assert!(err.to_string().contains("idempotency key is required"));
    }

    #[test]
    fn test_not_found_and_infrastructure_codes() {
        let id = Uuid::new_v4();
        assert_eq!(AppError::not_found("Wallet", id).code(), "Alumni:Common:404");

        let err: AppError = anyhow::anyhow!("store unavailable").into();
        assert_eq!(err.code(), "Alumni:Common:500");
        assert!(!err.is_business_rule());
    }

    #[test]
    fn test_refine_only_matching_code() {
        let err: AppError = SharedError::IdempotencyKeyRequired.into();
        let refined = err.refine(codes::IDEMPOTENCY_KEY_REQUIRED, || SharedError::IdempotencyKeyTooLong { max: 1 });
        assert_eq!(refined.code(), codes::IDEMPOTENCY_KEY_TOO_LONG);

        let err = AppError::not_found("Wallet", Uuid::new_v4());
        let untouched = err.refine(codes::IDEMPOTENCY_KEY_REQUIRED, || SharedError::IdempotencyKeyRequired);
        assert_eq!(untouched.code(), codes::NOT_FOUND);
    }
}
