use crate::domain::shared::BusinessRule;
use crate::event_sourcing::NotInitialized;

// ============================================================================
// Alumni Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlumniError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("First and last name are required")]
    NameRequired,

    #[error("Alumni account is not active")]
    NotActive,

    #[error("Alumni account is already deactivated")]
    AlreadyDeactivated,

    #[error("Invalid graduation year: {0}")]
    InvalidGraduationYear(i32),

    #[error("Aggregate not initialized")]
    NotInitialized,

    #[error("Alumni is already registered")]
    AlreadyRegistered,
}

impl BusinessRule for AlumniError {
    fn code(&self) -> &'static str {
        match self {
            AlumniError::InvalidEmail(_) => "Alumni:Profile:001",
            AlumniError::NameRequired => "Alumni:Profile:002",
            AlumniError::NotActive => "Alumni:Profile:003",
            AlumniError::AlreadyDeactivated => "Alumni:Profile:004",
            AlumniError::InvalidGraduationYear(_) => "Alumni:Profile:005",
            AlumniError::NotInitialized => "Alumni:Profile:006",
            AlumniError::AlreadyRegistered => "Alumni:Profile:007",
        }
    }
}

impl From<NotInitialized> for AlumniError {
    fn from(_: NotInitialized) -> Self {
        AlumniError::NotInitialized
    }
}
