use serde::{Deserialize, Serialize};

use super::errors::AlumniError;

// ============================================================================
// Alumni Value Objects
// ============================================================================

/// Lower-cased, trimmed email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, AlumniError> {
        let email = raw.as_ref().trim().to_lowercase();
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            }
            None => false,
        };
        if !valid {
            return Err(AlumniError::InvalidEmail(raw.as_ref().to_string()));
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlumniStatus {
    Active,
    Deactivated,
}
