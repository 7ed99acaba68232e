use std::fmt;
use serde::{Deserialize, Serialize};

use super::errors::SharedError;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Caller-supplied token that makes request creation safe to retry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, SharedError> {
        let key = raw.as_ref().trim();
        if key.is_empty() {
            return Err(SharedError::IdempotencyKeyRequired);
        }
        if key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(SharedError::IdempotencyKeyTooLong { max: MAX_IDEMPOTENCY_KEY_LEN });
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The request lifecycles that charge fees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Membership,
    Certificate,
    Syndicate,
    Shipment,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Membership => "membership",
            RequestKind::Certificate => "certificate",
            RequestKind::Syndicate => "syndicate",
            RequestKind::Shipment => "shipment",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_trimmed() {
        let key = IdempotencyKey::parse("  abc-123 ").unwrap();
        assert_eq!(key.as_str(), "abc-123");
    }

    #[test]
    fn test_blank_key_rejected() {
        assert_eq!(IdempotencyKey::parse("   "), Err(SharedError::IdempotencyKeyRequired));
    }

    #[test]
    fn test_long_key_rejected() {
        let raw = "x".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1);
        assert!(matches!(
            IdempotencyKey::parse(raw),
            Err(SharedError::IdempotencyKeyTooLong { .. })
        ));
    }
}
