use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::Money;
use crate::event_sourcing::DomainEvent;

// ============================================================================
// Wallet Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WalletEvent {
    Opened(WalletOpened),
    Credited(WalletCredited),
    Debited(WalletDebited),
    Refunded(WalletRefunded),
}

impl DomainEvent for WalletEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WalletEvent::Opened(_) => "WalletOpened",
            WalletEvent::Credited(_) => "WalletCredited",
            WalletEvent::Debited(_) => "WalletDebited",
            WalletEvent::Refunded(_) => "WalletRefunded",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WalletOpened {
    pub alumni_id: Uuid,
    pub opened_at: DateTime<Utc>,
}

/// Top-up from an external payment
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WalletCredited {
    pub amount: Money,
    pub reference: String,
    pub credited_at: DateTime<Utc>,
}

/// Deduction applied against a request fee
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WalletDebited {
    pub amount: Money,
    pub request_id: Uuid,
    pub debited_at: DateTime<Utc>,
}

/// Wallet-paid amount returned after a reject/cancel
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WalletRefunded {
    pub amount: Money,
    pub request_id: Uuid,
    pub refunded_at: DateTime<Utc>,
}
