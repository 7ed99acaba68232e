use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::{Money, RequestKind};

/// Where the money for a charge came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentSource {
    Wallet,
    External,
}

/// Immutable ledger entry. Charges are positive, refunds negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub alumni_id: Uuid,
    pub request_id: Uuid,
    pub request_kind: RequestKind,
    pub amount: Decimal,
    pub source: PaymentSource,
    pub reference: String,
    pub refund_of: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PaymentTransaction {
    pub fn is_refund(&self) -> bool {
        self.refund_of.is_some()
    }
}

/// Details of a charge before it is written
#[derive(Debug, Clone)]
pub struct NewCharge {
    pub alumni_id: Uuid,
    pub request_id: Uuid,
    pub request_kind: RequestKind,
    pub amount: Money,
    pub source: PaymentSource,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub charged: Decimal,
    pub refunded: Decimal,
    pub net: Decimal,
    pub wallet_net: Decimal,
    pub external_net: Decimal,
    pub transactions: usize,
}
