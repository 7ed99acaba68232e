use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::shared::Money;
use super::errors::PaymentError;
use super::transaction::{LedgerTotals, NewCharge, PaymentSource, PaymentTransaction};

// ============================================================================
// Payment Ledger
// ============================================================================
//
// Append-only. There is no update or delete: a refund is a new entry with a
// negative amount and `refund_of` set to the charge it reverses.
//
// ============================================================================

#[derive(Default)]
pub struct PaymentLedger {
    entries: RwLock<Vec<PaymentTransaction>>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_charge(&self, charge: NewCharge) -> Result<PaymentTransaction, PaymentError> {
        if charge.amount.is_zero() {
            return Err(PaymentError::InvalidAmount);
        }

        let transaction = PaymentTransaction {
            id: Uuid::now_v7(),
            alumni_id: charge.alumni_id,
            request_id: charge.request_id,
            request_kind: charge.request_kind,
            amount: charge.amount.amount(),
            source: charge.source,
            reference: charge.reference,
            refund_of: None,
            created_at: Utc::now(),
        };

        self.entries.write().await.push(transaction.clone());

        tracing::debug!(
            transaction_id = %transaction.id,
            request_id = %transaction.request_id,
            amount = %transaction.amount,
            source = ?transaction.source,
            "Recorded charge"
        );

        Ok(transaction)
    }

    /// Write a negative entry against `original_id`. Cumulative refunds can
    /// never exceed the original charge.
    pub async fn record_refund(
        &self,
        original_id: Uuid,
        amount: Money,
        reference: impl Into<String>,
    ) -> Result<PaymentTransaction, PaymentError> {
        if amount.is_zero() {
            return Err(PaymentError::InvalidAmount);
        }

        let mut entries = self.entries.write().await;

        let original = entries
            .iter()
            .find(|t| t.id == original_id)
            .cloned()
            .ok_or(PaymentError::TransactionNotFound(original_id))?;

        if original.is_refund() {
            return Err(PaymentError::CannotRefundRefund(original_id));
        }

        let refundable = original.amount + refunded_against(&entries, original_id);
        if amount.amount() > refundable {
            return Err(PaymentError::RefundExceedsCharge {
                transaction_id: original_id,
                requested: amount.amount(),
                refundable,
            });
        }

        let refund = PaymentTransaction {
            id: Uuid::now_v7(),
            alumni_id: original.alumni_id,
            request_id: original.request_id,
            request_kind: original.request_kind,
            amount: -amount.amount(),
            source: original.source,
            reference: reference.into(),
            refund_of: Some(original_id),
            created_at: Utc::now(),
        };
        entries.push(refund.clone());

        tracing::debug!(
            transaction_id = %refund.id,
            refund_of = %original_id,
            amount = %refund.amount,
            "Recorded refund"
        );

        Ok(refund)
    }

    /// Refund whatever is still outstanding on every charge of a request
    pub async fn refund_request(
        &self,
        request_id: Uuid,
        reference: &str,
    ) -> Result<Vec<PaymentTransaction>, PaymentError> {
        let outstanding: Vec<(Uuid, Decimal)> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .filter(|t| t.request_id == request_id && !t.is_refund())
                .map(|t| (t.id, t.amount + refunded_against(&entries, t.id)))
                .filter(|(_, left)| *left > Decimal::ZERO)
                .collect()
        };

        let mut refunds = Vec::with_capacity(outstanding.len());
        for (charge_id, left) in outstanding {
            let amount = Money::new(left).map_err(|_| PaymentError::InvalidAmount)?;
            refunds.push(self.record_refund(charge_id, amount, reference).await?);
        }
        Ok(refunds)
    }

    pub async fn get(&self, id: Uuid) -> Option<PaymentTransaction> {
        self.entries.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn for_request(&self, request_id: Uuid) -> Vec<PaymentTransaction> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|t| t.request_id == request_id)
            .cloned()
            .collect()
    }

    pub async fn for_alumni(&self, alumni_id: Uuid) -> Vec<PaymentTransaction> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|t| t.alumni_id == alumni_id)
            .cloned()
            .collect()
    }

    /// Sum of charges and refunds for one request
    pub async fn net_for_request(&self, request_id: Uuid) -> Decimal {
        self.entries
            .read()
            .await
            .iter()
            .filter(|t| t.request_id == request_id)
            .map(|t| t.amount)
            .sum()
    }

    pub async fn totals(&self) -> LedgerTotals {
        let entries = self.entries.read().await;
        let mut totals = LedgerTotals {
            transactions: entries.len(),
            ..LedgerTotals::default()
        };

        for t in entries.iter() {
            if t.is_refund() {
                totals.refunded -= t.amount;
            } else {
                totals.charged += t.amount;
            }
            match t.source {
                PaymentSource::Wallet => totals.wallet_net += t.amount,
                PaymentSource::External => totals.external_net += t.amount,
            }
        }
        totals.net = totals.charged - totals.refunded;
        totals
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Sum of refund entries (negative) written against a charge
fn refunded_against(entries: &[PaymentTransaction], charge_id: Uuid) -> Decimal {
    entries
        .iter()
        .filter(|t| t.refund_of == Some(charge_id))
        .map(|t| t.amount)
        .sum()
}
