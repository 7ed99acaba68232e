use std::sync::Arc;
use uuid::Uuid;

use crate::domain::shared::{FeeSplit, Money, RequestKind};
use crate::domain::wallet::WalletCommandHandler;
use crate::error::AppResult;
use super::ledger::PaymentLedger;
use super::transaction::{NewCharge, PaymentSource, PaymentTransaction};

// ============================================================================
// Fee Collector
// ============================================================================
//
// Applies the wallet against request fees and keeps the ledger in step:
//   quote    → FeeSplit from the current balance
//   collect  → wallet debit + Wallet ledger charge
//   refund   → ledger refunds for every charge + wallet credit-back
//   void_payment / reinstate → undo a payment or refund whose status
//                              change could not be stored
//
// ============================================================================

/// The request a charge belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeTarget {
    pub alumni_id: Uuid,
    pub request_id: Uuid,
    pub kind: RequestKind,
}

pub struct FeeCollector {
    wallets: Arc<WalletCommandHandler>,
    ledger: Arc<PaymentLedger>,
}

impl FeeCollector {
    pub fn new(wallets: Arc<WalletCommandHandler>, ledger: Arc<PaymentLedger>) -> Self {
        Self { wallets, ledger }
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    /// Split `total` between the alumni's wallet balance and an external payment
    pub async fn quote(&self, alumni_id: Uuid, total: Money) -> AppResult<FeeSplit> {
        let balance = self.wallets.balance(alumni_id).await?;
        Ok(FeeSplit::compute(total, balance))
    }

    /// Debit the wallet part of `split` and record it in the ledger
    pub async fn collect(&self, target: ChargeTarget, split: &FeeSplit, correlation_id: Uuid) -> AppResult<()> {
        if split.wallet_deducted.is_zero() {
            return Ok(());
        }

        self.wallets
            .debit(target.alumni_id, split.wallet_deducted, target.request_id, correlation_id)
            .await?;

        let charge = NewCharge {
            alumni_id: target.alumni_id,
            request_id: target.request_id,
            request_kind: target.kind,
            amount: split.wallet_deducted,
            source: PaymentSource::Wallet,
            reference: format!("wallet:{}", target.kind),
        };
        if let Err(err) = self.ledger.record_charge(charge).await {
            self.wallets
                .refund(target.alumni_id, split.wallet_deducted, target.request_id, correlation_id)
                .await?;
            return Err(err.into());
        }

        tracing::info!(
            request_id = %target.request_id,
            kind = %target.kind,
            wallet_deducted = %split.wallet_deducted,
            remaining = %split.remaining,
            "Applied wallet balance to fee"
        );
        Ok(())
    }

    /// Undo `collect` when the request itself could not be stored
    pub async fn compensate(&self, target: ChargeTarget, split: &FeeSplit, correlation_id: Uuid) -> AppResult<()> {
        if split.wallet_deducted.is_zero() {
            return Ok(());
        }

        self.ledger.refund_request(target.request_id, "compensation").await?;
        self.wallets
            .refund(target.alumni_id, split.wallet_deducted, target.request_id, correlation_id)
            .await?;

        tracing::warn!(
            request_id = %target.request_id,
            kind = %target.kind,
            amount = %split.wallet_deducted,
            "Compensated wallet debit for a request that was not stored"
        );
        Ok(())
    }

    /// Record the externally paid remainder of a fee
    pub async fn record_external_payment(
        &self,
        target: ChargeTarget,
        amount: Money,
        reference: impl Into<String>,
    ) -> AppResult<PaymentTransaction> {
        let charge = NewCharge {
            alumni_id: target.alumni_id,
            request_id: target.request_id,
            request_kind: target.kind,
            amount,
            source: PaymentSource::External,
            reference: reference.into(),
        };
        Ok(self.ledger.record_charge(charge).await?)
    }

    /// Reverse every ledger charge of the request and return the wallet part
    pub async fn refund(
        &self,
        target: ChargeTarget,
        wallet_amount: Money,
        reason: &str,
        correlation_id: Uuid,
    ) -> AppResult<Vec<PaymentTransaction>> {
        let refunds = self.ledger.refund_request(target.request_id, reason).await?;

        if wallet_amount.is_positive() {
            self.wallets
                .refund(target.alumni_id, wallet_amount, target.request_id, correlation_id)
                .await?;
        }

        tracing::info!(
            request_id = %target.request_id,
            kind = %target.kind,
            wallet_refund = %wallet_amount,
            ledger_entries = refunds.len(),
            "Refunded request"
        );
        Ok(refunds)
    }

    /// Reverse an external payment whose request change could not be stored
    pub async fn void_payment(&self, payment: &PaymentTransaction, reason: &str) -> AppResult<()> {
        let amount = Money::new(payment.amount)?;
        self.ledger.record_refund(payment.id, amount, reason).await?;

        tracing::warn!(
            request_id = %payment.request_id,
            transaction_id = %payment.id,
            amount = %amount,
            "Voided external payment"
        );
        Ok(())
    }

    /// Put back what `refund` returned when the closing change could not be stored
    pub async fn reinstate(
        &self,
        target: ChargeTarget,
        refunds: &[PaymentTransaction],
        wallet_amount: Money,
        correlation_id: Uuid,
    ) -> AppResult<()> {
        if wallet_amount.is_positive() {
            self.wallets
                .debit(target.alumni_id, wallet_amount, target.request_id, correlation_id)
                .await?;
        }

        for refund in refunds {
            let charge = NewCharge {
                alumni_id: refund.alumni_id,
                request_id: refund.request_id,
                request_kind: refund.request_kind,
                amount: Money::new(-refund.amount)?,
                source: refund.source,
                reference: format!("reinstated:{}", refund.reference),
            };
            self.ledger.record_charge(charge).await?;
        }

        tracing::warn!(
            request_id = %target.request_id,
            kind = %target.kind,
            wallet_amount = %wallet_amount,
            ledger_entries = refunds.len(),
            "Reinstated charges after a refund that was not stored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::{EventStore, Outbox};
    use crate::metrics::Metrics;
    use rust_decimal::Decimal;

    async fn collector_with_balance(alumni_id: Uuid, balance: u32) -> (FeeCollector, Arc<WalletCommandHandler>) {
        let store = Arc::new(EventStore::new("Wallet", Arc::new(Outbox::new())));
        let wallets = Arc::new(WalletCommandHandler::new(store, Arc::new(Metrics::new().unwrap())));
        wallets.open(alumni_id, Uuid::new_v4()).await.unwrap();
        if balance > 0 {
            wallets
                .top_up(alumni_id, Money::from_major(balance), "seed", Uuid::new_v4())
                .await
                .unwrap();
        }
        let collector = FeeCollector::new(wallets.clone(), Arc::new(PaymentLedger::new()));
        (collector, wallets)
    }

    fn target(alumni_id: Uuid) -> ChargeTarget {
        ChargeTarget { alumni_id, request_id: Uuid::new_v4(), kind: RequestKind::Membership }
    }

    #[tokio::test]
    async fn test_collect_then_refund() {
        let alumni_id = Uuid::new_v4();
        let (collector, wallets) = collector_with_balance(alumni_id, 200).await;
        let target = target(alumni_id);

        let split = collector.quote(alumni_id, Money::from_major(500)).await.unwrap();
        assert_eq!(split.wallet_deducted, Money::from_major(200));

        collector.collect(target, &split, Uuid::new_v4()).await.unwrap();
        collector
            .record_external_payment(target, split.remaining, "bank-transfer")
            .await
            .unwrap();
        assert_eq!(wallets.balance(alumni_id).await.unwrap(), Money::zero());
        assert_eq!(collector.ledger().net_for_request(target.request_id).await, Decimal::from(500));

        let refunds = collector
            .refund(target, split.wallet_deducted, "rejected", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(refunds.len(), 2);
        assert_eq!(wallets.balance(alumni_id).await.unwrap(), Money::from_major(200));
        assert_eq!(collector.ledger().net_for_request(target.request_id).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_nothing_collected_without_balance() {
        let alumni_id = Uuid::new_v4();
        let (collector, _) = collector_with_balance(alumni_id, 0).await;

        let split = collector.quote(alumni_id, Money::from_major(50)).await.unwrap();
        collector.collect(target(alumni_id), &split, Uuid::new_v4()).await.unwrap();

        assert_eq!(split.remaining, Money::from_major(50));
        assert_eq!(collector.ledger().len().await, 0);
    }

    #[tokio::test]
    async fn test_compensate_restores_wallet() {
        let alumni_id = Uuid::new_v4();
        let (collector, wallets) = collector_with_balance(alumni_id, 80).await;
        let target = target(alumni_id);

        let split = collector.quote(alumni_id, Money::from_major(60)).await.unwrap();
        collector.collect(target, &split, Uuid::new_v4()).await.unwrap();
        collector.compensate(target, &split, Uuid::new_v4()).await.unwrap();

        assert_eq!(wallets.balance(alumni_id).await.unwrap(), Money::from_major(80));
        assert_eq!(collector.ledger().net_for_request(target.request_id).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_void_payment_and_reinstate_undo_their_counterparts() {
        let alumni_id = Uuid::new_v4();
        let (collector, wallets) = collector_with_balance(alumni_id, 100).await;
        let target = target(alumni_id);

        let split = collector.quote(alumni_id, Money::from_major(300)).await.unwrap();
        collector.collect(target, &split, Uuid::new_v4()).await.unwrap();
        let payment = collector
            .record_external_payment(target, split.remaining, "bank-1")
            .await
            .unwrap();

        collector.void_payment(&payment, "compensation").await.unwrap();
        assert_eq!(collector.ledger().net_for_request(target.request_id).await, Decimal::from(100));

        let refunds = collector
            .refund(target, split.wallet_deducted, "rejected", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(wallets.balance(alumni_id).await.unwrap(), Money::from_major(100));

        collector
            .reinstate(target, &refunds, split.wallet_deducted, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(wallets.balance(alumni_id).await.unwrap(), Money::zero());
        assert_eq!(collector.ledger().net_for_request(target.request_id).await, Decimal::from(100));
    }
}
