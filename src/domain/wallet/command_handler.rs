use std::sync::Arc;
use uuid::Uuid;

use crate::domain::execution::{create_aggregate, execute_command};
use crate::domain::shared::Money;
use crate::error::AppResult;
use crate::event_sourcing::EventStore;
use crate::metrics::Metrics;

use super::aggregate::WalletAggregate;
use super::commands::WalletCommand;
use super::errors::WalletError;
use super::events::WalletEvent;

// ============================================================================
// Wallet Command Handler
// ============================================================================

pub struct WalletCommandHandler {
    event_store: Arc<EventStore<WalletEvent>>,
    metrics: Arc<Metrics>,
}

impl WalletCommandHandler {
    pub fn new(event_store: Arc<EventStore<WalletEvent>>, metrics: Arc<Metrics>) -> Self {
        Self { event_store, metrics }
    }

    /// Handle a command against an existing wallet
    pub async fn handle(
        &self,
        alumni_id: Uuid,
        command: WalletCommand,
        correlation_id: Uuid,
    ) -> AppResult<WalletAggregate> {
        if !self.event_store.aggregate_exists(alumni_id).await? {
            return match command {
                WalletCommand::Open { .. } => {
                    create_aggregate::<WalletAggregate>(&self.event_store, &command, correlation_id, &self.metrics).await
                }
                _ => Err(WalletError::NotFound(alumni_id).into()),
            };
        }

        let (wallet, _) =
            execute_command::<WalletAggregate>(&self.event_store, alumni_id, &command, correlation_id, &self.metrics).await?;
        Ok(wallet)
    }

    /// Open the wallet, or return the existing one
    pub async fn open(&self, alumni_id: Uuid, correlation_id: Uuid) -> AppResult<WalletAggregate> {
        if let Some(wallet) = self.find(alumni_id).await? {
            return Ok(wallet);
        }
        self.handle(alumni_id, WalletCommand::Open { alumni_id }, correlation_id).await
    }

    pub async fn find(&self, alumni_id: Uuid) -> AppResult<Option<WalletAggregate>> {
        Ok(self.event_store.find_aggregate(alumni_id).await?)
    }

    /// Available balance; an alumni without a wallet has nothing to spend
    pub async fn balance(&self, alumni_id: Uuid) -> AppResult<Money> {
        Ok(self
            .find(alumni_id)
            .await?
            .map(|wallet| wallet.balance)
            .unwrap_or_default())
    }

    pub async fn top_up(
        &self,
        alumni_id: Uuid,
        amount: Money,
        reference: impl Into<String>,
        correlation_id: Uuid,
    ) -> AppResult<WalletAggregate> {
        let command = WalletCommand::TopUp { amount, reference: reference.into() };
        self.handle(alumni_id, command, correlation_id).await
    }

    pub async fn debit(
        &self,
        alumni_id: Uuid,
        amount: Money,
        request_id: Uuid,
        correlation_id: Uuid,
    ) -> AppResult<WalletAggregate> {
        let wallet = self
            .handle(alumni_id, WalletCommand::Debit { amount, request_id }, correlation_id)
            .await?;
        self.metrics.record_wallet_deduction(amount);
        Ok(wallet)
    }

    pub async fn refund(
        &self,
        alumni_id: Uuid,
        amount: Money,
        request_id: Uuid,
        correlation_id: Uuid,
    ) -> AppResult<WalletAggregate> {
        self.handle(alumni_id, WalletCommand::Refund { amount, request_id }, correlation_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::Outbox;

    fn handler() -> WalletCommandHandler {
        let store = Arc::new(EventStore::new("Wallet", Arc::new(Outbox::new())));
        WalletCommandHandler::new(store, Arc::new(Metrics::new().unwrap()))
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let handler = handler();
        let alumni_id = Uuid::new_v4();

        let first = handler.open(alumni_id, Uuid::new_v4()).await.unwrap();
        let second = handler.open(alumni_id, Uuid::new_v4()).await.unwrap();

        assert_eq!(first.alumni_id, alumni_id);
        assert_eq!(second.version, 1);
    }

    #[tokio::test]
    async fn test_balance_without_wallet_is_zero() {
        let handler = handler();
        assert_eq!(handler.balance(Uuid::new_v4()).await.unwrap(), Money::zero());
    }

    #[tokio::test]
    async fn test_debit_unknown_wallet_fails() {
        let handler = handler();
        let err = handler
            .debit(Uuid::new_v4(), Money::from_major(1), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "Alumni:Wallet:003");
    }

    #[tokio::test]
    async fn test_debit_records_metric() {
        let handler = handler();
        let alumni_id = Uuid::new_v4();
        handler.open(alumni_id, Uuid::new_v4()).await.unwrap();
        handler.top_up(alumni_id, Money::from_major(80), "card", Uuid::new_v4()).await.unwrap();

        let wallet = handler
            .debit(alumni_id, Money::from_major(30), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(wallet.balance, Money::from_major(50));
        assert!((handler.metrics.wallet_deducted_amount.get() - 30.0).abs() < 1e-9);
    }
}
