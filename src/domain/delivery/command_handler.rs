use std::sync::Arc;
use uuid::Uuid;

use crate::domain::alumni::AlumniCommandHandler;
use crate::domain::execution::{commit_after, commit_prepared, create_aggregate, prepare_command, submit_once};
use crate::domain::payments::{ChargeTarget, FeeCollector};
use crate::domain::shared::{FeeSplit, IdempotencyKey, Money, RequestKind};
use crate::error::{AppError, AppResult};
use crate::event_sourcing::{EventStore, IdempotencyRegistry, IdempotencyScope};
use crate::metrics::Metrics;

use super::aggregate::ShipmentAggregate;
use super::commands::ShipmentCommand;
use super::events::ShipmentEvent;
use super::fee_strategy::FeeStrategyRegistry;
use super::provider::ProviderDirectory;
use super::value_objects::{Parcel, ShippingAddress};

// ============================================================================
// Shipment Command Handler
// ============================================================================

/// What an alumni asks to ship
#[derive(Debug, Clone)]
pub struct ShipmentDraft {
    pub alumni_id: Uuid,
    pub provider_id: Uuid,
    pub address: ShippingAddress,
    pub parcel: Parcel,
    pub idempotency_key: String,
}

pub struct ShipmentCommandHandler {
    event_store: Arc<EventStore<ShipmentEvent>>,
    providers: Arc<ProviderDirectory>,
    strategies: Arc<FeeStrategyRegistry>,
    fees: Arc<FeeCollector>,
    alumni: Arc<AlumniCommandHandler>,
    idempotency: Arc<IdempotencyRegistry>,
    metrics: Arc<Metrics>,
}

impl ShipmentCommandHandler {
    pub fn new(
        event_store: Arc<EventStore<ShipmentEvent>>,
        providers: Arc<ProviderDirectory>,
        strategies: Arc<FeeStrategyRegistry>,
        fees: Arc<FeeCollector>,
        alumni: Arc<AlumniCommandHandler>,
        idempotency: Arc<IdempotencyRegistry>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { event_store, providers, strategies, fees, alumni, idempotency, metrics }
    }

    /// Price a parcel with the provider's fee strategy; the provider must be active
    pub async fn quote(&self, provider_id: Uuid, parcel: &Parcel) -> AppResult<Money> {
        let provider = self.providers.get(provider_id).await?;
        Ok(self.strategies.calculate_for(&provider, parcel)?)
    }

    /// Standalone shipment, charged to the alumni
    pub async fn request(&self, draft: ShipmentDraft, correlation_id: Uuid) -> AppResult<ShipmentAggregate> {
        self.open_shipment(draft, None, correlation_id).await
    }

    /// Shipment whose delivery fee was already charged on `billed_to`.
    /// Retrying for the same request returns the first shipment.
    pub async fn request_for(
        &self,
        billed_to: Uuid,
        alumni_id: Uuid,
        provider_id: Uuid,
        address: ShippingAddress,
        parcel: Parcel,
        correlation_id: Uuid,
    ) -> AppResult<ShipmentAggregate> {
        let draft = ShipmentDraft {
            alumni_id,
            provider_id,
            address,
            parcel,
            idempotency_key: format!("billed-to:{billed_to}"),
        };
        self.open_shipment(draft, Some(billed_to), correlation_id).await
    }

    async fn open_shipment(
        &self,
        draft: ShipmentDraft,
        billed_to: Option<Uuid>,
        correlation_id: Uuid,
    ) -> AppResult<ShipmentAggregate> {
        let key = IdempotencyKey::parse(&draft.idempotency_key)?;
        let ShipmentDraft { alumni_id, provider_id, address, parcel, .. } = draft;
        let scope = IdempotencyScope::new(alumni_id, RequestKind::Shipment.as_str(), key.as_str());

        let submission = submit_once(&self.idempotency, scope, &self.metrics, |shipment_id| async move {
            self.alumni.require_active(alumni_id).await?;
            let quoted_fee = self.quote(provider_id, &parcel).await?;

            let target = ChargeTarget { alumni_id, request_id: shipment_id, kind: RequestKind::Shipment };
            let fee = match billed_to {
                Some(_) => FeeSplit::without_wallet(Money::zero()),
                None => self.fees.quote(alumni_id, quoted_fee).await?,
            };

            let command = ShipmentCommand::Request {
                shipment_id,
                alumni_id,
                provider_id,
                address,
                parcel,
                quoted_fee,
                fee,
                billed_to,
                idempotency_key: key.to_string(),
            };

            self.fees.collect(target, &fee, correlation_id).await?;
            if let Err(err) =
                create_aggregate::<ShipmentAggregate>(&self.event_store, &command, correlation_id, &self.metrics).await
            {
                self.fees.compensate(target, &fee, correlation_id).await?;
                return Err(err);
            }
            self.event_store.link_owner(alumni_id, shipment_id).await;
            Ok::<(), AppError>(())
        })
        .await?;

        self.load(submission.id()).await
    }

    /// Cancelling a shipment the alumni paid for refunds it before the cancellation is stored
    pub async fn handle(
        &self,
        shipment_id: Uuid,
        command: ShipmentCommand,
        correlation_id: Uuid,
    ) -> AppResult<ShipmentAggregate> {
        let prepared =
            prepare_command::<ShipmentAggregate>(&self.event_store, shipment_id, &command, &self.metrics).await?;

        let cancelled = prepared.events().iter().any(|e| matches!(e, ShipmentEvent::Cancelled(_)));
        if !cancelled || prepared.current().billed_to.is_some() {
            let (shipment, _) = commit_prepared(&self.event_store, prepared, correlation_id, &self.metrics).await?;
            return Ok(shipment);
        }

        let target = ChargeTarget {
            alumni_id: prepared.current().alumni_id,
            request_id: shipment_id,
            kind: RequestKind::Shipment,
        };
        let wallet_amount = prepared.current().fee.wallet_deducted;
        let (shipment, _) = commit_after(
            &self.event_store,
            prepared,
            correlation_id,
            &self.metrics,
            self.fees.refund(target, wallet_amount, "shipment cancelled", correlation_id),
            |refunds| async move { self.fees.reinstate(target, &refunds, wallet_amount, correlation_id).await },
        )
        .await?;
        Ok(shipment)
    }

    pub async fn load(&self, shipment_id: Uuid) -> AppResult<ShipmentAggregate> {
        self.event_store
            .find_aggregate(shipment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Shipment", shipment_id))
    }

    pub async fn for_alumni(&self, alumni_id: Uuid) -> AppResult<Vec<ShipmentAggregate>> {
        Ok(self.event_store.load_for_owner(alumni_id).await?)
    }

    pub async fn all(&self) -> AppResult<Vec<ShipmentAggregate>> {
        Ok(self.event_store.load_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{address, alumni_with_balance, local_courier, parcel, services};
    use crate::domain::delivery::{DeliveryProvider, ShipmentStatus};
    use rust_decimal::Decimal;

    fn draft(alumni_id: Uuid, provider_id: Uuid, key: &str) -> ShipmentDraft {
        ShipmentDraft {
            alumni_id,
            provider_id,
            address: address(),
            parcel: parcel(),
            idempotency_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_quote_uses_provider_strategy() {
        let services = services();
        let provider_id = services
            .providers
            .add(DeliveryProvider::distance_weight(
                "Nationwide Post",
                Money::from_major(20),
                Money::from_minor(150),
                Money::from_major(10),
            ))
            .await;

        // 20.00 + 12.5 km × 1.50 + 0.5 kg × 10.00
        let fee = services.shipments.quote(provider_id, &parcel()).await.unwrap();
        assert_eq!(fee, Money::from_minor(4_375));
    }

    #[tokio::test]
    async fn test_standalone_shipment_is_charged_and_refunded_on_cancel() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::from_major(100)).await;
        let provider_id = local_courier(&services).await;

        let shipment = services
            .shipments
            .request(draft(alumni_id, provider_id, "parcel-1"), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(shipment.fee.total, Money::from_major(40));
        assert_eq!(services.wallets.balance(alumni_id).await.unwrap(), Money::from_major(60));

        let cancelled = services
            .shipments
            .handle(shipment.shipment_id, ShipmentCommand::Cancel { reason: "wrong address".to_string() }, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(cancelled.status, ShipmentStatus::Cancelled);
        assert_eq!(services.wallets.balance(alumni_id).await.unwrap(), Money::from_major(100));
        assert_eq!(services.ledger.net_for_request(shipment.shipment_id).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_inactive_provider_refuses_new_shipments() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::from_major(100)).await;
        let provider_id = local_courier(&services).await;
        services.providers.deactivate(provider_id).await.unwrap();

        let err = services
            .shipments
            .request(draft(alumni_id, provider_id, "parcel-1"), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "Alumni:Delivery:002");

        services.providers.activate(provider_id).await.unwrap();
        let shipment = services
            .shipments
            .request(draft(alumni_id, provider_id, "parcel-1"), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Requested);
    }

    #[tokio::test]
    async fn test_billed_shipment_is_created_once() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::zero()).await;
        let provider_id = local_courier(&services).await;
        let certificate_id = Uuid::new_v4();

        let first = services
            .shipments
            .request_for(certificate_id, alumni_id, provider_id, address(), parcel(), Uuid::new_v4())
            .await
            .unwrap();
        let second = services
            .shipments
            .request_for(certificate_id, alumni_id, provider_id, address(), parcel(), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(first.shipment_id, second.shipment_id);
        assert_eq!(first.fee.total, Money::zero());
        assert_eq!(services.shipments.for_alumni(alumni_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_returned_shipment_keeps_its_charge() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::from_major(100)).await;
        let provider_id = local_courier(&services).await;
        let shipment = services
            .shipments
            .request(draft(alumni_id, provider_id, "parcel-1"), Uuid::new_v4())
            .await
            .unwrap();
        let id = shipment.shipment_id;

        let err = services
            .shipments
            .handle(id, ShipmentCommand::MarkAsPickedUp { tracking_number: "  ".to_string() }, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "Alumni:Delivery:006");

        services
            .shipments
            .handle(id, ShipmentCommand::MarkAsPickedUp { tracking_number: "TRK-19".to_string() }, Uuid::new_v4())
            .await
            .unwrap();
        services
            .shipments
            .handle(id, ShipmentCommand::MarkOutForDelivery, Uuid::new_v4())
            .await
            .unwrap();
        let returned = services
            .shipments
            .handle(id, ShipmentCommand::MarkReturned { reason: "nobody home".to_string() }, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(returned.status, ShipmentStatus::Returned);
        assert_eq!(services.wallets.balance(alumni_id).await.unwrap(), Money::from_major(60));
    }

    #[tokio::test]
    async fn test_replay_after_provider_withdrawn_returns_first_shipment() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::from_major(100)).await;
        let provider_id = local_courier(&services).await;
        let first = services
            .shipments
            .request(draft(alumni_id, provider_id, "parcel-1"), Uuid::new_v4())
            .await
            .unwrap();
        services.providers.deactivate(provider_id).await.unwrap();

        let replayed = services
            .shipments
            .request(draft(alumni_id, provider_id, "parcel-1"), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(replayed.shipment_id, first.shipment_id);
        assert_eq!(services.wallets.balance(alumni_id).await.unwrap(), Money::from_major(60));
    }
}

