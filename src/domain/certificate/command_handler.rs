use std::sync::Arc;
use uuid::Uuid;

use crate::domain::alumni::AlumniCommandHandler;
use crate::domain::delivery::ShipmentCommandHandler;
use crate::domain::execution::{
    commit_after, create_aggregate, execute_command, prepare_command, rule_violation, submit_once, PreparedCommand,
};
use crate::domain::payments::{ChargeTarget, FeeCollector};
use crate::domain::shared::{codes, FeeSchedule, IdempotencyKey, Money, RequestKind};
use crate::error::{AppError, AppResult};
use crate::event_sourcing::{EventStore, IdempotencyRegistry, IdempotencyScope};
use crate::metrics::Metrics;

use super::aggregate::{certificate_total, CertificateAggregate};
use super::commands::CertificateCommand;
use super::errors::CertificateError;
use super::events::CertificateEvent;
use super::value_objects::{CertificateType, DeliveryMethod, MAX_COPIES};

// ============================================================================
// Certificate Command Handler
// ============================================================================

#[derive(Debug, Clone)]
pub struct SubmitCertificate {
    pub alumni_id: Uuid,
    pub certificate_type: CertificateType,
    pub copies: u8,
    pub delivery: DeliveryMethod,
    pub idempotency_key: String,
}

pub struct CertificateCommandHandler {
    event_store: Arc<EventStore<CertificateEvent>>,
    shipments: Arc<ShipmentCommandHandler>,
    fees: Arc<FeeCollector>,
    alumni: Arc<AlumniCommandHandler>,
    idempotency: Arc<IdempotencyRegistry>,
    schedule: FeeSchedule,
    metrics: Arc<Metrics>,
}

impl CertificateCommandHandler {
    pub fn new(
        event_store: Arc<EventStore<CertificateEvent>>,
        shipments: Arc<ShipmentCommandHandler>,
        fees: Arc<FeeCollector>,
        alumni: Arc<AlumniCommandHandler>,
        idempotency: Arc<IdempotencyRegistry>,
        schedule: FeeSchedule,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { event_store, shipments, fees, alumni, idempotency, schedule, metrics }
    }

    pub async fn submit(&self, request: SubmitCertificate, correlation_id: Uuid) -> AppResult<CertificateAggregate> {
        let key = IdempotencyKey::parse(&request.idempotency_key)?;
        let SubmitCertificate { alumni_id, certificate_type, copies, delivery, .. } = request;

        let scope = IdempotencyScope::new(alumni_id, RequestKind::Certificate.as_str(), key.as_str());
        let submission = submit_once(&self.idempotency, scope, &self.metrics, |request_id| async move {
            if !(1..=MAX_COPIES).contains(&copies) {
                return Err(CertificateError::InvalidCopies { requested: copies }.into());
            }
            self.alumni.require_active(alumni_id).await?;

            // Courier fees are quoted against an active provider before anything is charged
            let delivery_fee = match &delivery {
                DeliveryMethod::Pickup => Money::zero(),
                DeliveryMethod::Courier { provider_id, parcel, .. } => {
                    self.shipments.quote(*provider_id, parcel).await?
                }
            };
            let unit_fee = certificate_type.unit_fee(&self.schedule);
            let total = certificate_total(unit_fee, copies, delivery_fee)?;

            let target = ChargeTarget { alumni_id, request_id, kind: RequestKind::Certificate };
            let fee = self.fees.quote(alumni_id, total).await?;
            let command = CertificateCommand::Submit {
                request_id,
                alumni_id,
                certificate_type,
                copies,
                delivery,
                unit_fee,
                delivery_fee,
                fee,
                idempotency_key: key.to_string(),
            };

            self.fees
                .collect(target, &fee, correlation_id)
                .await
                .map_err(|e| e.refine(codes::WALLET_INSUFFICIENT_BALANCE, || CertificateError::InsufficientWalletBalance))?;

            if let Err(err) =
                create_aggregate::<CertificateAggregate>(&self.event_store, &command, correlation_id, &self.metrics).await
            {
                self.fees.compensate(target, &fee, correlation_id).await?;
                return Err(err);
            }
            self.event_store.link_owner(alumni_id, request_id).await;

            tracing::info!(
                request_id = %request_id,
                certificate_type = ?certificate_type,
                copies = copies,
                total = %fee.total,
                "Certificate request submitted"
            );
            Ok::<(), AppError>(())
        })
        .await?;

        self.load(submission.id()).await
    }

    pub async fn record_payment(
        &self,
        request_id: Uuid,
        amount: Money,
        reference: &str,
        correlation_id: Uuid,
    ) -> AppResult<CertificateAggregate> {
        let command = CertificateCommand::RecordPayment { amount, reference: reference.to_string() };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_payment(prepared, amount, reference, correlation_id).await
    }

    pub async fn start_processing(&self, request_id: Uuid, correlation_id: Uuid) -> AppResult<CertificateAggregate> {
        self.execute(request_id, CertificateCommand::StartProcessing, correlation_id).await
    }

    pub async fn mark_ready(&self, request_id: Uuid, correlation_id: Uuid) -> AppResult<CertificateAggregate> {
        self.execute(request_id, CertificateCommand::MarkReady, correlation_id).await
    }

    /// Open a shipment billed to this certificate and move it out for delivery
    pub async fn dispatch(&self, request_id: Uuid, correlation_id: Uuid) -> AppResult<CertificateAggregate> {
        let certificate = self.load(request_id).await?;
        let courier = certificate
            .courier_details()
            .map_err(|e| rule_violation::<CertificateAggregate>(e, &self.metrics))?;

        let shipment = self
            .shipments
            .request_for(
                request_id,
                certificate.alumni_id,
                courier.provider_id,
                courier.address.clone(),
                *courier.parcel,
                correlation_id,
            )
            .await?;

        let command = CertificateCommand::DispatchForDelivery { shipment_id: shipment.shipment_id };
        self.execute(request_id, command, correlation_id).await
    }

    pub async fn confirm_delivered(&self, request_id: Uuid, correlation_id: Uuid) -> AppResult<CertificateAggregate> {
        self.execute(request_id, CertificateCommand::ConfirmDelivered, correlation_id).await
    }

    /// Reject anything not yet dispatched; wallet part and external payments are refunded
    pub async fn reject(&self, request_id: Uuid, reason: &str, correlation_id: Uuid) -> AppResult<CertificateAggregate> {
        let command = CertificateCommand::Reject { reason: reason.to_string() };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_refund(prepared, reason, correlation_id).await
    }

    pub async fn cancel(&self, request_id: Uuid, reason: &str, correlation_id: Uuid) -> AppResult<CertificateAggregate> {
        let command = CertificateCommand::Cancel { reason: reason.to_string() };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_refund(prepared, reason, correlation_id).await
    }

    pub async fn load(&self, request_id: Uuid) -> AppResult<CertificateAggregate> {
        self.event_store
            .find_aggregate(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Certificate", request_id))
    }

    pub async fn for_alumni(&self, alumni_id: Uuid) -> AppResult<Vec<CertificateAggregate>> {
        Ok(self.event_store.load_for_owner(alumni_id).await?)
    }

    pub async fn all(&self) -> AppResult<Vec<CertificateAggregate>> {
        Ok(self.event_store.load_all().await?)
    }

    async fn execute(
        &self,
        request_id: Uuid,
        command: CertificateCommand,
        correlation_id: Uuid,
    ) -> AppResult<CertificateAggregate> {
        let (certificate, _) = execute_command::<CertificateAggregate>(
            &self.event_store,
            request_id,
            &command,
            correlation_id,
            &self.metrics,
        )
        .await?;
        Ok(certificate)
    }

    async fn prepare(
        &self,
        request_id: Uuid,
        command: &CertificateCommand,
    ) -> AppResult<PreparedCommand<CertificateAggregate>> {
        prepare_command::<CertificateAggregate>(&self.event_store, request_id, command, &self.metrics).await
    }

    /// Ledger entry first, status change second; the entry is voided if the change cannot be stored
    async fn settle_payment(
        &self,
        prepared: PreparedCommand<CertificateAggregate>,
        amount: Money,
        reference: &str,
        correlation_id: Uuid,
    ) -> AppResult<CertificateAggregate> {
        let target = self.target(prepared.current());
        let (certificate, _) = commit_after(
            &self.event_store,
            prepared,
            correlation_id,
            &self.metrics,
            self.fees.record_external_payment(target, amount, reference),
            |payment| async move { self.fees.void_payment(&payment, "compensation").await },
        )
        .await?;
        Ok(certificate)
    }

    /// Refund first, then store the closing status; the refund is reinstated if that fails
    async fn settle_refund(
        &self,
        prepared: PreparedCommand<CertificateAggregate>,
        reason: &str,
        correlation_id: Uuid,
    ) -> AppResult<CertificateAggregate> {
        let target = self.target(prepared.current());
        let wallet_amount = prepared.current().fee.wallet_deducted;
        let (certificate, _) = commit_after(
            &self.event_store,
            prepared,
            correlation_id,
            &self.metrics,
            self.fees.refund(target, wallet_amount, reason, correlation_id),
            |refunds| async move { self.fees.reinstate(target, &refunds, wallet_amount, correlation_id).await },
        )
        .await?;
        Ok(certificate)
    }

    fn target(&self, certificate: &CertificateAggregate) -> ChargeTarget {
        ChargeTarget {
            alumni_id: certificate.alumni_id,
            request_id: certificate.request_id,
            kind: RequestKind::Certificate,
        }
    }
}
