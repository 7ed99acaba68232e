use std::sync::Arc;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::alumni::AlumniCommandHandler;
use crate::domain::execution::{
    commit_after, create_aggregate, execute_command, prepare_command, rule_violation, submit_once, PreparedCommand,
};
use crate::domain::membership::MembershipCommandHandler;
use crate::domain::payments::{ChargeTarget, FeeCollector};
use crate::domain::shared::{codes, FeeSchedule, IdempotencyKey, Money, RequestKind};
use crate::error::{AppError, AppResult};
use crate::event_sourcing::{Aggregate, EventStore, IdempotencyRegistry, IdempotencyScope};
use crate::metrics::Metrics;

use super::aggregate::SyndicateAggregate;
use super::commands::SyndicateCommand;
use super::errors::SyndicateError;
use super::events::SyndicateEvent;
use super::value_objects::SupportingDocument;

// ============================================================================
// Syndicate Command Handler
// ============================================================================

#[derive(Debug, Clone)]
pub struct SubmitSyndicate {
    pub alumni_id: Uuid,
    pub syndicate: String,
    pub year: i32,
    pub documents: Vec<SupportingDocument>,
    pub idempotency_key: String,
}

pub struct SyndicateCommandHandler {
    event_store: Arc<EventStore<SyndicateEvent>>,
    memberships: Arc<MembershipCommandHandler>,
    fees: Arc<FeeCollector>,
    alumni: Arc<AlumniCommandHandler>,
    idempotency: Arc<IdempotencyRegistry>,
    schedule: FeeSchedule,
    metrics: Arc<Metrics>,
    // Serializes the one-per-year check with the append
    submissions: Mutex<()>,
}

impl SyndicateCommandHandler {
    pub fn new(
        event_store: Arc<EventStore<SyndicateEvent>>,
        memberships: Arc<MembershipCommandHandler>,
        fees: Arc<FeeCollector>,
        alumni: Arc<AlumniCommandHandler>,
        idempotency: Arc<IdempotencyRegistry>,
        schedule: FeeSchedule,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            event_store,
            memberships,
            fees,
            alumni,
            idempotency,
            schedule,
            metrics,
            submissions: Mutex::new(()),
        }
    }

    pub async fn submit(&self, request: SubmitSyndicate, correlation_id: Uuid) -> AppResult<SyndicateAggregate> {
        let key = IdempotencyKey::parse(&request.idempotency_key)?;
        let SubmitSyndicate { alumni_id, syndicate, year, documents, .. } = request;

        let total = self.schedule.syndicate;
        let scope = IdempotencyScope::new(alumni_id, RequestKind::Syndicate.as_str(), key.as_str());

        let submission = submit_once(&self.idempotency, scope, &self.metrics, |request_id| async move {
            self.alumni.require_active(alumni_id).await?;
            let _guard = self.submissions.lock().await;

            if !self.memberships.has_active_membership(alumni_id, Utc::now()).await? {
                return Err(SyndicateError::MembershipRequired.into());
            }
            let existing: Vec<SyndicateAggregate> = self.event_store.load_for_owner(alumni_id).await?;
            if existing.iter().any(|s| s.blocks_year(year)) {
                return Err(SyndicateError::DuplicateSubscription { year }.into());
            }

            let target = ChargeTarget { alumni_id, request_id, kind: RequestKind::Syndicate };
            let fee = self.fees.quote(alumni_id, total).await?;
            let command = SyndicateCommand::Submit {
                request_id,
                alumni_id,
                syndicate,
                year,
                documents,
                fee,
                idempotency_key: key.to_string(),
            };

            // Dry run so a bad submission never touches the wallet
            SyndicateAggregate::create(&command).map_err(|e| rule_violation::<SyndicateAggregate>(e, &self.metrics))?;

            self.fees
                .collect(target, &fee, correlation_id)
                .await
                .map_err(|e| e.refine(codes::WALLET_INSUFFICIENT_BALANCE, || SyndicateError::InsufficientWalletBalance))?;

            if let Err(err) =
                create_aggregate::<SyndicateAggregate>(&self.event_store, &command, correlation_id, &self.metrics).await
            {
                self.fees.compensate(target, &fee, correlation_id).await?;
                return Err(err);
            }
            self.event_store.link_owner(alumni_id, request_id).await;

            tracing::info!(request_id = %request_id, year = year, "Syndicate subscription submitted");
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
    ) -> AppResult<SyndicateAggregate> {
        let command = SyndicateCommand::RecordPayment { amount, reference: reference.to_string() };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_payment(prepared, amount, reference, correlation_id).await
    }

    pub async fn start_review(&self, request_id: Uuid, reviewer: &str, correlation_id: Uuid) -> AppResult<SyndicateAggregate> {
        let command = SyndicateCommand::StartReview { reviewer: reviewer.to_string() };
        self.execute(request_id, command, correlation_id).await
    }

    pub async fn approve(&self, request_id: Uuid, card_number: &str, correlation_id: Uuid) -> AppResult<SyndicateAggregate> {
        let command = SyndicateCommand::Approve { card_number: card_number.to_string() };
        self.execute(request_id, command, correlation_id).await
    }

    pub async fn reject(&self, request_id: Uuid, reason: &str, correlation_id: Uuid) -> AppResult<SyndicateAggregate> {
        let command = SyndicateCommand::Reject { reason: reason.to_string() };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_refund(prepared, reason, correlation_id).await
    }

    pub async fn cancel(&self, request_id: Uuid, reason: &str, correlation_id: Uuid) -> AppResult<SyndicateAggregate> {
        let command = SyndicateCommand::Cancel { reason: reason.to_string() };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_refund(prepared, reason, correlation_id).await
    }

    pub async fn load(&self, request_id: Uuid) -> AppResult<SyndicateAggregate> {
        self.event_store
            .find_aggregate(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Syndicate", request_id))
    }

    pub async fn for_alumni(&self, alumni_id: Uuid) -> AppResult<Vec<SyndicateAggregate>> {
        Ok(self.event_store.load_for_owner(alumni_id).await?)
    }

    pub async fn all(&self) -> AppResult<Vec<SyndicateAggregate>> {
        Ok(self.event_store.load_all().await?)
    }

    async fn execute(
        &self,
        request_id: Uuid,
        command: SyndicateCommand,
        correlation_id: Uuid,
    ) -> AppResult<SyndicateAggregate> {
        let (subscription, _) = execute_command::<SyndicateAggregate>(
            &self.event_store,
            request_id,
            &command,
            correlation_id,
            &self.metrics,
        )
        .await?;
        Ok(subscription)
    }

    async fn prepare(
        &self,
        request_id: Uuid,
        command: &SyndicateCommand,
    ) -> AppResult<PreparedCommand<SyndicateAggregate>> {
        prepare_command::<SyndicateAggregate>(&self.event_store, request_id, command, &self.metrics).await
    }

    /// Ledger entry first, status change second; the entry is voided if the change cannot be stored
    async fn settle_payment(
        &self,
        prepared: PreparedCommand<SyndicateAggregate>,
        amount: Money,
        reference: &str,
        correlation_id: Uuid,
    ) -> AppResult<SyndicateAggregate> {
        let target = self.target(prepared.current());
        let (subscription, _) = commit_after(
            &self.event_store,
            prepared,
            correlation_id,
            &self.metrics,
            self.fees.record_external_payment(target, amount, reference),
            |payment| async move { self.fees.void_payment(&payment, "compensation").await },
        )
        .await?;
        Ok(subscription)
    }

    /// Refund first, then store the closing status; the refund is reinstated if that fails
    async fn settle_refund(
        &self,
        prepared: PreparedCommand<SyndicateAggregate>,
        reason: &str,
        correlation_id: Uuid,
    ) -> AppResult<SyndicateAggregate> {
        let target = self.target(prepared.current());
        let wallet_amount = prepared.current().fee.wallet_deducted;
        let (subscription, _) = commit_after(
            &self.event_store,
            prepared,
            correlation_id,
            &self.metrics,
            self.fees.refund(target, wallet_amount, reason, correlation_id),
            |refunds| async move { self.fees.reinstate(target, &refunds, wallet_amount, correlation_id).await },
        )
        .await?;
        Ok(subscription)
    }

    fn target(&self, subscription: &SyndicateAggregate) -> ChargeTarget {
        ChargeTarget {
            alumni_id: subscription.alumni_id,
            request_id: subscription.request_id,
            kind: RequestKind::Syndicate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{alumni_with_balance, services};
    use crate::app::AppServices;
    use crate::domain::membership::{MembershipPlan, SubmitMembership};
    use crate::domain::syndicate::SyndicateStatus;

    /// Alumni with an approved annual membership and `extra` left in the wallet
    async fn member(services: &AppServices, extra: u32) -> Uuid {
        let alumni_id = alumni_with_balance(services, Money::from_major(500 + extra)).await;
        let membership = services
            .memberships
            .submit(
                SubmitMembership {
                    alumni_id,
                    plan: MembershipPlan::Annual,
                    idempotency_key: "membership".to_string(),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        services
            .memberships
            .approve(membership.request_id, "board", Uuid::new_v4())
            .await
            .unwrap();
        alumni_id
    }

    fn subscription(alumni_id: Uuid, year: i32, key: &str) -> SubmitSyndicate {
        SubmitSyndicate {
            alumni_id,
            syndicate: "Engineers Syndicate".to_string(),
            year,
            documents: vec![SupportingDocument {
                name: "graduation certificate".to_string(),
                reference: "doc-881".to_string(),
            }],
            idempotency_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_membership_is_required() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::from_major(1_000)).await;

        let err = services
            .syndicates
            .submit(subscription(alumni_id, 2026, "k1"), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "Alumni:Syndicate:006");
        assert_eq!(services.wallets.balance(alumni_id).await.unwrap(), Money::from_major(1_000));
    }

    #[tokio::test]
    async fn test_one_open_subscription_per_year() {
        let services = services();
        let alumni_id = member(&services, 1_500).await;

        services
            .syndicates
            .submit(subscription(alumni_id, 2026, "k1"), Uuid::new_v4())
            .await
            .unwrap();
        let err = services
            .syndicates
            .submit(subscription(alumni_id, 2026, "k2"), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "Alumni:Syndicate:007");

        let next_year = services
            .syndicates
            .submit(subscription(alumni_id, 2027, "k3"), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(next_year.year, 2027);
    }

    #[tokio::test]
    async fn test_missing_documents_never_touch_the_wallet() {
        let services = services();
        let alumni_id = member(&services, 750).await;
        let mut request = subscription(alumni_id, 2026, "k1");
        request.documents.clear();

        let err = services.syndicates.submit(request, Uuid::new_v4()).await.unwrap_err();

        assert_eq!(err.code(), "Alumni:Syndicate:002");
        assert_eq!(services.wallets.balance(alumni_id).await.unwrap(), Money::from_major(750));
    }

    #[tokio::test]
    async fn test_review_and_approve() {
        let services = services();
        let alumni_id = member(&services, 750).await;
        let subscription = services
            .syndicates
            .submit(subscription(alumni_id, 2026, "k1"), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(subscription.status, SyndicateStatus::Paid);

        let id = subscription.request_id;
        services.syndicates.start_review(id, "committee", Uuid::new_v4()).await.unwrap();

        let err = services.syndicates.approve(id, " ", Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code(), "Alumni:Syndicate:008");

        let approved = services.syndicates.approve(id, "ENG-2026-0042", Uuid::new_v4()).await.unwrap();
        assert_eq!(approved.status, SyndicateStatus::Approved);
        assert_eq!(approved.card_number.as_deref(), Some("ENG-2026-0042"));

        let err = services.syndicates.cancel(id, "too late", Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code(), "Alumni:Syndicate:001");
    }

    #[tokio::test]
    async fn test_replay_after_deactivation_returns_first_request() {
        let services = services();
        let alumni_id = member(&services, 1_000).await;
        let first = services
            .syndicates
            .submit(subscription(alumni_id, 2026, "k1"), Uuid::new_v4())
            .await
            .unwrap();
        services
            .alumni
            .handle(
                alumni_id,
                crate::domain::alumni::AlumniCommand::Deactivate { reason: "retired".to_string() },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let replayed = services
            .syndicates
            .submit(subscription(alumni_id, 2026, "k1"), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(replayed.request_id, first.request_id);
        assert_eq!(services.syndicates.for_alumni(alumni_id).await.unwrap().len(), 1);
    }
}

