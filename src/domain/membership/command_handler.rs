use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::alumni::AlumniCommandHandler;
use crate::domain::execution::{
    commit_after, create_aggregate, execute_command, prepare_command, submit_once, PreparedCommand,
};
use crate::domain::payments::{ChargeTarget, FeeCollector};
use crate::domain::shared::{codes, FeeSchedule, IdempotencyKey, Money, RequestKind};
use crate::error::{AppError, AppResult};
use crate::event_sourcing::{EventStore, IdempotencyRegistry, IdempotencyScope};
use crate::metrics::Metrics;

use super::aggregate::MembershipAggregate;
use super::commands::MembershipCommand;
use super::errors::MembershipError;
use super::events::MembershipEvent;
use super::value_objects::{MembershipPlan, MembershipStatus};

// ============================================================================
// Membership Command Handler
// ============================================================================
//
// Submission: idempotency key → active alumni → open-request rule →
// wallet deduction + ledger → MembershipSubmitted. A failed append
// compensates the wallet debit.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct SubmitMembership {
    pub alumni_id: Uuid,
    pub plan: MembershipPlan,
    pub idempotency_key: String,
}

/// Outcome of one expiry pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpirySweep {
    pub expired: usize,
    pub failed: usize,
}

pub struct MembershipCommandHandler {
    event_store: Arc<EventStore<MembershipEvent>>,
    fees: Arc<FeeCollector>,
    alumni: Arc<AlumniCommandHandler>,
    idempotency: Arc<IdempotencyRegistry>,
    schedule: FeeSchedule,
    metrics: Arc<Metrics>,
    // Serializes the open-request check with the append
    submissions: Mutex<()>,
}

impl MembershipCommandHandler {
    pub fn new(
        event_store: Arc<EventStore<MembershipEvent>>,
        fees: Arc<FeeCollector>,
        alumni: Arc<AlumniCommandHandler>,
        idempotency: Arc<IdempotencyRegistry>,
        schedule: FeeSchedule,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            event_store,
            fees,
            alumni,
            idempotency,
            schedule,
            metrics,
            submissions: Mutex::new(()),
        }
    }

    pub async fn submit(&self, request: SubmitMembership, correlation_id: Uuid) -> AppResult<MembershipAggregate> {
        let key = IdempotencyKey::parse(&request.idempotency_key)?;
        let SubmitMembership { alumni_id, plan, .. } = request;

        let total = plan.fee(&self.schedule);
        let scope = IdempotencyScope::new(alumni_id, RequestKind::Membership.as_str(), key.as_str());

        let submission = submit_once(&self.idempotency, scope, &self.metrics, |request_id| async move {
            self.alumni.require_active(alumni_id).await?;
            let _guard = self.submissions.lock().await;

            let now = Utc::now();
            let existing: Vec<MembershipAggregate> = self.event_store.load_for_owner(alumni_id).await?;
            if existing.iter().any(|m| m.blocks_new_submission(now)) {
                return Err(MembershipError::OpenRequestExists.into());
            }

            let target = ChargeTarget { alumni_id, request_id, kind: RequestKind::Membership };
            let fee = self.fees.quote(alumni_id, total).await?;
            let command = MembershipCommand::Submit {
                request_id,
                alumni_id,
                plan,
                fee,
                idempotency_key: key.to_string(),
            };

            self.fees
                .collect(target, &fee, correlation_id)
                .await
                .map_err(|e| e.refine(codes::WALLET_INSUFFICIENT_BALANCE, || MembershipError::InsufficientWalletBalance))?;

            if let Err(err) =
                create_aggregate::<MembershipAggregate>(&self.event_store, &command, correlation_id, &self.metrics).await
            {
                self.fees.compensate(target, &fee, correlation_id).await?;
                return Err(err);
            }
            self.event_store.link_owner(alumni_id, request_id).await;

            tracing::info!(
                request_id = %request_id,
                alumni_id = %alumni_id,
                plan = ?plan,
                wallet_deducted = %fee.wallet_deducted,
                remaining = %fee.remaining,
                "Membership request submitted"
            );
            Ok::<(), AppError>(())
        })
        .await?;

        self.load(submission.id()).await
    }

    /// Record the externally paid remainder; moves the request to Paid
    pub async fn record_payment(
        &self,
        request_id: Uuid,
        amount: Money,
        reference: &str,
        correlation_id: Uuid,
    ) -> AppResult<MembershipAggregate> {
        let command = MembershipCommand::RecordPayment { amount, reference: reference.to_string() };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_payment(prepared, amount, reference, correlation_id).await
    }

    pub async fn approve(&self, request_id: Uuid, approved_by: &str, correlation_id: Uuid) -> AppResult<MembershipAggregate> {
        let command = MembershipCommand::Approve { approved_by: approved_by.to_string() };
        self.execute(request_id, command, correlation_id).await
    }

    /// Reject a pending or paid request; wallet part and any external payment are refunded
    pub async fn reject(
        &self,
        request_id: Uuid,
        reason: &str,
        rejected_by: &str,
        correlation_id: Uuid,
    ) -> AppResult<MembershipAggregate> {
        let command = MembershipCommand::Reject {
            reason: reason.to_string(),
            rejected_by: rejected_by.to_string(),
        };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_refund(prepared, reason, correlation_id).await
    }

    pub async fn cancel(&self, request_id: Uuid, reason: &str, correlation_id: Uuid) -> AppResult<MembershipAggregate> {
        let command = MembershipCommand::Cancel { reason: reason.to_string() };
        let prepared = self.prepare(request_id, &command).await?;
        self.settle_refund(prepared, reason, correlation_id).await
    }

    /// Expire every approved membership whose validity ended before `as_of`.
    /// One membership failing does not stop the others.
    pub async fn expire_due(&self, as_of: DateTime<Utc>, correlation_id: Uuid) -> AppResult<ExpirySweep> {
        let due: Vec<Uuid> = self
            .all()
            .await?
            .into_iter()
            .filter(|m| m.status == MembershipStatus::Approved && m.valid_until.is_some_and(|until| until <= as_of))
            .map(|m| m.request_id)
            .collect();

        let sweep = self.expire_each(&due, as_of, correlation_id).await;
        if !due.is_empty() {
            tracing::info!(
                expired = sweep.expired,
                failed = sweep.failed,
                as_of = %as_of,
                "Expired lapsed memberships"
            );
        }
        Ok(sweep)
    }

    async fn expire_each(&self, due: &[Uuid], as_of: DateTime<Utc>, correlation_id: Uuid) -> ExpirySweep {
        let mut sweep = ExpirySweep::default();
        for request_id in due {
            match self.execute(*request_id, MembershipCommand::Expire { as_of }, correlation_id).await {
                Ok(_) => sweep.expired += 1,
                Err(err) => {
                    sweep.failed += 1;
                    tracing::warn!(
                        request_id = %request_id,
                        code = err.code(),
                        error = %err,
                        "Could not expire membership, continuing"
                    );
                }
            }
        }
        sweep
    }

    pub async fn has_active_membership(&self, alumni_id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        Ok(self
            .for_alumni(alumni_id)
            .await?
            .iter()
            .any(|m| m.is_active_at(at)))
    }

    pub async fn load(&self, request_id: Uuid) -> AppResult<MembershipAggregate> {
        self.event_store
            .find_aggregate(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Membership", request_id))
    }

    pub async fn for_alumni(&self, alumni_id: Uuid) -> AppResult<Vec<MembershipAggregate>> {
        Ok(self.event_store.load_for_owner(alumni_id).await?)
    }

    pub async fn all(&self) -> AppResult<Vec<MembershipAggregate>> {
        Ok(self.event_store.load_all().await?)
    }

    async fn execute(
        &self,
        request_id: Uuid,
        command: MembershipCommand,
        correlation_id: Uuid,
    ) -> AppResult<MembershipAggregate> {
        let (membership, _) = execute_command::<MembershipAggregate>(
            &self.event_store,
            request_id,
            &command,
            correlation_id,
            &self.metrics,
        )
        .await?;
        Ok(membership)
    }

    async fn prepare(
        &self,
        request_id: Uuid,
        command: &MembershipCommand,
    ) -> AppResult<PreparedCommand<MembershipAggregate>> {
        prepare_command::<MembershipAggregate>(&self.event_store, request_id, command, &self.metrics).await
    }

    /// Ledger entry first, status change second; the entry is voided if the change cannot be stored
    async fn settle_payment(
        &self,
        prepared: PreparedCommand<MembershipAggregate>,
        amount: Money,
        reference: &str,
        correlation_id: Uuid,
    ) -> AppResult<MembershipAggregate> {
        let target = self.target(prepared.current());
        let (membership, _) = commit_after(
            &self.event_store,
            prepared,
            correlation_id,
            &self.metrics,
            self.fees.record_external_payment(target, amount, reference),
            |payment| async move { self.fees.void_payment(&payment, "compensation").await },
        )
        .await?;
        Ok(membership)
    }

    /// Refund first, then store the closing status; the refund is reinstated if that fails
    async fn settle_refund(
        &self,
        prepared: PreparedCommand<MembershipAggregate>,
        reason: &str,
        correlation_id: Uuid,
    ) -> AppResult<MembershipAggregate> {
        let target = self.target(prepared.current());
        let wallet_amount = prepared.current().fee.wallet_deducted;
        let (membership, _) = commit_after(
            &self.event_store,
            prepared,
            correlation_id,
            &self.metrics,
            self.fees.refund(target, wallet_amount, reason, correlation_id),
            |refunds| async move { self.fees.reinstate(target, &refunds, wallet_amount, correlation_id).await },
        )
        .await?;
        Ok(membership)
    }

    fn target(&self, membership: &MembershipAggregate) -> ChargeTarget {
        ChargeTarget {
            alumni_id: membership.alumni_id,
            request_id: membership.request_id,
            kind: RequestKind::Membership,
        }
    }
}
