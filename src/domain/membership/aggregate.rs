use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::{FeeSplit, Money};
use crate::event_sourcing::Aggregate;
use super::commands::MembershipCommand;
use super::errors::MembershipError;
use super::events::*;
use super::value_objects::{MembershipPlan, MembershipStatus};

// ============================================================================
// Membership Aggregate - Business Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipAggregate {
    pub request_id: Uuid,
    pub version: i64,
    pub alumni_id: Uuid,
    pub plan: MembershipPlan,
    pub status: MembershipStatus,
    pub fee: FeeSplit,
    pub paid_externally: Money,
    pub payment_reference: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub status_reason: Option<String>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MembershipAggregate {
    /// Approved and not past its validity
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.status == MembershipStatus::Approved && self.valid_until.map_or(true, |until| until > at)
    }

    /// Whether this request stops the alumni from submitting another one
    pub fn blocks_new_submission(&self, at: DateTime<Utc>) -> bool {
        matches!(self.status, MembershipStatus::Pending | MembershipStatus::Paid) || self.is_active_at(at)
    }

    fn transition(&self, next: MembershipStatus, action: &'static str) -> Result<(), MembershipError> {
        if self.status.can_become(next) {
            Ok(())
        } else {
            Err(MembershipError::InvalidTransition { from: self.status, action })
        }
    }
}

fn reason(value: &str) -> Result<String, MembershipError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MembershipError::ReasonRequired);
    }
    Ok(value.to_string())
}

impl Aggregate for MembershipAggregate {
    type Event = MembershipEvent;
    type Command = MembershipCommand;
    type Error = MembershipError;

    const AGGREGATE_TYPE: &'static str = "Membership";

    fn create(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let MembershipCommand::Submit { request_id, alumni_id, plan, fee, idempotency_key } = command else {
            return Err(MembershipError::NotInitialized);
        };

        if fee.total.is_zero() || !fee.is_consistent() {
            return Err(MembershipError::InvalidFee);
        }

        Ok(vec![MembershipEvent::Submitted(MembershipSubmitted {
            request_id: *request_id,
            alumni_id: *alumni_id,
            plan: *plan,
            fee: *fee,
            idempotency_key: idempotency_key.clone(),
            submitted_at: Utc::now(),
        })])
    }

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            MembershipEvent::Submitted(e) => Ok(Self {
                request_id: e.request_id,
                version: 0,
                alumni_id: e.alumni_id,
                plan: e.plan,
                status: if e.fee.is_settled() {
                    MembershipStatus::Paid
                } else {
                    MembershipStatus::Pending
                },
                fee: e.fee,
                paid_externally: Money::zero(),
                payment_reference: None,
                approved_by: None,
                approved_at: None,
                valid_until: None,
                status_reason: None,
                idempotency_key: e.idempotency_key.clone(),
                created_at: e.submitted_at,
                updated_at: e.submitted_at,
            }),
            _ => Err(MembershipError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            MembershipEvent::Submitted(_) => {}
            MembershipEvent::PaymentRecorded(e) => {
                self.status = MembershipStatus::Paid;
                self.paid_externally = e.amount;
                self.payment_reference = Some(e.reference.clone());
                self.updated_at = e.paid_at;
            }
            MembershipEvent::Approved(e) => {
                self.status = MembershipStatus::Approved;
                self.approved_by = Some(e.approved_by.clone());
                self.approved_at = Some(e.approved_at);
                self.valid_until = e.valid_until;
                self.updated_at = e.approved_at;
            }
            MembershipEvent::Rejected(e) => {
                self.status = MembershipStatus::Rejected;
                self.status_reason = Some(e.reason.clone());
                self.updated_at = e.rejected_at;
            }
            MembershipEvent::Cancelled(e) => {
                self.status = MembershipStatus::Cancelled;
                self.status_reason = Some(e.reason.clone());
                self.updated_at = e.cancelled_at;
            }
            MembershipEvent::Expired(e) => {
                self.status = MembershipStatus::Expired;
                self.updated_at = e.expired_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();
        match command {
            MembershipCommand::Submit { .. } => Err(MembershipError::InvalidTransition {
                from: self.status,
                action: "resubmit",
            }),

            MembershipCommand::RecordPayment { amount, reference } => {
                self.transition(MembershipStatus::Paid, "record payment for")?;
                if *amount != self.fee.remaining {
                    return Err(MembershipError::PaymentMismatch {
                        expected: self.fee.remaining,
                        received: *amount,
                    });
                }
                Ok(vec![MembershipEvent::PaymentRecorded(MembershipPaymentRecorded {
                    amount: *amount,
                    reference: reference.clone(),
                    paid_at: now,
                })])
            }

            MembershipCommand::Approve { approved_by } => {
                self.transition(MembershipStatus::Approved, "approve")?;
                Ok(vec![MembershipEvent::Approved(MembershipApproved {
                    approved_by: approved_by.clone(),
                    approved_at: now,
                    valid_until: self.plan.valid_until(now),
                })])
            }

            MembershipCommand::Reject { reason: why, rejected_by } => {
                self.transition(MembershipStatus::Rejected, "reject")?;
                Ok(vec![MembershipEvent::Rejected(MembershipRejected {
                    reason: reason(why)?,
                    rejected_by: rejected_by.clone(),
                    previous_status: self.status,
                    rejected_at: now,
                })])
            }

            MembershipCommand::Cancel { reason: why } => {
                self.transition(MembershipStatus::Cancelled, "cancel")?;
                Ok(vec![MembershipEvent::Cancelled(MembershipCancelled {
                    reason: reason(why)?,
                    cancelled_at: now,
                })])
            }

            MembershipCommand::Expire { as_of } => {
                self.transition(MembershipStatus::Expired, "expire")?;
                match self.valid_until {
                    Some(until) if until <= *as_of => {
                        Ok(vec![MembershipEvent::Expired(MembershipExpired { expired_at: *as_of })])
                    }
                    _ => Err(MembershipError::NotYetExpired),
                }
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.request_id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
