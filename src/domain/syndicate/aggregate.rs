use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::{FeeSplit, Money};
use crate::event_sourcing::Aggregate;
use super::commands::SyndicateCommand;
use super::errors::SyndicateError;
use super::events::*;
use super::value_objects::{SupportingDocument, SyndicateStatus};

// ============================================================================
// Syndicate Aggregate - Business Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyndicateAggregate {
    pub request_id: Uuid,
    pub version: i64,
    pub alumni_id: Uuid,
    pub syndicate: String,
    pub year: i32,
    pub documents: Vec<SupportingDocument>,
    pub status: SyndicateStatus,
    pub fee: FeeSplit,
    pub paid_externally: Money,
    pub reviewer: Option<String>,
    pub card_number: Option<String>,
    pub status_reason: Option<String>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyndicateAggregate {
    /// An open subscription for `year` blocks another one
    pub fn blocks_year(&self, year: i32) -> bool {
        self.year == year && self.status.is_open()
    }

    fn transition(&self, next: SyndicateStatus, action: &'static str) -> Result<(), SyndicateError> {
        if self.status.can_become(next) {
            Ok(())
        } else {
            Err(SyndicateError::InvalidTransition { from: self.status, action })
        }
    }
}

fn required(value: &str, err: SyndicateError) -> Result<String, SyndicateError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(err);
    }
    Ok(value.to_string())
}

impl Aggregate for SyndicateAggregate {
    type Event = SyndicateEvent;
    type Command = SyndicateCommand;
    type Error = SyndicateError;

    const AGGREGATE_TYPE: &'static str = "Syndicate";

    fn create(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let SyndicateCommand::Submit { request_id, alumni_id, syndicate, year, documents, fee, idempotency_key } =
            command
        else {
            return Err(SyndicateError::NotInitialized);
        };

        let syndicate = required(syndicate, SyndicateError::SyndicateNameRequired)?;
        if documents.iter().all(|d| d.reference.trim().is_empty()) {
            return Err(SyndicateError::DocumentsRequired);
        }
        if fee.total.is_zero() || !fee.is_consistent() {
            return Err(SyndicateError::InvalidFee);
        }

        Ok(vec![SyndicateEvent::Submitted(SyndicateSubmitted {
            request_id: *request_id,
            alumni_id: *alumni_id,
            syndicate,
            year: *year,
            documents: documents.clone(),
            fee: *fee,
            idempotency_key: idempotency_key.clone(),
            submitted_at: Utc::now(),
        })])
    }

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            SyndicateEvent::Submitted(e) => Ok(Self {
                request_id: e.request_id,
                version: 0,
                alumni_id: e.alumni_id,
                syndicate: e.syndicate.clone(),
                year: e.year,
                documents: e.documents.clone(),
                status: if e.fee.is_settled() {
                    SyndicateStatus::Paid
                } else {
                    SyndicateStatus::Pending
                },
                fee: e.fee,
                paid_externally: Money::zero(),
                reviewer: None,
                card_number: None,
                status_reason: None,
                idempotency_key: e.idempotency_key.clone(),
                created_at: e.submitted_at,
                updated_at: e.submitted_at,
            }),
            _ => Err(SyndicateError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            SyndicateEvent::Submitted(_) => {}
            SyndicateEvent::PaymentRecorded(e) => {
                self.status = SyndicateStatus::Paid;
                self.paid_externally = e.amount;
                self.updated_at = e.paid_at;
            }
            SyndicateEvent::ReviewStarted(e) => {
                self.status = SyndicateStatus::UnderReview;
                self.reviewer = Some(e.reviewer.clone());
                self.updated_at = e.started_at;
            }
            SyndicateEvent::Approved(e) => {
                self.status = SyndicateStatus::Approved;
                self.card_number = Some(e.card_number.clone());
                self.updated_at = e.approved_at;
            }
            SyndicateEvent::Rejected(e) => {
                self.status = SyndicateStatus::Rejected;
                self.status_reason = Some(e.reason.clone());
                self.updated_at = e.rejected_at;
            }
            SyndicateEvent::Cancelled(e) => {
                self.status = SyndicateStatus::Cancelled;
                self.status_reason = Some(e.reason.clone());
                self.updated_at = e.cancelled_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();
        match command {
            SyndicateCommand::Submit { .. } => Err(SyndicateError::InvalidTransition {
                from: self.status,
                action: "resubmit",
            }),

            SyndicateCommand::RecordPayment { amount, reference } => {
                self.transition(SyndicateStatus::Paid, "record payment for")?;
                if *amount != self.fee.remaining {
                    return Err(SyndicateError::PaymentMismatch {
                        expected: self.fee.remaining,
                        received: *amount,
                    });
                }
                Ok(vec![SyndicateEvent::PaymentRecorded(SyndicatePaymentRecorded {
                    amount: *amount,
                    reference: reference.clone(),
                    paid_at: now,
                })])
            }

            SyndicateCommand::StartReview { reviewer } => {
                self.transition(SyndicateStatus::UnderReview, "review")?;
                Ok(vec![SyndicateEvent::ReviewStarted(SyndicateReviewStarted {
                    reviewer: reviewer.clone(),
                    started_at: now,
                })])
            }

            SyndicateCommand::Approve { card_number } => {
                self.transition(SyndicateStatus::Approved, "approve")?;
                Ok(vec![SyndicateEvent::Approved(SyndicateApproved {
                    card_number: required(card_number, SyndicateError::CardNumberRequired)?,
                    approved_at: now,
                })])
            }

            SyndicateCommand::Reject { reason } => {
                self.transition(SyndicateStatus::Rejected, "reject")?;
                Ok(vec![SyndicateEvent::Rejected(SyndicateRejected {
                    reason: required(reason, SyndicateError::ReasonRequired)?,
                    previous_status: self.status,
                    rejected_at: now,
                })])
            }

            SyndicateCommand::Cancel { reason } => {
                self.transition(SyndicateStatus::Cancelled, "cancel")?;
                Ok(vec![SyndicateEvent::Cancelled(SyndicateCancelled {
                    reason: required(reason, SyndicateError::ReasonRequired)?,
                    cancelled_at: now,
                })])
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

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> SupportingDocument {
        SupportingDocument { name: "Graduation certificate".into(), reference: "docs/grad.pdf".into() }
    }

    fn submit_command(documents: Vec<SupportingDocument>, balance: Money) -> SyndicateCommand {
        SyndicateCommand::Submit {
            request_id: Uuid::new_v4(),
            alumni_id: Uuid::new_v4(),
            syndicate: "Engineers Syndicate".into(),
            year: 2026,
            documents,
            fee: FeeSplit::compute(Money::from_major(750), balance),
            idempotency_key: "k".into(),
        }
    }

    fn execute(subscription: &mut SyndicateAggregate, command: SyndicateCommand) -> Result<(), SyndicateError> {
        let events = subscription.handle_command(&command)?;
        subscription.apply_all(&events)
    }

    fn paid() -> SyndicateAggregate {
        let events = SyndicateAggregate::create(&submit_command(vec![document()], Money::from_major(750))).unwrap();
        SyndicateAggregate::from_events(&events).unwrap()
    }

    #[test]
    fn test_documents_required() {
        let result = SyndicateAggregate::create(&submit_command(vec![], Money::zero()));
        assert_eq!(result.unwrap_err(), SyndicateError::DocumentsRequired);

        let blank = SupportingDocument { name: "empty".into(), reference: "  ".into() };
        let result = SyndicateAggregate::create(&submit_command(vec![blank], Money::zero()));
        assert_eq!(result.unwrap_err(), SyndicateError::DocumentsRequired);
    }

    #[test]
    fn test_review_then_approve_with_card() {
        let mut subscription = paid();
        assert_eq!(subscription.status, SyndicateStatus::Paid);

        let err = subscription
            .handle_command(&SyndicateCommand::Approve { card_number: "C-1".into() })
            .unwrap_err();
        assert!(matches!(err, SyndicateError::InvalidTransition { .. }));

        execute(&mut subscription, SyndicateCommand::StartReview { reviewer: "board".into() }).unwrap();
        let err = subscription
            .handle_command(&SyndicateCommand::Approve { card_number: " ".into() })
            .unwrap_err();
        assert_eq!(err, SyndicateError::CardNumberRequired);

        execute(&mut subscription, SyndicateCommand::Approve { card_number: "ENG-2026-001".into() }).unwrap();
        assert_eq!(subscription.status, SyndicateStatus::Approved);
        assert!(subscription.blocks_year(2026));
        assert!(!subscription.blocks_year(2027));
    }

    #[test]
    fn test_rejected_subscription_frees_the_year() {
        let mut subscription = paid();
        execute(&mut subscription, SyndicateCommand::StartReview { reviewer: "board".into() }).unwrap();
        execute(&mut subscription, SyndicateCommand::Reject { reason: "missing stamp".into() }).unwrap();

        assert_eq!(subscription.status, SyndicateStatus::Rejected);
        assert!(!subscription.blocks_year(2026));
    }

    #[test]
    fn test_cancel_only_while_pending() {
        let subscription = paid();
        let err = subscription
            .handle_command(&SyndicateCommand::Cancel { reason: "no longer needed".into() })
            .unwrap_err();
        assert_eq!(
            err,
            SyndicateError::InvalidTransition { from: SyndicateStatus::Paid, action: "cancel" }
        );
    }
}
