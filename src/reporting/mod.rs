use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::alumni::AlumniCommandHandler;
use crate::domain::certificate::CertificateCommandHandler;
use crate::domain::delivery::ShipmentCommandHandler;
use crate::domain::membership::MembershipCommandHandler;
use crate::domain::payments::{LedgerTotals, PaymentLedger};
use crate::domain::syndicate::SyndicateCommandHandler;
use crate::error::AppResult;

// ============================================================================
// Administrative Reports
// ============================================================================
//
// Read-only snapshot for the admin dashboard: how many requests sit in each
// status per lifecycle, plus the ledger totals.
//
// ============================================================================

pub type StatusCounts = BTreeMap<String, usize>;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub alumni: StatusCounts,
    pub memberships: StatusCounts,
    pub certificates: StatusCounts,
    pub syndicates: StatusCounts,
    pub shipments: StatusCounts,
    pub ledger: LedgerTotals,
}

fn count_by_status<T, S: Debug>(items: &[T], status: impl Fn(&T) -> S) -> StatusCounts {
    let mut counts = StatusCounts::new();
    for item in items {
        *counts.entry(format!("{:?}", status(item))).or_default() += 1;
    }
    counts
}

pub struct ReportService {
    alumni: Arc<AlumniCommandHandler>,
    memberships: Arc<MembershipCommandHandler>,
    certificates: Arc<CertificateCommandHandler>,
    syndicates: Arc<SyndicateCommandHandler>,
    shipments: Arc<ShipmentCommandHandler>,
    ledger: Arc<PaymentLedger>,
}

impl ReportService {
    pub fn new(
        alumni: Arc<AlumniCommandHandler>,
        memberships: Arc<MembershipCommandHandler>,
        certificates: Arc<CertificateCommandHandler>,
        syndicates: Arc<SyndicateCommandHandler>,
        shipments: Arc<ShipmentCommandHandler>,
        ledger: Arc<PaymentLedger>,
    ) -> Self {
        Self { alumni, memberships, certificates, syndicates, shipments, ledger }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardReport> {
        let (alumni, memberships, certificates, syndicates, shipments) = futures_util::try_join!(
            self.alumni.all(),
            self.memberships.all(),
            self.certificates.all(),
            self.syndicates.all(),
            self.shipments.all(),
        )?;

        let report = DashboardReport {
            generated_at: Utc::now(),
            alumni: count_by_status(&alumni, |a| a.status),
            memberships: count_by_status(&memberships, |m| m.status),
            certificates: count_by_status(&certificates, |c| c.status),
            syndicates: count_by_status(&syndicates, |s| s.status),
            shipments: count_by_status(&shipments, |s| s.status),
            ledger: self.ledger.totals().await,
        };

        tracing::debug!(
            alumni = alumni.len(),
            memberships = memberships.len(),
            certificates = certificates.len(),
            syndicates = syndicates.len(),
            shipments = shipments.len(),
            "Built dashboard report"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Status {
        Pending,
        Paid,
    }

    #[test]
    fn test_count_by_status() {
        let items = vec![Status::Pending, Status::Paid, Status::Pending];
        let counts = count_by_status(&items, |s| *s);

        assert_eq!(counts.get("Pending"), Some(&2));
        assert_eq!(counts.get("Paid"), Some(&1));
        assert_eq!(counts.get("Approved"), None);
    }

    #[test]
    fn test_report_serializes_counts_as_map() {
        let mut memberships = StatusCounts::new();
        memberships.insert("Paid".to_string(), 3);
        let report = DashboardReport {
            generated_at: Utc::now(),
            alumni: StatusCounts::new(),
            memberships,
            certificates: StatusCounts::new(),
            syndicates: StatusCounts::new(),
            shipments: StatusCounts::new(),
            ledger: LedgerTotals::default(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["memberships"]["Paid"], 3);
        assert_eq!(json["ledger"]["transactions"], 0);
    }
}
