mod server;

use prometheus::{Counter, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use rust_decimal::prelude::ToPrimitive;

use crate::domain::shared::Money;

pub use server::{start_http_server, HttpState};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Request submissions and idempotent replays
// - Lifecycle transitions (accepted and rejected by business rules)
// - Wallet deductions
// - Outbox dispatch and the audit-log sweep
// - Profile cache effectiveness
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Request lifecycle
    pub requests_submitted: IntCounterVec,
    pub idempotent_replays: IntCounterVec,
    pub status_transitions: IntCounterVec,
    pub rejected_transitions: IntCounterVec,

    // Wallet
    pub wallet_deducted_amount: Counter,

    // Outbox
    pub outbox_dispatched: IntCounterVec,
    pub outbox_failed: IntCounterVec,
    pub outbox_pending: IntGauge,

    // Audit log sweep
    pub audit_entries_purged: IntCounter,

    // Profile cache
    pub cache_lookups: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_submitted = IntCounterVec::new(
            Opts::new("requests_submitted_total", "Requests created, by request kind"),
            &["kind"],
        )?;
        registry.register(Box::new(requests_submitted.clone()))?;

        let idempotent_replays = IntCounterVec::new(
            Opts::new("idempotent_replays_total", "Submissions answered from an existing idempotency key"),
            &["kind"],
        )?;
        registry.register(Box::new(idempotent_replays.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("status_transitions_total", "Events appended, by aggregate and event type"),
            &["aggregate", "event"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let rejected_transitions = IntCounterVec::new(
            Opts::new("rejected_transitions_total", "Commands refused by a business rule"),
            &["aggregate", "code"],
        )?;
        registry.register(Box::new(rejected_transitions.clone()))?;

        let wallet_deducted_amount = Counter::new(
            "wallet_deducted_amount_total",
            "Total amount deducted from alumni wallets",
        )?;
        registry.register(Box::new(wallet_deducted_amount.clone()))?;

        let outbox_dispatched = IntCounterVec::new(
            Opts::new("outbox_dispatched_total", "Outbox messages delivered to subscribers"),
            &["event_type"],
        )?;
        registry.register(Box::new(outbox_dispatched.clone()))?;

        let outbox_failed = IntCounterVec::new(
            Opts::new("outbox_failed_total", "Outbox deliveries that failed after retries"),
            &["event_type"],
        )?;
        registry.register(Box::new(outbox_failed.clone()))?;

        let outbox_pending = IntGauge::new("outbox_pending", "Messages waiting in the outbox")?;
        registry.register(Box::new(outbox_pending.clone()))?;

        let audit_entries_purged = IntCounter::new(
            "audit_entries_purged_total",
            "Audit log entries removed by the cleanup sweep",
        )?;
        registry.register(Box::new(audit_entries_purged.clone()))?;

        let cache_lookups = IntCounterVec::new(
            Opts::new("profile_cache_lookups_total", "Alumni summary cache lookups"),
            &["result"],
        )?;
        registry.register(Box::new(cache_lookups.clone()))?;

        Ok(Self {
            registry,
            requests_submitted,
            idempotent_replays,
            status_transitions,
            rejected_transitions,
            wallet_deducted_amount,
            outbox_dispatched,
            outbox_failed,
            outbox_pending,
            audit_entries_purged,
            cache_lookups,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_submission(&self, kind: &str) {
        self.requests_submitted.with_label_values(&[kind]).inc();
    }

    pub fn record_idempotent_replay(&self, kind: &str) {
        self.idempotent_replays.with_label_values(&[kind]).inc();
    }

    pub fn record_transition(&self, aggregate: &str, event: &str) {
        self.status_transitions.with_label_values(&[aggregate, event]).inc();
    }

    pub fn record_rejected_transition(&self, aggregate: &str, code: &str) {
        self.rejected_transitions.with_label_values(&[aggregate, code]).inc();
    }

    pub fn record_wallet_deduction(&self, amount: Money) {
        self.wallet_deducted_amount.inc_by(amount.amount().to_f64().unwrap_or(0.0));
    }

    pub fn record_outbox_delivery(&self, event_type: &str, success: bool) {
        if success {
            self.outbox_dispatched.with_label_values(&[event_type]).inc();
        } else {
            self.outbox_failed.with_label_values(&[event_type]).inc();
        }
    }

    pub fn set_outbox_pending(&self, pending: usize) {
        self.outbox_pending.set(pending as i64);
    }

    pub fn record_audit_purge(&self, purged: usize) {
        self.audit_entries_purged.inc_by(purged as u64);
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[result]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_submission("membership");
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_transitions() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transition("Membership", "MembershipSubmitted");
        metrics.record_transition("Membership", "MembershipApproved");
        metrics.record_rejected_transition("Membership", "Alumni:Membership:001");

        let gathered = metrics.registry.gather();
        let transitions = gathered.iter().find(|m| m.name() == "status_transitions_total").unwrap();
        assert_eq!(transitions.metric.len(), 2);

        let rejected = metrics
            .rejected_transitions
            .with_label_values(&["Membership", "Alumni:Membership:001"]);
        assert_eq!(rejected.get(), 1);
    }

    #[test]
    fn test_wallet_deduction_amount() {
        let metrics = Metrics::new().unwrap();
        metrics.record_wallet_deduction(Money::from_minor(12_550));
        metrics.record_wallet_deduction(Money::from_major(10));

        assert!((metrics.wallet_deducted_amount.get() - 135.5).abs() < 1e-9);
    }

    #[test]
    fn test_audit_purge_and_cache() {
        let metrics = Metrics::new().unwrap();
        metrics.record_audit_purge(3);
        metrics.record_audit_purge(2);
        metrics.record_cache_lookup(true);
        metrics.record_cache_lookup(false);
        metrics.record_cache_lookup(false);

        assert_eq!(metrics.audit_entries_purged.get(), 5);
        assert_eq!(metrics.cache_lookups.with_label_values(&["miss"]).get(), 2);
    }
}
