use actix::prelude::*;
use anyhow::{bail, Context as _};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::actors::core::HealthStatus;
use crate::audit::AuditLog;
use crate::cache::AlumniSummaryCache;
use crate::domain::membership::MembershipCommandHandler;
use crate::metrics::Metrics;

use super::health_monitor::{HealthMonitorActor, UpdateHealth};

// ============================================================================
// Nightly Sweep Actor - Periodic housekeeping
// ============================================================================
//
// On every tick (daily by default):
// - purge audit entries older than the retention window
// - expire approved memberships whose validity has ended
// - evict alumni summaries past their TTL
//
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub audit_entries_purged: usize,
    pub memberships_expired: usize,
    pub memberships_failed: usize,
    pub summaries_evicted: usize,
}

#[derive(Clone)]
pub struct Housekeeping {
    audit: Arc<AuditLog>,
    memberships: Arc<MembershipCommandHandler>,
    summaries: Arc<AlumniSummaryCache>,
    metrics: Arc<Metrics>,
    retention_days: i64,
}

impl Housekeeping {
    pub fn new(
        audit: Arc<AuditLog>,
        memberships: Arc<MembershipCommandHandler>,
        summaries: Arc<AlumniSummaryCache>,
        metrics: Arc<Metrics>,
        retention_days: i64,
    ) -> Self {
        Self { audit, memberships, summaries, metrics, retention_days }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<SweepReport> {
        let correlation_id = Uuid::now_v7();

        let cutoff = self.retention_cutoff(now)?;
        let audit_entries_purged = self.audit.purge_older_than(cutoff).await;
        self.metrics.record_audit_purge(audit_entries_purged);

        let expiry = self.memberships.expire_due(now, correlation_id).await?;
        let summaries_evicted = self.summaries.remove_expired().await;

        let report = SweepReport {
            audit_entries_purged,
            memberships_expired: expiry.expired,
            memberships_failed: expiry.failed,
            summaries_evicted,
        };
        tracing::info!(
            correlation_id = %correlation_id,
            cutoff = %cutoff,
            audit_entries_purged = report.audit_entries_purged,
            memberships_expired = report.memberships_expired,
            memberships_failed = report.memberships_failed,
            summaries_evicted = report.summaries_evicted,
            "Nightly sweep finished"
        );
        Ok(report)
    }

    fn retention_cutoff(&self, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
        if self.retention_days < 1 {
            bail!("audit retention must be at least one day, got {}", self.retention_days);
        }
        TimeDelta::try_days(self.retention_days)
            .and_then(|window| now.checked_sub_signed(window))
            .with_context(|| format!("audit retention of {} days is out of range", self.retention_days))
    }
}

pub struct NightlySweepActor {
    housekeeping: Housekeeping,
    interval: Duration,
    health: Option<Addr<HealthMonitorActor>>,
}

impl NightlySweepActor {
    pub fn new(housekeeping: Housekeeping, interval: Duration) -> Self {
        Self { housekeeping, interval, health: None }
    }

    pub fn with_health_monitor(mut self, health: Addr<HealthMonitorActor>) -> Self {
        self.health = Some(health);
        self
    }

    fn sweep(&mut self, ctx: &mut Context<Self>) {
        let housekeeping = self.housekeeping.clone();
        let health = self.health.clone();

        ctx.spawn(
            async move {
                let status = match housekeeping.run(Utc::now()).await {
                    Ok(_) => HealthStatus::Healthy,
                    Err(e) => {
                        tracing::error!(error = %e, "Nightly sweep failed");
                        HealthStatus::Degraded(format!("Last sweep failed: {e}"))
                    }
                };
                if let Some(health) = health {
                    health.do_send(UpdateHealth {
                        component: "nightly_sweep".to_string(),
                        status,
                        details: None,
                    });
                }
            }
            .into_actor(self),
        );
    }
}

impl Actor for NightlySweepActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(interval_secs = self.interval.as_secs(), "NightlySweepActor started");
        ctx.run_interval(self.interval, |act, ctx| act.sweep(ctx));
    }
}

/// Run the sweep now instead of waiting for the next tick
#[derive(Message)]
#[rtype(result = "Result<SweepReport, String>")]
pub struct RunSweep;

impl Handler<RunSweep> for NightlySweepActor {
    type Result = ResponseFuture<Result<SweepReport, String>>;

    fn handle(&mut self, _: RunSweep, _: &mut Self::Context) -> Self::Result {
        let housekeeping = self.housekeeping.clone();
        Box::pin(async move { housekeeping.run(Utc::now()).await.map_err(|e| e.to_string()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{alumni_with_balance, services};
    use crate::domain::membership::{MembershipPlan, MembershipStatus, SubmitMembership};
    use crate::domain::shared::Money;
    use crate::event_sourcing::OutboxMessage;

    fn housekeeping(services: &crate::app::AppServices, retention_days: i64) -> Housekeeping {
        Housekeeping::new(
            services.audit.clone(),
            services.memberships.clone(),
            services.summaries.clone(),
            services.metrics.clone(),
            retention_days,
        )
    }

    fn audit_message(created_at: DateTime<Utc>) -> OutboxMessage {
        OutboxMessage {
            id: Uuid::new_v4(),
            aggregate_id: Uuid::new_v4(),
            aggregate_type: "Wallet".to_string(),
            event_id: Uuid::new_v4(),
            event_type: "WalletCredited".to_string(),
            payload: "{}".to_string(),
            correlation_id: Uuid::new_v4(),
            created_at,
            attempts: 0,
        }
    }

    #[tokio::test]
    async fn test_sweep_purges_audit_and_expires_memberships() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::from_major(500)).await;
        let membership = services
            .memberships
            .submit(
                SubmitMembership {
                    alumni_id,
                    plan: MembershipPlan::Annual,
                    idempotency_key: "annual".to_string(),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        let approved = services
            .memberships
            .approve(membership.request_id, "board", Uuid::new_v4())
            .await
            .unwrap();

        let now = Utc::now();
        services.audit.record(&audit_message(now - TimeDelta::days(40))).await.unwrap();
        services.audit.record(&audit_message(now)).await.unwrap();

        let housekeeping = housekeeping(&services, 30);

        let report = housekeeping.run(now).await.unwrap();
        assert_eq!(report, SweepReport { audit_entries_purged: 1, ..SweepReport::default() });

        // A year later the membership has lapsed; the fresh audit entry is now old too
        let later = approved.valid_until.unwrap() + TimeDelta::days(1);
        let report = housekeeping.run(later).await.unwrap();
        assert_eq!(
            report,
            SweepReport { audit_entries_purged: 1, memberships_expired: 1, ..SweepReport::default() }
        );
        assert_eq!(
            services.memberships.load(membership.request_id).await.unwrap().status,
            MembershipStatus::Expired
        );
        assert_eq!(services.metrics.audit_entries_purged.get(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_retention_fails_without_panicking() {
        let services = services();
        for days in [0, -1, i64::MAX] {
            let err = housekeeping(&services, days).run(Utc::now()).await.unwrap_err();
            assert!(err.to_string().contains("retention"));
        }
    }

    #[tokio::test]
    async fn test_sweep_evicts_stale_summaries() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::from_major(10)).await;
        let summaries = Arc::new(AlumniSummaryCache::new(
            Duration::ZERO,
            services.alumni.clone(),
            services.wallets.clone(),
            services.metrics.clone(),
        ));
        summaries.get_or_load(alumni_id).await.unwrap();

        let housekeeping = Housekeeping::new(
            services.audit.clone(),
            services.memberships.clone(),
            summaries.clone(),
            services.metrics.clone(),
            30,
        );
        let report = housekeeping.run(Utc::now()).await.unwrap();

        assert_eq!(report.summaries_evicted, 1);
        assert_eq!(summaries.len().await, 0);
    }
}
