use actix::prelude::*;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::actors::core::{overall_status, ComponentHealth, HealthStatus};
use crate::event_sourcing::Outbox;
use crate::metrics::Metrics;

// ============================================================================
// Health Monitor Actor - Monitors system health
// ============================================================================
//
// Responsibilities:
// - Track health status reported by the other actors
// - Watch the outbox backlog
// - Aggregate system-wide health for /health
//
// ============================================================================

/// Backlog above which the outbox is reported degraded
const OUTBOX_BACKLOG_DEGRADED: usize = 1_000;

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

#[derive(Message)]
#[rtype(result = "SystemHealth")]
pub struct GetSystemHealth;

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    outbox: Arc<Outbox>,
    metrics: Arc<Metrics>,
}

impl HealthMonitorActor {
    pub fn new(outbox: Arc<Outbox>, metrics: Arc<Metrics>) -> Self {
        Self {
            components: HashMap::new(),
            outbox,
            metrics,
        }
    }

    fn record(&mut self, health: ComponentHealth) {
        tracing::debug!(
            component = %health.name,
            status = ?health.status,
            "Updated component health"
        );
        self.components.insert(health.name.clone(), health);
    }
}

fn backlog_status(pending: usize) -> HealthStatus {
    if pending > OUTBOX_BACKLOG_DEGRADED {
        HealthStatus::Degraded(format!("{pending} messages waiting"))
    } else {
        HealthStatus::Healthy
    }
}

impl Actor for HealthMonitorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor started");

        let addr = ctx.address();

        // Check the outbox backlog periodically
        ctx.run_interval(Duration::from_secs(10), move |act, _ctx| {
            let outbox = act.outbox.clone();
            let metrics = act.metrics.clone();
            let addr = addr.clone();

            actix::spawn(async move {
                let pending = outbox.len().await;
                metrics.set_outbox_pending(pending);
                addr.do_send(UpdateHealth {
                    component: "outbox".to_string(),
                    status: backlog_status(pending),
                    details: Some(format!("{pending} pending")),
                });
            });
        });
    }
}

impl Handler<UpdateHealth> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, msg: UpdateHealth, _: &mut Self::Context) {
        let mut health = ComponentHealth::new(msg.component, msg.status);
        if let Some(details) = msg.details {
            health = health.with_details(details);
        }
        self.record(health);
    }
}

impl Handler<GetSystemHealth> for HealthMonitorActor {
    type Result = MessageResult<GetSystemHealth>;

    fn handle(&mut self, _msg: GetSystemHealth, _: &mut Self::Context) -> Self::Result {
        MessageResult(SystemHealth {
            overall_status: overall_status(self.components.values()),
            components: self.components.clone(),
            check_time: Utc::now(),
        })
    }
}
