use actix::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::actors::core::HealthStatus;
use crate::app::AppServices;
use crate::config::Config;
use crate::utils::RetryConfig;

use super::nightly_sweep::{Housekeeping, NightlySweepActor};
use super::outbox_dispatcher::{OutboxDelivery, OutboxDispatcher};
use super::subscribers::{AuditTrail, OutboxSubscriber, SummaryRefresh};
use super::{GetSystemHealth, HealthMonitorActor, UpdateHealth};

// ============================================================================
// Coordinator Actor - Orchestrates all system actors
// ============================================================================
//
// Responsibilities:
// - Starts the child actors and hands them the shared services
// - Reports system health every 30s
// - Coordinates graceful shutdown
//
// Actor Hierarchy:
//   CoordinatorActor (Supervisor)
//   ├── HealthMonitorActor
//   ├── OutboxDispatcher
//   └── NightlySweepActor
//
// ============================================================================

pub struct CoordinatorActor {
    services: Arc<AppServices>,
    config: Config,
    health_monitor: Option<Addr<HealthMonitorActor>>,
    outbox_dispatcher: Option<Addr<OutboxDispatcher>>,
    nightly_sweep: Option<Addr<NightlySweepActor>>,
}

impl CoordinatorActor {
    pub fn new(services: Arc<AppServices>, config: Config) -> Self {
        Self {
            services,
            config,
            health_monitor: None,
            outbox_dispatcher: None,
            nightly_sweep: None,
        }
    }

    fn start_child_actors(&mut self, _ctx: &mut Context<Self>) {
        tracing::info!("Starting supervised child actors");
        let services = &self.services;

        let health_monitor = HealthMonitorActor::new(services.outbox.clone(), services.metrics.clone()).start();
        self.health_monitor = Some(health_monitor.clone());

        let subscribers: Vec<Arc<dyn OutboxSubscriber>> = vec![
            Arc::new(AuditTrail::new(services.audit.clone())),
            Arc::new(SummaryRefresh::new(services.summaries.clone())),
        ];
        let delivery = OutboxDelivery::new(
            services.outbox.clone(),
            subscribers,
            services.metrics.clone(),
            RetryConfig::in_process(),
        );
        let outbox_dispatcher = OutboxDispatcher::new(delivery, self.config.outbox_poll_interval)
            .with_health_monitor(health_monitor.clone())
            .start();
        self.outbox_dispatcher = Some(outbox_dispatcher);

        health_monitor.do_send(UpdateHealth {
            component: "outbox_dispatcher".to_string(),
            status: HealthStatus::Healthy,
            details: Some("Outbox dispatcher started".to_string()),
        });

        let housekeeping = Housekeeping::new(
            services.audit.clone(),
            services.memberships.clone(),
            services.summaries.clone(),
            services.metrics.clone(),
            self.config.audit_retention_days,
        );
        let nightly_sweep = NightlySweepActor::new(housekeeping, self.config.log_cleanup_interval)
            .with_health_monitor(health_monitor.clone())
            .start();
        self.nightly_sweep = Some(nightly_sweep);

        health_monitor.do_send(UpdateHealth {
            component: "nightly_sweep".to_string(),
            status: HealthStatus::Healthy,
            details: Some("Nightly sweep scheduled".to_string()),
        });

        tracing::info!("✅ All supervised actors started successfully");
    }
}

impl Actor for CoordinatorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("🎯 CoordinatorActor started - Alumni portal core");
        self.start_child_actors(ctx);

        // Schedule periodic health checks
        ctx.run_interval(Duration::from_secs(30), |act, _ctx| {
            if let Some(ref health_monitor) = act.health_monitor {
                let health_monitor = health_monitor.clone();
                actix::spawn(async move {
                    match health_monitor.send(GetSystemHealth).await {
                        Ok(health) => match health.overall_status {
                            HealthStatus::Healthy => {
                                tracing::debug!("System health check: Healthy");
                            }
                            HealthStatus::Degraded(ref msg) => {
                                tracing::warn!("System health check: Degraded - {}", msg);
                            }
                            HealthStatus::Unhealthy(ref msg) => {
                                tracing::error!("System health check: Unhealthy - {}", msg);
                            }
                        },
                        Err(e) => {
                            tracing::error!("Failed to get system health: {}", e);
                        }
                    }
                });
            }
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        tracing::info!("🛑 CoordinatorActor stopping - initiating graceful shutdown");
        Running::Stop
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("🛑 CoordinatorActor stopped");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct Shutdown;

impl Handler<Shutdown> for CoordinatorActor {
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) {
        tracing::info!("Received shutdown signal");

        if let Some(ref outbox_dispatcher) = self.outbox_dispatcher {
            outbox_dispatcher.do_send(StopActor);
        }

        if let Some(ref nightly_sweep) = self.nightly_sweep {
            nightly_sweep.do_send(StopActor);
        }

        if let Some(ref health_monitor) = self.health_monitor {
            health_monitor.do_send(StopActor);
        }

        ctx.stop();
    }
}

/// Message to gracefully stop an actor
#[derive(Message)]
#[rtype(result = "()")]
struct StopActor;

impl Handler<StopActor> for OutboxDispatcher {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("OutboxDispatcher received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for NightlySweepActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("NightlySweepActor received stop signal");
        ctx.stop();
    }
}

#[derive(Message)]
#[rtype(result = "Option<Addr<HealthMonitorActor>>")]
pub struct GetHealthMonitor;

impl Handler<GetHealthMonitor> for CoordinatorActor {
    type Result = Option<Addr<HealthMonitorActor>>;

    fn handle(&mut self, _: GetHealthMonitor, _: &mut Self::Context) -> Self::Result {
        self.health_monitor.clone()
    }
}

#[derive(Message)]
#[rtype(result = "Option<Addr<OutboxDispatcher>>")]
pub struct GetOutboxDispatcher;

impl Handler<GetOutboxDispatcher> for CoordinatorActor {
    type Result = Option<Addr<OutboxDispatcher>>;

    fn handle(&mut self, _: GetOutboxDispatcher, _: &mut Self::Context) -> Self::Result {
        self.outbox_dispatcher.clone()
    }
}

#[derive(Message)]
#[rtype(result = "Option<Addr<NightlySweepActor>>")]
pub struct GetNightlySweep;

impl Handler<GetNightlySweep> for CoordinatorActor {
    type Result = Option<Addr<NightlySweepActor>>;

    fn handle(&mut self, _: GetNightlySweep, _: &mut Self::Context) -> Self::Result {
        self.nightly_sweep.clone()
    }
}
