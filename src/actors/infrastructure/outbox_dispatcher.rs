use actix::prelude::*;
use anyhow::Context as _;
use std::sync::Arc;
use std::time::Duration;

use crate::actors::core::HealthStatus;
use crate::event_sourcing::{Outbox, OutboxMessage};
use crate::metrics::Metrics;
use crate::utils::{retry_with_backoff, RetryConfig};

use super::health_monitor::{HealthMonitorActor, UpdateHealth};
use super::subscribers::OutboxSubscriber;

// ============================================================================
// Outbox Dispatcher - Delivers outbox messages to subscribers
// ============================================================================
//
// Polls the shared outbox on an interval. Each message goes to every
// subscriber that accepts it, with backoff retries per subscriber. A message
// that still fails is put back at the head of the queue together with the
// rest of its batch, so per-aggregate order is kept. After
// MAX_DELIVERY_ATTEMPTS polls it is dropped and counted as failed.
//
// ============================================================================

pub const MAX_DELIVERY_ATTEMPTS: u32 = 5;
const BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub requeued: usize,
    pub dropped: usize,
}

impl DispatchReport {
    fn absorb(&mut self, other: DispatchReport) {
        self.delivered += other.delivered;
        self.requeued += other.requeued;
        self.dropped += other.dropped;
    }

    fn health(&self) -> HealthStatus {
        if self.dropped > 0 {
            HealthStatus::Degraded(format!("{} messages dropped", self.dropped))
        } else if self.requeued > 0 {
            HealthStatus::Degraded("Deliveries are being retried".to_string())
        } else {
            HealthStatus::Healthy
        }
    }
}

/// The delivery loop, independent of the actor driving it
#[derive(Clone)]
pub struct OutboxDelivery {
    outbox: Arc<Outbox>,
    subscribers: Arc<Vec<Arc<dyn OutboxSubscriber>>>,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
    batch_size: usize,
}

impl OutboxDelivery {
    pub fn new(
        outbox: Arc<Outbox>,
        subscribers: Vec<Arc<dyn OutboxSubscriber>>,
        metrics: Arc<Metrics>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            outbox,
            subscribers: Arc::new(subscribers),
            metrics,
            retry,
            batch_size: BATCH_SIZE,
        }
    }

    /// Deliver one batch
    pub async fn dispatch_batch(&self) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut pending = self.outbox.take_batch(self.batch_size).await.into_iter();

        while let Some(mut message) = pending.next() {
            match self.deliver(&message).await {
                Ok(()) => {
                    report.delivered += 1;
                    self.metrics.record_outbox_delivery(&message.event_type, true);
                }
                Err(err) => {
                    message.attempts += 1;
                    if message.attempts >= MAX_DELIVERY_ATTEMPTS {
                        report.dropped += 1;
                        self.metrics.record_outbox_delivery(&message.event_type, false);
                        tracing::error!(
                            message_id = %message.id,
                            aggregate_id = %message.aggregate_id,
                            event_type = %message.event_type,
                            attempts = message.attempts,
                            error = %err,
                            "Dropping outbox message after repeated failures"
                        );
                        continue;
                    }

                    tracing::warn!(
                        message_id = %message.id,
                        event_type = %message.event_type,
                        attempts = message.attempts,
                        error = %err,
                        "Outbox delivery failed, requeueing"
                    );
                    let mut retry_later = vec![message];
                    retry_later.extend(pending.by_ref());
                    report.requeued = retry_later.len();
                    self.outbox.requeue(retry_later).await;
                    break;
                }
            }
        }

        self.metrics.set_outbox_pending(self.outbox.len().await);
        report
    }

    /// Dispatch until the outbox is empty. Every batch either delivers,
    /// drops or counts an attempt against its head message, so this ends.
    pub async fn drain(&self) -> DispatchReport {
        let mut total = DispatchReport::default();
        while !self.outbox.is_empty().await {
            total.absorb(self.dispatch_batch().await);
        }
        total
    }

    async fn deliver(&self, message: &OutboxMessage) -> anyhow::Result<()> {
        for subscriber in self.subscribers.iter().filter(|s| s.accepts(message)) {
            retry_with_backoff(&self.retry, |_attempt| subscriber.handle(message))
                .await
                .into_result()
                .with_context(|| format!("subscriber {} failed", subscriber.name()))?;
        }
        Ok(())
    }
}

// ============================================================================
// Actor
// ============================================================================

pub struct OutboxDispatcher {
    delivery: OutboxDelivery,
    poll_interval: Duration,
    health: Option<Addr<HealthMonitorActor>>,
    dispatching: bool,
    last_status: Option<HealthStatus>,
}

impl OutboxDispatcher {
    pub fn new(delivery: OutboxDelivery, poll_interval: Duration) -> Self {
        Self {
            delivery,
            poll_interval,
            health: None,
            dispatching: false,
            last_status: None,
        }
    }

    pub fn with_health_monitor(mut self, health: Addr<HealthMonitorActor>) -> Self {
        self.health = Some(health);
        self
    }

    fn poll(&mut self, ctx: &mut Context<Self>) {
        // One batch at a time; the next tick picks up where this one stopped
        if self.dispatching {
            return;
        }
        self.dispatching = true;

        let delivery = self.delivery.clone();
        ctx.spawn(
            async move { delivery.dispatch_batch().await }
                .into_actor(self)
                .map(|report, act, _ctx| {
                    act.dispatching = false;
                    if report.delivered > 0 {
                        tracing::debug!(delivered = report.delivered, "Dispatched outbox batch");
                    }
                    act.report_health(report.health());
                }),
        );
    }

    fn report_health(&mut self, status: HealthStatus) {
        if self.last_status.as_ref() == Some(&status) {
            return;
        }
        if let Some(ref health) = self.health {
            health.do_send(UpdateHealth {
                component: "outbox_dispatcher".to_string(),
                status: status.clone(),
                details: None,
            });
        }
        self.last_status = Some(status);
    }
}

impl Actor for OutboxDispatcher {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis(),
            subscribers = self.delivery.subscribers.len(),
            "OutboxDispatcher started"
        );
        ctx.run_interval(self.poll_interval, |act, ctx| act.poll(ctx));
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("OutboxDispatcher stopped");
    }
}

/// Deliver everything currently in the outbox
#[derive(Message)]
#[rtype(result = "DispatchReport")]
pub struct FlushOutbox;

impl Handler<FlushOutbox> for OutboxDispatcher {
    type Result = ResponseFuture<DispatchReport>;

    fn handle(&mut self, _: FlushOutbox, _: &mut Self::Context) -> Self::Result {
        let delivery = self.delivery.clone();
        Box::pin(async move { delivery.drain().await })
    }
}
