use actix::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

mod actors;
mod app;
mod audit;
mod cache;
mod config;
mod domain;
mod error;
mod event_sourcing;
mod metrics;
mod reporting;
mod utils;

use actors::{
    CoordinatorActor, FlushOutbox, GetHealthMonitor, GetNightlySweep, GetOutboxDispatcher, RunSweep, Shutdown,
};
use app::AppServices;
use config::Config;
use domain::alumni::AlumniCommand;
use domain::certificate::{CertificateType, DeliveryMethod, SubmitCertificate};
use domain::delivery::{DeliveryProvider, Parcel, ShippingAddress};
use domain::membership::{MembershipPlan, SubmitMembership};
use domain::shared::Money;

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,alumni_portal=debug"))
        )
        .init();

    tracing::info!("🚀 Starting alumni portal core");

    // === 1. Configuration and metrics ===
    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Services and delivery providers ===
    let services = Arc::new(AppServices::new(&config, metrics.clone()));
    let courier_id = seed_providers(&services).await;

    // === 3. Start Coordinator Actor (supervision) ===
    tracing::info!("Starting coordinator actor with supervision");
    let coordinator = CoordinatorActor::new(services.clone(), config.clone()).start();

    let health_monitor = coordinator
        .send(GetHealthMonitor)
        .await?
        .ok_or_else(|| anyhow::anyhow!("health monitor was not started"))?;
    let outbox_dispatcher = coordinator
        .send(GetOutboxDispatcher)
        .await?
        .ok_or_else(|| anyhow::anyhow!("outbox dispatcher was not started"))?;

    // === 4. HTTP server: /metrics, /health, read models ===
    let server = metrics::start_http_server(
        metrics::HttpState {
            metrics: metrics.clone(),
            reports: services.reports.clone(),
            summaries: services.summaries.clone(),
            health: health_monitor,
        },
        config.http_port,
    )?;
    let server_handle = server.handle();
    actix::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    // === 5. Demonstrate a request lifecycle ===
    if let Err(e) = demo_lifecycle(&services, courier_id).await {
        tracing::error!(code = e.code(), "Demo lifecycle failed: {}", e);
    }

    let report = outbox_dispatcher.send(FlushOutbox).await?;
    tracing::info!(
        delivered = report.delivered,
        dropped = report.dropped,
        "Outbox flushed"
    );

    // Run housekeeping once at startup instead of waiting a full interval
    if let Some(nightly_sweep) = coordinator.send(GetNightlySweep).await? {
        match nightly_sweep.send(RunSweep).await? {
            Ok(sweep) => tracing::info!(
                audit_entries_purged = sweep.audit_entries_purged,
                memberships_expired = sweep.memberships_expired,
                summaries_evicted = sweep.summaries_evicted,
                "Startup sweep finished"
            ),
            Err(e) => tracing::warn!("Startup sweep failed: {}", e),
        }
    }

    let dashboard = services.reports.dashboard().await?;
    tracing::info!("📈 Dashboard: {}", serde_json::to_string(&dashboard)?);

    // === 6. Run until interrupted ===
    tracing::info!("⏳ Running; press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    coordinator.do_send(Shutdown);
    server_handle.stop(true).await;
    tracing::info!("👋 Shutdown complete");

    Ok(())
}

/// Register the demo couriers; returns the local one
async fn seed_providers(services: &AppServices) -> Uuid {
    let local = services
        .providers
        .add(DeliveryProvider::flat_local("City Express", Money::from_major(40)))
        .await;
    services
        .providers
        .add(DeliveryProvider::distance_weight(
            "National Post",
            Money::from_major(25),
            Money::from_minor(150),
            Money::from_major(10),
        ))
        .await;
    local
}

async fn demo_lifecycle(services: &AppServices, courier_id: Uuid) -> error::AppResult<()> {
    let correlation_id = Uuid::now_v7();
    let alumni_id = Uuid::new_v4();

    services
        .alumni
        .register(
            AlumniCommand::Register {
                alumni_id,
                email: "mona.adel@alumni.example.org".to_string(),
                first_name: "Mona".to_string(),
                last_name: "Adel".to_string(),
                graduation_year: 2015,
                faculty: "Engineering".to_string(),
                phone: None,
            },
            correlation_id,
        )
        .await?;
    services.wallets.open(alumni_id, correlation_id).await?;
    services
        .wallets
        .top_up(alumni_id, Money::from_major(1_000), "demo", correlation_id)
        .await?;
    tracing::info!(%alumni_id, "✅ Alumni registered with a funded wallet");

    let membership = services
        .memberships
        .submit(
            SubmitMembership {
                alumni_id,
                plan: MembershipPlan::Annual,
                idempotency_key: "demo-membership".to_string(),
            },
            correlation_id,
        )
        .await?;
    tracing::info!(request_id = %membership.request_id, status = ?membership.status, "✅ Membership submitted");

    let certificate = services
        .certificates
        .submit(
            SubmitCertificate {
                alumni_id,
                certificate_type: CertificateType::Graduation,
                copies: 1,
                delivery: DeliveryMethod::Courier {
                    provider_id: courier_id,
                    address: ShippingAddress {
                        recipient: "Mona Adel".to_string(),
                        street: "3 Tahrir Sq".to_string(),
                        city: "Cairo".to_string(),
                        phone: "+20111111111".to_string(),
                    },
                    parcel: Parcel::new(Decimal::new(8, 0), Decimal::new(3, 1))?,
                },
                idempotency_key: "demo-certificate".to_string(),
            },
            correlation_id,
        )
        .await?;
    tracing::info!(
        request_id = %certificate.request_id,
        fee = %certificate.fee.total,
        "✅ Certificate requested"
    );

    services.certificates.start_processing(certificate.request_id, correlation_id).await?;
    services.certificates.mark_ready(certificate.request_id, correlation_id).await?;
    let dispatched = services.certificates.dispatch(certificate.request_id, correlation_id).await?;
    tracing::info!(
        request_id = %dispatched.request_id,
        shipment_id = ?dispatched.shipment_id,
        "✅ Certificate out for delivery"
    );

    let summary = services.summaries.get_or_load(alumni_id).await?;
    tracing::info!(balance = %summary.wallet_balance, "💳 Remaining wallet balance");

    Ok(())
}
