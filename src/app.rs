use std::sync::Arc;

use crate::audit::AuditLog;
use crate::cache::AlumniSummaryCache;
use crate::config::Config;
use crate::domain::alumni::{AlumniCommandHandler, AlumniEvent};
use crate::domain::certificate::{CertificateCommandHandler, CertificateEvent};
use crate::domain::delivery::{FeeStrategyRegistry, ProviderDirectory, ShipmentCommandHandler, ShipmentEvent};
use crate::domain::membership::{MembershipCommandHandler, MembershipEvent};
use crate::domain::payments::{FeeCollector, PaymentLedger};
use crate::domain::syndicate::{SyndicateCommandHandler, SyndicateEvent};
use crate::domain::wallet::{WalletCommandHandler, WalletEvent};
use crate::event_sourcing::{EventStore, IdempotencyRegistry, Outbox};
use crate::metrics::Metrics;
use crate::reporting::ReportService;

// ============================================================================
// Application Services
// ============================================================================
//
// Wires the event stores, the shared outbox and every command handler
// together. One instance is shared (Arc) by the actors and the HTTP server.
//
// ============================================================================

pub struct AppServices {
    pub metrics: Arc<Metrics>,
    pub outbox: Arc<Outbox>,
    pub idempotency: Arc<IdempotencyRegistry>,
    pub ledger: Arc<PaymentLedger>,
    pub providers: Arc<ProviderDirectory>,
    pub fee_strategies: Arc<FeeStrategyRegistry>,

    pub alumni: Arc<AlumniCommandHandler>,
    pub wallets: Arc<WalletCommandHandler>,
    pub fees: Arc<FeeCollector>,
    pub memberships: Arc<MembershipCommandHandler>,
    pub certificates: Arc<CertificateCommandHandler>,
    pub syndicates: Arc<SyndicateCommandHandler>,
    pub shipments: Arc<ShipmentCommandHandler>,

    pub audit: Arc<AuditLog>,
    pub summaries: Arc<AlumniSummaryCache>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(config: &Config, metrics: Arc<Metrics>) -> Self {
        let outbox = Arc::new(Outbox::new());
        let idempotency = Arc::new(IdempotencyRegistry::new());
        let ledger = Arc::new(PaymentLedger::new());
        let providers = Arc::new(ProviderDirectory::new());
        let fee_strategies = Arc::new(FeeStrategyRegistry::with_defaults());

        let alumni_store: Arc<EventStore<AlumniEvent>> = Arc::new(EventStore::new("Alumni", outbox.clone()));
        let wallet_store: Arc<EventStore<WalletEvent>> = Arc::new(EventStore::new("Wallet", outbox.clone()));
        let membership_store: Arc<EventStore<MembershipEvent>> =
            Arc::new(EventStore::new("Membership", outbox.clone()));
        let certificate_store: Arc<EventStore<CertificateEvent>> =
            Arc::new(EventStore::new("Certificate", outbox.clone()));
        let syndicate_store: Arc<EventStore<SyndicateEvent>> =
            Arc::new(EventStore::new("Syndicate", outbox.clone()));
        let shipment_store: Arc<EventStore<ShipmentEvent>> = Arc::new(EventStore::new("Shipment", outbox.clone()));

        let alumni = Arc::new(AlumniCommandHandler::new(alumni_store, metrics.clone()));
        let wallets = Arc::new(WalletCommandHandler::new(wallet_store, metrics.clone()));
        let fees = Arc::new(FeeCollector::new(wallets.clone(), ledger.clone()));

        let memberships = Arc::new(MembershipCommandHandler::new(
            membership_store,
            fees.clone(),
            alumni.clone(),
            idempotency.clone(),
            config.fees,
            metrics.clone(),
        ));
        let shipments = Arc::new(ShipmentCommandHandler::new(
            shipment_store,
            providers.clone(),
            fee_strategies.clone(),
            fees.clone(),
            alumni.clone(),
            idempotency.clone(),
            metrics.clone(),
        ));
        let certificates = Arc::new(CertificateCommandHandler::new(
            certificate_store,
            shipments.clone(),
            fees.clone(),
            alumni.clone(),
            idempotency.clone(),
            config.fees,
            metrics.clone(),
        ));
        let syndicates = Arc::new(SyndicateCommandHandler::new(
            syndicate_store,
            memberships.clone(),
            fees.clone(),
            alumni.clone(),
            idempotency.clone(),
            config.fees,
            metrics.clone(),
        ));

        let audit = Arc::new(AuditLog::new());
        let summaries = Arc::new(AlumniSummaryCache::new(
            config.profile_cache_ttl,
            alumni.clone(),
            wallets.clone(),
            metrics.clone(),
        ));
        let reports = Arc::new(ReportService::new(
            alumni.clone(),
            memberships.clone(),
            certificates.clone(),
            syndicates.clone(),
            shipments.clone(),
            ledger.clone(),
        ));

        Self {
            metrics,
            outbox,
            idempotency,
            ledger,
            providers,
            fee_strategies,
            alumni,
            wallets,
            fees,
            memberships,
            certificates,
            syndicates,
            shipments,
            audit,
            summaries,
            reports,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use uuid::Uuid;

    use super::*;
    use crate::domain::alumni::AlumniCommand;
    use crate::domain::delivery::{DeliveryProvider, Parcel, ShippingAddress};
    use crate::domain::shared::Money;
    use rust_decimal::Decimal;

    pub fn services() -> AppServices {
        AppServices::new(&Config::default(), Arc::new(Metrics::new().unwrap()))
    }

    /// Register an active alumni and load `balance` into their wallet
    pub async fn alumni_with_balance(services: &AppServices, balance: Money) -> Uuid {
        let alumni_id = Uuid::new_v4();
        services
            .alumni
            .register(
                AlumniCommand::Register {
                    alumni_id,
                    email: format!("{alumni_id}@alumni.example.org"),
                    first_name: "Karim".to_string(),
                    last_name: "Hassan".to_string(),
                    graduation_year: 2012,
                    faculty: "Commerce".to_string(),
                    phone: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        services.wallets.open(alumni_id, Uuid::new_v4()).await.unwrap();
        if !balance.is_zero() {
            services
                .wallets
                .top_up(alumni_id, balance, "seed", Uuid::new_v4())
                .await
                .unwrap();
        }
        alumni_id
    }

    /// Flat-rate courier charging 40.00 per shipment
    pub async fn local_courier(services: &AppServices) -> Uuid {
        services
            .providers
            .add(DeliveryProvider::flat_local("City Express", Money::from_major(40)))
            .await
    }

    pub fn address() -> ShippingAddress {
        ShippingAddress {
            recipient: "Karim Hassan".to_string(),
            street: "12 Nile St".to_string(),
            city: "Cairo".to_string(),
            phone: "+20100000000".to_string(),
        }
    }

    pub fn parcel() -> Parcel {
        Parcel::new(Decimal::new(125, 1), Decimal::new(5, 1)).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use crate::domain::membership::{MembershipPlan, SubmitMembership};
    use crate::domain::shared::Money;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_submission_reaches_outbox_and_dashboard() {
        let services = services();
        let alumni_id = alumni_with_balance(&services, Money::from_major(200)).await;

        services
            .memberships
            .submit(
                SubmitMembership {
                    alumni_id,
                    plan: MembershipPlan::Annual,
                    idempotency_key: "join-2026".to_string(),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        // AlumniRegistered, WalletOpened, WalletCredited, WalletDebited, MembershipSubmitted
        assert_eq!(services.outbox.len().await, 5);

        let report = services.reports.dashboard().await.unwrap();
        assert_eq!(report.memberships.get("Pending"), Some(&1));
        assert_eq!(report.alumni.get("Active"), Some(&1));
        assert_eq!(report.ledger.charged, Decimal::new(200, 0));
        assert_eq!(report.ledger.wallet_net, Decimal::new(200, 0));
    }
}
