use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::alumni::{AlumniCommandHandler, AlumniStatus};
use crate::domain::shared::Money;
use crate::domain::wallet::WalletCommandHandler;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;

/// Read model served to profile pages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlumniSummary {
    pub alumni_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub graduation_year: i32,
    pub faculty: String,
    pub status: AlumniStatus,
    pub wallet_balance: Money,
}

struct CachedSummary {
    summary: AlumniSummary,
    loaded_at: Instant,
}

pub struct AlumniSummaryCache {
    entries: RwLock<HashMap<Uuid, CachedSummary>>,
    ttl: Duration,
    alumni: Arc<AlumniCommandHandler>,
    wallets: Arc<WalletCommandHandler>,
    metrics: Arc<Metrics>,
}

impl AlumniSummaryCache {
    pub fn new(
        ttl: Duration,
        alumni: Arc<AlumniCommandHandler>,
        wallets: Arc<WalletCommandHandler>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            alumni,
            wallets,
            metrics,
        }
    }

    /// Serve a fresh entry from the cache, otherwise load and store it
    pub async fn get_or_load(&self, alumni_id: Uuid) -> AppResult<AlumniSummary> {
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(&alumni_id) {
                if cached.loaded_at.elapsed() < self.ttl {
                    self.metrics.record_cache_lookup(true);
                    return Ok(cached.summary.clone());
                }
            }
        }

        self.metrics.record_cache_lookup(false);
        tracing::debug!(alumni_id = %alumni_id, "Summary cache miss");
        self.rebuild(alumni_id).await
    }

    pub async fn invalidate(&self, alumni_id: Uuid) {
        if self.entries.write().await.remove(&alumni_id).is_some() {
            tracing::debug!(alumni_id = %alumni_id, "Invalidated summary cache entry");
        }
    }

    /// Reload an entry from the event store, replacing whatever is cached
    pub async fn rebuild(&self, alumni_id: Uuid) -> AppResult<AlumniSummary> {
        let summary = self.load(alumni_id).await?;
        self.entries.write().await.insert(
            alumni_id,
            CachedSummary {
                summary: summary.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(summary)
    }

    /// Drop entries older than the TTL
    pub async fn remove_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, cached| cached.loaded_at.elapsed() < ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn load(&self, alumni_id: Uuid) -> AppResult<AlumniSummary> {
        let alumni = self
            .alumni
            .find(alumni_id)
            .await?
            .ok_or_else(|| AppError::not_found("Alumni", alumni_id))?;
        let wallet_balance = self.wallets.balance(alumni_id).await?;

        Ok(AlumniSummary {
            alumni_id,
            full_name: alumni.full_name(),
            email: alumni.email.as_str().to_string(),
            graduation_year: alumni.graduation_year,
            faculty: alumni.faculty.clone(),
            status: alumni.status,
            wallet_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alumni::AlumniCommand;
    use crate::event_sourcing::{EventStore, Outbox};

    struct Fixture {
        cache: AlumniSummaryCache,
        alumni: Arc<AlumniCommandHandler>,
        wallets: Arc<WalletCommandHandler>,
        metrics: Arc<Metrics>,
    }

    fn fixture(ttl: Duration) -> Fixture {
        let outbox = Arc::new(Outbox::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let alumni = Arc::new(AlumniCommandHandler::new(
            Arc::new(EventStore::new("Alumni", outbox.clone())),
            metrics.clone(),
        ));
        let wallets = Arc::new(WalletCommandHandler::new(
            Arc::new(EventStore::new("Wallet", outbox)),
            metrics.clone(),
        ));
        let cache = AlumniSummaryCache::new(ttl, alumni.clone(), wallets.clone(), metrics.clone());
        Fixture { cache, alumni, wallets, metrics }
    }

    async fn register(fixture: &Fixture) -> Uuid {
        let alumni_id = Uuid::new_v4();
        fixture
            .alumni
            .register(
                AlumniCommand::Register {
                    alumni_id,
                    email: "Mona.Adel@Example.org".to_string(),
                    first_name: "Mona".to_string(),
                    last_name: "Adel".to_string(),
                    graduation_year: 2015,
                    faculty: "Engineering".to_string(),
                    phone: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        alumni_id
    }

    #[tokio::test]
    async fn test_second_read_is_a_hit() {
        let fixture = fixture(Duration::from_secs(60));
        let alumni_id = register(&fixture).await;

        let first = fixture.cache.get_or_load(alumni_id).await.unwrap();
        let second = fixture.cache.get_or_load(alumni_id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.email, "mona.adel@example.org");
        assert_eq!(fixture.metrics.cache_lookups.with_label_values(&["miss"]).get(), 1);
        assert_eq!(fixture.metrics.cache_lookups.with_label_values(&["hit"]).get(), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_until_rebuilt() {
        let fixture = fixture(Duration::from_secs(60));
        let alumni_id = register(&fixture).await;
        fixture.cache.get_or_load(alumni_id).await.unwrap();

        fixture.wallets.open(alumni_id, Uuid::new_v4()).await.unwrap();
        fixture
            .wallets
            .top_up(alumni_id, Money::from_major(40), "cash", Uuid::new_v4())
            .await
            .unwrap();

        let cached = fixture.cache.get_or_load(alumni_id).await.unwrap();
        assert_eq!(cached.wallet_balance, Money::zero());

        fixture.cache.rebuild(alumni_id).await.unwrap();
        let fresh = fixture.cache.get_or_load(alumni_id).await.unwrap();
        assert_eq!(fresh.wallet_balance, Money::from_major(40));
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let fixture = fixture(Duration::from_secs(60));
        let alumni_id = register(&fixture).await;
        fixture.cache.get_or_load(alumni_id).await.unwrap();

        fixture.cache.invalidate(alumni_id).await;
        assert_eq!(fixture.cache.len().await, 0);

        fixture.cache.get_or_load(alumni_id).await.unwrap();
        assert_eq!(fixture.metrics.cache_lookups.with_label_values(&["miss"]).get(), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_reload() {
        let fixture = fixture(Duration::ZERO);
        let alumni_id = register(&fixture).await;

        fixture.cache.get_or_load(alumni_id).await.unwrap();
        fixture.cache.get_or_load(alumni_id).await.unwrap();

        assert_eq!(fixture.metrics.cache_lookups.with_label_values(&["hit"]).get(), 0);
        assert_eq!(fixture.cache.remove_expired().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_alumni_is_not_found() {
        let fixture = fixture(Duration::from_secs(60));
        let err = fixture.cache.get_or_load(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code(), "Alumni:Common:404");
    }
}
