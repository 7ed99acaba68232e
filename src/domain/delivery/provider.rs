use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::shared::Money;
use super::errors::DeliveryError;

// ============================================================================
// Delivery Providers
// ============================================================================

/// Selects the calculator used to price a provider's shipments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeStrategyType {
    /// Fixed price within the local area
    FlatLocal,
    /// External carrier priced by distance and weight
    DistanceWeight,
}

impl FeeStrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeStrategyType::FlatLocal => "flat_local",
            FeeStrategyType::DistanceWeight => "distance_weight",
        }
    }
}

impl fmt::Display for FeeStrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeStrategyType {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat_local" | "flatlocal" => Ok(FeeStrategyType::FlatLocal),
            "distance_weight" | "distanceweight" => Ok(FeeStrategyType::DistanceWeight),
            other => Err(DeliveryError::UnknownFeeStrategy(other.to_string())),
        }
    }
}

/// Rates a provider is configured with; which ones matter depends on the strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRates {
    pub flat_rate: Option<Money>,
    pub base_rate: Option<Money>,
    pub per_km: Option<Money>,
    pub per_kg: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryProvider {
    pub id: Uuid,
    pub name: String,
    pub strategy: FeeStrategyType,
    pub is_active: bool,
    pub rates: ProviderRates,
}

impl DeliveryProvider {
    pub fn flat_local(name: impl Into<String>, flat_rate: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            strategy: FeeStrategyType::FlatLocal,
            is_active: true,
            rates: ProviderRates {
                flat_rate: Some(flat_rate),
                ..ProviderRates::default()
            },
        }
    }

    pub fn distance_weight(name: impl Into<String>, base_rate: Money, per_km: Money, per_kg: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            strategy: FeeStrategyType::DistanceWeight,
            is_active: true,
            rates: ProviderRates {
                flat_rate: None,
                base_rate: Some(base_rate),
                per_km: Some(per_km),
                per_kg: Some(per_kg),
            },
        }
    }
}

/// Configured providers keyed by id
#[derive(Default)]
pub struct ProviderDirectory {
    providers: RwLock<HashMap<Uuid, DeliveryProvider>>,
}

impl ProviderDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, provider: DeliveryProvider) -> Uuid {
        let id = provider.id;
        tracing::info!(provider_id = %id, name = %provider.name, strategy = %provider.strategy, "Registered delivery provider");
        self.providers.write().await.insert(id, provider);
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<DeliveryProvider, DeliveryError> {
        self.providers
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DeliveryError::ProviderNotFound(id))
    }

    pub async fn activate(&self, id: Uuid) -> Result<(), DeliveryError> {
        self.set_active(id, true).await
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<(), DeliveryError> {
        self.set_active(id, false).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<(), DeliveryError> {
        let mut providers = self.providers.write().await;
        let provider = providers.get_mut(&id).ok_or(DeliveryError::ProviderNotFound(id))?;
        provider.is_active = active;
        tracing::info!(provider_id = %id, active = active, "Delivery provider availability changed");
        Ok(())
    }

    pub async fn list_active(&self) -> Vec<DeliveryProvider> {
        let mut active: Vec<_> = self
            .providers
            .read()
            .await
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_type_parsing() {
        assert_eq!("Flat_Local".parse::<FeeStrategyType>().unwrap(), FeeStrategyType::FlatLocal);
        assert_eq!(
            "distance_weight".parse::<FeeStrategyType>().unwrap(),
            FeeStrategyType::DistanceWeight
        );
        assert_eq!(
            "drone".parse::<FeeStrategyType>(),
            Err(DeliveryError::UnknownFeeStrategy("drone".to_string()))
        );
    }

    #[tokio::test]
    async fn test_directory_activation() {
        let directory = ProviderDirectory::new();
        let local = directory.add(DeliveryProvider::flat_local("Campus Courier", Money::from_major(30))).await;
        directory
            .add(DeliveryProvider::distance_weight(
                "Aramex",
                Money::from_major(20),
                Money::from_minor(150),
                Money::from_major(5),
            ))
            .await;

        assert_eq!(directory.list_active().await.len(), 2);

        directory.deactivate(local).await.unwrap();
        let active = directory.list_active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Aramex");
        assert!(!directory.get(local).await.unwrap().is_active);

        let missing = Uuid::new_v4();
        assert_eq!(directory.activate(missing).await, Err(DeliveryError::ProviderNotFound(missing)));
    }
}
