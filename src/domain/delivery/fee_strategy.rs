use std::collections::HashMap;

use crate::domain::shared::Money;
use super::errors::DeliveryError;
use super::provider::{DeliveryProvider, FeeStrategyType};
use super::value_objects::Parcel;

// ============================================================================
// Delivery Fee Strategies
// ============================================================================
//
// A provider names its strategy type; the registry resolves it to a
// calculator at request time. Unregistered types fail fast.
//
// ============================================================================

pub trait FeeStrategy: Send + Sync {
    fn strategy_type(&self) -> FeeStrategyType;

    fn calculate(&self, provider: &DeliveryProvider, parcel: &Parcel) -> Result<Money, DeliveryError>;
}

/// Provider's flat rate, whatever the parcel
pub struct FlatRateStrategy;

impl FeeStrategy for FlatRateStrategy {
    fn strategy_type(&self) -> FeeStrategyType {
        FeeStrategyType::FlatLocal
    }

    fn calculate(&self, provider: &DeliveryProvider, _parcel: &Parcel) -> Result<Money, DeliveryError> {
        provider.rates.flat_rate.ok_or(DeliveryError::RatesNotConfigured {
            provider_id: provider.id,
            strategy: self.strategy_type(),
        })
    }
}

/// `base + per_km * distance + per_kg * weight`
pub struct DistanceWeightStrategy;

impl FeeStrategy for DistanceWeightStrategy {
    fn strategy_type(&self) -> FeeStrategyType {
        FeeStrategyType::DistanceWeight
    }

    fn calculate(&self, provider: &DeliveryProvider, parcel: &Parcel) -> Result<Money, DeliveryError> {
        parcel.validate()?;

        let rates = &provider.rates;
        let (Some(base), Some(per_km), Some(per_kg)) = (rates.base_rate, rates.per_km, rates.per_kg) else {
            return Err(DeliveryError::RatesNotConfigured {
                provider_id: provider.id,
                strategy: self.strategy_type(),
            });
        };

        let fee = per_km
            .amount()
            .checked_mul(parcel.distance_km)
            .zip(per_kg.amount().checked_mul(parcel.weight_kg))
            .and_then(|(distance, weight)| distance.checked_add(weight))
            .and_then(|variable| variable.checked_add(base.amount()))
            .ok_or(DeliveryError::InvalidFee)?;
        Money::new(fee).map_err(|_| DeliveryError::InvalidFee)
    }
}

pub struct FeeStrategyRegistry {
    strategies: HashMap<FeeStrategyType, Box<dyn FeeStrategy>>,
}

impl FeeStrategyRegistry {
    /// Empty registry; every lookup fails until strategies are registered
    pub fn empty() -> Self {
        Self { strategies: HashMap::new() }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(FlatRateStrategy));
        registry.register(Box::new(DistanceWeightStrategy));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn FeeStrategy>) {
        self.strategies.insert(strategy.strategy_type(), strategy);
    }

    pub fn resolve(&self, strategy_type: FeeStrategyType) -> Result<&dyn FeeStrategy, DeliveryError> {
        self.strategies
            .get(&strategy_type)
            .map(|s| s.as_ref())
            .ok_or_else(|| DeliveryError::UnknownFeeStrategy(strategy_type.to_string()))
    }

    /// Price a parcel with the provider's configured strategy.
    /// Inactive providers cannot take new shipments.
    pub fn calculate_for(&self, provider: &DeliveryProvider, parcel: &Parcel) -> Result<Money, DeliveryError> {
        if !provider.is_active {
            return Err(DeliveryError::ProviderInactive(provider.id));
        }
        parcel.validate()?;
        self.resolve(provider.strategy)?.calculate(provider, parcel)
    }
}

impl Default for FeeStrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
