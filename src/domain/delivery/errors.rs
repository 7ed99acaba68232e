use uuid::Uuid;

use crate::domain::shared::BusinessRule;
use crate::event_sourcing::NotInitialized;
use super::provider::FeeStrategyType;
use super::value_objects::ShipmentStatus;

// ============================================================================
// Delivery Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Cannot {action} a shipment in status {from:?}")]
    InvalidTransition { from: ShipmentStatus, action: &'static str },

    #[error("Delivery provider {0} is inactive")]
    ProviderInactive(Uuid),

    #[error("No fee strategy registered for '{0}'")]
    UnknownFeeStrategy(String),

    #[error("Delivery provider not found: {0}")]
    ProviderNotFound(Uuid),

    #[error("Parcel distance must be >= 0 and weight > 0")]
    InvalidParcel,

    #[error("A tracking number is required")]
    TrackingNumberRequired,

    #[error("A reason is required")]
    ReasonRequired,

    #[error("Aggregate not initialized")]
    NotInitialized,

    #[error("Provider {provider_id} has no rates configured for {strategy:?}")]
    RatesNotConfigured { provider_id: Uuid, strategy: FeeStrategyType },

    #[error("Shipment fee does not match the quoted delivery fee")]
    InvalidFee,
}

impl BusinessRule for DeliveryError {
    fn code(&self) -> &'static str {
        match self {
            DeliveryError::InvalidTransition { .. } => "Alumni:Delivery:001",
            DeliveryError::ProviderInactive(_) => "Alumni:Delivery:002",
            DeliveryError::UnknownFeeStrategy(_) => "Alumni:Delivery:003",
            DeliveryError::ProviderNotFound(_) => "Alumni:Delivery:004",
            DeliveryError::InvalidParcel => "Alumni:Delivery:005",
            DeliveryError::TrackingNumberRequired => "Alumni:Delivery:006",
            DeliveryError::ReasonRequired => "Alumni:Delivery:007",
            DeliveryError::NotInitialized => "Alumni:Delivery:008",
            DeliveryError::RatesNotConfigured { .. } => "Alumni:Delivery:009",
            DeliveryError::InvalidFee => "Alumni:Delivery:010",
        }
    }
}

impl From<NotInitialized> for DeliveryError {
    fn from(_: NotInitialized) -> Self {
        DeliveryError::NotInitialized
    }
}
