use std::sync::Arc;
use uuid::Uuid;

use crate::domain::execution::{create_aggregate, execute_command};
use crate::error::{AppError, AppResult};
use crate::event_sourcing::EventStore;
use crate::metrics::Metrics;

use super::aggregate::AlumniAggregate;
use super::commands::AlumniCommand;
use super::errors::AlumniError;
use super::events::AlumniEvent;

// ============================================================================
// Alumni Command Handler
// ============================================================================

pub struct AlumniCommandHandler {
    event_store: Arc<EventStore<AlumniEvent>>,
    metrics: Arc<Metrics>,
}

impl AlumniCommandHandler {
    pub fn new(event_store: Arc<EventStore<AlumniEvent>>, metrics: Arc<Metrics>) -> Self {
        Self { event_store, metrics }
    }

    pub async fn register(&self, command: AlumniCommand, correlation_id: Uuid) -> AppResult<AlumniAggregate> {
        if let AlumniCommand::Register { alumni_id, .. } = &command {
            if self.event_store.aggregate_exists(*alumni_id).await? {
                return Err(AlumniError::AlreadyRegistered.into());
            }
        }
        create_aggregate::<AlumniAggregate>(&self.event_store, &command, correlation_id, &self.metrics).await
    }

    pub async fn handle(
        &self,
        alumni_id: Uuid,
        command: AlumniCommand,
        correlation_id: Uuid,
    ) -> AppResult<AlumniAggregate> {
        let (alumni, _) = execute_command::<AlumniAggregate>(
            &self.event_store,
            alumni_id,
            &command,
            correlation_id,
            &self.metrics,
        )
        .await?;
        Ok(alumni)
    }

    pub async fn find(&self, alumni_id: Uuid) -> AppResult<Option<AlumniAggregate>> {
        Ok(self.event_store.find_aggregate(alumni_id).await?)
    }

    /// Load the alumni and check the account may submit requests
    pub async fn require_active(&self, alumni_id: Uuid) -> AppResult<AlumniAggregate> {
        let alumni = self
            .find(alumni_id)
            .await?
            .ok_or_else(|| AppError::not_found("Alumni", alumni_id))?;

        if !alumni.is_active() {
            return Err(AlumniError::NotActive.into());
        }
        Ok(alumni)
    }

    pub async fn all(&self) -> AppResult<Vec<AlumniAggregate>> {
        Ok(self.event_store.load_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::Outbox;

    fn handler() -> AlumniCommandHandler {
        let store = Arc::new(EventStore::new("Alumni", Arc::new(Outbox::new())));
        AlumniCommandHandler::new(store, Arc::new(Metrics::new().unwrap()))
    }

    fn register(alumni_id: Uuid) -> AlumniCommand {
        AlumniCommand::Register {
            alumni_id,
            email: "sara@example.com".to_string(),
            first_name: "Sara".to_string(),
            last_name: "Nabil".to_string(),
            graduation_year: 2019,
            faculty: "Law".to_string(),
            phone: Some("+20100000000".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let handler = handler();
        let alumni_id = Uuid::new_v4();
        handler.register(register(alumni_id), Uuid::new_v4()).await.unwrap();

        let err = handler.register(register(alumni_id), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code(), "Alumni:Profile:007");
    }

    #[tokio::test]
    async fn test_require_active() {
        let handler = handler();
        let alumni_id = Uuid::new_v4();

        let err = handler.require_active(alumni_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        handler.register(register(alumni_id), Uuid::new_v4()).await.unwrap();
        assert!(handler.require_active(alumni_id).await.is_ok());

        handler
            .handle(alumni_id, AlumniCommand::Deactivate { reason: "left".into() }, Uuid::new_v4())
            .await
            .unwrap();
        let err = handler.require_active(alumni_id).await.unwrap_err();
        assert_eq!(err.code(), "Alumni:Profile:003");
    }
}
