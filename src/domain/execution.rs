use std::fmt::Display;
use std::future::Future;
use uuid::Uuid;

use crate::domain::shared::SharedError;
use crate::error::{AppError, AppResult};
use crate::event_sourcing::{
    Aggregate, DomainEvent, EventStore, IdempotencyRegistry, IdempotencyScope, NotInitialized, Reservation,
};
use crate::metrics::Metrics;

// ============================================================================
// Command Execution
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store
//
// Shared by every command handler so each one only adds its cross-aggregate
// work (wallet deduction, ledger entries, idempotency).
//
// ============================================================================

/// Validate a creation command, persist the opening events and return the new aggregate
pub async fn create_aggregate<A>(
    store: &EventStore<A::Event>,
    command: &A::Command,
    correlation_id: Uuid,
    metrics: &Metrics,
) -> AppResult<A>
where
    A: Aggregate,
    A::Event: DomainEvent,
    A::Error: Display + From<NotInitialized>,
    AppError: From<A::Error>,
{
    let events = A::create(command).map_err(|e| rule_violation::<A>(e, metrics))?;
    let aggregate = A::from_events(&events)?;
    let aggregate_id = aggregate.aggregate_id();

    let event_names: Vec<&'static str> = events.iter().map(|e| e.event_type()).collect();
    store.commit(aggregate_id, 0, events, correlation_id).await?;

    for name in event_names {
        metrics.record_transition(A::AGGREGATE_TYPE, name);
    }

    tracing::info!(
        aggregate_type = A::AGGREGATE_TYPE,
        aggregate_id = %aggregate_id,
        correlation_id = %correlation_id,
        "Created aggregate"
    );

    Ok(aggregate)
}

/// Load an aggregate, run a command against it and persist the emitted events.
/// Returns the updated aggregate together with the events that were appended.
pub async fn execute_command<A>(
    store: &EventStore<A::Event>,
    aggregate_id: Uuid,
    command: &A::Command,
    correlation_id: Uuid,
    metrics: &Metrics,
) -> AppResult<(A, Vec<A::Event>)>
where
    A: Aggregate,
    A::Event: DomainEvent,
    A::Error: Display,
    AppError: From<A::Error>,
{
    let prepared = prepare_command::<A>(store, aggregate_id, command, metrics).await?;
    commit_prepared(store, prepared, correlation_id, metrics).await
}

/// A command accepted by the aggregate whose events are not stored yet
pub struct PreparedCommand<A: Aggregate> {
    aggregate: A,
    expected_version: i64,
    events: Vec<A::Event>,
}

impl<A: Aggregate> PreparedCommand<A> {
    /// The aggregate as it was before the command
    pub fn current(&self) -> &A {
        &self.aggregate
    }

    pub fn events(&self) -> &[A::Event] {
        &self.events
    }
}

/// Load an aggregate and run a command against it without persisting anything
pub async fn prepare_command<A>(
    store: &EventStore<A::Event>,
    aggregate_id: Uuid,
    command: &A::Command,
    metrics: &Metrics,
) -> AppResult<PreparedCommand<A>>
where
    A: Aggregate,
    A::Event: DomainEvent,
    A::Error: Display,
    AppError: From<A::Error>,
{
    let aggregate: A = store
        .find_aggregate(aggregate_id)
        .await?
        .ok_or_else(|| AppError::not_found(A::AGGREGATE_TYPE, aggregate_id))?;

    let expected_version = aggregate.version();
    let events = aggregate
        .handle_command(command)
        .map_err(|e| rule_violation::<A>(e, metrics))?;

    Ok(PreparedCommand { aggregate, expected_version, events })
}

/// Persist a prepared command. Fails if the aggregate moved on since it was prepared.
pub async fn commit_prepared<A>(
    store: &EventStore<A::Event>,
    prepared: PreparedCommand<A>,
    correlation_id: Uuid,
    metrics: &Metrics,
) -> AppResult<(A, Vec<A::Event>)>
where
    A: Aggregate,
    A::Event: DomainEvent,
    AppError: From<A::Error>,
{
    let PreparedCommand { mut aggregate, expected_version, events } = prepared;
    if events.is_empty() {
        return Ok((aggregate, events));
    }

    let aggregate_id = aggregate.aggregate_id();
    store
        .commit(aggregate_id, expected_version, events.clone(), correlation_id)
        .await?;
    aggregate.apply_all(&events)?;

    for event in &events {
        metrics.record_transition(A::AGGREGATE_TYPE, event.event_type());
        tracing::info!(
            aggregate_type = A::AGGREGATE_TYPE,
            aggregate_id = %aggregate_id,
            event_type = event.event_type(),
            version = aggregate.version(),
            "Applied command"
        );
    }

    Ok((aggregate, events))
}

/// Run `effect` before storing a prepared command that depends on it.
/// When the command can no longer be stored, `undo` gets the effect's result back.
pub async fn commit_after<A, T, U, UFut>(
    store: &EventStore<A::Event>,
    prepared: PreparedCommand<A>,
    correlation_id: Uuid,
    metrics: &Metrics,
    effect: impl Future<Output = AppResult<T>>,
    undo: U,
) -> AppResult<(A, Vec<A::Event>)>
where
    A: Aggregate,
    A::Event: DomainEvent,
    AppError: From<A::Error>,
    U: FnOnce(T) -> UFut,
    UFut: Future<Output = AppResult<()>>,
{
    let aggregate_id = prepared.current().aggregate_id();
    let outcome = effect.await?;

    match commit_prepared(store, prepared, correlation_id, metrics).await {
        Ok(done) => Ok(done),
        Err(err) => {
            tracing::warn!(
                aggregate_type = A::AGGREGATE_TYPE,
                aggregate_id = %aggregate_id,
                error = %err,
                "Command could not be stored after its side effect, undoing it"
            );
            undo(outcome).await?;
            Err(err)
        }
    }
}

/// Count and log a command refused by a business rule
pub fn rule_violation<A>(err: A::Error, metrics: &Metrics) -> AppError
where
    A: Aggregate,
    AppError: From<A::Error>,
{
    let err = AppError::from(err);
    metrics.record_rejected_transition(A::AGGREGATE_TYPE, err.code());
    tracing::warn!(
        aggregate_type = A::AGGREGATE_TYPE,
        code = err.code(),
        error = %err,
        "Command rejected by business rule"
    );
    err
}

/// Outcome of an idempotent submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Created(Uuid),
    /// The key was used before; nothing was created or charged
    Replayed(Uuid),
}

impl Submission {
    pub fn id(&self) -> Uuid {
        match self {
            Submission::Created(id) | Submission::Replayed(id) => *id,
        }
    }
}

/// Run `create` at most once per idempotency scope.
///
/// The key is reserved for a fresh id before `create` runs. Rule checks
/// belong inside `create` so a replay is answered before the world is
/// consulted again. If `create` fails the reservation is released so the
/// caller can retry; a call that arrives while another still holds the key
/// is rejected instead of being handed an id that does not exist yet.
pub async fn submit_once<F, Fut>(
    registry: &IdempotencyRegistry,
    scope: IdempotencyScope,
    metrics: &Metrics,
    create: F,
) -> AppResult<Submission>
where
    F: FnOnce(Uuid) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let kind = scope.kind;
    let candidate = Uuid::now_v7();

    match registry.reserve(scope.clone(), candidate).await {
        Reservation::New(_) => {}
        Reservation::Existing(existing) => {
            metrics.record_idempotent_replay(kind);
            tracing::info!(
                kind = kind,
                owner_id = %scope.owner_id,
                request_id = %existing,
                "Idempotency key already used, returning existing request"
            );
            return Ok(Submission::Replayed(existing));
        }
        Reservation::InProgress(holder) => {
            tracing::warn!(
                kind = kind,
                owner_id = %scope.owner_id,
                request_id = %holder,
                "Idempotency key is held by a submission that has not finished"
            );
            return Err(SharedError::SubmissionInProgress.into());
        }
    }

    if let Err(err) = create(candidate).await {
        registry.release(&scope, candidate).await;
        return Err(err);
    }

    registry.commit(&scope, candidate).await;
    metrics.record_submission(kind);
    Ok(Submission::Created(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_once_replays_same_key() {
        let registry = IdempotencyRegistry::new();
        let metrics = Metrics::new().unwrap();
        let scope = IdempotencyScope::new(Uuid::new_v4(), "membership", "key");

        let first = submit_once(&registry, scope.clone(), &metrics, |_| async { Ok::<(), AppError>(()) })
            .await
            .unwrap();
        // Would fail the unwrap below if it ran
        let second = submit_once(&registry, scope, &metrics, |_| async {
            Err::<(), AppError>(anyhow::anyhow!("must not run for a replayed key").into())
        })
        .await
        .unwrap();

        assert!(matches!(first, Submission::Created(_)));
        assert_eq!(second, Submission::Replayed(first.id()));
        assert_eq!(metrics.idempotent_replays.with_label_values(&["membership"]).get(), 1);
    }

    #[tokio::test]
    async fn test_failed_creation_releases_key() {
        let registry = IdempotencyRegistry::new();
        let metrics = Metrics::new().unwrap();
        let scope = IdempotencyScope::new(Uuid::new_v4(), "syndicate", "key");

        let result = submit_once(&registry, scope.clone(), &metrics, |_| async {
            Err::<(), AppError>(AppError::Infrastructure(anyhow::anyhow!("store down")))
        })
        .await;
        assert!(result.is_err());
        assert!(registry.lookup(&scope).await.is_none());

        let retried = submit_once(&registry, scope, &metrics, |_| async { Ok::<(), AppError>(()) })
            .await
            .unwrap();
        assert!(matches!(retried, Submission::Created(_)));
    }

    #[tokio::test]
    async fn test_retry_during_pending_creation_is_rejected() {
        let registry = IdempotencyRegistry::new();
        let metrics = Metrics::new().unwrap();
        let scope = IdempotencyScope::new(Uuid::new_v4(), "certificate", "key");

        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel::<()>();
        let (finish_tx, finish_rx) = tokio::sync::oneshot::channel::<()>();

        let original = submit_once(&registry, scope.clone(), &metrics, |_| async move {
            let _ = entered_tx.send(());
            let _ = finish_rx.await;
            Ok::<(), AppError>(())
        });
        let retry = async {
            let _ = entered_rx.await;
            let outcome = submit_once(&registry, scope.clone(), &metrics, |_| async {
                Err::<(), AppError>(anyhow::anyhow!("must not run while the key is held").into())
            })
            .await;
            let _ = finish_tx.send(());
            outcome
        };

        let (original, retry) = tokio::join!(original, retry);
        let original = original.unwrap();
        let err = retry.unwrap_err();
        assert_eq!(err.code(), "Alumni:Common:003");
        assert!(matches!(original, Submission::Created(_)));
        assert_eq!(registry.lookup(&scope).await, Some(original.id()));

        let replay = submit_once(&registry, scope, &metrics, |_| async { Ok::<(), AppError>(()) })
            .await
            .unwrap();
        assert_eq!(replay, Submission::Replayed(original.id()));
    }
}
