//! Load-decide-append pipeline for event-sourced aggregates.
//!
//! ```text
//! load stream -> validate -> rehydrate -> handle(command) -> append(Exact(version))
//! ```
//!
//! The repository holds no state of its own; concurrent writers to one stream
//! are serialized by the store's optimistic version check.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use furnerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, ExpectedVersion, TenantId};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("concurrent modification: {0}")]
    Concurrency(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error(transparent)]
    Store(EventStoreError),
}

impl From<EventStoreError> for RepositoryError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => RepositoryError::Concurrency(msg),
            EventStoreError::TenantIsolation(msg) => RepositoryError::TenantIsolation(msg),
            other => RepositoryError::Store(other),
        }
    }
}

/// Outcome of a handled command: the aggregate after the new events, and
/// the events as committed (empty when the command changed nothing).
#[derive(Debug, Clone)]
pub struct Executed<A> {
    pub aggregate: A,
    pub committed: Vec<StoredEvent>,
}

#[derive(Debug, Clone)]
pub struct AggregateRepository<S> {
    store: S,
}

impl<S> AggregateRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: EventStore> AggregateRepository<S> {
    /// Rehydrate an aggregate from its stream. A missing stream yields
    /// the instance built by `make_aggregate`.
    pub fn load<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        make_aggregate: impl FnOnce() -> A,
    ) -> Result<A, RepositoryError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(tenant_id, aggregate_id)?;
        validate_stream(tenant_id, aggregate_id, &history)?;

        let mut aggregate = make_aggregate();
        for stored in &history {
            aggregate.apply(&stored.decode::<A::Event>()?);
        }
        Ok(aggregate)
    }

    /// Run `command` against the current state and append what it decides.
    pub fn execute<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        command: &A::Command,
        make_aggregate: impl FnOnce() -> A,
    ) -> Result<Executed<A>, RepositoryError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: furnerp_events::Event + Serialize + DeserializeOwned,
    {
        let aggregate_type = <A::Event as furnerp_events::Event>::STREAM;
        let mut aggregate = self.load(tenant_id, aggregate_id, make_aggregate)?;
        let expected = ExpectedVersion::Exact(aggregate.version());

        let decided = aggregate.handle(command)?;
        if decided.is_empty() {
            return Ok(Executed {
                aggregate,
                committed: Vec::new(),
            });
        }

        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(tenant_id, aggregate_id, aggregate_type, ev))
            .collect::<Result<Vec<_>, _>>()?;
        let committed = self.store.append(uncommitted, expected)?;

        for ev in &decided {
            aggregate.apply(ev);
        }
        tracing::debug!(
            %tenant_id,
            %aggregate_id,
            aggregate_type,
            events = committed.len(),
            version = aggregate.version(),
            "events appended"
        );

        Ok(Executed {
            aggregate,
            committed,
        })
    }
}

fn validate_stream(
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), RepositoryError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.tenant_id != tenant_id || e.aggregate_id != aggregate_id {
            return Err(RepositoryError::TenantIsolation(format!(
                "loaded stream has a foreign event at index {idx}"
            )));
        }
        if e.sequence_number <= last {
            return Err(RepositoryError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence number {} after {last}",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}
