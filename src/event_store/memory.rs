// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory event store
//!
//! Keeps the whole log in a `Vec` behind a `tokio::sync::RwLock`. Every push
//! is validated completely (expected sequences, then unique constraints in
//! batch order) before the first event is appended, so a failed push leaves
//! no trace.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{EventStore, PushRequest, SearchQuery};
use crate::aggregate::AggregateKey;
use crate::errors::EventStoreError;
use crate::events::{Event, PendingEvent, UniqueConstraintAction};

/// (instance id, unique type, unique field)
type UniqueKey = (String, String, String);

#[derive(Debug, Default)]
struct Log {
    events: Vec<Event>,
    tips: HashMap<AggregateKey, u64>,
    unique: HashSet<UniqueKey>,
}

/// Event store for tests, demos and single-process use
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    log: RwLock<Log>,
    filter_calls: AtomicUsize,
    push_calls: AtomicUsize,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events without expectations and without counting a push
    ///
    /// Unique constraints are still applied, so seeded claims collide with
    /// later commands exactly like pushed ones.
    pub async fn seed(&self, events: Vec<PendingEvent>) -> Result<Vec<Event>, EventStoreError> {
        let mut log = self.log.write().await;
        commit(&mut log, PushRequest::new(events))
    }

    /// Snapshot of the whole log in commit order
    pub async fn events(&self) -> Vec<Event> {
        self.log.read().await.events.clone()
    }

    pub fn filter_calls(&self) -> usize {
        self.filter_calls.load(Ordering::SeqCst)
    }

    pub fn push_calls(&self) -> usize {
        self.push_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn filter(&self, query: &SearchQuery) -> Result<Vec<Event>, EventStoreError> {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);

        let log = self.log.read().await;
        let events: Vec<Event> = log
            .events
            .iter()
            .filter(|event| query.matches(event))
            .cloned()
            .collect();

        debug!(matched = events.len(), "Filtered event log");
        Ok(events)
    }

    async fn push(&self, request: PushRequest) -> Result<Vec<Event>, EventStoreError> {
        self.push_calls.fetch_add(1, Ordering::SeqCst);

        let mut log = self.log.write().await;
        commit(&mut log, request)
    }
}

fn commit(log: &mut Log, request: PushRequest) -> Result<Vec<Event>, EventStoreError> {
    for (aggregate, expected) in &request.expectations {
        let actual = log.tips.get(aggregate).copied().unwrap_or(0);
        if actual != *expected {
            warn!(%aggregate, expected, actual, "Rejected push: sequence conflict");
            return Err(EventStoreError::Conflict {
                aggregate: aggregate.to_string(),
                expected: *expected,
                actual,
            });
        }
    }

    let mut unique = log.unique.clone();
    for event in &request.events {
        for constraint in &event.unique_constraints {
            let key = (
                event.aggregate.instance_id.clone(),
                constraint.unique_type.clone(),
                constraint.unique_field.clone(),
            );
            match constraint.action {
                UniqueConstraintAction::Add => {
                    if !unique.insert(key) {
                        warn!(
                            unique_type = %constraint.unique_type,
                            unique_field = %constraint.unique_field,
                            "Rejected push: unique constraint violation"
                        );
                        return Err(EventStoreError::UniqueConstraintViolation {
                            unique_type: constraint.unique_type.clone(),
                            unique_field: constraint.unique_field.clone(),
                            message: constraint.message.clone(),
                            on_violation: constraint.on_violation,
                        });
                    }
                }
                UniqueConstraintAction::Remove => {
                    unique.remove(&key);
                }
            }
        }
    }

    let now = Utc::now();
    let mut committed = Vec::with_capacity(request.events.len());
    for pending in request.events {
        let tip = log.tips.entry(pending.aggregate.key()).or_insert(0);
        *tip += 1;
        committed.push(Event {
            aggregate: pending.aggregate,
            event_type: pending.event_type.to_string(),
            payload: pending.payload,
            sequence: *tip,
            creation_date: now,
            creator: pending.creator,
        });
    }

    log.events.extend(committed.iter().cloned());
    log.unique = unique;

    debug!(count = committed.len(), "Committed events");
    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateRef, AggregateType};
    use crate::errors::ViolationKind;
    use crate::events::UniqueConstraint;

    fn pending(id: &str, event_type: &'static str) -> PendingEvent {
        PendingEvent {
            aggregate: AggregateRef::new(AggregateType::Target, id, "instance", "instance"),
            event_type,
            payload: serde_json::json!({}),
            creator: "user1".to_string(),
            unique_constraints: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_sequences_are_contiguous_per_aggregate() {
        // Arrange
        let store = InMemoryEventStore::new();

        // Act
        let committed = store
            .push(PushRequest::new(vec![
                pending("a", "target.added"),
                pending("b", "target.added"),
                pending("a", "target.changed"),
            ]))
            .await
            .unwrap();

        // Assert
        let sequences: Vec<(String, u64)> = committed
            .iter()
            .map(|e| (e.aggregate.id.clone(), e.sequence))
            .collect();
        assert_eq!(
            sequences,
            vec![("a".into(), 1), ("b".into(), 1), ("a".into(), 2)]
        );
    }

    #[tokio::test]
    async fn test_stale_expectation_is_a_conflict() {
        let store = InMemoryEventStore::new();
        let key = AggregateRef::new(AggregateType::Target, "a", "instance", "instance").key();
        store
            .push(PushRequest::new(vec![pending("a", "target.added")]).expect(key.clone(), 0))
            .await
            .unwrap();

        let result = store
            .push(PushRequest::new(vec![pending("a", "target.changed")]).expect(key, 0))
            .await;

        assert_eq!(
            result,
            Err(EventStoreError::Conflict {
                aggregate: "instance:target/a".to_string(),
                expected: 0,
                actual: 1,
            })
        );
        assert_eq!(store.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unique_collision_rejects_whole_batch() {
        // Arrange
        let store = InMemoryEventStore::new();
        store
            .seed(vec![pending("a", "target.added")
                .with_constraint(UniqueConstraint::claim("target_names", "hook", "taken"))])
            .await
            .unwrap();

        // Act
        let result = store
            .push(PushRequest::new(vec![
                pending("b", "target.removed"),
                pending("c", "target.added").with_constraint(
                    UniqueConstraint::claim("target_names", "hook", "taken")
                        .on_violation(ViolationKind::PreconditionFailed),
                ),
            ]))
            .await;

        // Assert
        assert!(matches!(
            result,
            Err(EventStoreError::UniqueConstraintViolation {
                on_violation: ViolationKind::PreconditionFailed,
                ..
            })
        ));
        assert_eq!(store.events().await.len(), 1);
        assert_eq!(store.push_calls(), 1);
    }

    #[tokio::test]
    async fn test_release_then_claim_in_one_batch() {
        let store = InMemoryEventStore::new();
        store
            .seed(vec![pending("a", "target.added")
                .with_constraint(UniqueConstraint::claim("target_names", "old", "taken"))])
            .await
            .unwrap();

        let renamed = store
            .push(PushRequest::new(vec![pending("a", "target.changed")
                .with_constraint(UniqueConstraint::release("target_names", "old"))
                .with_constraint(UniqueConstraint::claim("target_names", "new", "taken"))]))
            .await;
        let reclaimed = store
            .push(PushRequest::new(vec![pending("b", "target.added")
                .with_constraint(UniqueConstraint::claim("target_names", "old", "taken"))]))
            .await;

        assert!(renamed.is_ok());
        assert!(reclaimed.is_ok());
    }

    #[tokio::test]
    async fn test_unique_claims_are_scoped_per_instance() {
        let store = InMemoryEventStore::new();
        let mut other = pending("b", "target.added")
            .with_constraint(UniqueConstraint::claim("target_names", "hook", "taken"));
        other.aggregate.instance_id = "other".to_string();

        store
            .seed(vec![pending("a", "target.added")
                .with_constraint(UniqueConstraint::claim("target_names", "hook", "taken"))])
            .await
            .unwrap();

        assert!(store.push(PushRequest::new(vec![other])).await.is_ok());
    }

    #[tokio::test]
    async fn test_filter_counts_calls() {
        let store = InMemoryEventStore::new();
        store.seed(vec![pending("a", "target.added")]).await.unwrap();

        let events = store
            .filter(&SearchQuery::new().aggregate_id("a"))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(store.filter_calls(), 1);
        assert_eq!(store.push_calls(), 0);
    }
}
