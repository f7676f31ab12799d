// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Store Abstraction
//!
//! The event log gateway is the single source of truth and the only
//! synchronization point of the command side. Commands talk to it twice at
//! most: once to hydrate a write model, once to push.
//!
//! # Architecture
//!
//! ```text
//! Command ──filter(SearchQuery)──► EventStore ──► Vec<Event> ──► WriteModel::reduce
//!    │
//!    └────push(PushRequest)──────► EventStore ──► Vec<Event> ──► fold-back
//!            │                        │
//!            │                        ├─ expected sequence per aggregate (compare-and-append)
//!            │                        └─ unique claims / releases (all-or-nothing)
//! ```
//!
//! # Event Store Requirements
//!
//! 1. **Append-Only**: events are never updated or deleted
//! 2. **Ordered**: sequences are contiguous per aggregate, starting at 1
//! 3. **Atomic**: a push commits every event and every unique claim, or nothing
//! 4. **Optimistic**: a push naming an expected sequence fails unless it is still the tip

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::aggregate::{AggregateKey, AggregateType};
use crate::errors::EventStoreError;
use crate::events::{Event, PendingEvent};

pub mod memory;

pub use memory::InMemoryEventStore;

/// Event log gateway
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events matching `query`, ascending sequence within each aggregate and
    /// commit order across aggregates
    async fn filter(&self, query: &SearchQuery) -> Result<Vec<Event>, EventStoreError>;

    /// Append a batch atomically
    ///
    /// # Errors
    ///
    /// - `Conflict` if an expected sequence no longer matches the aggregate tip
    /// - `UniqueConstraintViolation` if a claim collides with a live claim
    /// - `Storage` if the backend fails
    async fn push(&self, request: PushRequest) -> Result<Vec<Event>, EventStoreError>;
}

/// Filter over the event log
///
/// Empty criteria match everything; set criteria must all match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub instance_id: Option<String>,
    pub resource_owner: Option<String>,
    pub aggregate_types: Vec<AggregateType>,
    pub aggregate_ids: Vec<String>,
    pub event_types: Vec<&'static str>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn resource_owner(mut self, resource_owner: impl Into<String>) -> Self {
        self.resource_owner = Some(resource_owner.into());
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: AggregateType) -> Self {
        self.aggregate_types.push(aggregate_type);
        self
    }

    pub fn aggregate_id(mut self, aggregate_id: impl Into<String>) -> Self {
        self.aggregate_ids.push(aggregate_id.into());
        self
    }

    pub fn event_types(mut self, event_types: impl IntoIterator<Item = &'static str>) -> Self {
        self.event_types.extend(event_types);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        let aggregate = &event.aggregate;

        self.instance_id
            .as_ref()
            .map_or(true, |id| *id == aggregate.instance_id)
            && self
                .resource_owner
                .as_ref()
                .map_or(true, |owner| *owner == aggregate.resource_owner)
            && (self.aggregate_types.is_empty()
                || self.aggregate_types.contains(&aggregate.aggregate_type))
            && (self.aggregate_ids.is_empty() || self.aggregate_ids.contains(&aggregate.id))
            && (self.event_types.is_empty()
                || self.event_types.iter().any(|t| *t == event.event_type))
    }
}

/// An atomic batch for [`EventStore::push`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushRequest {
    pub events: Vec<PendingEvent>,
    /// Expected tip per aggregate; aggregates not listed are appended at their tip
    pub expectations: BTreeMap<AggregateKey, u64>,
}

impl PushRequest {
    pub fn new(events: Vec<PendingEvent>) -> Self {
        Self {
            events,
            expectations: BTreeMap::new(),
        }
    }

    /// Require `aggregate` to still be at `sequence` when the batch commits
    pub fn expect(mut self, aggregate: AggregateKey, sequence: u64) -> Self {
        self.expectations.insert(aggregate, sequence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateRef;
    use chrono::Utc;

    fn event(aggregate: AggregateRef, event_type: &str) -> Event {
        Event {
            aggregate,
            event_type: event_type.to_string(),
            payload: serde_json::json!({}),
            sequence: 1,
            creation_date: Utc::now(),
            creator: "user1".to_string(),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let e = event(
            AggregateRef::new(AggregateType::Target, "id1", "instance", "instance"),
            "target.added",
        );

        assert!(SearchQuery::new().matches(&e));
    }

    #[test]
    fn test_query_criteria_are_conjunctive() {
        let e = event(
            AggregateRef::new(AggregateType::Action, "a1", "org1", "inst1"),
            "action.added",
        );

        let query = SearchQuery::new()
            .instance_id("inst1")
            .resource_owner("org1")
            .aggregate_type(AggregateType::Action)
            .aggregate_id("a1")
            .event_types(["action.added", "action.changed"]);

        assert!(query.matches(&e));
        assert!(!query.clone().resource_owner("org2").matches(&e));
        assert!(!SearchQuery::new()
            .event_types(["action.removed"])
            .matches(&e));
        assert!(!SearchQuery::new().instance_id("inst2").matches(&e));
    }
}
