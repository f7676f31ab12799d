// Copyright (c) 2025 - Cowboy AI, Inc.
//! Write Models
//!
//! A write model is the current state of one aggregate, rebuilt by folding its
//! events in log order. It is the only input to the diff builders and state
//! checks of a command.
//!
//! # Lifecycle
//!
//! ```text
//! new(aggregate) ──► filter_and_fold ──► diff / state check ──► push ──► fold-back
//!      empty          (hydrated)                                       (same instance)
//! ```
//!
//! # Folding
//!
//! - [`Reducer::append_events`] buffers the events selected by the model's
//!   [`Reducer::query`]; everything else is ignored without error.
//! - [`Reducer::reduce`] decodes the buffer in arrival order, applies every
//!   recognised event and advances `processed_sequence`.
//!
//! Models that own sub-models (an identity-provider configuration owns its
//! OIDC and JWT models) override both methods, call [`buffer_events`] /
//! [`fold_pending`] for themselves and delegate to the sub-models explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::AggregateRef;
use crate::event_store::{EventStore, SearchQuery};
use crate::errors::CommandResult;
use crate::events::{DomainEvent, Event};

pub mod action;
pub mod execution;
pub mod flow;
pub mod idp;
pub mod login_policy;
pub mod policy;
pub mod smtp;
pub mod target;
pub mod user;

/// Lifecycle of the entity a write model represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    #[default]
    Unspecified,
    Active,
    Inactive,
    Removed,
}

impl EntityState {
    /// Added and not removed
    pub fn exists(&self) -> bool {
        matches!(self, EntityState::Active | EntityState::Inactive)
    }
}

/// Caller facing summary of a write: which object, at which sequence, when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDetails {
    pub id: String,
    pub sequence: u64,
    pub event_date: Option<DateTime<Utc>>,
    pub resource_owner: String,
}

/// Fields shared by every write model
#[derive(Debug, Clone, PartialEq)]
pub struct WriteModel {
    pub aggregate: AggregateRef,
    /// Sequence of the last folded event; the expected tip for the next push
    pub processed_sequence: u64,
    pub change_date: Option<DateTime<Utc>>,
    pending: Vec<Event>,
}

impl WriteModel {
    pub fn new(aggregate: AggregateRef) -> Self {
        Self {
            aggregate,
            processed_sequence: 0,
            change_date: None,
            pending: Vec::new(),
        }
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate.id
    }

    pub fn resource_owner(&self) -> &str {
        &self.aggregate.resource_owner
    }

    pub fn instance_id(&self) -> &str {
        &self.aggregate.instance_id
    }

    pub fn details(&self) -> ObjectDetails {
        ObjectDetails {
            id: self.aggregate.id.clone(),
            sequence: self.processed_sequence,
            event_date: self.change_date,
            resource_owner: self.aggregate.resource_owner.clone(),
        }
    }

    /// Query for every event of this aggregate with the given types
    pub fn aggregate_query(&self, event_types: Vec<&'static str>) -> SearchQuery {
        SearchQuery::new()
            .instance_id(self.aggregate.instance_id.clone())
            .aggregate_type(self.aggregate.aggregate_type)
            .aggregate_id(self.aggregate.id.clone())
            .event_types(event_types)
    }

    fn record(&mut self, event: &Event) {
        if event.aggregate.key() == self.aggregate.key() {
            self.processed_sequence = self.processed_sequence.max(event.sequence);
            self.change_date = Some(event.creation_date);
            self.aggregate.resource_owner = event.aggregate.resource_owner.clone();
        }
    }
}

/// Folding contract of a write model
pub trait Reducer: Send {
    type Event: DomainEvent;

    fn base(&self) -> &WriteModel;

    fn base_mut(&mut self) -> &mut WriteModel;

    /// Filter for exactly the events this model folds
    fn query(&self) -> SearchQuery;

    /// Apply one decoded event
    fn apply(&mut self, event: &Self::Event, raw: &Event);

    fn append_events(&mut self, events: &[Event]) {
        buffer_events(self, events);
    }

    fn reduce(&mut self) -> CommandResult<()> {
        fold_pending(self)
    }
}

/// Buffer the events `model` selects
pub fn buffer_events<R: Reducer + ?Sized>(model: &mut R, events: &[Event]) {
    let query = model.query();
    model
        .base_mut()
        .pending
        .extend(events.iter().filter(|event| query.matches(event)).cloned());
}

/// Fold the buffered events of `model` in arrival order
pub fn fold_pending<R: Reducer + ?Sized>(model: &mut R) -> CommandResult<()> {
    let pending = std::mem::take(&mut model.base_mut().pending);
    for raw in &pending {
        if let Some(event) = R::Event::decode(raw)? {
            model.apply(&event, raw);
        }
        model.base_mut().record(raw);
    }
    Ok(())
}

/// Hydrate `model` from the log
pub async fn filter_and_fold<R: Reducer + ?Sized>(
    store: &dyn EventStore,
    model: &mut R,
) -> CommandResult<()> {
    let query = model.query();
    let events = store.filter(&query).await?;
    debug!(
        aggregate = %model.base().aggregate,
        events = events.len(),
        "Hydrating write model"
    );
    model.append_events(&events);
    model.reduce()
}
