// Copyright (c) 2025 - Cowboy AI, Inc.
//! Execution write model

use super::{EntityState, ObjectDetails, Reducer, WriteModel};
use crate::aggregate::{AggregateRef, AggregateType};
use crate::domain::ExecutionTarget;
use crate::event_store::SearchQuery;
use crate::events::{DomainEvent, Event, ExecutionEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionWriteModel {
    base: WriteModel,
    pub state: EntityState,
    pub targets: Vec<ExecutionTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub details: ObjectDetails,
    pub targets: Vec<ExecutionTarget>,
}

impl ExecutionWriteModel {
    /// `id` is the condition id, e.g. `request/<method>`
    pub fn new(id: &str, instance_id: &str) -> Self {
        Self {
            base: WriteModel::new(AggregateRef::new(
                AggregateType::Execution,
                id,
                instance_id,
                instance_id,
            )),
            state: EntityState::Unspecified,
            targets: Vec::new(),
        }
    }

    pub fn to_execution(&self) -> Option<Execution> {
        self.state.exists().then(|| Execution {
            details: self.base.details(),
            targets: self.targets.clone(),
        })
    }

    /// Condition ids this execution includes
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().filter_map(|target| match target {
            ExecutionTarget::Include(id) => Some(id.as_str()),
            ExecutionTarget::Target(_) => None,
        })
    }
}

impl Reducer for ExecutionWriteModel {
    type Event = ExecutionEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base.aggregate_query(ExecutionEvent::event_types())
    }

    fn apply(&mut self, event: &ExecutionEvent, _raw: &Event) {
        match event {
            ExecutionEvent::Set(set) => {
                self.targets = set.targets.clone();
                self.state = EntityState::Active;
            }
            ExecutionEvent::Removed(_) => {
                self.targets.clear();
                self.state = EntityState::Removed;
            }
        }
    }
}
