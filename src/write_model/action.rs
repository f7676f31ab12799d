// Copyright (c) 2025 - Cowboy AI, Inc.
//! Action write model

use std::time::Duration;

use super::{EntityState, ObjectDetails, Reducer, WriteModel};
use crate::aggregate::{AggregateRef, AggregateType};
use crate::event_store::SearchQuery;
use crate::events::action::ActionChange;
use crate::events::{ActionEvent, DomainEvent, Event};

#[derive(Debug, Clone, PartialEq)]
pub struct ActionWriteModel {
    base: WriteModel,
    pub state: EntityState,
    pub name: String,
    pub script: String,
    pub timeout: Duration,
    pub allowed_to_fail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub details: ObjectDetails,
    pub state: EntityState,
    pub name: String,
    pub script: String,
    pub timeout: Duration,
    pub allowed_to_fail: bool,
}

impl ActionWriteModel {
    pub fn new(id: &str, org_id: &str, instance_id: &str) -> Self {
        Self {
            base: WriteModel::new(AggregateRef::new(
                AggregateType::Action,
                id,
                org_id,
                instance_id,
            )),
            state: EntityState::Unspecified,
            name: String::new(),
            script: String::new(),
            timeout: Duration::ZERO,
            allowed_to_fail: false,
        }
    }

    pub fn to_action(&self) -> Option<Action> {
        self.state.exists().then(|| Action {
            details: self.base.details(),
            state: self.state,
            name: self.name.clone(),
            script: self.script.clone(),
            timeout: self.timeout,
            allowed_to_fail: self.allowed_to_fail,
        })
    }
}

impl Reducer for ActionWriteModel {
    type Event = ActionEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base
            .aggregate_query(ActionEvent::event_types())
            .resource_owner(self.base.resource_owner())
    }

    fn apply(&mut self, event: &ActionEvent, _raw: &Event) {
        match event {
            ActionEvent::Added(added) => {
                self.name = added.name.clone();
                self.script = added.script.clone();
                self.timeout = added.timeout;
                self.allowed_to_fail = added.allowed_to_fail;
                self.state = EntityState::Active;
            }
            ActionEvent::Changed(changed) => {
                for change in &changed.changes {
                    match change {
                        ActionChange::Name(name) => self.name = name.clone(),
                        ActionChange::Script(script) => self.script = script.clone(),
                        ActionChange::Timeout(timeout) => self.timeout = *timeout,
                        ActionChange::AllowedToFail(allowed) => self.allowed_to_fail = *allowed,
                    }
                }
            }
            ActionEvent::Deactivated(_) => self.state = EntityState::Inactive,
            ActionEvent::Reactivated(_) => self.state = EntityState::Active,
            ActionEvent::Removed(_) => self.state = EntityState::Removed,
        }
    }
}
