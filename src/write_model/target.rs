// Copyright (c) 2025 - Cowboy AI, Inc.
//! Target write model

use std::time::Duration;

use super::{EntityState, ObjectDetails, Reducer, WriteModel};
use crate::aggregate::{AggregateRef, AggregateType};
use crate::crypto::CryptoValue;
use crate::domain::{Endpoint, TargetType};
use crate::event_store::SearchQuery;
use crate::events::target::TargetChange;
use crate::events::{DomainEvent, Event, TargetEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct TargetWriteModel {
    base: WriteModel,
    pub state: EntityState,
    pub name: String,
    pub target_type: Option<TargetType>,
    pub endpoint: Option<Endpoint>,
    pub timeout: Duration,
    pub interrupt_on_error: bool,
    pub signing_key: Option<CryptoValue>,
}

/// Target as returned to callers
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub details: ObjectDetails,
    pub name: String,
    pub target_type: TargetType,
    pub endpoint: Endpoint,
    pub timeout: Duration,
    pub interrupt_on_error: bool,
    pub signing_key: CryptoValue,
}

impl TargetWriteModel {
    pub fn new(id: &str, resource_owner: &str, instance_id: &str) -> Self {
        Self {
            base: WriteModel::new(AggregateRef::new(
                AggregateType::Target,
                id,
                resource_owner,
                instance_id,
            )),
            state: EntityState::Unspecified,
            name: String::new(),
            target_type: None,
            endpoint: None,
            timeout: Duration::ZERO,
            interrupt_on_error: false,
            signing_key: None,
        }
    }

    /// Projection, present while the target exists
    pub fn to_target(&self) -> Option<Target> {
        if !self.state.exists() {
            return None;
        }
        Some(Target {
            details: self.base.details(),
            name: self.name.clone(),
            target_type: self.target_type?,
            endpoint: self.endpoint.clone()?,
            timeout: self.timeout,
            interrupt_on_error: self.interrupt_on_error,
            signing_key: self.signing_key.clone()?,
        })
    }
}

impl Reducer for TargetWriteModel {
    type Event = TargetEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base.aggregate_query(TargetEvent::event_types())
    }

    fn apply(&mut self, event: &TargetEvent, _raw: &Event) {
        match event {
            TargetEvent::Added(added) => {
                self.name = added.name.clone();
                self.target_type = Some(added.target_type);
                self.endpoint = Some(added.endpoint.clone());
                self.timeout = added.timeout;
                self.interrupt_on_error = added.interrupt_on_error;
                self.signing_key = Some(added.signing_key.clone());
                self.state = EntityState::Active;
            }
            TargetEvent::Changed(changed) => {
                for change in &changed.changes {
                    match change {
                        TargetChange::Name(name) => self.name = name.clone(),
                        TargetChange::TargetType(target_type) => {
                            self.target_type = Some(*target_type)
                        }
                        TargetChange::Endpoint(endpoint) => self.endpoint = Some(endpoint.clone()),
                        TargetChange::Timeout(timeout) => self.timeout = *timeout,
                        TargetChange::InterruptOnError(interrupt) => {
                            self.interrupt_on_error = *interrupt
                        }
                        TargetChange::SigningKey(key) => self.signing_key = Some(key.clone()),
                    }
                }
            }
            TargetEvent::Removed(_) => self.state = EntityState::Removed,
        }
    }
}
