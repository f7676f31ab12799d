// Copyright (c) 2025 - Cowboy AI, Inc.
//! Write model of one settings policy on one level

use super::{EntityState, ObjectDetails, Reducer, WriteModel};
use crate::event_store::SearchQuery;
use crate::events::{DomainEvent, Event, PolicyEvent};
use crate::policy::{PolicyLevel, PolicySchema};

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyWriteModel<P: PolicySchema> {
    base: WriteModel,
    pub level: PolicyLevel,
    pub state: EntityState,
    pub policy: Option<P>,
}

impl<P: PolicySchema> PolicyWriteModel<P> {
    pub fn new(level: PolicyLevel, instance_id: &str) -> Self {
        Self {
            base: WriteModel::new(level.aggregate(P::AGGREGATE_TYPE, instance_id)),
            level,
            state: EntityState::Unspecified,
            policy: None,
        }
    }

    /// Policy and details while active
    pub fn projection(&self) -> Option<(P, ObjectDetails)> {
        match (&self.state, &self.policy) {
            (EntityState::Active, Some(policy)) => Some((policy.clone(), self.base.details())),
            _ => None,
        }
    }
}

impl<P: PolicySchema> Reducer for PolicyWriteModel<P> {
    type Event = PolicyEvent<P>;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base
            .aggregate_query(PolicyEvent::<P>::event_types())
            .resource_owner(self.base.resource_owner())
    }

    fn apply(&mut self, event: &PolicyEvent<P>, _raw: &Event) {
        match event {
            PolicyEvent::Added(policy) => {
                self.policy = Some(policy.clone());
                self.state = EntityState::Active;
            }
            PolicyEvent::Changed(changed) => {
                if let Some(policy) = self.policy.as_mut() {
                    for change in &changed.changes {
                        policy.apply(change);
                    }
                }
            }
            PolicyEvent::Removed => {
                self.policy = None;
                self.state = EntityState::Removed;
            }
        }
    }
}
