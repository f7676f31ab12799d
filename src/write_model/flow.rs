// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flow write model: trigger → ordered action ids, per organization

use std::collections::BTreeMap;

use super::{Reducer, WriteModel};
use crate::aggregate::{AggregateRef, AggregateType};
use crate::domain::{FlowType, TriggerType};
use crate::event_store::SearchQuery;
use crate::events::{DomainEvent, Event, FlowEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct FlowWriteModel {
    base: WriteModel,
    pub triggers: BTreeMap<(FlowType, TriggerType), Vec<String>>,
}

impl FlowWriteModel {
    pub fn new(org_id: &str, instance_id: &str) -> Self {
        Self {
            base: WriteModel::new(AggregateRef::org_singleton(
                AggregateType::Flow,
                org_id,
                instance_id,
            )),
            triggers: BTreeMap::new(),
        }
    }

    pub fn actions(&self, flow_type: FlowType, trigger_type: TriggerType) -> &[String] {
        self.triggers
            .get(&(flow_type, trigger_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_flow(&self, flow_type: FlowType) -> bool {
        self.triggers
            .iter()
            .any(|((flow, _), actions)| *flow == flow_type && !actions.is_empty())
    }

    /// Triggers whose action list contains `action_id`
    pub fn triggers_referencing(&self, action_id: &str) -> Vec<(FlowType, TriggerType)> {
        self.triggers
            .iter()
            .filter(|(_, actions)| actions.iter().any(|id| id == action_id))
            .map(|(key, _)| *key)
            .collect()
    }
}

impl Reducer for FlowWriteModel {
    type Event = FlowEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base.aggregate_query(FlowEvent::event_types())
    }

    fn apply(&mut self, event: &FlowEvent, _raw: &Event) {
        match event {
            FlowEvent::TriggerActionsSet(set) => {
                let key = (set.flow_type, set.trigger_type);
                if set.action_ids.is_empty() {
                    self.triggers.remove(&key);
                } else {
                    self.triggers.insert(key, set.action_ids.clone());
                }
            }
            FlowEvent::TriggerActionsCascadeRemoved(removed) => {
                if let Some(actions) = self
                    .triggers
                    .get_mut(&(removed.flow_type, removed.trigger_type))
                {
                    actions.retain(|id| *id != removed.action_id);
                }
            }
            FlowEvent::Cleared(cleared) => {
                self.triggers.retain(|(flow, _), _| *flow != cleared.flow_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::flow::{TriggerActionsCascadeRemoved, TriggerActionsSet};
    use chrono::Utc;

    fn raw(model: &FlowWriteModel, event: &FlowEvent, sequence: u64) -> Event {
        Event {
            aggregate: model.base.aggregate.clone(),
            event_type: event.event_type().to_string(),
            payload: event.payload().unwrap(),
            sequence,
            creation_date: Utc::now(),
            creator: "user1".to_string(),
        }
    }

    #[test]
    fn test_cascade_removes_only_the_action() {
        // Arrange
        let mut model = FlowWriteModel::new("org1", "inst1");
        let set = FlowEvent::TriggerActionsSet(TriggerActionsSet {
            flow_type: FlowType::ExternalAuthentication,
            trigger_type: TriggerType::PostAuthentication,
            action_ids: vec!["a1".into(), "a2".into()],
        });
        let cascade = FlowEvent::TriggerActionsCascadeRemoved(TriggerActionsCascadeRemoved {
            flow_type: FlowType::ExternalAuthentication,
            trigger_type: TriggerType::PostAuthentication,
            action_id: "a1".into(),
        });
        let events = vec![raw(&model, &set, 1), raw(&model, &cascade, 2)];

        // Act
        model.append_events(&events);
        model.reduce().unwrap();

        // Assert
        assert_eq!(
            model.actions(FlowType::ExternalAuthentication, TriggerType::PostAuthentication),
            ["a2".to_string()]
        );
        assert!(model.triggers_referencing("a1").is_empty());
        assert_eq!(model.base().processed_sequence, 2);
    }
}
