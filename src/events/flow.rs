// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flow aggregate events
//!
//! One flow aggregate exists per organization (id = organization id). It
//! records which actions run at which trigger of which flow type.

use serde::{Deserialize, Serialize};

use crate::domain::{FlowType, TriggerType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlowEvent {
    TriggerActionsSet(TriggerActionsSet),
    TriggerActionsCascadeRemoved(TriggerActionsCascadeRemoved),
    Cleared(FlowCleared),
}

domain_event!(FlowEvent {
    TriggerActionsSet(TriggerActionsSet) => "flow.trigger_actions.set",
    TriggerActionsCascadeRemoved(TriggerActionsCascadeRemoved) => "flow.trigger_actions.cascade.removed",
    Cleared(FlowCleared) => "flow.cleared",
});

/// Replaces the ordered action list of one trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerActionsSet {
    pub flow_type: FlowType,
    pub trigger_type: TriggerType,
    pub action_ids: Vec<String>,
}

/// Drops one action from a trigger because the action was deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerActionsCascadeRemoved {
    pub flow_type: FlowType,
    pub trigger_type: TriggerType,
    pub action_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCleared {
    pub flow_type: FlowType,
}
