// Copyright (c) 2025 - Cowboy AI, Inc.
//! Action aggregate events

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Changes, Empty};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionEvent {
    Added(ActionAdded),
    Changed(Changes<ActionChange>),
    Deactivated(Empty),
    Reactivated(Empty),
    Removed(ActionRemoved),
}

domain_event!(ActionEvent {
    Added(ActionAdded) => "action.added",
    Changed(Changes<ActionChange>) => "action.changed",
    Deactivated(Empty) => "action.deactivated",
    Reactivated(Empty) => "action.reactivated",
    Removed(ActionRemoved) => "action.removed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAdded {
    pub name: String,
    pub script: String,
    pub timeout: Duration,
    pub allowed_to_fail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ActionChange {
    Name(String),
    Script(String),
    Timeout(Duration),
    AllowedToFail(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRemoved {
    pub name: String,
}
