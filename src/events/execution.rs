// Copyright (c) 2025 - Cowboy AI, Inc.
//! Execution aggregate events

use serde::{Deserialize, Serialize};

use super::Empty;
use crate::domain::ExecutionTarget;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
    Set(ExecutionSet),
    Removed(Empty),
}

domain_event!(ExecutionEvent {
    Set(ExecutionSet) => "execution.set",
    Removed(Empty) => "execution.removed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSet {
    pub targets: Vec<ExecutionTarget>,
}
