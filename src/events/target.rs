// Copyright (c) 2025 - Cowboy AI, Inc.
//! Target aggregate events

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Changes;
use crate::crypto::CryptoValue;
use crate::domain::{Endpoint, TargetType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetEvent {
    Added(TargetAdded),
    Changed(Changes<TargetChange>),
    Removed(TargetRemoved),
}

domain_event!(TargetEvent {
    Added(TargetAdded) => "target.added",
    Changed(Changes<TargetChange>) => "target.changed",
    Removed(TargetRemoved) => "target.removed",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAdded {
    pub name: String,
    pub target_type: TargetType,
    pub endpoint: Endpoint,
    pub timeout: Duration,
    pub interrupt_on_error: bool,
    pub signing_key: CryptoValue,
}

/// One changed target field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TargetChange {
    Name(String),
    TargetType(TargetType),
    Endpoint(Endpoint),
    Timeout(Duration),
    InterruptOnError(bool),
    SigningKey(CryptoValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRemoved {
    /// Name at removal time, its unique claim is released
    pub name: String,
}
