// Copyright (c) 2025 - Cowboy AI, Inc.
//! Execution conditions and targets
//!
//! An execution is addressed by its condition. The condition id doubles as the
//! aggregate id, so "the execution for request `/user.v2.UserService/AddHuman`"
//! is a single aggregate no matter how often it is set or removed.
//!
//! ```text
//! request/<method>     request/<service>     request
//! response/<method>    response/<service>    response
//! function/<name>
//! event/<event_type>   event/<group>.*       event
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector for API based conditions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiCondition {
    Method(String),
    Service(String),
    All,
}

/// Selector for event based conditions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCondition {
    Event(String),
    Group(String),
    All,
}

/// When an execution runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionCondition {
    Request(ApiCondition),
    Response(ApiCondition),
    Function(String),
    Event(EventCondition),
}

impl ExecutionCondition {
    /// Whether every selector is present; purely syntactic
    pub fn is_valid(&self) -> bool {
        match self {
            ExecutionCondition::Request(api) | ExecutionCondition::Response(api) => match api {
                ApiCondition::Method(value) | ApiCondition::Service(value) => {
                    !value.trim().is_empty()
                }
                ApiCondition::All => true,
            },
            ExecutionCondition::Function(name) => !name.trim().is_empty(),
            ExecutionCondition::Event(event) => match event {
                EventCondition::Event(value) | EventCondition::Group(value) => {
                    !value.trim().is_empty()
                }
                EventCondition::All => true,
            },
        }
    }

    /// Aggregate id of the execution for this condition
    pub fn id(&self) -> String {
        match self {
            ExecutionCondition::Request(api) => api_id("request", api),
            ExecutionCondition::Response(api) => api_id("response", api),
            ExecutionCondition::Function(name) => format!("function/{}", name.trim()),
            ExecutionCondition::Event(EventCondition::Event(event)) => {
                format!("event/{}", event.trim())
            }
            ExecutionCondition::Event(EventCondition::Group(group)) => {
                format!("event/{}.*", group.trim())
            }
            ExecutionCondition::Event(EventCondition::All) => "event".to_string(),
        }
    }
}

fn api_id(prefix: &str, api: &ApiCondition) -> String {
    match api {
        ApiCondition::Method(method) => format!("{}/{}", prefix, method.trim()),
        ApiCondition::Service(service) => format!("{}/{}", prefix, service.trim()),
        ApiCondition::All => prefix.to_string(),
    }
}

impl fmt::Display for ExecutionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// What an execution calls, in order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ExecutionTarget {
    /// A target by id
    Target(String),
    /// Every target of another execution, by condition id
    Include(String),
}

impl ExecutionTarget {
    pub fn reference(&self) -> &str {
        match self {
            ExecutionTarget::Target(id) | ExecutionTarget::Include(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_ids() {
        let method = ExecutionCondition::Request(ApiCondition::Method(
            "/user.v2.UserService/AddHuman".to_string(),
        ));
        assert_eq!(method.id(), "request//user.v2.UserService/AddHuman");
        assert_eq!(ExecutionCondition::Response(ApiCondition::All).id(), "response");
        assert_eq!(
            ExecutionCondition::Event(EventCondition::Group("user".into())).id(),
            "event/user.*"
        );
        assert_eq!(
            ExecutionCondition::Function("preuserinfo".into()).id(),
            "function/preuserinfo"
        );
    }

    #[test]
    fn test_condition_validity() {
        assert!(ExecutionCondition::Request(ApiCondition::All).is_valid());
        assert!(!ExecutionCondition::Request(ApiCondition::Method(" ".into())).is_valid());
        assert!(!ExecutionCondition::Function(String::new()).is_valid());
        assert!(!ExecutionCondition::Event(EventCondition::Group(String::new())).is_valid());
    }
}
