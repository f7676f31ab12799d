// Copyright (c) 2025 - Cowboy AI, Inc.
//! Events of settings policies described by a [`PolicySchema`]

use super::{Changes, DomainEvent, Empty, Event};
use crate::errors::CommandResult;
use crate::policy::PolicySchema;

/// Added / changed / removed for one policy kind
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyEvent<P: PolicySchema> {
    Added(P),
    Changed(Changes<P::Change>),
    Removed,
}

impl<P: PolicySchema> DomainEvent for PolicyEvent<P> {
    fn event_type(&self) -> &'static str {
        match self {
            PolicyEvent::Added(_) => P::ADDED,
            PolicyEvent::Changed(_) => P::CHANGED,
            PolicyEvent::Removed => P::REMOVED,
        }
    }

    fn event_types() -> Vec<&'static str> {
        vec![P::ADDED, P::CHANGED, P::REMOVED]
    }

    fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            PolicyEvent::Added(policy) => serde_json::to_value(policy),
            PolicyEvent::Changed(changes) => serde_json::to_value(changes),
            PolicyEvent::Removed => serde_json::to_value(Empty {}),
        }
    }

    fn decode(event: &Event) -> CommandResult<Option<Self>> {
        let event_type = event.event_type.as_str();
        if event_type == P::ADDED {
            event.payload_as::<P>().map(|p| Some(PolicyEvent::Added(p)))
        } else if event_type == P::CHANGED {
            event
                .payload_as::<Changes<P::Change>>()
                .map(|c| Some(PolicyEvent::Changed(c)))
        } else if event_type == P::REMOVED {
            Ok(Some(PolicyEvent::Removed))
        } else {
            Ok(None)
        }
    }
}
