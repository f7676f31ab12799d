// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM Domain Events
//!
//! Events are immutable facts in the log. Two shapes exist:
//!
//! - [`PendingEvent`]: built by a command, not yet in the log. Carries the
//!   unique constraint claims and releases that must commit with it.
//! - [`Event`]: committed, with the per-aggregate sequence and creation date
//!   assigned by the event store.
//!
//! Payloads are stored as JSON. Each aggregate has a typed sum type
//! (`TargetEvent`, `ActionEvent`, ...) implementing [`DomainEvent`], which maps
//! variants to event type strings and back.
//!
//! # Event Flow
//!
//! ```text
//! Command → typed event → PendingEvent → EventStore::push → Event → WriteModel::reduce
//!                          (+ unique claims)                 (sequence assigned)
//! ```
//!
//! # Decoding
//!
//! Decoding matches the event type string exhaustively against the variants
//! of the sum type:
//! - a known type with a broken payload is a fatal [`CommandError::Decode`]
//! - an unknown type decodes to `None` and is skipped by the write model

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateRef;
use crate::errors::{CommandError, CommandResult, EventStoreError, ViolationKind};

/// Implements [`DomainEvent`] for a sum type whose variants each wrap one payload struct
macro_rules! domain_event {
    ($name:ident { $($variant:ident($payload:ty) => $event_type:literal),+ $(,)? }) => {
        impl $crate::events::DomainEvent for $name {
            fn event_type(&self) -> &'static str {
                match self {
                    $( $name::$variant(_) => $event_type, )+
                }
            }

            fn event_types() -> Vec<&'static str> {
                vec![$($event_type),+]
            }

            fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
                match self {
                    $( $name::$variant(inner) => serde_json::to_value(inner), )+
                }
            }

            fn decode(
                event: &$crate::events::Event,
            ) -> $crate::errors::CommandResult<Option<Self>> {
                match event.event_type.as_str() {
                    $( $event_type => event.payload_as::<$payload>().map(|p| Some($name::$variant(p))), )+
                    _ => Ok(None),
                }
            }
        }
    };
}

pub mod action;
pub mod execution;
pub mod flow;
pub mod idp;
pub mod login_policy;
pub mod policy;
pub mod smtp;
pub mod target;
pub mod user;

pub use action::ActionEvent;
pub use execution::ExecutionEvent;
pub use flow::FlowEvent;
pub use idp::{IdpConfigEvent, JwtConfigEvent, OidcConfigEvent};
pub use login_policy::LoginPolicyEvent;
pub use policy::PolicyEvent;
pub use smtp::SmtpConfigEvent;
pub use target::TargetEvent;
pub use user::UserEvent;

/// A typed event sum type for one aggregate
pub trait DomainEvent: Sized + Send + Sync {
    /// Type string of this variant, e.g. `target.added`
    fn event_type(&self) -> &'static str;

    /// Every type string this sum type decodes
    fn event_types() -> Vec<&'static str>;

    /// JSON payload of this variant
    fn payload(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Decode a committed event; `None` if the type is not one of ours
    fn decode(event: &Event) -> CommandResult<Option<Self>>;
}

/// A committed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub aggregate: AggregateRef,
    pub event_type: String,
    pub payload: serde_json::Value,
    /// Position within the aggregate, starting at 1
    pub sequence: u64,
    pub creation_date: DateTime<Utc>,
    /// User that caused the event
    pub creator: String,
}

impl Event {
    /// Deserialize the payload into `T`
    pub fn payload_as<T: DeserializeOwned>(&self) -> CommandResult<T> {
        serde_json::from_value(self.payload.clone()).map_err(|err| CommandError::Decode {
            event_type: self.event_type.clone(),
            sequence: self.sequence,
            reason: err.to_string(),
        })
    }
}

/// Whether a constraint takes or frees a unique key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueConstraintAction {
    Add,
    Remove,
}

/// A unique key claimed or released together with an event
///
/// Keys are scoped per instance. Callers that need a narrower scope (per
/// organization, per owner) fold it into `unique_field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub unique_type: String,
    pub unique_field: String,
    pub action: UniqueConstraintAction,
    /// Message key reported on collision
    pub message: String,
    pub on_violation: ViolationKind,
}

impl UniqueConstraint {
    pub fn claim(
        unique_type: impl Into<String>,
        unique_field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            unique_type: unique_type.into(),
            unique_field: unique_field.into(),
            action: UniqueConstraintAction::Add,
            message: message.into(),
            on_violation: ViolationKind::AlreadyExists,
        }
    }

    pub fn release(unique_type: impl Into<String>, unique_field: impl Into<String>) -> Self {
        Self {
            unique_type: unique_type.into(),
            unique_field: unique_field.into(),
            action: UniqueConstraintAction::Remove,
            message: String::new(),
            on_violation: ViolationKind::AlreadyExists,
        }
    }

    /// Report a collision as `kind` instead of `AlreadyExists`
    pub fn on_violation(mut self, kind: ViolationKind) -> Self {
        self.on_violation = kind;
        self
    }
}

/// An event waiting to be pushed
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub aggregate: AggregateRef,
    pub event_type: &'static str,
    pub payload: serde_json::Value,
    pub creator: String,
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl PendingEvent {
    pub fn new<E: DomainEvent>(
        aggregate: &AggregateRef,
        creator: &str,
        event: &E,
    ) -> CommandResult<Self> {
        let payload = event.payload().map_err(EventStoreError::from)?;
        Ok(Self {
            aggregate: aggregate.clone(),
            event_type: event.event_type(),
            payload,
            creator: creator.to_string(),
            unique_constraints: Vec::new(),
        })
    }

    pub fn with_constraint(mut self, constraint: UniqueConstraint) -> Self {
        self.unique_constraints.push(constraint);
        self
    }

    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = UniqueConstraint>) -> Self {
        self.unique_constraints.extend(constraints);
        self
    }
}

/// Field change entries of a `*.changed` event
///
/// Every changed event carries an ordered list of these; the order follows
/// the entity's field order, never the caller's input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changes<C> {
    pub changes: Vec<C>,
}

impl<C> Changes<C> {
    pub fn new(changes: Vec<C>) -> Self {
        Self { changes }
    }
}

/// Payload of events that carry no data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
