// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM Domain Value Objects
//!
//! Value objects and enumerations shared across events, write models and
//! commands. Validation that needs no I/O lives here so that commands can
//! reject malformed input before touching the event store.
//!
//! - [`Endpoint`] - absolute http(s) URL
//! - [`ExecutionCondition`] / [`ExecutionTarget`] - execution addressing
//! - [`FlowType`] / [`TriggerType`] - action flows

pub mod endpoint;
pub mod execution;
pub mod types;

pub use endpoint::{Endpoint, EndpointError};
pub use execution::{ApiCondition, EventCondition, ExecutionCondition, ExecutionTarget};
pub use types::{
    FlowType, Gender, IdpOwner, IdpStylingType, MultiFactorType, OidcMappingField,
    PasswordlessType, SecondFactorType, TargetType, TriggerType,
};
