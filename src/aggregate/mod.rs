// Copyright (c) 2025 - Cowboy AI, Inc.
//! Aggregate Addressing
//!
//! Every event belongs to exactly one aggregate. An aggregate is addressed by
//! its type, its id and the tenant hierarchy it lives in:
//!
//! ```text
//! instance ──► resource owner (organization or the instance itself) ──► aggregate id
//! ```
//!
//! Three scoping levels exist:
//!
//! - **Instance-wide singletons**: one aggregate per instance, id = instance id
//!   (e.g. the default login policy).
//! - **Organization-scoped singletons**: one aggregate per organization,
//!   id = organization id (e.g. an organization login policy, flows).
//! - **Individually keyed entities**: generated id plus owning organization or
//!   instance (targets, actions, executions, identity-provider configs, users).
//!
//! The aggregate is the ordering domain for optimistic concurrency: sequences
//! are contiguous per [`AggregateKey`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current schema version written into new aggregates
pub const AGGREGATE_VERSION: u32 = 1;

/// Aggregate types known to the command side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    /// Webhook/call targets for executions
    Target,
    /// Scripted actions
    Action,
    /// Per-organization action flows
    Flow,
    /// Executions keyed by their condition
    Execution,
    /// Identity-provider configurations
    IdpConfig,
    /// Login policy (instance default or organization override)
    LoginPolicy,
    /// Password complexity policy
    PasswordComplexityPolicy,
    /// Lockout policy
    LockoutPolicy,
    /// SMTP notification channels
    SmtpConfig,
    /// Users
    User,
}

impl AggregateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateType::Target => "target",
            AggregateType::Action => "action",
            AggregateType::Flow => "flow",
            AggregateType::Execution => "execution",
            AggregateType::IdpConfig => "idp_config",
            AggregateType::LoginPolicy => "login_policy",
            AggregateType::PasswordComplexityPolicy => "password_complexity_policy",
            AggregateType::LockoutPolicy => "lockout_policy",
            AggregateType::SmtpConfig => "smtp_config",
            AggregateType::User => "user",
        }
    }
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the aggregate an event belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateRef {
    pub id: String,
    pub aggregate_type: AggregateType,
    pub version: u32,
    pub resource_owner: String,
    pub instance_id: String,
}

impl AggregateRef {
    pub fn new(
        aggregate_type: AggregateType,
        id: impl Into<String>,
        resource_owner: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            aggregate_type,
            version: AGGREGATE_VERSION,
            resource_owner: resource_owner.into(),
            instance_id: instance_id.into(),
        }
    }

    /// Instance-wide singleton: id and resource owner are the instance id
    pub fn instance_singleton(aggregate_type: AggregateType, instance_id: &str) -> Self {
        Self::new(aggregate_type, instance_id, instance_id, instance_id)
    }

    /// Organization-scoped singleton: id and resource owner are the organization id
    pub fn org_singleton(aggregate_type: AggregateType, org_id: &str, instance_id: &str) -> Self {
        Self::new(aggregate_type, org_id, org_id, instance_id)
    }

    /// Ordering domain of this aggregate
    pub fn key(&self) -> AggregateKey {
        AggregateKey {
            instance_id: self.instance_id.clone(),
            aggregate_type: self.aggregate_type,
            id: self.id.clone(),
        }
    }
}

impl fmt::Display for AggregateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.aggregate_type, self.id)
    }
}

/// Identity of an aggregate stream within the log
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateKey {
    pub instance_id: String,
    pub aggregate_type: AggregateType,
    pub id: String,
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.instance_id, self.aggregate_type, self.id)
    }
}
