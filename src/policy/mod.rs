// Copyright (c) 2025 - Cowboy AI, Inc.
//! Policy Hierarchy
//!
//! Settings policies live on up to three levels:
//!
//! ```text
//! Instance  (ultimate fallback)
//!    ▲
//! Organization  (optional override)
//!    ▲
//! User  (optional override, only for some policies)
//! ```
//!
//! Writes always target one explicit level. Reads resolve upwards: the first
//! level with an active policy wins, and the result is flagged `is_default`
//! when it came from a level above the requested one.
//!
//! [`PolicySchema`] is the per-policy surface (fields, validation, ordered
//! changes). Everything else (events, write model, commands, resolution) is
//! generic over it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::aggregate::{AggregateRef, AggregateType};
use crate::errors::{CommandError, CommandResult};
use crate::write_model::ObjectDetails;

pub mod lockout;
pub mod password_complexity;

pub use lockout::{LockoutChange, LockoutPolicy};
pub use password_complexity::{PasswordComplexityChange, PasswordComplexityPolicy};

/// Kind of level, without ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyScope {
    Instance,
    Org,
    User,
}

/// A concrete level in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyLevel {
    Instance,
    Org { org_id: String },
    User { org_id: String, user_id: String },
}

impl PolicyLevel {
    pub fn org(org_id: impl Into<String>) -> Self {
        PolicyLevel::Org {
            org_id: org_id.into(),
        }
    }

    pub fn user(org_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        PolicyLevel::User {
            org_id: org_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn scope(&self) -> PolicyScope {
        match self {
            PolicyLevel::Instance => PolicyScope::Instance,
            PolicyLevel::Org { .. } => PolicyScope::Org,
            PolicyLevel::User { .. } => PolicyScope::User,
        }
    }

    /// Next level up, `None` above the instance
    pub fn parent(&self) -> Option<PolicyLevel> {
        match self {
            PolicyLevel::Instance => None,
            PolicyLevel::Org { .. } => Some(PolicyLevel::Instance),
            PolicyLevel::User { org_id, .. } => Some(PolicyLevel::org(org_id.clone())),
        }
    }

    /// Aggregate holding the policy of this level
    pub fn aggregate(&self, aggregate_type: AggregateType, instance_id: &str) -> AggregateRef {
        match self {
            PolicyLevel::Instance => AggregateRef::instance_singleton(aggregate_type, instance_id),
            PolicyLevel::Org { org_id } => {
                AggregateRef::org_singleton(aggregate_type, org_id, instance_id)
            }
            PolicyLevel::User { org_id, user_id } => {
                AggregateRef::new(aggregate_type, user_id, org_id, instance_id)
            }
        }
    }

    /// Empty ids make a level unusable
    pub fn is_valid(&self) -> bool {
        match self {
            PolicyLevel::Instance => true,
            PolicyLevel::Org { org_id } => !org_id.trim().is_empty(),
            PolicyLevel::User { org_id, user_id } => {
                !org_id.trim().is_empty() && !user_id.trim().is_empty()
            }
        }
    }
}

impl fmt::Display for PolicyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyLevel::Instance => f.write_str("instance"),
            PolicyLevel::Org { org_id } => write!(f, "org/{}", org_id),
            PolicyLevel::User { org_id, user_id } => write!(f, "org/{}/user/{}", org_id, user_id),
        }
    }
}

/// Field schema of one settings policy
pub trait PolicySchema:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// One changed field
    type Change: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Used in message keys, e.g. `Errors.PasswordComplexityPolicy.NotFound`
    const NAME: &'static str;
    const AGGREGATE_TYPE: AggregateType;
    const ADDED: &'static str;
    const CHANGED: &'static str;
    const REMOVED: &'static str;
    /// Levels the policy may be written on
    const SCOPES: &'static [PolicyScope];

    /// Local validation, no I/O
    fn validate(&self) -> CommandResult<()>;

    /// Changes turning `self` into `desired`, in field order; `None` if equal
    fn changes(&self, desired: &Self) -> Option<Vec<Self::Change>>;

    fn apply(&mut self, change: &Self::Change);

    fn supports(scope: PolicyScope) -> bool {
        Self::SCOPES.contains(&scope)
    }
}

/// Policy found by walking up the hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPolicy<T> {
    pub policy: T,
    pub details: ObjectDetails,
    /// Inherited from a level above the requested one
    pub is_default: bool,
    pub level: PolicyLevel,
}

/// Walk from `start` towards the instance and return the first active policy
///
/// `load` hydrates one level and returns its projection if the policy there
/// is active. Levels rejected by `supports` are skipped without loading.
pub async fn resolve<T, F, Fut>(
    start: PolicyLevel,
    supports: impl Fn(PolicyScope) -> bool,
    mut load: F,
) -> CommandResult<ResolvedPolicy<T>>
where
    F: FnMut(PolicyLevel) -> Fut,
    Fut: Future<Output = CommandResult<Option<(T, ObjectDetails)>>>,
{
    let mut next = Some(start.clone());
    while let Some(level) = next {
        if supports(level.scope()) {
            if let Some((policy, details)) = load(level.clone()).await? {
                return Ok(ResolvedPolicy {
                    policy,
                    details,
                    is_default: level != start,
                    level,
                });
            }
        }
        next = level.parent();
    }
    Err(CommandError::not_found("POLICY-8k3mq", "Errors.Policy.NotFound"))
}
