// Copyright (c) 2025 - Cowboy AI, Inc.
//! Lockout policy, the one policy users may override

use serde::{Deserialize, Serialize};

use super::{PolicySchema, PolicyScope};
use crate::aggregate::AggregateType;
use crate::diff::ChangeSet;
use crate::errors::CommandResult;

/// Zero attempts disables locking for that factor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutPolicy {
    pub max_password_attempts: u64,
    pub max_otp_attempts: u64,
    pub show_lockout_failures: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum LockoutChange {
    MaxPasswordAttempts(u64),
    MaxOtpAttempts(u64),
    ShowLockoutFailures(bool),
}

impl PolicySchema for LockoutPolicy {
    type Change = LockoutChange;

    const NAME: &'static str = "LockoutPolicy";
    const AGGREGATE_TYPE: AggregateType = AggregateType::LockoutPolicy;
    const ADDED: &'static str = "lockout_policy.added";
    const CHANGED: &'static str = "lockout_policy.changed";
    const REMOVED: &'static str = "lockout_policy.removed";
    const SCOPES: &'static [PolicyScope] =
        &[PolicyScope::Instance, PolicyScope::Org, PolicyScope::User];

    fn validate(&self) -> CommandResult<()> {
        Ok(())
    }

    fn changes(&self, desired: &Self) -> Option<Vec<Self::Change>> {
        ChangeSet::new()
            .field(
                &self.max_password_attempts,
                &desired.max_password_attempts,
                LockoutChange::MaxPasswordAttempts,
            )
            .field(
                &self.max_otp_attempts,
                &desired.max_otp_attempts,
                LockoutChange::MaxOtpAttempts,
            )
            .field(
                &self.show_lockout_failures,
                &desired.show_lockout_failures,
                LockoutChange::ShowLockoutFailures,
            )
            .into_changes()
    }

    fn apply(&mut self, change: &Self::Change) {
        match change {
            LockoutChange::MaxPasswordAttempts(v) => self.max_password_attempts = *v,
            LockoutChange::MaxOtpAttempts(v) => self.max_otp_attempts = *v,
            LockoutChange::ShowLockoutFailures(v) => self.show_lockout_failures = *v,
        }
    }
}
