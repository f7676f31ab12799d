// Copyright (c) 2025 - Cowboy AI, Inc.
//! Password complexity policy

use serde::{Deserialize, Serialize};

use super::{PolicySchema, PolicyScope};
use crate::aggregate::AggregateType;
use crate::diff::ChangeSet;
use crate::errors::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordComplexityPolicy {
    pub min_length: u64,
    pub has_uppercase: bool,
    pub has_lowercase: bool,
    pub has_number: bool,
    pub has_symbol: bool,
}

impl Default for PasswordComplexityPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            has_uppercase: true,
            has_lowercase: true,
            has_number: true,
            has_symbol: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum PasswordComplexityChange {
    MinLength(u64),
    HasUppercase(bool),
    HasLowercase(bool),
    HasNumber(bool),
    HasSymbol(bool),
}

impl PolicySchema for PasswordComplexityPolicy {
    type Change = PasswordComplexityChange;

    const NAME: &'static str = "PasswordComplexityPolicy";
    const AGGREGATE_TYPE: AggregateType = AggregateType::PasswordComplexityPolicy;
    const ADDED: &'static str = "password_complexity_policy.added";
    const CHANGED: &'static str = "password_complexity_policy.changed";
    const REMOVED: &'static str = "password_complexity_policy.removed";
    const SCOPES: &'static [PolicyScope] = &[PolicyScope::Instance, PolicyScope::Org];

    fn validate(&self) -> CommandResult<()> {
        if self.min_length == 0 {
            return Err(CommandError::invalid_argument(
                "POLICY-p8c2v",
                "Errors.PasswordComplexityPolicy.MinLength.Invalid",
            ));
        }
        Ok(())
    }

    fn changes(&self, desired: &Self) -> Option<Vec<Self::Change>> {
        ChangeSet::new()
            .field(&self.min_length, &desired.min_length, PasswordComplexityChange::MinLength)
            .field(
                &self.has_uppercase,
                &desired.has_uppercase,
                PasswordComplexityChange::HasUppercase,
            )
            .field(
                &self.has_lowercase,
                &desired.has_lowercase,
                PasswordComplexityChange::HasLowercase,
            )
            .field(&self.has_number, &desired.has_number, PasswordComplexityChange::HasNumber)
            .field(&self.has_symbol, &desired.has_symbol, PasswordComplexityChange::HasSymbol)
            .into_changes()
    }

    fn apply(&mut self, change: &Self::Change) {
        match change {
            PasswordComplexityChange::MinLength(v) => self.min_length = *v,
            PasswordComplexityChange::HasUppercase(v) => self.has_uppercase = *v,
            PasswordComplexityChange::HasLowercase(v) => self.has_lowercase = *v,
            PasswordComplexityChange::HasNumber(v) => self.has_number = *v,
            PasswordComplexityChange::HasSymbol(v) => self.has_symbol = *v,
        }
    }
}
