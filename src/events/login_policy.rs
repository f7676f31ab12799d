// Copyright (c) 2025 - Cowboy AI, Inc.
//! Login policy events
//!
//! The same event family serves the instance default policy (aggregate id =
//! instance id) and organization overrides (aggregate id = organization id).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Changes, Empty};
use crate::domain::{MultiFactorType, PasswordlessType, SecondFactorType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoginPolicyEvent {
    Added(LoginPolicySettings),
    Changed(Changes<LoginPolicyChange>),
    Removed(Empty),
    IdpAdded(LoginPolicyIdp),
    IdpRemoved(LoginPolicyIdp),
    IdpCascadeRemoved(LoginPolicyIdp),
    SecondFactorAdded(SecondFactor),
    SecondFactorRemoved(SecondFactor),
    MultiFactorAdded(MultiFactor),
    MultiFactorRemoved(MultiFactor),
}

domain_event!(LoginPolicyEvent {
    Added(LoginPolicySettings) => "login_policy.added",
    Changed(Changes<LoginPolicyChange>) => "login_policy.changed",
    Removed(Empty) => "login_policy.removed",
    IdpAdded(LoginPolicyIdp) => "login_policy.idp.added",
    IdpRemoved(LoginPolicyIdp) => "login_policy.idp.removed",
    IdpCascadeRemoved(LoginPolicyIdp) => "login_policy.idp.cascade.removed",
    SecondFactorAdded(SecondFactor) => "login_policy.second_factor.added",
    SecondFactorRemoved(SecondFactor) => "login_policy.second_factor.removed",
    MultiFactorAdded(MultiFactor) => "login_policy.multi_factor.added",
    MultiFactorRemoved(MultiFactor) => "login_policy.multi_factor.removed",
});

/// Every mutable login policy field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPolicySettings {
    pub allow_username_password: bool,
    pub allow_register: bool,
    pub allow_external_idp: bool,
    pub force_mfa: bool,
    pub passwordless_type: PasswordlessType,
    pub hide_password_reset: bool,
    pub ignore_unknown_usernames: bool,
    pub default_redirect_uri: String,
    pub password_check_lifetime: Duration,
    pub external_login_check_lifetime: Duration,
    pub mfa_init_skip_lifetime: Duration,
    pub second_factor_check_lifetime: Duration,
    pub multi_factor_check_lifetime: Duration,
}

impl Default for LoginPolicySettings {
    fn default() -> Self {
        Self {
            allow_username_password: true,
            allow_register: true,
            allow_external_idp: true,
            force_mfa: false,
            passwordless_type: PasswordlessType::Allowed,
            hide_password_reset: false,
            ignore_unknown_usernames: false,
            default_redirect_uri: String::new(),
            password_check_lifetime: Duration::from_secs(240 * 3600),
            external_login_check_lifetime: Duration::from_secs(240 * 3600),
            mfa_init_skip_lifetime: Duration::from_secs(720 * 3600),
            second_factor_check_lifetime: Duration::from_secs(18 * 3600),
            multi_factor_check_lifetime: Duration::from_secs(12 * 3600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum LoginPolicyChange {
    AllowUsernamePassword(bool),
    AllowRegister(bool),
    AllowExternalIdp(bool),
    ForceMfa(bool),
    PasswordlessType(PasswordlessType),
    HidePasswordReset(bool),
    IgnoreUnknownUsernames(bool),
    DefaultRedirectUri(String),
    PasswordCheckLifetime(Duration),
    ExternalLoginCheckLifetime(Duration),
    MfaInitSkipLifetime(Duration),
    SecondFactorCheckLifetime(Duration),
    MultiFactorCheckLifetime(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPolicyIdp {
    pub idp_config_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondFactor {
    pub factor: SecondFactorType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiFactor {
    pub factor: MultiFactorType,
}
