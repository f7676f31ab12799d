// Copyright (c) 2025 - Cowboy AI, Inc.
//! Enumerations shared by events, write models and commands

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an execution calls a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Fire the request, only the status code matters
    Webhook,
    /// Call and use the response body
    Call,
    /// Fire and forget
    Async,
}

/// Styling hint for identity-provider login buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdpStylingType {
    #[default]
    Unspecified,
    Google,
}

/// Claim used to map an external OIDC identity to a local field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OidcMappingField {
    #[default]
    Unspecified,
    PreferredUsername,
    Email,
}

/// Who owns an identity-provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum IdpOwner {
    /// Configured on the instance, usable by every organization
    Instance,
    /// Configured on one organization
    Org(String),
}

impl IdpOwner {
    /// Resource owner id of the configuration within the given instance
    pub fn resource_owner<'a>(&'a self, instance_id: &'a str) -> &'a str {
        match self {
            IdpOwner::Instance => instance_id,
            IdpOwner::Org(org_id) => org_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordlessType {
    #[default]
    NotAllowed,
    Allowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondFactorType {
    Otp,
    U2f,
    OtpEmail,
    OtpSms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiFactorType {
    U2fWithVerification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Unspecified,
    Female,
    Male,
    Diverse,
}

/// Action flows an organization can attach actions to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    ExternalAuthentication,
    CustomiseToken,
    InternalAuthentication,
    CustomizeSamlResponse,
}

/// Points within a flow where actions run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    PostAuthentication,
    PreCreation,
    PostCreation,
    PreUserinfoCreation,
    PreAccessTokenCreation,
    PreSamlResponseCreation,
}

impl FlowType {
    /// Trigger types that exist within this flow
    pub fn trigger_types(&self) -> &'static [TriggerType] {
        match self {
            FlowType::ExternalAuthentication | FlowType::InternalAuthentication => &[
                TriggerType::PostAuthentication,
                TriggerType::PreCreation,
                TriggerType::PostCreation,
            ],
            FlowType::CustomiseToken => &[
                TriggerType::PreUserinfoCreation,
                TriggerType::PreAccessTokenCreation,
            ],
            FlowType::CustomizeSamlResponse => &[TriggerType::PreSamlResponseCreation],
        }
    }

    pub fn has_trigger(&self, trigger: TriggerType) -> bool {
        self.trigger_types().contains(&trigger)
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowType::ExternalAuthentication => "external_authentication",
            FlowType::CustomiseToken => "customise_token",
            FlowType::InternalAuthentication => "internal_authentication",
            FlowType::CustomizeSamlResponse => "customize_saml_response",
        };
        f.write_str(name)
    }
}
