// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity-provider configuration events
//!
//! An identity-provider configuration is one `idp_config` aggregate carrying
//! three families of events:
//!
//! ```text
//! idp_config.added ──► idp_config.oidc.added | idp_config.jwt.added   (same push)
//! idp_config.changed / .deactivated / .reactivated / .removed
//! idp_config.oidc.changed
//! idp_config.jwt.changed
//! ```
//!
//! The generic and the type specific families are decoded by separate sum
//! types so the OIDC and JWT sub-models only ever see their own events.

use serde::{Deserialize, Serialize};

use super::{Changes, Empty};
use crate::crypto::CryptoValue;
use crate::domain::{Endpoint, IdpStylingType, OidcMappingField};

/// Protocol of an identity-provider configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdpConfigType {
    Oidc,
    Jwt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IdpConfigEvent {
    Added(IdpConfigAdded),
    Changed(Changes<IdpConfigChange>),
    Deactivated(Empty),
    Reactivated(Empty),
    Removed(IdpConfigRemoved),
}

domain_event!(IdpConfigEvent {
    Added(IdpConfigAdded) => "idp_config.added",
    Changed(Changes<IdpConfigChange>) => "idp_config.changed",
    Deactivated(Empty) => "idp_config.deactivated",
    Reactivated(Empty) => "idp_config.reactivated",
    Removed(IdpConfigRemoved) => "idp_config.removed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpConfigAdded {
    pub name: String,
    pub config_type: IdpConfigType,
    pub styling_type: IdpStylingType,
    pub auto_register: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum IdpConfigChange {
    Name(String),
    StylingType(IdpStylingType),
    AutoRegister(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpConfigRemoved {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OidcConfigEvent {
    Added(OidcConfigAdded),
    Changed(Changes<OidcConfigChange>),
}

domain_event!(OidcConfigEvent {
    Added(OidcConfigAdded) => "idp_config.oidc.added",
    Changed(Changes<OidcConfigChange>) => "idp_config.oidc.changed",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OidcConfigAdded {
    pub client_id: String,
    pub client_secret: CryptoValue,
    pub issuer: Endpoint,
    pub authorization_endpoint: Option<Endpoint>,
    pub token_endpoint: Option<Endpoint>,
    pub scopes: Vec<String>,
    pub display_name_mapping: OidcMappingField,
    pub username_mapping: OidcMappingField,
}

/// One changed OIDC field; a new client secret always comes first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum OidcConfigChange {
    ClientSecret(CryptoValue),
    ClientId(String),
    Issuer(Endpoint),
    AuthorizationEndpoint(Option<Endpoint>),
    TokenEndpoint(Option<Endpoint>),
    Scopes(Vec<String>),
    DisplayNameMapping(OidcMappingField),
    UsernameMapping(OidcMappingField),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JwtConfigEvent {
    Added(JwtConfigAdded),
    Changed(Changes<JwtConfigChange>),
}

domain_event!(JwtConfigEvent {
    Added(JwtConfigAdded) => "idp_config.jwt.added",
    Changed(Changes<JwtConfigChange>) => "idp_config.jwt.changed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfigAdded {
    pub jwt_endpoint: Endpoint,
    pub issuer: String,
    pub keys_endpoint: Endpoint,
    pub header_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum JwtConfigChange {
    JwtEndpoint(Endpoint),
    Issuer(String),
    KeysEndpoint(Endpoint),
    HeaderName(String),
}
