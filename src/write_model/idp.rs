// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity-provider configuration write models
//!
//! # Composition
//!
//! ```text
//! IdpConfigWriteModel ─┬─ idp_config.*            (folded here)
//!                      ├─ OidcConfigModel ◄─ idp_config.oidc.*
//!                      └─ JwtConfigModel  ◄─ idp_config.jwt.*
//! ```
//!
//! The outer model buffers every event of the aggregate and hands the same
//! slice to both sub-models; each sub-model keeps only its own family.
//!
//! [`LoginPolicyIdpReferences`] and [`UserIdpLinkReferences`] are read-only
//! scans across many aggregates, used to build the cascade events of a
//! removal.

use std::collections::{BTreeMap, BTreeSet};

use super::{buffer_events, fold_pending, EntityState, ObjectDetails, Reducer, WriteModel};
use crate::aggregate::{AggregateKey, AggregateRef, AggregateType};
use crate::crypto::CryptoValue;
use crate::domain::{Endpoint, IdpStylingType, OidcMappingField};
use crate::event_store::SearchQuery;
use crate::errors::CommandResult;
use crate::events::idp::{IdpConfigChange, IdpConfigType, JwtConfigChange, OidcConfigChange};
use crate::events::{
    DomainEvent, Event, IdpConfigEvent, JwtConfigEvent, LoginPolicyEvent, OidcConfigEvent,
    UserEvent,
};

/// OIDC specific part of an identity-provider configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OidcConfigModel {
    base: WriteModel,
    pub state: EntityState,
    pub client_id: String,
    pub client_secret: Option<CryptoValue>,
    pub issuer: Option<Endpoint>,
    pub authorization_endpoint: Option<Endpoint>,
    pub token_endpoint: Option<Endpoint>,
    pub scopes: Vec<String>,
    pub display_name_mapping: OidcMappingField,
    pub username_mapping: OidcMappingField,
}

impl OidcConfigModel {
    fn new(aggregate: AggregateRef) -> Self {
        Self {
            base: WriteModel::new(aggregate),
            state: EntityState::Unspecified,
            client_id: String::new(),
            client_secret: None,
            issuer: None,
            authorization_endpoint: None,
            token_endpoint: None,
            scopes: Vec::new(),
            display_name_mapping: OidcMappingField::Unspecified,
            username_mapping: OidcMappingField::Unspecified,
        }
    }
}

impl Reducer for OidcConfigModel {
    type Event = OidcConfigEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base.aggregate_query(OidcConfigEvent::event_types())
    }

    fn apply(&mut self, event: &OidcConfigEvent, _raw: &Event) {
        match event {
            OidcConfigEvent::Added(added) => {
                self.client_id = added.client_id.clone();
                self.client_secret = Some(added.client_secret.clone());
                self.issuer = Some(added.issuer.clone());
                self.authorization_endpoint = added.authorization_endpoint.clone();
                self.token_endpoint = added.token_endpoint.clone();
                self.scopes = added.scopes.clone();
                self.display_name_mapping = added.display_name_mapping;
                self.username_mapping = added.username_mapping;
                self.state = EntityState::Active;
            }
            OidcConfigEvent::Changed(changed) => {
                for change in &changed.changes {
                    match change {
                        OidcConfigChange::ClientSecret(secret) => {
                            self.client_secret = Some(secret.clone())
                        }
                        OidcConfigChange::ClientId(id) => self.client_id = id.clone(),
                        OidcConfigChange::Issuer(issuer) => self.issuer = Some(issuer.clone()),
                        OidcConfigChange::AuthorizationEndpoint(endpoint) => {
                            self.authorization_endpoint = endpoint.clone()
                        }
                        OidcConfigChange::TokenEndpoint(endpoint) => {
                            self.token_endpoint = endpoint.clone()
                        }
                        OidcConfigChange::Scopes(scopes) => self.scopes = scopes.clone(),
                        OidcConfigChange::DisplayNameMapping(mapping) => {
                            self.display_name_mapping = *mapping
                        }
                        OidcConfigChange::UsernameMapping(mapping) => {
                            self.username_mapping = *mapping
                        }
                    }
                }
            }
        }
    }
}

/// JWT specific part of an identity-provider configuration
#[derive(Debug, Clone, PartialEq)]
pub struct JwtConfigModel {
    base: WriteModel,
    pub state: EntityState,
    pub jwt_endpoint: Option<Endpoint>,
    pub issuer: String,
    pub keys_endpoint: Option<Endpoint>,
    pub header_name: String,
}

impl JwtConfigModel {
    fn new(aggregate: AggregateRef) -> Self {
        Self {
            base: WriteModel::new(aggregate),
            state: EntityState::Unspecified,
            jwt_endpoint: None,
            issuer: String::new(),
            keys_endpoint: None,
            header_name: String::new(),
        }
    }
}

impl Reducer for JwtConfigModel {
    type Event = JwtConfigEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base.aggregate_query(JwtConfigEvent::event_types())
    }

    fn apply(&mut self, event: &JwtConfigEvent, _raw: &Event) {
        match event {
            JwtConfigEvent::Added(added) => {
                self.jwt_endpoint = Some(added.jwt_endpoint.clone());
                self.issuer = added.issuer.clone();
                self.keys_endpoint = Some(added.keys_endpoint.clone());
                self.header_name = added.header_name.clone();
                self.state = EntityState::Active;
            }
            JwtConfigEvent::Changed(changed) => {
                for change in &changed.changes {
                    match change {
                        JwtConfigChange::JwtEndpoint(endpoint) => {
                            self.jwt_endpoint = Some(endpoint.clone())
                        }
                        JwtConfigChange::Issuer(issuer) => self.issuer = issuer.clone(),
                        JwtConfigChange::KeysEndpoint(endpoint) => {
                            self.keys_endpoint = Some(endpoint.clone())
                        }
                        JwtConfigChange::HeaderName(name) => self.header_name = name.clone(),
                    }
                }
            }
        }
    }
}

/// One identity-provider configuration with its protocol sub-models
#[derive(Debug, Clone, PartialEq)]
pub struct IdpConfigWriteModel {
    base: WriteModel,
    pub state: EntityState,
    pub name: String,
    pub config_type: Option<IdpConfigType>,
    pub styling_type: IdpStylingType,
    pub auto_register: bool,
    pub oidc: OidcConfigModel,
    pub jwt: JwtConfigModel,
}

/// Identity-provider configuration as returned to callers
#[derive(Debug, Clone, PartialEq)]
pub struct IdpConfig {
    pub details: ObjectDetails,
    pub state: EntityState,
    pub name: String,
    pub config_type: IdpConfigType,
    pub styling_type: IdpStylingType,
    pub auto_register: bool,
}

impl IdpConfigWriteModel {
    pub fn new(id: &str, resource_owner: &str, instance_id: &str) -> Self {
        let aggregate = AggregateRef::new(AggregateType::IdpConfig, id, resource_owner, instance_id);
        Self {
            oidc: OidcConfigModel::new(aggregate.clone()),
            jwt: JwtConfigModel::new(aggregate.clone()),
            base: WriteModel::new(aggregate),
            state: EntityState::Unspecified,
            name: String::new(),
            config_type: None,
            styling_type: IdpStylingType::Unspecified,
            auto_register: false,
        }
    }

    pub fn to_idp_config(&self) -> Option<IdpConfig> {
        if !self.state.exists() {
            return None;
        }
        Some(IdpConfig {
            details: self.base.details(),
            state: self.state,
            name: self.name.clone(),
            config_type: self.config_type?,
            styling_type: self.styling_type,
            auto_register: self.auto_register,
        })
    }
}

impl Reducer for IdpConfigWriteModel {
    type Event = IdpConfigEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        let mut event_types = IdpConfigEvent::event_types();
        event_types.extend(OidcConfigEvent::event_types());
        event_types.extend(JwtConfigEvent::event_types());
        self.base
            .aggregate_query(event_types)
            .resource_owner(self.base.resource_owner())
    }

    fn apply(&mut self, event: &IdpConfigEvent, _raw: &Event) {
        match event {
            IdpConfigEvent::Added(added) => {
                self.name = added.name.clone();
                self.config_type = Some(added.config_type);
                self.styling_type = added.styling_type;
                self.auto_register = added.auto_register;
                self.state = EntityState::Active;
            }
            IdpConfigEvent::Changed(changed) => {
                for change in &changed.changes {
                    match change {
                        IdpConfigChange::Name(name) => self.name = name.clone(),
                        IdpConfigChange::StylingType(styling) => self.styling_type = *styling,
                        IdpConfigChange::AutoRegister(auto) => self.auto_register = *auto,
                    }
                }
            }
            IdpConfigEvent::Deactivated(_) => self.state = EntityState::Inactive,
            IdpConfigEvent::Reactivated(_) => self.state = EntityState::Active,
            IdpConfigEvent::Removed(_) => self.state = EntityState::Removed,
        }
    }

    fn append_events(&mut self, events: &[Event]) {
        buffer_events(self, events);
        self.oidc.append_events(events);
        self.jwt.append_events(events);
    }

    fn reduce(&mut self) -> CommandResult<()> {
        fold_pending(self)?;
        self.oidc.reduce()?;
        self.jwt.reduce()
    }
}

/// Which login policies reference which identity providers
#[derive(Debug, Clone, PartialEq)]
pub struct LoginPolicyIdpReferences {
    base: WriteModel,
    scope: Option<String>,
    policies: BTreeMap<AggregateKey, (AggregateRef, BTreeSet<String>)>,
}

impl LoginPolicyIdpReferences {
    /// Scan every login policy of the instance, or only those owned by `org_id`
    pub fn new(instance_id: &str, org_id: Option<&str>) -> Self {
        Self {
            base: WriteModel::new(AggregateRef::instance_singleton(
                AggregateType::LoginPolicy,
                instance_id,
            )),
            scope: org_id.map(str::to_string),
            policies: BTreeMap::new(),
        }
    }

    pub fn referencing(&self, idp_config_id: &str) -> Vec<AggregateRef> {
        self.policies
            .values()
            .filter(|(_, idps)| idps.contains(idp_config_id))
            .map(|(aggregate, _)| aggregate.clone())
            .collect()
    }
}

impl Reducer for LoginPolicyIdpReferences {
    type Event = LoginPolicyEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        let query = SearchQuery::new()
            .instance_id(self.base.instance_id())
            .aggregate_type(AggregateType::LoginPolicy)
            .event_types([
                "login_policy.removed",
                "login_policy.idp.added",
                "login_policy.idp.removed",
                "login_policy.idp.cascade.removed",
            ]);
        match &self.scope {
            Some(org_id) => query.resource_owner(org_id.clone()),
            None => query,
        }
    }

    fn apply(&mut self, event: &LoginPolicyEvent, raw: &Event) {
        let key = raw.aggregate.key();
        match event {
            LoginPolicyEvent::IdpAdded(idp) => {
                self.policies
                    .entry(key)
                    .or_insert_with(|| (raw.aggregate.clone(), BTreeSet::new()))
                    .1
                    .insert(idp.idp_config_id.clone());
            }
            LoginPolicyEvent::IdpRemoved(idp) | LoginPolicyEvent::IdpCascadeRemoved(idp) => {
                if let Some((_, idps)) = self.policies.get_mut(&key) {
                    idps.remove(&idp.idp_config_id);
                }
            }
            LoginPolicyEvent::Removed(_) => {
                self.policies.remove(&key);
            }
            _ => {}
        }
    }
}

/// Which users are linked to which identity providers
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdpLinkReferences {
    base: WriteModel,
    idp_config_id: String,
    links: BTreeMap<AggregateKey, (AggregateRef, BTreeSet<String>)>,
}

impl UserIdpLinkReferences {
    pub fn new(instance_id: &str, idp_config_id: &str) -> Self {
        Self {
            base: WriteModel::new(AggregateRef::instance_singleton(
                AggregateType::User,
                instance_id,
            )),
            idp_config_id: idp_config_id.to_string(),
            links: BTreeMap::new(),
        }
    }

    /// Every (user, external user id) linked to the identity provider
    pub fn links(&self) -> Vec<(AggregateRef, String)> {
        self.links
            .values()
            .flat_map(|(user, external_ids)| {
                external_ids
                    .iter()
                    .map(move |external_id| (user.clone(), external_id.clone()))
            })
            .collect()
    }
}

impl Reducer for UserIdpLinkReferences {
    type Event = UserEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        SearchQuery::new()
            .instance_id(self.base.instance_id())
            .aggregate_type(AggregateType::User)
            .event_types([
                "user.removed",
                "user.idp_link.added",
                "user.idp_link.removed",
                "user.idp_link.cascade.removed",
            ])
    }

    fn apply(&mut self, event: &UserEvent, raw: &Event) {
        let key = raw.aggregate.key();
        match event {
            UserEvent::IdpLinkAdded(link) if link.idp_config_id == self.idp_config_id => {
                self.links
                    .entry(key)
                    .or_insert_with(|| (raw.aggregate.clone(), BTreeSet::new()))
                    .1
                    .insert(link.external_user_id.clone());
            }
            UserEvent::IdpLinkRemoved(link) | UserEvent::IdpLinkCascadeRemoved(link)
                if link.idp_config_id == self.idp_config_id =>
            {
                if let Some((_, external_ids)) = self.links.get_mut(&key) {
                    external_ids.remove(&link.external_user_id);
                }
            }
            UserEvent::Removed(_) => {
                self.links.remove(&key);
            }
            _ => {}
        }
    }
}
