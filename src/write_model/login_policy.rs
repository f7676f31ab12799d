// Copyright (c) 2025 - Cowboy AI, Inc.
//! Login policy write model (instance default or organization override)

use std::collections::BTreeSet;

use super::{EntityState, ObjectDetails, Reducer, WriteModel};
use crate::aggregate::{AggregateRef, AggregateType};
use crate::domain::{MultiFactorType, SecondFactorType};
use crate::event_store::SearchQuery;
use crate::events::login_policy::{LoginPolicyChange, LoginPolicySettings};
use crate::events::{DomainEvent, Event, LoginPolicyEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct LoginPolicyWriteModel {
    base: WriteModel,
    pub state: EntityState,
    pub settings: LoginPolicySettings,
    /// Identity providers in the order they were added
    pub idps: Vec<String>,
    pub second_factors: BTreeSet<SecondFactorType>,
    pub multi_factors: BTreeSet<MultiFactorType>,
}

/// Effective login policy
#[derive(Debug, Clone, PartialEq)]
pub struct LoginPolicy {
    pub details: ObjectDetails,
    pub settings: LoginPolicySettings,
    pub idps: Vec<String>,
    pub second_factors: Vec<SecondFactorType>,
    pub multi_factors: Vec<MultiFactorType>,
}

impl LoginPolicyWriteModel {
    /// Instance default policy
    pub fn instance(instance_id: &str) -> Self {
        Self::with_aggregate(AggregateRef::instance_singleton(
            AggregateType::LoginPolicy,
            instance_id,
        ))
    }

    /// Organization override
    pub fn org(org_id: &str, instance_id: &str) -> Self {
        Self::with_aggregate(AggregateRef::org_singleton(
            AggregateType::LoginPolicy,
            org_id,
            instance_id,
        ))
    }

    fn with_aggregate(aggregate: AggregateRef) -> Self {
        Self {
            base: WriteModel::new(aggregate),
            state: EntityState::Unspecified,
            settings: LoginPolicySettings::default(),
            idps: Vec::new(),
            second_factors: BTreeSet::new(),
            multi_factors: BTreeSet::new(),
        }
    }

    pub fn has_idp(&self, idp_config_id: &str) -> bool {
        self.idps.iter().any(|id| id == idp_config_id)
    }

    pub fn to_login_policy(&self) -> Option<LoginPolicy> {
        self.state.exists().then(|| LoginPolicy {
            details: self.base.details(),
            settings: self.settings.clone(),
            idps: self.idps.clone(),
            second_factors: self.second_factors.iter().copied().collect(),
            multi_factors: self.multi_factors.iter().copied().collect(),
        })
    }

    fn reset(&mut self) {
        self.settings = LoginPolicySettings::default();
        self.idps.clear();
        self.second_factors.clear();
        self.multi_factors.clear();
    }

    fn apply_change(&mut self, change: &LoginPolicyChange) {
        let s = &mut self.settings;
        match change {
            LoginPolicyChange::AllowUsernamePassword(v) => s.allow_username_password = *v,
            LoginPolicyChange::AllowRegister(v) => s.allow_register = *v,
            LoginPolicyChange::AllowExternalIdp(v) => s.allow_external_idp = *v,
            LoginPolicyChange::ForceMfa(v) => s.force_mfa = *v,
            LoginPolicyChange::PasswordlessType(v) => s.passwordless_type = *v,
            LoginPolicyChange::HidePasswordReset(v) => s.hide_password_reset = *v,
            LoginPolicyChange::IgnoreUnknownUsernames(v) => s.ignore_unknown_usernames = *v,
            LoginPolicyChange::DefaultRedirectUri(v) => s.default_redirect_uri = v.clone(),
            LoginPolicyChange::PasswordCheckLifetime(v) => s.password_check_lifetime = *v,
            LoginPolicyChange::ExternalLoginCheckLifetime(v) => {
                s.external_login_check_lifetime = *v
            }
            LoginPolicyChange::MfaInitSkipLifetime(v) => s.mfa_init_skip_lifetime = *v,
            LoginPolicyChange::SecondFactorCheckLifetime(v) => {
                s.second_factor_check_lifetime = *v
            }
            LoginPolicyChange::MultiFactorCheckLifetime(v) => s.multi_factor_check_lifetime = *v,
        }
    }
}

impl Reducer for LoginPolicyWriteModel {
    type Event = LoginPolicyEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base
            .aggregate_query(LoginPolicyEvent::event_types())
            .resource_owner(self.base.resource_owner())
    }

    fn apply(&mut self, event: &LoginPolicyEvent, _raw: &Event) {
        match event {
            LoginPolicyEvent::Added(settings) => {
                self.reset();
                self.settings = settings.clone();
                self.state = EntityState::Active;
            }
            LoginPolicyEvent::Changed(changed) => {
                for change in &changed.changes {
                    self.apply_change(change);
                }
            }
            LoginPolicyEvent::Removed(_) => {
                self.reset();
                self.state = EntityState::Removed;
            }
            LoginPolicyEvent::IdpAdded(idp) => {
                if !self.has_idp(&idp.idp_config_id) {
                    self.idps.push(idp.idp_config_id.clone());
                }
            }
            LoginPolicyEvent::IdpRemoved(idp) | LoginPolicyEvent::IdpCascadeRemoved(idp) => {
                self.idps.retain(|id| *id != idp.idp_config_id);
            }
            LoginPolicyEvent::SecondFactorAdded(factor) => {
                self.second_factors.insert(factor.factor);
            }
            LoginPolicyEvent::SecondFactorRemoved(factor) => {
                self.second_factors.remove(&factor.factor);
            }
            LoginPolicyEvent::MultiFactorAdded(factor) => {
                self.multi_factors.insert(factor.factor);
            }
            LoginPolicyEvent::MultiFactorRemoved(factor) => {
                self.multi_factors.remove(&factor.factor);
            }
        }
    }
}
