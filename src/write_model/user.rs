// Copyright (c) 2025 - Cowboy AI, Inc.
//! User write models
//!
//! [`UserWriteModel`] owns a [`UserIdpLinksModel`] and feeds it the same
//! events; the links model keeps only link events and the removal.

use std::collections::BTreeMap;

use super::{buffer_events, fold_pending, EntityState, ObjectDetails, Reducer, WriteModel};
use crate::aggregate::{AggregateRef, AggregateType};
use crate::event_store::SearchQuery;
use crate::errors::CommandResult;
use crate::events::user::{HumanProfile, ProfileChange};
use crate::events::{DomainEvent, Event, UserEvent};

/// External identities linked to one user, keyed by (idp, external user id)
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdpLinksModel {
    base: WriteModel,
    /// (idp config id, external user id) → display name
    pub links: BTreeMap<(String, String), String>,
}

impl UserIdpLinksModel {
    fn new(aggregate: AggregateRef) -> Self {
        Self {
            base: WriteModel::new(aggregate),
            links: BTreeMap::new(),
        }
    }

    pub fn has_link(&self, idp_config_id: &str, external_user_id: &str) -> bool {
        self.links
            .contains_key(&(idp_config_id.to_string(), external_user_id.to_string()))
    }
}

impl Reducer for UserIdpLinksModel {
    type Event = UserEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base.aggregate_query(vec![
            "user.removed",
            "user.idp_link.added",
            "user.idp_link.removed",
            "user.idp_link.cascade.removed",
        ])
    }

    fn apply(&mut self, event: &UserEvent, _raw: &Event) {
        match event {
            UserEvent::IdpLinkAdded(link) => {
                self.links.insert(
                    (link.idp_config_id.clone(), link.external_user_id.clone()),
                    link.display_name.clone(),
                );
            }
            UserEvent::IdpLinkRemoved(link) | UserEvent::IdpLinkCascadeRemoved(link) => {
                self.links
                    .remove(&(link.idp_config_id.clone(), link.external_user_id.clone()));
            }
            UserEvent::Removed(_) => self.links.clear(),
            UserEvent::HumanAdded(_)
            | UserEvent::ProfileChanged(_)
            | UserEvent::UsernameChanged(_)
            | UserEvent::Deactivated(_)
            | UserEvent::Reactivated(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserWriteModel {
    base: WriteModel,
    pub state: EntityState,
    pub username: String,
    pub email: String,
    pub profile: HumanProfile,
    pub idp_links: UserIdpLinksModel,
}

/// Human user as returned to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanUser {
    pub details: ObjectDetails,
    pub state: EntityState,
    pub username: String,
    pub email: String,
    pub profile: HumanProfile,
}

impl UserWriteModel {
    pub fn new(user_id: &str, org_id: &str, instance_id: &str) -> Self {
        let aggregate = AggregateRef::new(AggregateType::User, user_id, org_id, instance_id);
        Self {
            idp_links: UserIdpLinksModel::new(aggregate.clone()),
            base: WriteModel::new(aggregate),
            state: EntityState::Unspecified,
            username: String::new(),
            email: String::new(),
            profile: HumanProfile::default(),
        }
    }

    pub fn to_human_user(&self) -> Option<HumanUser> {
        self.state.exists().then(|| HumanUser {
            details: self.base.details(),
            state: self.state,
            username: self.username.clone(),
            email: self.email.clone(),
            profile: self.profile.clone(),
        })
    }
}

impl Reducer for UserWriteModel {
    type Event = UserEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base
            .aggregate_query(UserEvent::event_types())
            .resource_owner(self.base.resource_owner())
    }

    fn apply(&mut self, event: &UserEvent, _raw: &Event) {
        match event {
            UserEvent::HumanAdded(added) => {
                self.username = added.username.clone();
                self.email = added.email.clone();
                self.profile = added.profile.clone();
                self.state = EntityState::Active;
            }
            UserEvent::ProfileChanged(changed) => {
                for change in &changed.changes {
                    let p = &mut self.profile;
                    match change {
                        ProfileChange::FirstName(v) => p.first_name = v.clone(),
                        ProfileChange::LastName(v) => p.last_name = v.clone(),
                        ProfileChange::NickName(v) => p.nick_name = v.clone(),
                        ProfileChange::DisplayName(v) => p.display_name = v.clone(),
                        ProfileChange::PreferredLanguage(v) => p.preferred_language = v.clone(),
                        ProfileChange::Gender(v) => p.gender = *v,
                    }
                }
            }
            UserEvent::UsernameChanged(changed) => self.username = changed.username.clone(),
            UserEvent::Deactivated(_) => self.state = EntityState::Inactive,
            UserEvent::Reactivated(_) => self.state = EntityState::Active,
            UserEvent::Removed(_) => self.state = EntityState::Removed,
            UserEvent::IdpLinkAdded(_)
            | UserEvent::IdpLinkRemoved(_)
            | UserEvent::IdpLinkCascadeRemoved(_) => {}
        }
    }

    fn append_events(&mut self, events: &[Event]) {
        buffer_events(self, events);
        self.idp_links.append_events(events);
    }

    fn reduce(&mut self) -> CommandResult<()> {
        fold_pending(self)?;
        self.idp_links.reduce()
    }
}
