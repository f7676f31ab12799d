// Copyright (c) 2025 - Cowboy AI, Inc.
//! User aggregate events

use serde::{Deserialize, Serialize};

use super::{Changes, Empty};
use crate::domain::Gender;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UserEvent {
    HumanAdded(HumanAdded),
    ProfileChanged(Changes<ProfileChange>),
    UsernameChanged(UsernameChanged),
    Deactivated(Empty),
    Reactivated(Empty),
    Removed(UserRemoved),
    IdpLinkAdded(IdpLinkAdded),
    IdpLinkRemoved(IdpLink),
    IdpLinkCascadeRemoved(IdpLink),
}

domain_event!(UserEvent {
    HumanAdded(HumanAdded) => "user.human.added",
    ProfileChanged(Changes<ProfileChange>) => "user.human.profile.changed",
    UsernameChanged(UsernameChanged) => "user.username.changed",
    Deactivated(Empty) => "user.deactivated",
    Reactivated(Empty) => "user.reactivated",
    Removed(UserRemoved) => "user.removed",
    IdpLinkAdded(IdpLinkAdded) => "user.idp_link.added",
    IdpLinkRemoved(IdpLink) => "user.idp_link.removed",
    IdpLinkCascadeRemoved(IdpLink) => "user.idp_link.cascade.removed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanAdded {
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub profile: HumanProfile,
}

/// Mutable profile fields of a human user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanProfile {
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub display_name: String,
    pub preferred_language: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ProfileChange {
    FirstName(String),
    LastName(String),
    NickName(String),
    DisplayName(String),
    PreferredLanguage(String),
    Gender(Gender),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameChanged {
    pub old_username: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemoved {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpLinkAdded {
    pub idp_config_id: String,
    pub external_user_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpLink {
    pub idp_config_id: String,
    pub external_user_id: String,
}
