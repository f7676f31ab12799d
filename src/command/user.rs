// Copyright (c) 2025 - Cowboy AI, Inc.
//! Human user commands
//!
//! Usernames are unique per organization. An external identity
//! (identity provider, external user id) may be linked to at most one user of
//! the instance.

use tracing::{info, instrument};

use super::{required, CommandContext, Commands};
use crate::diff::ChangeSet;
use crate::domain::IdpOwner;
use crate::errors::{CommandError, CommandResult, ViolationKind};
use crate::events::user::{
    HumanAdded, HumanProfile, IdpLink, IdpLinkAdded, ProfileChange, UserRemoved, UsernameChanged,
};
use crate::events::{Changes, Empty, PendingEvent, UniqueConstraint, UserEvent};
use crate::write_model::idp::IdpConfigWriteModel;
use crate::write_model::user::{HumanUser, UserWriteModel};
use crate::write_model::{EntityState, ObjectDetails, Reducer};

const UNIQUE_USERNAME: &str = "username";
const UNIQUE_IDP_LINK: &str = "idp_link";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddHumanUser {
    pub username: String,
    pub email: String,
    pub profile: HumanProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddIdpLink {
    pub idp_config_id: String,
    pub idp_owner: IdpOwner,
    pub external_user_id: String,
    pub display_name: String,
}

fn unique_username(org_id: &str, username: &str) -> UniqueConstraint {
    UniqueConstraint::claim(
        UNIQUE_USERNAME,
        format!("{}:{}", org_id, username),
        "Errors.User.AlreadyExists",
    )
}

fn release_username(org_id: &str, username: &str) -> UniqueConstraint {
    UniqueConstraint::release(UNIQUE_USERNAME, format!("{}:{}", org_id, username))
}

fn claim_idp_link(idp_config_id: &str, external_user_id: &str) -> UniqueConstraint {
    UniqueConstraint::claim(
        UNIQUE_IDP_LINK,
        format!("{}:{}", idp_config_id, external_user_id),
        "Errors.User.ExternalIDP.AlreadyExists",
    )
    .on_violation(ViolationKind::PreconditionFailed)
}

pub(crate) fn release_idp_link(idp_config_id: &str, external_user_id: &str) -> UniqueConstraint {
    UniqueConstraint::release(
        UNIQUE_IDP_LINK,
        format!("{}:{}", idp_config_id, external_user_id),
    )
}

/// Trimmed profile with first and last name present and a display name filled in
fn validate_profile(profile: &HumanProfile) -> CommandResult<HumanProfile> {
    let first_name = required(
        &profile.first_name,
        "USER-f1rstn",
        "Errors.User.Profile.FirstNameEmpty",
    )?;
    let last_name = required(
        &profile.last_name,
        "USER-l4stn4",
        "Errors.User.Profile.LastNameEmpty",
    )?;
    let display_name = match profile.display_name.trim() {
        "" => format!("{} {}", first_name, last_name),
        display_name => display_name.to_string(),
    };
    Ok(HumanProfile {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        nick_name: profile.nick_name.trim().to_string(),
        display_name,
        preferred_language: profile.preferred_language.trim().to_string(),
        gender: profile.gender,
    })
}

fn validate_email(email: &str) -> CommandResult<String> {
    let email = required(email, "USER-3m41l0", "Errors.User.Email.Empty")?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email.to_string()),
        _ => Err(CommandError::invalid_argument(
            "USER-3m41l1",
            "Errors.User.Email.Invalid",
        )),
    }
}

fn not_found() -> CommandError {
    CommandError::not_found("USER-5c9fvq", "Errors.User.NotFound")
}

impl Commands {
    async fn existing_user(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
    ) -> CommandResult<UserWriteModel> {
        let org_id = required(org_id, "USER-0rg1d0", "Errors.Org.IDMissing")?;
        let user_id = required(user_id, "USER-1d3mp0", "Errors.IDMissing")?;
        let mut model = UserWriteModel::new(user_id, org_id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(not_found());
        }
        Ok(model)
    }

    #[instrument(skip(self, ctx, add), fields(instance = %ctx.instance_id))]
    pub async fn add_human_user(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        add: AddHumanUser,
    ) -> CommandResult<ObjectDetails> {
        let org_id = required(org_id, "USER-0rg1d1", "Errors.Org.IDMissing")?;
        let username =
            required(&add.username, "USER-us3rn0", "Errors.User.Username.Empty")?.to_string();
        let email = validate_email(&add.email)?;
        let profile = validate_profile(&add.profile)?;

        let id = self.next_id().await?;
        let mut model = UserWriteModel::new(&id, org_id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists(
                "USER-a1r3dy",
                "Errors.User.AlreadyExisting",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let added = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &UserEvent::HumanAdded(HumanAdded {
                username: username.clone(),
                email,
                profile,
            }),
        )?
        .with_constraint(unique_username(org_id, &username));

        self.push_and_fold(ctx, &mut model, vec![added]).await?;
        info!(user_id = %id, org = %org_id, "Human user added");
        Ok(model.base().details())
    }

    /// Replace the profile; unchanged fields produce no change entries
    #[instrument(skip(self, ctx, profile), fields(instance = %ctx.instance_id))]
    pub async fn change_human_profile(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
        profile: HumanProfile,
    ) -> CommandResult<ObjectDetails> {
        let desired = validate_profile(&profile)?;
        let mut model = self.existing_user(ctx, org_id, user_id).await?;

        let current = &model.profile;
        let changes = ChangeSet::new()
            .field(&current.first_name, &desired.first_name, ProfileChange::FirstName)
            .field(&current.last_name, &desired.last_name, ProfileChange::LastName)
            .field(&current.nick_name, &desired.nick_name, ProfileChange::NickName)
            .field(&current.display_name, &desired.display_name, ProfileChange::DisplayName)
            .field(
                &current.preferred_language,
                &desired.preferred_language,
                ProfileChange::PreferredLanguage,
            )
            .field(&current.gender, &desired.gender, ProfileChange::Gender)
            .into_changes()
            .ok_or_else(|| {
                CommandError::precondition_failed("USER-c0ng3d", "Errors.User.Profile.NotChanged")
            })?;

        let aggregate = model.base().aggregate.clone();
        let changed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &UserEvent::ProfileChanged(Changes::new(changes)),
        )?;

        self.push_and_fold(ctx, &mut model, vec![changed]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn change_username(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
        username: &str,
    ) -> CommandResult<ObjectDetails> {
        let username =
            required(username, "USER-us3rn1", "Errors.User.Username.Empty")?.to_string();
        let mut model = self.existing_user(ctx, org_id, user_id).await?;
        if model.username == username {
            return Err(CommandError::precondition_failed(
                "USER-us3rn2",
                "Errors.User.Username.NotChanged",
            ));
        }

        let org_id = model.base().resource_owner().to_string();
        let aggregate = model.base().aggregate.clone();
        let changed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &UserEvent::UsernameChanged(UsernameChanged {
                old_username: model.username.clone(),
                username: username.clone(),
            }),
        )?
        .with_constraints([
            release_username(&org_id, &model.username),
            unique_username(&org_id, &username),
        ]);

        self.push_and_fold(ctx, &mut model, vec![changed]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn deactivate_user(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
    ) -> CommandResult<ObjectDetails> {
        self.transition_user(
            ctx,
            org_id,
            user_id,
            EntityState::Active,
            UserEvent::Deactivated(Empty {}),
        )
        .await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn reactivate_user(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
    ) -> CommandResult<ObjectDetails> {
        self.transition_user(
            ctx,
            org_id,
            user_id,
            EntityState::Inactive,
            UserEvent::Reactivated(Empty {}),
        )
        .await
    }

    async fn transition_user(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
        from: EntityState,
        event: UserEvent,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_user(ctx, org_id, user_id).await?;
        if model.state != from {
            return Err(CommandError::precondition_failed(
                "USER-st4t30",
                "Errors.User.InvalidState",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let pending = PendingEvent::new(&aggregate, &ctx.user_id, &event)?;
        self.push_and_fold(ctx, &mut model, vec![pending]).await?;
        Ok(model.base().details())
    }

    /// Remove a user, freeing its username and every external identity linked to it
    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn remove_user(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_user(ctx, org_id, user_id).await?;

        let org_id = model.base().resource_owner().to_string();
        let mut constraints = vec![release_username(&org_id, &model.username)];
        constraints.extend(
            model
                .idp_links
                .links
                .keys()
                .map(|(idp_config_id, external_user_id)| {
                    release_idp_link(idp_config_id, external_user_id)
                }),
        );

        let aggregate = model.base().aggregate.clone();
        let removed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &UserEvent::Removed(UserRemoved {
                username: model.username.clone(),
            }),
        )?
        .with_constraints(constraints);

        self.push_and_fold(ctx, &mut model, vec![removed]).await?;
        info!(user_id = %user_id, "User removed");
        Ok(model.base().details())
    }

    /// Link an external identity of an active identity provider to a user
    #[instrument(skip(self, ctx, link), fields(instance = %ctx.instance_id))]
    pub async fn add_user_idp_link(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
        link: AddIdpLink,
    ) -> CommandResult<ObjectDetails> {
        let idp_config_id = required(
            &link.idp_config_id,
            "USER-1dp1d0",
            "Errors.User.ExternalIDP.IDPConfigIDMissing",
        )?;
        let external_user_id = required(
            &link.external_user_id,
            "USER-3xt1d0",
            "Errors.User.ExternalIDP.ExternalUserIDMissing",
        )?;
        if let IdpOwner::Org(idp_org) = &link.idp_owner {
            if idp_org.trim() != org_id.trim() {
                return Err(CommandError::precondition_failed(
                    "USER-1dp0rg",
                    "Errors.User.ExternalIDP.IDPConfigNotExisting",
                ));
            }
        }

        let idp_owner = required(
            link.idp_owner.resource_owner(&ctx.instance_id),
            "USER-1dp0wn",
            "Errors.ResourceOwnerMissing",
        )?;
        let mut idp = IdpConfigWriteModel::new(idp_config_id, idp_owner, &ctx.instance_id);
        let (mut model, _) = tokio::try_join!(
            self.existing_user(ctx, org_id, user_id),
            self.hydrate(ctx, &mut idp),
        )?;
        if idp.state != EntityState::Active {
            return Err(CommandError::precondition_failed(
                "USER-1dpn4c",
                "Errors.User.ExternalIDP.IDPConfigNotExisting",
            ));
        }
        if model.idp_links.has_link(idp_config_id, external_user_id) {
            return Err(CommandError::already_exists(
                "USER-l1nk3x",
                "Errors.User.ExternalIDP.AlreadyExists",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let added = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &UserEvent::IdpLinkAdded(IdpLinkAdded {
                idp_config_id: idp_config_id.to_string(),
                external_user_id: external_user_id.to_string(),
                display_name: link.display_name.trim().to_string(),
            }),
        )?
        .with_constraint(claim_idp_link(idp_config_id, external_user_id));

        self.push_and_fold(ctx, &mut model, vec![added]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn remove_user_idp_link(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
        idp_config_id: &str,
        external_user_id: &str,
    ) -> CommandResult<ObjectDetails> {
        let idp_config_id = required(
            idp_config_id,
            "USER-1dp1d1",
            "Errors.User.ExternalIDP.IDPConfigIDMissing",
        )?;
        let external_user_id = required(
            external_user_id,
            "USER-3xt1d1",
            "Errors.User.ExternalIDP.ExternalUserIDMissing",
        )?;

        let mut model = self.existing_user(ctx, org_id, user_id).await?;
        if !model.idp_links.has_link(idp_config_id, external_user_id) {
            return Err(CommandError::not_found(
                "USER-l1nkn0",
                "Errors.User.ExternalIDP.NotFound",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let removed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &UserEvent::IdpLinkRemoved(IdpLink {
                idp_config_id: idp_config_id.to_string(),
                external_user_id: external_user_id.to_string(),
            }),
        )?
        .with_constraint(release_idp_link(idp_config_id, external_user_id));

        self.push_and_fold(ctx, &mut model, vec![removed]).await?;
        Ok(model.base().details())
    }

    pub async fn get_human_user(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
    ) -> CommandResult<HumanUser> {
        let model = self.existing_user(ctx, org_id, user_id).await?;
        model.to_human_user().ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ada@example.com", true ; "plain address")]
    #[test_case(" ada@example.com ", true ; "trimmed")]
    #[test_case("ada", false ; "no at sign")]
    #[test_case("@example.com", false ; "no local part")]
    #[test_case("ada@localhost", false ; "no domain dot")]
    fn test_validate_email(email: &str, valid: bool) {
        assert_eq!(validate_email(email).is_ok(), valid);
    }

    #[test]
    fn test_display_name_defaults_to_full_name() {
        let profile = HumanProfile {
            first_name: " Ada ".into(),
            last_name: "Lovelace".into(),
            ..HumanProfile::default()
        };

        let valid = validate_profile(&profile).unwrap();

        assert_eq!(valid.display_name, "Ada Lovelace");
        assert_eq!(valid.first_name, "Ada");
    }
}
