// Copyright (c) 2025 - Cowboy AI, Inc.
//! Login policy commands
//!
//! The instance carries the default login policy; an organization may
//! override it. Identity providers, second factors and multi factors are
//! managed as lists on either level.

use tracing::instrument;

use super::{CommandContext, Commands};
use crate::diff::ChangeSet;
use crate::domain::{Endpoint, IdpOwner, MultiFactorType, SecondFactorType};
use crate::errors::{CommandError, CommandResult};
use crate::events::login_policy::{
    LoginPolicyChange, LoginPolicyIdp, LoginPolicySettings, MultiFactor, SecondFactor,
};
use crate::events::{Changes, Empty, LoginPolicyEvent, PendingEvent};
use crate::policy::{resolve, PolicyLevel, PolicyScope, ResolvedPolicy};
use crate::write_model::idp::IdpConfigWriteModel;
use crate::write_model::login_policy::{LoginPolicy, LoginPolicyWriteModel};
use crate::write_model::{EntityState, ObjectDetails, Reducer};

fn invalid_level() -> CommandError {
    CommandError::invalid_argument("LOGIN-l3v3l0", "Errors.LoginPolicy.InvalidLevel")
}

fn not_found() -> CommandError {
    CommandError::not_found("LOGIN-n0tfnd", "Errors.LoginPolicy.NotFound")
}

/// Empty write model for an instance or organization level
fn model_for(level: &PolicyLevel, instance_id: &str) -> CommandResult<LoginPolicyWriteModel> {
    if !level.is_valid() {
        return Err(invalid_level());
    }
    match level {
        PolicyLevel::Instance => Ok(LoginPolicyWriteModel::instance(instance_id)),
        PolicyLevel::Org { org_id } => Ok(LoginPolicyWriteModel::org(org_id.trim(), instance_id)),
        PolicyLevel::User { .. } => Err(invalid_level()),
    }
}

fn validate_settings(settings: &LoginPolicySettings) -> CommandResult<LoginPolicySettings> {
    let mut settings = settings.clone();
    settings.default_redirect_uri = settings.default_redirect_uri.trim().to_string();
    if !settings.default_redirect_uri.is_empty() {
        Endpoint::new(settings.default_redirect_uri.as_str()).map_err(|err| {
            CommandError::invalid_argument(
                "LOGIN-r3d1r0",
                format!("Errors.LoginPolicy.RedirectURIInvalid: {}", err),
            )
        })?;
    }
    Ok(settings)
}

/// Ordered changes turning `current` into `desired`
fn settings_changes(
    current: &LoginPolicySettings,
    desired: &LoginPolicySettings,
) -> Option<Vec<LoginPolicyChange>> {
    use LoginPolicyChange as C;
    ChangeSet::new()
        .field(
            &current.allow_username_password,
            &desired.allow_username_password,
            C::AllowUsernamePassword,
        )
        .field(&current.allow_register, &desired.allow_register, C::AllowRegister)
        .field(&current.allow_external_idp, &desired.allow_external_idp, C::AllowExternalIdp)
        .field(&current.force_mfa, &desired.force_mfa, C::ForceMfa)
        .field(&current.passwordless_type, &desired.passwordless_type, C::PasswordlessType)
        .field(&current.hide_password_reset, &desired.hide_password_reset, C::HidePasswordReset)
        .field(
            &current.ignore_unknown_usernames,
            &desired.ignore_unknown_usernames,
            C::IgnoreUnknownUsernames,
        )
        .field(&current.default_redirect_uri, &desired.default_redirect_uri, C::DefaultRedirectUri)
        .field(
            &current.password_check_lifetime,
            &desired.password_check_lifetime,
            C::PasswordCheckLifetime,
        )
        .field(
            &current.external_login_check_lifetime,
            &desired.external_login_check_lifetime,
            C::ExternalLoginCheckLifetime,
        )
        .field(
            &current.mfa_init_skip_lifetime,
            &desired.mfa_init_skip_lifetime,
            C::MfaInitSkipLifetime,
        )
        .field(
            &current.second_factor_check_lifetime,
            &desired.second_factor_check_lifetime,
            C::SecondFactorCheckLifetime,
        )
        .field(
            &current.multi_factor_check_lifetime,
            &desired.multi_factor_check_lifetime,
            C::MultiFactorCheckLifetime,
        )
        .into_changes()
}

impl Commands {
    async fn existing_login_policy(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
    ) -> CommandResult<LoginPolicyWriteModel> {
        let mut model = model_for(level, &ctx.instance_id)?;
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(not_found());
        }
        Ok(model)
    }

    async fn push_login_policy_event(
        &self,
        ctx: &CommandContext,
        model: &mut LoginPolicyWriteModel,
        event: LoginPolicyEvent,
    ) -> CommandResult<ObjectDetails> {
        let aggregate = model.base().aggregate.clone();
        let pending = PendingEvent::new(&aggregate, &ctx.user_id, &event)?;
        self.push_and_fold(ctx, model, vec![pending]).await?;
        Ok(model.base().details())
    }

    async fn add_login_policy_at(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        settings: LoginPolicySettings,
    ) -> CommandResult<ObjectDetails> {
        let mut model = model_for(level, &ctx.instance_id)?;
        let settings = validate_settings(&settings)?;

        self.hydrate(ctx, &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists(
                "LOGIN-a1r3dy",
                "Errors.LoginPolicy.AlreadyExists",
            ));
        }
        self.push_login_policy_event(ctx, &mut model, LoginPolicyEvent::Added(settings))
            .await
    }

    async fn change_login_policy_at(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        settings: LoginPolicySettings,
    ) -> CommandResult<ObjectDetails> {
        model_for(level, &ctx.instance_id)?;
        let settings = validate_settings(&settings)?;

        let mut model = self.existing_login_policy(ctx, level).await?;
        let changes = settings_changes(&model.settings, &settings).ok_or_else(|| {
            CommandError::precondition_failed("LOGIN-c0ng3d", "Errors.LoginPolicy.NotChanged")
        })?;
        let event = LoginPolicyEvent::Changed(Changes::new(changes));
        self.push_login_policy_event(ctx, &mut model, event).await
    }

    #[instrument(skip(self, ctx, settings), fields(instance = %ctx.instance_id))]
    pub async fn add_default_login_policy(
        &self,
        ctx: &CommandContext,
        settings: LoginPolicySettings,
    ) -> CommandResult<ObjectDetails> {
        self.add_login_policy_at(ctx, &PolicyLevel::Instance, settings)
            .await
    }

    #[instrument(skip(self, ctx, settings), fields(instance = %ctx.instance_id))]
    pub async fn change_default_login_policy(
        &self,
        ctx: &CommandContext,
        settings: LoginPolicySettings,
    ) -> CommandResult<ObjectDetails> {
        self.change_login_policy_at(ctx, &PolicyLevel::Instance, settings)
            .await
    }

    #[instrument(skip(self, ctx, settings), fields(instance = %ctx.instance_id))]
    pub async fn add_login_policy(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        settings: LoginPolicySettings,
    ) -> CommandResult<ObjectDetails> {
        self.add_login_policy_at(ctx, &PolicyLevel::org(org_id), settings)
            .await
    }

    #[instrument(skip(self, ctx, settings), fields(instance = %ctx.instance_id))]
    pub async fn change_login_policy(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        settings: LoginPolicySettings,
    ) -> CommandResult<ObjectDetails> {
        self.change_login_policy_at(ctx, &PolicyLevel::org(org_id), settings)
            .await
    }

    /// Drop an organization's override; the instance default applies again
    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn remove_login_policy(
        &self,
        ctx: &CommandContext,
        org_id: &str,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self
            .existing_login_policy(ctx, &PolicyLevel::org(org_id))
            .await?;
        self.push_login_policy_event(ctx, &mut model, LoginPolicyEvent::Removed(Empty {}))
            .await
    }

    /// Allow an active identity provider on a login policy
    ///
    /// The instance policy only takes instance providers; an organization
    /// policy takes instance providers and its own.
    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id, level = %level))]
    pub async fn add_idp_to_login_policy(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        idp_config_id: &str,
        idp_owner: &IdpOwner,
    ) -> CommandResult<ObjectDetails> {
        let idp_config_id = super::required(
            idp_config_id,
            "LOGIN-1dp1d0",
            "Errors.LoginPolicy.IDP.IDMissing",
        )?;
        let mut model = model_for(level, &ctx.instance_id)?;
        let owner_allowed = match (level, idp_owner) {
            (_, IdpOwner::Instance) => true,
            (PolicyLevel::Org { org_id }, IdpOwner::Org(idp_org)) => {
                org_id.trim() == idp_org.trim()
            }
            _ => false,
        };
        if !owner_allowed {
            return Err(CommandError::invalid_argument(
                "LOGIN-1dp0wn",
                "Errors.LoginPolicy.IDP.WrongOwner",
            ));
        }

        let mut idp = IdpConfigWriteModel::new(
            idp_config_id,
            idp_owner.resource_owner(&ctx.instance_id),
            &ctx.instance_id,
        );
        tokio::try_join!(self.hydrate(ctx, &mut model), self.hydrate(ctx, &mut idp))?;
        if !model.state.exists() {
            return Err(not_found());
        }
        if idp.state != EntityState::Active {
            return Err(CommandError::precondition_failed(
                "LOGIN-1dpn4c",
                "Errors.IdpConfig.NotExisting",
            ));
        }
        if model.has_idp(idp_config_id) {
            return Err(CommandError::already_exists(
                "LOGIN-1dp3x1",
                "Errors.LoginPolicy.IDP.AlreadyExists",
            ));
        }

        let event = LoginPolicyEvent::IdpAdded(LoginPolicyIdp {
            idp_config_id: idp_config_id.to_string(),
        });
        self.push_login_policy_event(ctx, &mut model, event).await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id, level = %level))]
    pub async fn remove_idp_from_login_policy(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        idp_config_id: &str,
    ) -> CommandResult<ObjectDetails> {
        let idp_config_id = super::required(
            idp_config_id,
            "LOGIN-1dp1d1",
            "Errors.LoginPolicy.IDP.IDMissing",
        )?;
        let mut model = self.existing_login_policy(ctx, level).await?;
        if !model.has_idp(idp_config_id) {
            return Err(CommandError::not_found(
                "LOGIN-1dpn0t",
                "Errors.LoginPolicy.IDP.NotExisting",
            ));
        }

        let event = LoginPolicyEvent::IdpRemoved(LoginPolicyIdp {
            idp_config_id: idp_config_id.to_string(),
        });
        self.push_login_policy_event(ctx, &mut model, event).await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id, level = %level))]
    pub async fn add_second_factor(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        factor: SecondFactorType,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_login_policy(ctx, level).await?;
        if model.second_factors.contains(&factor) {
            return Err(CommandError::already_exists(
                "LOGIN-2f4ct0",
                "Errors.LoginPolicy.MFA.AlreadyExists",
            ));
        }
        let event = LoginPolicyEvent::SecondFactorAdded(SecondFactor { factor });
        self.push_login_policy_event(ctx, &mut model, event).await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id, level = %level))]
    pub async fn remove_second_factor(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        factor: SecondFactorType,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_login_policy(ctx, level).await?;
        if !model.second_factors.contains(&factor) {
            return Err(CommandError::not_found(
                "LOGIN-2f4ct1",
                "Errors.LoginPolicy.MFA.NotExisting",
            ));
        }
        let event = LoginPolicyEvent::SecondFactorRemoved(SecondFactor { factor });
        self.push_login_policy_event(ctx, &mut model, event).await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id, level = %level))]
    pub async fn add_multi_factor(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        factor: MultiFactorType,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_login_policy(ctx, level).await?;
        if model.multi_factors.contains(&factor) {
            return Err(CommandError::already_exists(
                "LOGIN-mf4ct0",
                "Errors.LoginPolicy.MFA.AlreadyExists",
            ));
        }
        let event = LoginPolicyEvent::MultiFactorAdded(MultiFactor { factor });
        self.push_login_policy_event(ctx, &mut model, event).await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id, level = %level))]
    pub async fn remove_multi_factor(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        factor: MultiFactorType,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_login_policy(ctx, level).await?;
        if !model.multi_factors.contains(&factor) {
            return Err(CommandError::not_found(
                "LOGIN-mf4ct1",
                "Errors.LoginPolicy.MFA.NotExisting",
            ));
        }
        let event = LoginPolicyEvent::MultiFactorRemoved(MultiFactor { factor });
        self.push_login_policy_event(ctx, &mut model, event).await
    }

    /// Effective login policy of an organization, falling back to the instance default
    pub async fn resolve_login_policy(
        &self,
        ctx: &CommandContext,
        org_id: &str,
    ) -> CommandResult<ResolvedPolicy<LoginPolicy>> {
        let start = PolicyLevel::org(org_id);
        if !start.is_valid() {
            return Err(invalid_level());
        }
        resolve(
            start,
            |scope| scope != PolicyScope::User,
            move |level| async move {
                let mut model = model_for(&level, &ctx.instance_id)?;
                self.hydrate(ctx, &mut model).await?;
                Ok(model.to_login_policy().map(|policy| {
                    let details = policy.details.clone();
                    (policy, details)
                }))
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_settings_changes_follow_field_order() {
        let current = LoginPolicySettings::default();
        let desired = LoginPolicySettings {
            multi_factor_check_lifetime: Duration::from_secs(60),
            allow_register: false,
            ..current.clone()
        };

        let changes = settings_changes(&current, &desired).unwrap();

        assert_eq!(
            changes,
            vec![
                LoginPolicyChange::AllowRegister(false),
                LoginPolicyChange::MultiFactorCheckLifetime(Duration::from_secs(60)),
            ]
        );
        assert_eq!(settings_changes(&current, &current), None);
    }

    #[test]
    fn test_user_level_has_no_login_policy() {
        let level = PolicyLevel::user("org1", "user1");

        assert!(matches!(
            model_for(&level, "inst1"),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_redirect_uri_must_be_url() {
        let settings = LoginPolicySettings {
            default_redirect_uri: "not a url".into(),
            ..LoginPolicySettings::default()
        };

        assert!(validate_settings(&settings).is_err());
    }
}
