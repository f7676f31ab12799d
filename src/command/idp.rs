// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity-provider configuration commands
//!
//! A configuration is owned by the instance or by one organization and is
//! either OIDC or JWT. Adding one pushes the generic `idp_config.added` and the
//! protocol specific added event in the same batch. Removing one cascades to
//! every login policy and user link that references it.

use tracing::{info, instrument};

use super::user::release_idp_link;
use super::{required, CommandContext, Commands};
use crate::diff::ChangeSet;
use crate::domain::{Endpoint, IdpOwner, IdpStylingType, OidcMappingField};
use crate::errors::{CommandError, CommandResult};
use crate::events::idp::{
    IdpConfigAdded, IdpConfigChange, IdpConfigRemoved, IdpConfigType, JwtConfigAdded,
    JwtConfigChange, OidcConfigAdded, OidcConfigChange,
};
use crate::events::login_policy::LoginPolicyIdp;
use crate::events::user::IdpLink;
use crate::events::{
    Changes, Empty, IdpConfigEvent, JwtConfigEvent, LoginPolicyEvent, OidcConfigEvent,
    PendingEvent, UniqueConstraint, UserEvent,
};
use crate::write_model::idp::{
    IdpConfig, IdpConfigWriteModel, LoginPolicyIdpReferences, UserIdpLinkReferences,
};
use crate::write_model::{EntityState, ObjectDetails, Reducer};

const UNIQUE_IDP_NAME: &str = "idp_config_name";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OidcConfigInput {
    pub client_id: String,
    pub client_secret: String,
    pub issuer: String,
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub scopes: Vec<String>,
    pub display_name_mapping: OidcMappingField,
    pub username_mapping: OidcMappingField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwtConfigInput {
    pub jwt_endpoint: String,
    pub issuer: String,
    pub keys_endpoint: String,
    pub header_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdpProtocolConfig {
    Oidc(OidcConfigInput),
    Jwt(JwtConfigInput),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddIdpConfig {
    pub name: String,
    pub styling_type: IdpStylingType,
    pub auto_register: bool,
    pub config: IdpProtocolConfig,
}

/// Full desired state of the generic part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeIdpConfig {
    pub name: String,
    pub styling_type: IdpStylingType,
    pub auto_register: bool,
}

/// Full desired OIDC state; an empty `client_secret` keeps the stored secret
pub type ChangeOidcConfig = OidcConfigInput;

pub type ChangeJwtConfig = JwtConfigInput;

/// OIDC input after local validation, secret still in clear text
struct ValidOidc {
    client_id: String,
    client_secret: String,
    issuer: Endpoint,
    authorization_endpoint: Option<Endpoint>,
    token_endpoint: Option<Endpoint>,
    scopes: Vec<String>,
    display_name_mapping: OidcMappingField,
    username_mapping: OidcMappingField,
}

struct ValidJwt {
    jwt_endpoint: Endpoint,
    issuer: String,
    keys_endpoint: Endpoint,
    header_name: String,
}

fn endpoint(raw: &str, code: &'static str) -> CommandResult<Endpoint> {
    Endpoint::new(raw).map_err(|err| {
        CommandError::invalid_argument(code, format!("Errors.IdpConfig.InvalidURL: {}", err))
    })
}

/// `None` for an absent or blank endpoint
fn optional_endpoint(raw: Option<&str>, code: &'static str) -> CommandResult<Option<Endpoint>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => endpoint(raw, code).map(Some),
    }
}

fn validate_oidc(input: &OidcConfigInput, secret_required: bool) -> CommandResult<ValidOidc> {
    let client_id = required(&input.client_id, "IDP-c1i3nt", "Errors.IdpConfig.ClientIDMissing")?;
    if secret_required && input.client_secret.trim().is_empty() {
        return Err(CommandError::invalid_argument(
            "IDP-s3cr3t",
            "Errors.IdpConfig.ClientSecretMissing",
        ));
    }
    let scopes = input
        .scopes
        .iter()
        .map(|scope| scope.trim())
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ValidOidc {
        client_id: client_id.to_string(),
        client_secret: input.client_secret.trim().to_string(),
        issuer: endpoint(&input.issuer, "IDP-1ssu3r")?,
        authorization_endpoint: optional_endpoint(
            input.authorization_endpoint.as_deref(),
            "IDP-4uth0e",
        )?,
        token_endpoint: optional_endpoint(input.token_endpoint.as_deref(), "IDP-t0k3ne")?,
        scopes,
        display_name_mapping: input.display_name_mapping,
        username_mapping: input.username_mapping,
    })
}

fn validate_jwt(input: &JwtConfigInput) -> CommandResult<ValidJwt> {
    Ok(ValidJwt {
        jwt_endpoint: endpoint(&input.jwt_endpoint, "IDP-jwt3nd")?,
        issuer: required(&input.issuer, "IDP-jwt1ss", "Errors.IdpConfig.IssuerMissing")?
            .to_string(),
        keys_endpoint: endpoint(&input.keys_endpoint, "IDP-k3ys3n")?,
        header_name: required(&input.header_name, "IDP-h34d3r", "Errors.IdpConfig.HeaderMissing")?
            .to_string(),
    })
}

fn owner_id<'a>(owner: &'a IdpOwner, instance_id: &'a str) -> CommandResult<&'a str> {
    required(
        owner.resource_owner(instance_id),
        "IDP-0wn3r0",
        "Errors.ResourceOwnerMissing",
    )
}

fn unique_name(owner_id: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::claim(
        UNIQUE_IDP_NAME,
        format!("{}:{}", owner_id, name),
        "Errors.IdpConfig.AlreadyExists",
    )
}

fn release_name(owner_id: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::release(UNIQUE_IDP_NAME, format!("{}:{}", owner_id, name))
}

fn not_found() -> CommandError {
    CommandError::not_found("IDP-4m9fjs", "Errors.IdpConfig.NotFound")
}

impl Commands {
    /// Hydrated configuration that must exist
    async fn existing_idp_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
    ) -> CommandResult<IdpConfigWriteModel> {
        let owner_id = owner_id(owner, &ctx.instance_id)?;
        let id = required(id, "IDP-1d3mp0", "Errors.IDMissing")?;
        let mut model = IdpConfigWriteModel::new(id, owner_id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(not_found());
        }
        Ok(model)
    }

    #[instrument(skip(self, ctx, add), fields(instance = %ctx.instance_id))]
    pub async fn add_idp_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        add: AddIdpConfig,
    ) -> CommandResult<ObjectDetails> {
        let owner_id = owner_id(owner, &ctx.instance_id)?;
        let name = required(&add.name, "IDP-n4m3e0", "Errors.IdpConfig.Invalid")?.to_string();
        enum Valid {
            Oidc(ValidOidc),
            Jwt(ValidJwt),
        }
        let config = match &add.config {
            IdpProtocolConfig::Oidc(oidc) => Valid::Oidc(validate_oidc(oidc, true)?),
            IdpProtocolConfig::Jwt(jwt) => Valid::Jwt(validate_jwt(jwt)?),
        };

        let id = self.next_id().await?;
        let mut model = IdpConfigWriteModel::new(&id, owner_id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists(
                "IDP-a1r3dy",
                "Errors.IdpConfig.AlreadyExists",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let config_type = match config {
            Valid::Oidc(_) => IdpConfigType::Oidc,
            Valid::Jwt(_) => IdpConfigType::Jwt,
        };
        let added = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &IdpConfigEvent::Added(IdpConfigAdded {
                name: name.clone(),
                config_type,
                styling_type: add.styling_type,
                auto_register: add.auto_register,
            }),
        )?
        .with_constraint(unique_name(owner_id, &name));

        let protocol = match config {
            Valid::Oidc(oidc) => {
                let client_secret = self.encrypt(&oidc.client_secret).await?;
                PendingEvent::new(
                    &aggregate,
                    &ctx.user_id,
                    &OidcConfigEvent::Added(OidcConfigAdded {
                        client_id: oidc.client_id,
                        client_secret,
                        issuer: oidc.issuer,
                        authorization_endpoint: oidc.authorization_endpoint,
                        token_endpoint: oidc.token_endpoint,
                        scopes: oidc.scopes,
                        display_name_mapping: oidc.display_name_mapping,
                        username_mapping: oidc.username_mapping,
                    }),
                )?
            }
            Valid::Jwt(jwt) => PendingEvent::new(
                &aggregate,
                &ctx.user_id,
                &JwtConfigEvent::Added(JwtConfigAdded {
                    jwt_endpoint: jwt.jwt_endpoint,
                    issuer: jwt.issuer,
                    keys_endpoint: jwt.keys_endpoint,
                    header_name: jwt.header_name,
                }),
            )?,
        };

        self.push_and_fold(ctx, &mut model, vec![added, protocol])
            .await?;
        info!(idp_config_id = %id, owner = %owner_id, ?config_type, "Identity provider added");
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx, change), fields(instance = %ctx.instance_id))]
    pub async fn change_idp_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
        change: ChangeIdpConfig,
    ) -> CommandResult<ObjectDetails> {
        let name = required(&change.name, "IDP-n4m3e1", "Errors.IdpConfig.Invalid")?.to_string();
        let mut model = self.existing_idp_config(ctx, owner, id).await?;

        let changes = ChangeSet::new()
            .field(&model.name, &name, IdpConfigChange::Name)
            .field(&model.styling_type, &change.styling_type, IdpConfigChange::StylingType)
            .field(&model.auto_register, &change.auto_register, IdpConfigChange::AutoRegister)
            .into_changes()
            .ok_or_else(|| {
                CommandError::precondition_failed("IDP-c0ng3d", "Errors.IdpConfig.NotChanged")
            })?;

        let owner_id = model.base().resource_owner().to_string();
        let mut constraints = Vec::new();
        if model.name != name {
            constraints.push(release_name(&owner_id, &model.name));
            constraints.push(unique_name(&owner_id, &name));
        }

        let aggregate = model.base().aggregate.clone();
        let changed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &IdpConfigEvent::Changed(Changes::new(changes)),
        )?
        .with_constraints(constraints);

        self.push_and_fold(ctx, &mut model, vec![changed]).await?;
        Ok(model.base().details())
    }

    /// Change the OIDC part; a new client secret is always recorded, first
    #[instrument(skip(self, ctx, change), fields(instance = %ctx.instance_id))]
    pub async fn change_idp_oidc_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
        change: ChangeOidcConfig,
    ) -> CommandResult<ObjectDetails> {
        let desired = validate_oidc(&change, false)?;
        let mut model = self.existing_idp_config(ctx, owner, id).await?;
        if model.config_type != Some(IdpConfigType::Oidc) || !model.oidc.state.exists() {
            return Err(CommandError::precondition_failed(
                "IDP-n01dc0",
                "Errors.IdpConfig.OIDC.NotExisting",
            ));
        }

        let client_secret = self.encrypt_optional(&desired.client_secret).await?;
        let oidc = &model.oidc;
        let changes = ChangeSet::new()
            .secret(client_secret, OidcConfigChange::ClientSecret)
            .field(&oidc.client_id, &desired.client_id, OidcConfigChange::ClientId)
            .optional_unset(oidc.issuer.as_ref(), Some(&desired.issuer), OidcConfigChange::Issuer)
            .field(
                &oidc.authorization_endpoint,
                &desired.authorization_endpoint,
                OidcConfigChange::AuthorizationEndpoint,
            )
            .field(
                &oidc.token_endpoint,
                &desired.token_endpoint,
                OidcConfigChange::TokenEndpoint,
            )
            .field(&oidc.scopes, &desired.scopes, OidcConfigChange::Scopes)
            .field(
                &oidc.display_name_mapping,
                &desired.display_name_mapping,
                OidcConfigChange::DisplayNameMapping,
            )
            .field(
                &oidc.username_mapping,
                &desired.username_mapping,
                OidcConfigChange::UsernameMapping,
            )
            .into_changes()
            .ok_or_else(|| {
                CommandError::precondition_failed("IDP-c0ng3e", "Errors.IdpConfig.NotChanged")
            })?;

        let aggregate = model.base().aggregate.clone();
        let changed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &OidcConfigEvent::Changed(Changes::new(changes)),
        )?;

        self.push_and_fold(ctx, &mut model, vec![changed]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx, change), fields(instance = %ctx.instance_id))]
    pub async fn change_idp_jwt_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
        change: ChangeJwtConfig,
    ) -> CommandResult<ObjectDetails> {
        let desired = validate_jwt(&change)?;
        let mut model = self.existing_idp_config(ctx, owner, id).await?;
        if model.config_type != Some(IdpConfigType::Jwt) || !model.jwt.state.exists() {
            return Err(CommandError::precondition_failed(
                "IDP-n0jwt0",
                "Errors.IdpConfig.JWT.NotExisting",
            ));
        }

        let jwt = &model.jwt;
        let changes = ChangeSet::new()
            .optional_unset(
                jwt.jwt_endpoint.as_ref(),
                Some(&desired.jwt_endpoint),
                JwtConfigChange::JwtEndpoint,
            )
            .field(&jwt.issuer, &desired.issuer, JwtConfigChange::Issuer)
            .optional_unset(
                jwt.keys_endpoint.as_ref(),
                Some(&desired.keys_endpoint),
                JwtConfigChange::KeysEndpoint,
            )
            .field(&jwt.header_name, &desired.header_name, JwtConfigChange::HeaderName)
            .into_changes()
            .ok_or_else(|| {
                CommandError::precondition_failed("IDP-c0ng3f", "Errors.IdpConfig.NotChanged")
            })?;

        let aggregate = model.base().aggregate.clone();
        let changed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &JwtConfigEvent::Changed(Changes::new(changes)),
        )?;

        self.push_and_fold(ctx, &mut model, vec![changed]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn deactivate_idp_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        self.transition_idp_config(
            ctx,
            owner,
            id,
            EntityState::Active,
            IdpConfigEvent::Deactivated(Empty {}),
        )
        .await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn reactivate_idp_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        self.transition_idp_config(
            ctx,
            owner,
            id,
            EntityState::Inactive,
            IdpConfigEvent::Reactivated(Empty {}),
        )
        .await
    }

    async fn transition_idp_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
        from: EntityState,
        event: IdpConfigEvent,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_idp_config(ctx, owner, id).await?;
        if model.state != from {
            return Err(CommandError::precondition_failed(
                "IDP-st4t30",
                "Errors.IdpConfig.InvalidState",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let pending = PendingEvent::new(&aggregate, &ctx.user_id, &event)?;
        self.push_and_fold(ctx, &mut model, vec![pending]).await?;
        Ok(model.base().details())
    }

    /// Remove a configuration together with every login policy entry and user link to it
    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn remove_idp_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        let owner_id = owner_id(owner, &ctx.instance_id)?;
        let id = required(id, "IDP-1d3mp1", "Errors.IDMissing")?;

        let mut model = IdpConfigWriteModel::new(id, owner_id, &ctx.instance_id);
        let policy_scope = match owner {
            IdpOwner::Instance => None,
            IdpOwner::Org(org_id) => Some(org_id.as_str()),
        };
        let mut policies = LoginPolicyIdpReferences::new(&ctx.instance_id, policy_scope);
        let mut links = UserIdpLinkReferences::new(&ctx.instance_id, id);
        tokio::try_join!(
            self.hydrate(ctx, &mut model),
            self.hydrate(ctx, &mut policies),
            self.hydrate(ctx, &mut links),
        )?;
        if !model.state.exists() {
            return Err(not_found());
        }

        let aggregate = model.base().aggregate.clone();
        let mut events = vec![PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &IdpConfigEvent::Removed(IdpConfigRemoved {
                name: model.name.clone(),
            }),
        )?
        .with_constraint(release_name(owner_id, &model.name))];

        let referencing = policies.referencing(id);
        for policy in &referencing {
            events.push(PendingEvent::new(
                policy,
                &ctx.user_id,
                &LoginPolicyEvent::IdpCascadeRemoved(LoginPolicyIdp {
                    idp_config_id: id.to_string(),
                }),
            )?);
        }
        let user_links = links.links();
        for (user, external_user_id) in &user_links {
            events.push(
                PendingEvent::new(
                    user,
                    &ctx.user_id,
                    &UserEvent::IdpLinkCascadeRemoved(IdpLink {
                        idp_config_id: id.to_string(),
                        external_user_id: external_user_id.clone(),
                    }),
                )?
                .with_constraint(release_idp_link(id, external_user_id)),
            );
        }

        self.push_and_fold(ctx, &mut model, events).await?;
        info!(
            idp_config_id = %id,
            login_policies = referencing.len(),
            user_links = user_links.len(),
            "Identity provider removed"
        );
        Ok(model.base().details())
    }

    pub async fn get_idp_config(
        &self,
        ctx: &CommandContext,
        owner: &IdpOwner,
        id: &str,
    ) -> CommandResult<IdpConfig> {
        let model = self.existing_idp_config(ctx, owner, id).await?;
        model.to_idp_config().ok_or_else(not_found)
    }
}
