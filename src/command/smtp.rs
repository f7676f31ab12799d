// Copyright (c) 2025 - Cowboy AI, Inc.
//! SMTP notification channel commands
//!
//! A new configuration starts inactive. The password is write-only: it is
//! encrypted on the way in and an empty password on change keeps the stored one.

use tracing::{info, instrument};

use super::{required, CommandContext, Commands};
use crate::diff::ChangeSet;
use crate::errors::{CommandError, CommandResult};
use crate::events::smtp::{SmtpConfigAdded, SmtpConfigChange};
use crate::events::{Changes, Empty, PendingEvent, SmtpConfigEvent};
use crate::write_model::smtp::{SmtpConfig, SmtpConfigWriteModel};
use crate::write_model::{EntityState, ObjectDetails, Reducer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddSmtpConfig {
    pub description: String,
    pub tls: bool,
    pub sender_address: String,
    pub sender_name: String,
    pub reply_to_address: String,
    pub host: String,
    pub user: String,
    pub password: String,
}

/// Full desired state; an empty `password` keeps the stored one
pub type ChangeSmtpConfig = AddSmtpConfig;

/// Trimmed copy with the mandatory fields present
fn validate(config: &AddSmtpConfig) -> CommandResult<AddSmtpConfig> {
    let sender_address = required(
        &config.sender_address,
        "SMTP-s3nd3r",
        "Errors.SMTPConfig.SenderAddressEmpty",
    )?;
    if !sender_address.contains('@') {
        return Err(CommandError::invalid_argument(
            "SMTP-s3nd3a",
            "Errors.SMTPConfig.SenderAddressInvalid",
        ));
    }
    let sender_name = required(
        &config.sender_name,
        "SMTP-s3ndn4",
        "Errors.SMTPConfig.SenderNameEmpty",
    )?;
    let host = required(&config.host, "SMTP-h0st00", "Errors.SMTPConfig.HostEmpty")?;
    Ok(AddSmtpConfig {
        description: config.description.trim().to_string(),
        tls: config.tls,
        sender_address: sender_address.to_string(),
        sender_name: sender_name.to_string(),
        reply_to_address: config.reply_to_address.trim().to_string(),
        host: host.to_string(),
        user: config.user.trim().to_string(),
        password: config.password.clone(),
    })
}

fn not_found() -> CommandError {
    CommandError::not_found("SMTP-n0tfnd", "Errors.SMTPConfig.NotFound")
}

impl Commands {
    async fn existing_smtp_config(
        &self,
        ctx: &CommandContext,
        id: &str,
    ) -> CommandResult<SmtpConfigWriteModel> {
        let id = required(id, "SMTP-1d3mp0", "Errors.IDMissing")?;
        let mut model = SmtpConfigWriteModel::new(id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(not_found());
        }
        Ok(model)
    }

    #[instrument(skip(self, ctx, add), fields(instance = %ctx.instance_id))]
    pub async fn add_smtp_config(
        &self,
        ctx: &CommandContext,
        add: AddSmtpConfig,
    ) -> CommandResult<ObjectDetails> {
        let add = validate(&add)?;

        let id = self.next_id().await?;
        let mut model = SmtpConfigWriteModel::new(&id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists(
                "SMTP-a1r3dy",
                "Errors.SMTPConfig.AlreadyExists",
            ));
        }

        let password = self.encrypt_optional(&add.password).await?;
        let aggregate = model.base().aggregate.clone();
        let added = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &SmtpConfigEvent::Added(SmtpConfigAdded {
                description: add.description,
                tls: add.tls,
                sender_address: add.sender_address,
                sender_name: add.sender_name,
                reply_to_address: add.reply_to_address,
                host: add.host,
                user: add.user,
                password,
            }),
        )?;

        self.push_and_fold(ctx, &mut model, vec![added]).await?;
        info!(smtp_config_id = %id, "SMTP configuration added");
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx, change), fields(instance = %ctx.instance_id))]
    pub async fn change_smtp_config(
        &self,
        ctx: &CommandContext,
        id: &str,
        change: ChangeSmtpConfig,
    ) -> CommandResult<ObjectDetails> {
        let desired = validate(&change)?;
        let mut model = self.existing_smtp_config(ctx, id).await?;

        let password = self.encrypt_optional(&desired.password).await?;
        let changes = ChangeSet::new()
            .secret(password, SmtpConfigChange::Password)
            .field(&model.description, &desired.description, SmtpConfigChange::Description)
            .field(&model.tls, &desired.tls, SmtpConfigChange::Tls)
            .field(
                &model.sender_address,
                &desired.sender_address,
                SmtpConfigChange::SenderAddress,
            )
            .field(&model.sender_name, &desired.sender_name, SmtpConfigChange::SenderName)
            .field(
                &model.reply_to_address,
                &desired.reply_to_address,
                SmtpConfigChange::ReplyToAddress,
            )
            .field(&model.host, &desired.host, SmtpConfigChange::Host)
            .field(&model.user, &desired.user, SmtpConfigChange::User)
            .into_changes()
            .ok_or_else(|| {
                CommandError::precondition_failed("SMTP-c0ng3d", "Errors.SMTPConfig.NotChanged")
            })?;

        let aggregate = model.base().aggregate.clone();
        let changed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &SmtpConfigEvent::Changed(Changes::new(changes)),
        )?;

        self.push_and_fold(ctx, &mut model, vec![changed]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn activate_smtp_config(
        &self,
        ctx: &CommandContext,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        self.transition_smtp_config(
            ctx,
            id,
            EntityState::Inactive,
            SmtpConfigEvent::Activated(Empty {}),
        )
        .await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn deactivate_smtp_config(
        &self,
        ctx: &CommandContext,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        self.transition_smtp_config(
            ctx,
            id,
            EntityState::Active,
            SmtpConfigEvent::Deactivated(Empty {}),
        )
        .await
    }

    async fn transition_smtp_config(
        &self,
        ctx: &CommandContext,
        id: &str,
        from: EntityState,
        event: SmtpConfigEvent,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_smtp_config(ctx, id).await?;
        if model.state != from {
            return Err(CommandError::precondition_failed(
                "SMTP-st4t30",
                "Errors.SMTPConfig.InvalidState",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let pending = PendingEvent::new(&aggregate, &ctx.user_id, &event)?;
        self.push_and_fold(ctx, &mut model, vec![pending]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn remove_smtp_config(
        &self,
        ctx: &CommandContext,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_smtp_config(ctx, id).await?;

        let aggregate = model.base().aggregate.clone();
        let removed =
            PendingEvent::new(&aggregate, &ctx.user_id, &SmtpConfigEvent::Removed(Empty {}))?;

        self.push_and_fold(ctx, &mut model, vec![removed]).await?;
        Ok(model.base().details())
    }

    pub async fn get_smtp_config(
        &self,
        ctx: &CommandContext,
        id: &str,
    ) -> CommandResult<SmtpConfig> {
        let model = self.existing_smtp_config(ctx, id).await?;
        model.to_smtp_config().ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn config() -> AddSmtpConfig {
        AddSmtpConfig {
            description: " main ".into(),
            sender_address: "noreply@example.com".into(),
            sender_name: "Example".into(),
            host: "smtp.example.com:587".into(),
            ..AddSmtpConfig::default()
        }
    }

    #[test]
    fn test_validate_trims() {
        let valid = validate(&config()).unwrap();

        assert_eq!(valid.description, "main");
        assert_eq!(valid.password, "");
    }

    #[test_case(|c: &mut AddSmtpConfig| c.sender_address = "noreply".into() ; "sender without at sign")]
    #[test_case(|c: &mut AddSmtpConfig| c.sender_name = " ".into() ; "blank sender name")]
    #[test_case(|c: &mut AddSmtpConfig| c.host = String::new() ; "missing host")]
    fn test_validate_rejects(mutate: fn(&mut AddSmtpConfig)) {
        let mut config = config();
        mutate(&mut config);

        assert!(matches!(
            validate(&config),
            Err(CommandError::InvalidArgument { .. })
        ));
    }
}
