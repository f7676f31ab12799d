// Copyright (c) 2025 - Cowboy AI, Inc.
//! Target commands
//!
//! Targets are the endpoints executions call. They are instance scoped and
//! their names are unique per instance.

use std::time::Duration;
use tracing::{info, instrument};

use super::{required, CommandContext, Commands};
use crate::diff::ChangeSet;
use crate::domain::{Endpoint, TargetType};
use crate::errors::{CommandError, CommandResult};
use crate::events::target::{TargetAdded, TargetChange, TargetRemoved};
use crate::events::{Changes, PendingEvent, TargetEvent, UniqueConstraint};
use crate::write_model::target::{Target, TargetWriteModel};
use crate::write_model::{ObjectDetails, Reducer};

const UNIQUE_TARGET_NAME: &str = "target_name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTarget {
    pub name: String,
    pub target_type: TargetType,
    pub endpoint: String,
    pub timeout: Duration,
    pub interrupt_on_error: bool,
}

/// Partial update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTarget {
    pub name: Option<String>,
    pub target_type: Option<TargetType>,
    pub endpoint: Option<String>,
    pub timeout: Option<Duration>,
    pub interrupt_on_error: Option<bool>,
    /// Replace the signing key with a fresh one
    pub expiration_signing_key: bool,
}

fn unique_name(name: &str) -> UniqueConstraint {
    UniqueConstraint::claim(UNIQUE_TARGET_NAME, name, "Errors.Target.AlreadyExists")
}

fn endpoint(raw: &str) -> CommandResult<Endpoint> {
    Endpoint::new(raw).map_err(|err| {
        CommandError::invalid_argument(
            "TARGET-e1ndp0",
            format!("Errors.Target.InvalidURL: {}", err),
        )
    })
}

fn check_timeout(timeout: Duration, max: Duration) -> CommandResult<()> {
    if timeout.is_zero() || timeout > max {
        return Err(CommandError::invalid_argument(
            "TARGET-t1m30u",
            "Errors.Target.InvalidTimeout",
        ));
    }
    Ok(())
}

fn check_owner(resource_owner: &str) -> CommandResult<&str> {
    required(resource_owner, "INSTANCE-r3s0wn", "Errors.ResourceOwnerMissing")
}

impl Commands {
    #[instrument(skip(self, ctx, add), fields(instance = %ctx.instance_id))]
    pub async fn add_target(
        &self,
        ctx: &CommandContext,
        add: AddTarget,
        resource_owner: &str,
    ) -> CommandResult<ObjectDetails> {
        let resource_owner = check_owner(resource_owner)?;
        let name = required(&add.name, "TARGET-n4m3e0", "Errors.Target.Invalid")?.to_string();
        let endpoint = endpoint(&add.endpoint)?;
        check_timeout(add.timeout, self.config().target_max_timeout)?;

        let id = self.next_id().await?;
        let mut model = TargetWriteModel::new(&id, resource_owner, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists(
                "TARGET-9f3kq2",
                "Errors.Target.AlreadyExists",
            ));
        }

        let signing_key = self.generate_signing_key().await?;
        let aggregate = model.base().aggregate.clone();
        let added = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &TargetEvent::Added(TargetAdded {
                name: name.clone(),
                target_type: add.target_type,
                endpoint,
                timeout: add.timeout,
                interrupt_on_error: add.interrupt_on_error,
                signing_key,
            }),
        )?
        .with_constraint(unique_name(&name));

        self.push_and_fold(ctx, &mut model, vec![added]).await?;
        info!(target_id = %id, "Target added");
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx, change), fields(instance = %ctx.instance_id))]
    pub async fn change_target(
        &self,
        ctx: &CommandContext,
        id: &str,
        change: ChangeTarget,
        resource_owner: &str,
    ) -> CommandResult<ObjectDetails> {
        let resource_owner = check_owner(resource_owner)?;
        let id = required(id, "TARGET-1d3mpt", "Errors.IDMissing")?;
        let name = match &change.name {
            Some(name) => {
                Some(required(name, "TARGET-n4m3e1", "Errors.Target.Invalid")?.to_string())
            }
            None => None,
        };
        let new_endpoint = change.endpoint.as_deref().map(endpoint).transpose()?;
        if let Some(timeout) = change.timeout {
            check_timeout(timeout, self.config().target_max_timeout)?;
        }

        let mut model = TargetWriteModel::new(id, resource_owner, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(CommandError::not_found("TARGET-x8k2p4", "Errors.Target.NotFound"));
        }

        let signing_key = if change.expiration_signing_key {
            Some(self.generate_signing_key().await?)
        } else {
            None
        };

        let changes = ChangeSet::new()
            .optional(&model.name, name.as_ref(), TargetChange::Name)
            .optional_unset(
                model.target_type.as_ref(),
                change.target_type.as_ref(),
                TargetChange::TargetType,
            )
            .optional_unset(model.endpoint.as_ref(), new_endpoint.as_ref(), TargetChange::Endpoint)
            .optional(&model.timeout, change.timeout.as_ref(), TargetChange::Timeout)
            .optional(
                &model.interrupt_on_error,
                change.interrupt_on_error.as_ref(),
                TargetChange::InterruptOnError,
            )
            .secret(signing_key, TargetChange::SigningKey)
            .into_changes()
            .ok_or_else(|| {
                CommandError::precondition_failed("TARGET-c0ng3d", "Errors.Target.NoChanges")
            })?;

        let mut constraints = Vec::new();
        if let Some(TargetChange::Name(new_name)) = changes
            .iter()
            .find(|change| matches!(change, TargetChange::Name(_)))
        {
            constraints.push(UniqueConstraint::release(UNIQUE_TARGET_NAME, &model.name));
            constraints.push(unique_name(new_name));
        }

        let aggregate = model.base().aggregate.clone();
        let changed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &TargetEvent::Changed(Changes::new(changes)),
        )?
        .with_constraints(constraints);

        self.push_and_fold(ctx, &mut model, vec![changed]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn delete_target(
        &self,
        ctx: &CommandContext,
        id: &str,
        resource_owner: &str,
    ) -> CommandResult<ObjectDetails> {
        let resource_owner = check_owner(resource_owner)?;
        let id = required(id, "TARGET-1d3mpu", "Errors.IDMissing")?;

        let mut model = TargetWriteModel::new(id, resource_owner, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(CommandError::not_found("TARGET-x8k2p5", "Errors.Target.NotFound"));
        }

        let aggregate = model.base().aggregate.clone();
        let removed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &TargetEvent::Removed(TargetRemoved {
                name: model.name.clone(),
            }),
        )?
        .with_constraint(UniqueConstraint::release(UNIQUE_TARGET_NAME, &model.name));

        self.push_and_fold(ctx, &mut model, vec![removed]).await?;
        info!(target_id = %id, "Target removed");
        Ok(model.base().details())
    }

    /// Hydrate and project one target
    pub async fn get_target(
        &self,
        ctx: &CommandContext,
        id: &str,
        resource_owner: &str,
    ) -> CommandResult<Target> {
        let mut model = TargetWriteModel::new(id, resource_owner, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        model
            .to_target()
            .ok_or_else(|| CommandError::not_found("TARGET-x8k2p6", "Errors.Target.NotFound"))
    }
}
