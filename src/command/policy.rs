// Copyright (c) 2025 - Cowboy AI, Inc.
//! Settings policy commands, generic over [`PolicySchema`]

use tracing::instrument;

use super::{CommandContext, Commands};
use crate::errors::{CommandError, CommandResult};
use crate::events::{Changes, PendingEvent, PolicyEvent};
use crate::policy::{resolve, PolicyLevel, PolicySchema, ResolvedPolicy};
use crate::write_model::policy::PolicyWriteModel;
use crate::write_model::{ObjectDetails, Reducer};

/// Reject levels the policy cannot live on, before any I/O
fn check_level<P: PolicySchema>(level: &PolicyLevel) -> CommandResult<()> {
    if !level.is_valid() || !P::supports(level.scope()) {
        return Err(CommandError::invalid_argument(
            "POLICY-l3v3l0",
            format!("Errors.{}.InvalidLevel", P::NAME),
        ));
    }
    Ok(())
}

fn not_found<P: PolicySchema>() -> CommandError {
    CommandError::not_found("POLICY-n0tfnd", format!("Errors.{}.NotFound", P::NAME))
}

impl Commands {
    async fn policy_model<P: PolicySchema>(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
    ) -> CommandResult<PolicyWriteModel<P>> {
        let mut model = PolicyWriteModel::<P>::new(level.clone(), &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        Ok(model)
    }

    async fn push_policy_event<P: PolicySchema>(
        &self,
        ctx: &CommandContext,
        model: &mut PolicyWriteModel<P>,
        event: PolicyEvent<P>,
    ) -> CommandResult<ObjectDetails> {
        let aggregate = model.base().aggregate.clone();
        let pending = PendingEvent::new(&aggregate, &ctx.user_id, &event)?;
        self.push_and_fold(ctx, model, vec![pending]).await?;
        Ok(model.base().details())
    }

    #[instrument(
        skip(self, ctx, policy),
        fields(instance = %ctx.instance_id, policy = P::NAME, level = %level)
    )]
    pub async fn add_policy<P: PolicySchema>(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        policy: P,
    ) -> CommandResult<ObjectDetails> {
        check_level::<P>(level)?;
        policy.validate()?;

        let mut model = self.policy_model::<P>(ctx, level).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists(
                "POLICY-a1r3dy",
                format!("Errors.{}.AlreadyExists", P::NAME),
            ));
        }
        self.push_policy_event(ctx, &mut model, PolicyEvent::Added(policy))
            .await
    }

    #[instrument(
        skip(self, ctx, policy),
        fields(instance = %ctx.instance_id, policy = P::NAME, level = %level)
    )]
    pub async fn change_policy<P: PolicySchema>(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
        policy: P,
    ) -> CommandResult<ObjectDetails> {
        check_level::<P>(level)?;
        policy.validate()?;

        let mut model = self.policy_model::<P>(ctx, level).await?;
        let current = match (&model.policy, model.state.exists()) {
            (Some(current), true) => current,
            _ => return Err(not_found::<P>()),
        };
        let changes = current.changes(&policy).ok_or_else(|| {
            CommandError::precondition_failed(
                "POLICY-c0ng3d",
                format!("Errors.{}.NotChanged", P::NAME),
            )
        })?;
        let event = PolicyEvent::Changed(Changes::new(changes));
        self.push_policy_event(ctx, &mut model, event).await
    }

    /// Remove an organization or user override; the instance policy stays
    #[instrument(
        skip(self, ctx),
        fields(instance = %ctx.instance_id, policy = P::NAME, level = %level)
    )]
    pub async fn remove_policy<P: PolicySchema>(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
    ) -> CommandResult<ObjectDetails> {
        check_level::<P>(level)?;
        if *level == PolicyLevel::Instance {
            return Err(CommandError::precondition_failed(
                "POLICY-1nst4n",
                format!("Errors.{}.InstanceNotRemovable", P::NAME),
            ));
        }

        let mut model = self.policy_model::<P>(ctx, level).await?;
        if !model.state.exists() {
            return Err(not_found::<P>());
        }
        self.push_policy_event(ctx, &mut model, PolicyEvent::Removed)
            .await
    }

    /// Effective policy for `level`, inherited from the nearest level above if unset
    pub async fn resolve_policy<P: PolicySchema>(
        &self,
        ctx: &CommandContext,
        level: &PolicyLevel,
    ) -> CommandResult<ResolvedPolicy<P>> {
        if !level.is_valid() {
            return Err(CommandError::invalid_argument(
                "POLICY-l3v3l1",
                format!("Errors.{}.InvalidLevel", P::NAME),
            ));
        }
        resolve(level.clone(), P::supports, move |level| async move {
            let model = self.policy_model::<P>(ctx, &level).await?;
            Ok(model.projection())
        })
        .await
    }
}
