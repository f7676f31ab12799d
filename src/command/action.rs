// Copyright (c) 2025 - Cowboy AI, Inc.
//! Action commands
//!
//! Actions are organization scoped scripts. Deleting one also removes it from
//! every flow trigger of its organization, in the same push.

use std::time::Duration;
use tracing::{info, instrument};

use super::{required, CommandContext, Commands};
use crate::diff::ChangeSet;
use crate::errors::{CommandError, CommandResult};
use crate::events::action::{ActionAdded, ActionChange, ActionRemoved};
use crate::events::flow::TriggerActionsCascadeRemoved;
use crate::events::{ActionEvent, Changes, Empty, FlowEvent, PendingEvent, UniqueConstraint};
use crate::write_model::action::{Action, ActionWriteModel};
use crate::write_model::flow::FlowWriteModel;
use crate::write_model::{EntityState, ObjectDetails, Reducer};

const UNIQUE_ACTION_NAME: &str = "action_name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddAction {
    pub name: String,
    pub script: String,
    pub timeout: Duration,
    pub allowed_to_fail: bool,
}

/// Full desired state of an action
pub type ChangeAction = AddAction;

fn unique_name(org_id: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::claim(
        UNIQUE_ACTION_NAME,
        format!("{}:{}", org_id, name),
        "Errors.Action.AlreadyExists",
    )
}

fn release_name(org_id: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::release(UNIQUE_ACTION_NAME, format!("{}:{}", org_id, name))
}

/// Trimmed name and script, checked timeout
fn validate(action: &AddAction, max_timeout: Duration) -> CommandResult<AddAction> {
    let name = required(&action.name, "ACTION-n4m3e0", "Errors.Action.Invalid")?;
    let script = required(&action.script, "ACTION-scr1pt", "Errors.Action.Invalid")?;
    if action.timeout > max_timeout {
        return Err(CommandError::invalid_argument(
            "ACTION-t1m30u",
            "Errors.Action.InvalidTimeout",
        ));
    }
    Ok(AddAction {
        name: name.to_string(),
        script: script.to_string(),
        timeout: action.timeout,
        allowed_to_fail: action.allowed_to_fail,
    })
}

fn not_found() -> CommandError {
    CommandError::not_found("ACTION-k9d2mx", "Errors.Action.NotFound")
}

impl Commands {
    #[instrument(skip(self, ctx, add), fields(instance = %ctx.instance_id))]
    pub async fn add_action(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        add: AddAction,
    ) -> CommandResult<ObjectDetails> {
        let org_id = required(org_id, "ACTION-0rg1d0", "Errors.Org.IDMissing")?;
        let add = validate(&add, self.config().action_max_timeout)?;

        let id = self.next_id().await?;
        let mut model = ActionWriteModel::new(&id, org_id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists(
                "ACTION-a1r3dy",
                "Errors.Action.AlreadyExists",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let added = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &ActionEvent::Added(ActionAdded {
                name: add.name.clone(),
                script: add.script,
                timeout: add.timeout,
                allowed_to_fail: add.allowed_to_fail,
            }),
        )?
        .with_constraint(unique_name(org_id, &add.name));

        self.push_and_fold(ctx, &mut model, vec![added]).await?;
        info!(action_id = %id, org = %org_id, "Action added");
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx, change), fields(instance = %ctx.instance_id))]
    pub async fn change_action(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        id: &str,
        change: ChangeAction,
    ) -> CommandResult<ObjectDetails> {
        let org_id = required(org_id, "ACTION-0rg1d1", "Errors.Org.IDMissing")?;
        let id = required(id, "ACTION-1d3mp0", "Errors.IDMissing")?;
        let change = validate(&change, self.config().action_max_timeout)?;

        let mut model = ActionWriteModel::new(id, org_id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(not_found());
        }

        let changes = ChangeSet::new()
            .field(&model.name, &change.name, ActionChange::Name)
            .field(&model.script, &change.script, ActionChange::Script)
            .field(&model.timeout, &change.timeout, ActionChange::Timeout)
            .field(
                &model.allowed_to_fail,
                &change.allowed_to_fail,
                ActionChange::AllowedToFail,
            )
            .into_changes()
            .ok_or_else(|| {
                CommandError::precondition_failed("ACTION-c0ng3d", "Errors.Action.NotChanged")
            })?;

        let mut constraints = Vec::new();
        if model.name != change.name {
            constraints.push(release_name(org_id, &model.name));
            constraints.push(unique_name(org_id, &change.name));
        }

        let aggregate = model.base().aggregate.clone();
        let changed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &ActionEvent::Changed(Changes::new(changes)),
        )?
        .with_constraints(constraints);

        self.push_and_fold(ctx, &mut model, vec![changed]).await?;
        Ok(model.base().details())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn deactivate_action(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        self.transition_action(
            ctx,
            org_id,
            id,
            EntityState::Active,
            ActionEvent::Deactivated(Empty {}),
        )
        .await
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn reactivate_action(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        self.transition_action(
            ctx,
            org_id,
            id,
            EntityState::Inactive,
            ActionEvent::Reactivated(Empty {}),
        )
        .await
    }

    async fn transition_action(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        id: &str,
        from: EntityState,
        event: ActionEvent,
    ) -> CommandResult<ObjectDetails> {
        let org_id = required(org_id, "ACTION-0rg1d2", "Errors.Org.IDMissing")?;
        let id = required(id, "ACTION-1d3mp1", "Errors.IDMissing")?;

        let mut model = ActionWriteModel::new(id, org_id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(not_found());
        }
        if model.state != from {
            return Err(CommandError::precondition_failed(
                "ACTION-st4t30",
                "Errors.Action.InvalidState",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let pending = PendingEvent::new(&aggregate, &ctx.user_id, &event)?;
        self.push_and_fold(ctx, &mut model, vec![pending]).await?;
        Ok(model.base().details())
    }

    /// Remove an action and drop it from every trigger of its organization's flows
    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn delete_action(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        id: &str,
    ) -> CommandResult<ObjectDetails> {
        let org_id = required(org_id, "ACTION-0rg1d3", "Errors.Org.IDMissing")?;
        let id = required(id, "ACTION-1d3mp2", "Errors.IDMissing")?;

        let mut model = ActionWriteModel::new(id, org_id, &ctx.instance_id);
        let mut flow = FlowWriteModel::new(org_id, &ctx.instance_id);
        tokio::try_join!(self.hydrate(ctx, &mut model), self.hydrate(ctx, &mut flow))?;
        if !model.state.exists() {
            return Err(not_found());
        }

        let aggregate = model.base().aggregate.clone();
        let mut events = vec![PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &ActionEvent::Removed(ActionRemoved {
                name: model.name.clone(),
            }),
        )?
        .with_constraint(release_name(org_id, &model.name))];

        let flow_aggregate = flow.base().aggregate.clone();
        for (flow_type, trigger_type) in flow.triggers_referencing(id) {
            events.push(PendingEvent::new(
                &flow_aggregate,
                &ctx.user_id,
                &FlowEvent::TriggerActionsCascadeRemoved(TriggerActionsCascadeRemoved {
                    flow_type,
                    trigger_type,
                    action_id: id.to_string(),
                }),
            )?);
        }
        let cascades = events.len() - 1;

        self.push_and_fold(ctx, &mut model, events).await?;
        info!(action_id = %id, cascades, "Action removed");
        Ok(model.base().details())
    }

    pub async fn get_action(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        id: &str,
    ) -> CommandResult<Action> {
        let mut model = ActionWriteModel::new(id, org_id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        model.to_action().ok_or_else(not_found)
    }
}
