// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flow commands

use std::collections::HashSet;
use tracing::{info, instrument};

use super::{required, CommandContext, Commands};
use crate::domain::{FlowType, TriggerType};
use crate::errors::{CommandError, CommandResult};
use crate::events::flow::{FlowCleared, TriggerActionsSet};
use crate::events::{FlowEvent, PendingEvent};
use crate::write_model::action::ActionWriteModel;
use crate::write_model::flow::FlowWriteModel;
use crate::write_model::{EntityState, ObjectDetails, Reducer};

impl Commands {
    /// Replace the ordered actions of one trigger; an empty list clears it
    #[instrument(skip(self, ctx, action_ids), fields(instance = %ctx.instance_id))]
    pub async fn set_trigger_actions(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        flow_type: FlowType,
        trigger_type: TriggerType,
        action_ids: Vec<String>,
    ) -> CommandResult<ObjectDetails> {
        let org_id = required(org_id, "FLOW-0rg1d0", "Errors.Org.IDMissing")?;
        if !flow_type.has_trigger(trigger_type) {
            return Err(CommandError::invalid_argument(
                "FLOW-tr1gg3",
                "Errors.Flow.WrongTriggerType",
            ));
        }
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(action_ids.len());
        for id in &action_ids {
            let id = required(id, "FLOW-4ct10n", "Errors.Flow.ActionIDMissing")?;
            if !seen.insert(id) {
                return Err(CommandError::invalid_argument(
                    "FLOW-dup1c4",
                    "Errors.Flow.ActionIDDuplicate",
                ));
            }
            ids.push(id.to_string());
        }

        let mut flow = FlowWriteModel::new(org_id, &ctx.instance_id);
        let actions = ids
            .iter()
            .map(|id| ActionWriteModel::new(id, org_id, &ctx.instance_id))
            .collect();
        let (_, actions) =
            tokio::try_join!(self.hydrate(ctx, &mut flow), self.hydrate_all(ctx, actions))?;
        if actions.iter().any(|action| action.state != EntityState::Active) {
            return Err(CommandError::precondition_failed(
                "FLOW-n0t4ct",
                "Errors.Flow.ActionIDsNotExist",
            ));
        }

        if flow.actions(flow_type, trigger_type) == ids.as_slice() {
            return Err(CommandError::precondition_failed(
                "FLOW-n0chg0",
                "Errors.Flow.NoChanges",
            ));
        }

        let aggregate = flow.base().aggregate.clone();
        let set = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &FlowEvent::TriggerActionsSet(TriggerActionsSet {
                flow_type,
                trigger_type,
                action_ids: ids,
            }),
        )?;

        self.push_and_fold(ctx, &mut flow, vec![set]).await?;
        info!(org = %org_id, %flow_type, "Trigger actions set");
        Ok(flow.base().details())
    }

    /// Drop every trigger of one flow type
    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id))]
    pub async fn clear_flow(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        flow_type: FlowType,
    ) -> CommandResult<ObjectDetails> {
        let org_id = required(org_id, "FLOW-0rg1d1", "Errors.Org.IDMissing")?;

        let mut flow = FlowWriteModel::new(org_id, &ctx.instance_id);
        self.hydrate(ctx, &mut flow).await?;
        if !flow.has_flow(flow_type) {
            return Err(CommandError::precondition_failed(
                "FLOW-3mpty0",
                "Errors.Flow.Empty",
            ));
        }

        let aggregate = flow.base().aggregate.clone();
        let cleared = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &FlowEvent::Cleared(FlowCleared { flow_type }),
        )?;

        self.push_and_fold(ctx, &mut flow, vec![cleared]).await?;
        Ok(flow.base().details())
    }

    /// Ordered action ids of one trigger
    pub async fn get_trigger_actions(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        flow_type: FlowType,
        trigger_type: TriggerType,
    ) -> CommandResult<Vec<String>> {
        let mut flow = FlowWriteModel::new(org_id, &ctx.instance_id);
        self.hydrate(ctx, &mut flow).await?;
        Ok(flow.actions(flow_type, trigger_type).to_vec())
    }
}
