// Copyright (c) 2025 - Cowboy AI, Inc.
//! Execution commands
//!
//! Executions bind an ordered list of targets to a condition. An entry may
//! include another execution by condition id; the include graph must stay
//! acyclic and no deeper than `max_include_depth`.

use std::collections::HashSet;
use tracing::{debug, instrument};

use super::{CommandContext, Commands};
use crate::domain::{ExecutionCondition, ExecutionTarget};
use crate::errors::{CommandError, CommandResult};
use crate::events::execution::ExecutionSet;
use crate::events::{Empty, ExecutionEvent, PendingEvent};
use crate::write_model::execution::{Execution, ExecutionWriteModel};
use crate::write_model::target::TargetWriteModel;
use crate::write_model::{ObjectDetails, Reducer};

fn check_condition(condition: &ExecutionCondition) -> CommandResult<String> {
    if !condition.is_valid() {
        return Err(CommandError::invalid_argument(
            "EXEC-c0nd10",
            "Errors.Execution.ConditionInvalid",
        ));
    }
    Ok(condition.id())
}

fn check_targets(targets: Vec<ExecutionTarget>) -> CommandResult<Vec<ExecutionTarget>> {
    if targets.is_empty() {
        return Err(CommandError::invalid_argument(
            "EXEC-t4rg30",
            "Errors.Execution.TargetsMissing",
        ));
    }
    let mut seen = HashSet::new();
    let mut checked = Vec::with_capacity(targets.len());
    for target in targets {
        let reference = target.reference().trim().to_string();
        if reference.is_empty() {
            return Err(CommandError::invalid_argument(
                "EXEC-t4rg31",
                "Errors.Execution.TargetInvalid",
            ));
        }
        let target = match target {
            ExecutionTarget::Target(_) => ExecutionTarget::Target(reference),
            ExecutionTarget::Include(_) => ExecutionTarget::Include(reference),
        };
        if !seen.insert(target.clone()) {
            return Err(CommandError::invalid_argument(
                "EXEC-dup1c4",
                "Errors.Execution.TargetDuplicate",
            ));
        }
        checked.push(target);
    }
    Ok(checked)
}

fn include_cycle() -> CommandError {
    CommandError::precondition_failed("EXEC-cyc13e", "Errors.Execution.IncludeCycle")
}

impl Commands {
    /// Set the targets of the execution for `condition`, replacing the previous list
    #[instrument(
        skip(self, ctx, targets),
        fields(instance = %ctx.instance_id, condition = %condition)
    )]
    pub async fn set_execution(
        &self,
        ctx: &CommandContext,
        condition: &ExecutionCondition,
        targets: Vec<ExecutionTarget>,
    ) -> CommandResult<ObjectDetails> {
        let id = check_condition(condition)?;
        let targets = check_targets(targets)?;
        if targets
            .iter()
            .any(|target| matches!(target, ExecutionTarget::Include(include) if *include == id))
        {
            return Err(include_cycle());
        }

        let target_models = targets
            .iter()
            .filter_map(|target| match target {
                ExecutionTarget::Target(target_id) => Some(TargetWriteModel::new(
                    target_id,
                    &ctx.instance_id,
                    &ctx.instance_id,
                )),
                ExecutionTarget::Include(_) => None,
            })
            .collect();
        let include_models = targets
            .iter()
            .filter_map(|target| match target {
                ExecutionTarget::Include(include) => {
                    Some(ExecutionWriteModel::new(include, &ctx.instance_id))
                }
                ExecutionTarget::Target(_) => None,
            })
            .collect();

        let mut model = ExecutionWriteModel::new(&id, &ctx.instance_id);
        let (_, target_models, include_models) = tokio::try_join!(
            self.hydrate(ctx, &mut model),
            self.hydrate_all(ctx, target_models),
            self.hydrate_all(ctx, include_models),
        )?;

        if target_models.iter().any(|target| !target.state.exists()) {
            return Err(CommandError::precondition_failed(
                "EXEC-n0t4rg",
                "Errors.Execution.TargetNotFound",
            ));
        }
        if include_models.iter().any(|include| !include.state.exists()) {
            return Err(CommandError::precondition_failed(
                "EXEC-n01ncl",
                "Errors.Execution.IncludeNotFound",
            ));
        }
        self.check_include_graph(ctx, &id, include_models).await?;

        if model.state.exists() && model.targets == targets {
            return Err(CommandError::precondition_failed(
                "EXEC-n0chg0",
                "Errors.Execution.NoChanges",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let set = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &ExecutionEvent::Set(ExecutionSet { targets }),
        )?;

        self.push_and_fold(ctx, &mut model, vec![set]).await?;
        Ok(model.base().details())
    }

    /// Walk the include graph breadth first from the direct includes of `root`
    async fn check_include_graph(
        &self,
        ctx: &CommandContext,
        root: &str,
        mut level: Vec<ExecutionWriteModel>,
    ) -> CommandResult<()> {
        let max_depth = self.config().max_include_depth;
        let mut visited: HashSet<String> = level
            .iter()
            .map(|include| include.base().aggregate_id().to_string())
            .collect();
        let mut depth = 1;

        while !level.is_empty() {
            if depth > max_depth {
                return Err(CommandError::precondition_failed(
                    "EXEC-d3pth0",
                    "Errors.Execution.IncludeTooDeep",
                ));
            }

            let mut next = Vec::new();
            for include in &level {
                for nested in include.includes() {
                    if nested == root {
                        return Err(include_cycle());
                    }
                    if visited.insert(nested.to_string()) {
                        next.push(ExecutionWriteModel::new(nested, &ctx.instance_id));
                    }
                }
            }
            debug!(depth, includes = next.len(), "Following execution includes");

            level = self.hydrate_all(ctx, next).await?;
            depth += 1;
        }
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(instance = %ctx.instance_id, condition = %condition))]
    pub async fn remove_execution(
        &self,
        ctx: &CommandContext,
        condition: &ExecutionCondition,
    ) -> CommandResult<ObjectDetails> {
        let id = check_condition(condition)?;

        let mut model = ExecutionWriteModel::new(&id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        if !model.state.exists() {
            return Err(CommandError::not_found(
                "EXEC-n0tfnd",
                "Errors.Execution.NotFound",
            ));
        }

        let aggregate = model.base().aggregate.clone();
        let removed = PendingEvent::new(
            &aggregate,
            &ctx.user_id,
            &ExecutionEvent::Removed(Empty {}),
        )?;

        self.push_and_fold(ctx, &mut model, vec![removed]).await?;
        Ok(model.base().details())
    }

    pub async fn get_execution(
        &self,
        ctx: &CommandContext,
        condition: &ExecutionCondition,
    ) -> CommandResult<Execution> {
        let id = check_condition(condition)?;
        let mut model = ExecutionWriteModel::new(&id, &ctx.instance_id);
        self.hydrate(ctx, &mut model).await?;
        model.to_execution().ok_or_else(|| {
            CommandError::not_found("EXEC-n0tfn1", "Errors.Execution.NotFound")
        })
    }
}
