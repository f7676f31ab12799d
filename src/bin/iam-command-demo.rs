// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM Command Demo
//!
//! Drives a handful of commands against the in-memory event store and prints
//! the resulting log.
//!
//! Run with: cargo run --bin iam-command-demo
//!
//! Environment:
//! - `RUST_LOG` filters log output (default `info`)
//! - `IAM_*` variables override command limits, see `CommandConfig::from_env`
//! - `IAM_DEMO_MASTER_KEY` keys the development cipher

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use iam_command::command::{AddAction, AddHumanUser, AddIdpConfig, AddTarget};
use iam_command::command::{IdpProtocolConfig, OidcConfigInput};
use iam_command::domain::{ApiCondition, ExecutionCondition, ExecutionTarget};
use iam_command::domain::{FlowType, IdpOwner, IdpStylingType, TargetType, TriggerType};
use iam_command::events::login_policy::LoginPolicySettings;
use iam_command::events::user::HumanProfile;
use iam_command::policy::PasswordComplexityPolicy;
use iam_command::telemetry::init_tracing;
use iam_command::{
    Blake3DevCrypto, CommandConfig, CommandContext, Commands, InMemoryEventStore, PolicyLevel,
    UuidV7Generator,
};

const INSTANCE_ID: &str = "demo-instance";
const ORG_ID: &str = "demo-org";
const ADMIN_ID: &str = "demo-admin";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    info!("Starting IAM command demo");

    let config = CommandConfig::from_env().context("Invalid IAM_* configuration")?;
    let master_key =
        std::env::var("IAM_DEMO_MASTER_KEY").unwrap_or_else(|_| "demo-master-key".to_string());

    let store = Arc::new(InMemoryEventStore::new());
    let commands = Commands::new(
        store.clone(),
        Arc::new(UuidV7Generator),
        Arc::new(Blake3DevCrypto::new("demo", master_key.as_bytes())),
        config,
    );
    let ctx = CommandContext::new(INSTANCE_ID, ADMIN_ID).with_timeout(Duration::from_secs(30));

    // Settings
    commands
        .add_default_login_policy(&ctx, LoginPolicySettings::default())
        .await
        .context("Failed to add default login policy")?;
    commands
        .add_policy(&ctx, &PolicyLevel::Instance, PasswordComplexityPolicy::default())
        .await
        .context("Failed to add password complexity policy")?;
    let resolved = commands
        .resolve_login_policy(&ctx, ORG_ID)
        .await
        .context("Failed to resolve login policy")?;
    info!(level = %resolved.level, is_default = resolved.is_default, "Login policy resolved");

    // Identity provider and user
    let idp = commands
        .add_idp_config(
            &ctx,
            &IdpOwner::Instance,
            AddIdpConfig {
                name: "Corporate SSO".to_string(),
                styling_type: IdpStylingType::Unspecified,
                auto_register: false,
                config: IdpProtocolConfig::Oidc(OidcConfigInput {
                    client_id: "demo-client".to_string(),
                    client_secret: "demo-secret".to_string(),
                    issuer: "https://sso.example.com".to_string(),
                    scopes: vec!["openid".to_string(), "email".to_string()],
                    ..OidcConfigInput::default()
                }),
            },
        )
        .await
        .context("Failed to add identity provider")?;
    info!(idp_id = %idp.id, "Identity provider ready");

    let user = commands
        .add_human_user(
            &ctx,
            ORG_ID,
            AddHumanUser {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                profile: HumanProfile {
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                    ..HumanProfile::default()
                },
            },
        )
        .await
        .context("Failed to add user")?;
    info!(user_id = %user.id, "User ready");

    // Actions and executions
    let action = commands
        .add_action(
            &ctx,
            ORG_ID,
            AddAction {
                name: "enrich-claims".to_string(),
                script: "function enrich(ctx, api) {}".to_string(),
                timeout: Duration::from_secs(5),
                allowed_to_fail: true,
            },
        )
        .await
        .context("Failed to add action")?;
    commands
        .set_trigger_actions(
            &ctx,
            ORG_ID,
            FlowType::CustomiseToken,
            TriggerType::PreAccessTokenCreation,
            vec![action.id.clone()],
        )
        .await
        .context("Failed to set trigger actions")?;

    let target = commands
        .add_target(
            &ctx,
            AddTarget {
                name: "audit-webhook".to_string(),
                target_type: TargetType::Webhook,
                endpoint: "https://hooks.example.com/audit".to_string(),
                timeout: Duration::from_secs(10),
                interrupt_on_error: false,
            },
            INSTANCE_ID,
        )
        .await
        .context("Failed to add target")?;
    commands
        .set_execution(
            &ctx,
            &ExecutionCondition::Request(ApiCondition::All),
            vec![ExecutionTarget::Target(target.id.clone())],
        )
        .await
        .context("Failed to set execution")?;

    // Removing the action cascades into the flow
    commands
        .delete_action(&ctx, ORG_ID, &action.id)
        .await
        .context("Failed to delete action")?;
    let remaining = commands
        .get_trigger_actions(
            &ctx,
            ORG_ID,
            FlowType::CustomiseToken,
            TriggerType::PreAccessTokenCreation,
        )
        .await
        .context("Failed to read trigger actions")?;
    if !remaining.is_empty() {
        warn!(remaining = remaining.len(), "Trigger still references actions");
    }

    for event in store.events().await {
        info!(
            sequence = event.sequence,
            aggregate = %event.aggregate,
            event_type = %event.event_type,
            "Event"
        );
    }

    info!("Demo finished");
    Ok(())
}
