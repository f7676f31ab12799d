// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for SMTP configurations

mod fixtures;

use pretty_assertions::assert_eq;

use fixtures::*;
use iam_command::command::ChangeSmtpConfig;
use iam_command::{EntityState, ErrorKind};

#[tokio::test]
async fn test_new_smtp_config_starts_inactive() {
    let h = harness(&[ID_1]);

    let details = h.commands.add_smtp_config(&h.ctx, smtp_fixture()).await.unwrap();

    assert_eq!(details.id, ID_1);
    assert_eq!(details.resource_owner, INSTANCE_ID);
    let config = h.commands.get_smtp_config(&h.ctx, ID_1).await.unwrap();
    assert_eq!(config.state, EntityState::Inactive);
    assert_eq!(config.host, "smtp.example.com:587");
}

#[tokio::test]
async fn test_password_never_reaches_the_log_in_clear() {
    let h = harness(&[ID_1]);

    h.commands.add_smtp_config(&h.ctx, smtp_fixture()).await.unwrap();
    h.commands
        .change_smtp_config(
            &h.ctx,
            ID_1,
            ChangeSmtpConfig {
                password: "rotated-pass".to_string(),
                ..smtp_fixture()
            },
        )
        .await
        .unwrap();

    for event in h.events().await {
        let payload = event.payload.to_string();
        assert!(!payload.contains("mail-pass"));
        assert!(!payload.contains("rotated-pass"));
    }
}

#[tokio::test]
async fn test_activation_follows_the_state_machine() {
    let h = harness(&[ID_1]);
    h.commands.add_smtp_config(&h.ctx, smtp_fixture()).await.unwrap();

    let deactivate_inactive = h.commands.deactivate_smtp_config(&h.ctx, ID_1).await;
    h.commands
        .activate_smtp_config(&h.ctx, ID_1)
        .await
        .unwrap();
    let activate_twice = h.commands.activate_smtp_config(&h.ctx, ID_1).await;
    let active = h.commands.get_smtp_config(&h.ctx, ID_1).await.unwrap();
    h.commands
        .deactivate_smtp_config(&h.ctx, ID_1)
        .await
        .unwrap();

    assert_kind(deactivate_inactive, ErrorKind::PreconditionFailed);
    assert_kind(activate_twice, ErrorKind::PreconditionFailed);
    assert_eq!(active.state, EntityState::Active);
    let inactive = h.commands.get_smtp_config(&h.ctx, ID_1).await.unwrap();
    assert_eq!(inactive.state, EntityState::Inactive);
}

#[tokio::test]
async fn test_empty_password_keeps_the_stored_one() {
    let h = harness(&[ID_1]);
    h.commands.add_smtp_config(&h.ctx, smtp_fixture()).await.unwrap();
    let change = ChangeSmtpConfig {
        password: String::new(),
        host: "smtp2.example.com:465".to_string(),
        ..smtp_fixture()
    };

    h.commands
        .change_smtp_config(&h.ctx, ID_1, change)
        .await
        .unwrap();

    let events = h.events().await;
    let changed = events.last().unwrap();
    assert_eq!(changed.event_type, "smtp_config.changed");
    assert_eq!(
        changed.payload,
        serde_json::json!({ "changes": [{ "field": "host", "value": "smtp2.example.com:465" }] })
    );
}

#[tokio::test]
async fn test_unchanged_smtp_config_is_precondition_failed() {
    let h = harness(&[ID_1]);
    h.commands.add_smtp_config(&h.ctx, smtp_fixture()).await.unwrap();

    let result = h
        .commands
        .change_smtp_config(
            &h.ctx,
            ID_1,
            ChangeSmtpConfig {
                password: String::new(),
                ..smtp_fixture()
            },
        )
        .await;

    assert_kind(result, ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_remove_smtp_config() {
    let h = harness(&[ID_1]);
    h.commands.add_smtp_config(&h.ctx, smtp_fixture()).await.unwrap();

    h.commands.remove_smtp_config(&h.ctx, ID_1).await.unwrap();

    assert_kind(
        h.commands.get_smtp_config(&h.ctx, ID_1).await,
        ErrorKind::NotFound,
    );
    assert_kind(
        h.commands.activate_smtp_config(&h.ctx, ID_1).await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_missing_sender_address_is_rejected_before_io() {
    let h = harness(&[ID_1]);
    let add = smtp_fixture();

    let result = h
        .commands
        .add_smtp_config(
            &h.ctx,
            ChangeSmtpConfig {
                sender_address: "not-an-address".to_string(),
                ..add
            },
        )
        .await;

    assert_kind(result, ErrorKind::InvalidArgument);
    assert_eq!(h.store.filter_calls(), 0);
}
