// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for human users and their external identity links
//!
//! The last section interleaves a foreign write between hydration and push,
//! to observe the optimistic concurrency check.

mod fixtures;

use pretty_assertions::assert_eq;

use fixtures::*;
use iam_command::aggregate::{AggregateRef, AggregateType};
use iam_command::command::AddIdpLink;
use iam_command::domain::IdpOwner;
use iam_command::events::user::HumanProfile;
use iam_command::events::{Empty, PendingEvent, UserEvent};
use iam_command::{EntityState, ErrorKind};

fn link(idp_config_id: &str, external_user_id: &str) -> AddIdpLink {
    AddIdpLink {
        idp_config_id: idp_config_id.to_string(),
        idp_owner: IdpOwner::Instance,
        external_user_id: external_user_id.to_string(),
        display_name: external_user_id.to_string(),
    }
}

/// IDP `ID_1` on the instance plus user `ID_2` ("ada") in `ORG_ID`
async fn with_idp_and_user(ids: &[&'static str]) -> Harness {
    let h = harness(ids);
    h.commands
        .add_idp_config(&h.ctx, &IdpOwner::Instance, oidc_idp_fixture("SSO"))
        .await
        .unwrap();
    h.commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await
        .unwrap();
    h
}

#[tokio::test]
async fn test_add_human_user_round_trip() {
    let h = harness(&[ID_1]);

    let details = h
        .commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture(" ada "))
        .await
        .unwrap();

    assert_eq!(details.id, ID_1);
    assert_eq!(details.resource_owner, ORG_ID);
    let user = h.commands.get_human_user(&h.ctx, ORG_ID, ID_1).await.unwrap();
    assert_eq!(user.username, "ada");
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.state, EntityState::Active);
    assert_eq!(user.profile.last_name, "Lovelace");
}

#[tokio::test]
async fn test_usernames_are_unique_per_organization() {
    let h = harness(&[ID_1, ID_2, ID_3]);
    h.commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await
        .unwrap();

    let same_org = h
        .commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await;
    let other_org = h
        .commands
        .add_human_user(&h.ctx, OTHER_ORG_ID, human_fixture("ada"))
        .await;

    assert_kind(same_org, ErrorKind::AlreadyExists);
    assert!(other_org.is_ok());
}

#[tokio::test]
async fn test_invalid_user_input_is_rejected_before_io() {
    let h = harness(&[ID_1]);
    let mut no_email = human_fixture("ada");
    no_email.email = "ada".to_string();
    let mut no_first_name = human_fixture("ada");
    no_first_name.profile.first_name = " ".to_string();

    let email = h.commands.add_human_user(&h.ctx, ORG_ID, no_email).await;
    let profile = h.commands.add_human_user(&h.ctx, ORG_ID, no_first_name).await;

    assert_kind(email, ErrorKind::InvalidArgument);
    assert_kind(profile, ErrorKind::InvalidArgument);
    assert_eq!(h.store.filter_calls(), 0);
}

#[tokio::test]
async fn test_change_username_moves_the_claim() {
    let h = harness(&[ID_1, ID_2, ID_3]);
    h.commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await
        .unwrap();
    h.commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("grace"))
        .await
        .unwrap();

    let taken = h.commands.change_username(&h.ctx, ORG_ID, ID_1, "grace").await;
    let same = h.commands.change_username(&h.ctx, ORG_ID, ID_1, "ada").await;
    h.commands
        .change_username(&h.ctx, ORG_ID, ID_1, "countess")
        .await
        .unwrap();
    let freed = h
        .commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await;

    assert_kind(taken, ErrorKind::AlreadyExists);
    assert_kind(same, ErrorKind::PreconditionFailed);
    assert!(freed.is_ok());
    let user = h.commands.get_human_user(&h.ctx, ORG_ID, ID_1).await.unwrap();
    assert_eq!(user.username, "countess");
}

#[tokio::test]
async fn test_change_profile_records_only_differences() {
    let h = harness(&[ID_1]);
    h.commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await
        .unwrap();
    let profile = HumanProfile {
        nick_name: "Countess".to_string(),
        ..human_fixture("ada").profile
    };

    h.commands
        .change_human_profile(&h.ctx, ORG_ID, ID_1, profile.clone())
        .await
        .unwrap();
    let again = h
        .commands
        .change_human_profile(&h.ctx, ORG_ID, ID_1, profile)
        .await;

    assert_kind(again, ErrorKind::PreconditionFailed);
    let events = h.events().await;
    let changed = events.last().unwrap();
    assert_eq!(changed.event_type, "user.human.profile.changed");
    assert_eq!(
        changed.payload,
        serde_json::json!({ "changes": [{ "field": "nick_name", "value": "Countess" }] })
    );
}

#[tokio::test]
async fn test_deactivate_and_reactivate_user() {
    let h = harness(&[ID_1]);
    h.commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await
        .unwrap();

    let reactivate_active = h.commands.reactivate_user(&h.ctx, ORG_ID, ID_1).await;
    h.commands.deactivate_user(&h.ctx, ORG_ID, ID_1).await.unwrap();
    let inactive = h.commands.get_human_user(&h.ctx, ORG_ID, ID_1).await.unwrap();
    h.commands.reactivate_user(&h.ctx, ORG_ID, ID_1).await.unwrap();

    assert_kind(reactivate_active, ErrorKind::PreconditionFailed);
    assert_eq!(inactive.state, EntityState::Inactive);
}

#[tokio::test]
async fn test_user_is_scoped_to_its_organization() {
    let h = harness(&[ID_1]);
    h.commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await
        .unwrap();

    let result = h.commands.get_human_user(&h.ctx, OTHER_ORG_ID, ID_1).await;

    assert_kind(result, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_idp_link_requires_an_active_idp() {
    let h = with_idp_and_user(&[ID_1, ID_2]).await;
    h.commands
        .deactivate_idp_config(&h.ctx, &IdpOwner::Instance, ID_1)
        .await
        .unwrap();

    let inactive = h
        .commands
        .add_user_idp_link(&h.ctx, ORG_ID, ID_2, link(ID_1, "ext-ada"))
        .await;
    let missing = h
        .commands
        .add_user_idp_link(&h.ctx, ORG_ID, ID_2, link(ID_5, "ext-ada"))
        .await;

    assert_kind(inactive, ErrorKind::PreconditionFailed);
    assert_kind(missing, ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_idp_link_of_another_org_is_rejected_before_io() {
    let h = harness(&[]);
    let foreign = AddIdpLink {
        idp_owner: IdpOwner::Org(OTHER_ORG_ID.to_string()),
        ..link(ID_1, "ext-ada")
    };

    let result = h
        .commands
        .add_user_idp_link(&h.ctx, ORG_ID, ID_2, foreign)
        .await;

    assert_kind(result, ErrorKind::PreconditionFailed);
    assert_eq!(h.store.filter_calls(), 0);
}

#[tokio::test]
async fn test_external_identity_links_to_one_user_only() {
    // Arrange
    let h = with_idp_and_user(&[ID_1, ID_2, ID_3]).await;
    h.commands
        .add_human_user(&h.ctx, OTHER_ORG_ID, human_fixture("grace"))
        .await
        .unwrap();
    h.commands
        .add_user_idp_link(&h.ctx, ORG_ID, ID_2, link(ID_1, "ext-ada"))
        .await
        .unwrap();

    // Act
    let same_user = h
        .commands
        .add_user_idp_link(&h.ctx, ORG_ID, ID_2, link(ID_1, "ext-ada"))
        .await;
    let other_user = h
        .commands
        .add_user_idp_link(&h.ctx, OTHER_ORG_ID, ID_3, link(ID_1, "ext-ada"))
        .await;

    // Assert
    assert_kind(same_user, ErrorKind::AlreadyExists);
    assert_kind(other_user, ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_remove_user_frees_username_and_links() {
    // Arrange
    let h = with_idp_and_user(&[ID_1, ID_2, ID_3]).await;
    h.commands
        .add_user_idp_link(&h.ctx, ORG_ID, ID_2, link(ID_1, "ext-ada"))
        .await
        .unwrap();

    // Act
    h.commands.remove_user(&h.ctx, ORG_ID, ID_2).await.unwrap();

    // Assert
    assert_kind(
        h.commands.get_human_user(&h.ctx, ORG_ID, ID_2).await,
        ErrorKind::NotFound,
    );
    h.commands
        .add_human_user(&h.ctx, ORG_ID, human_fixture("ada"))
        .await
        .unwrap();
    let relinked = h
        .commands
        .add_user_idp_link(&h.ctx, ORG_ID, ID_3, link(ID_1, "ext-ada"))
        .await;
    assert!(relinked.is_ok());
}

#[tokio::test]
async fn test_remove_idp_link() {
    let h = with_idp_and_user(&[ID_1, ID_2]).await;
    h.commands
        .add_user_idp_link(&h.ctx, ORG_ID, ID_2, link(ID_1, "ext-ada"))
        .await
        .unwrap();

    h.commands
        .remove_user_idp_link(&h.ctx, ORG_ID, ID_2, ID_1, "ext-ada")
        .await
        .unwrap();
    let twice = h
        .commands
        .remove_user_idp_link(&h.ctx, ORG_ID, ID_2, ID_1, "ext-ada")
        .await;

    assert_kind(twice, ErrorKind::NotFound);
    assert_eq!(
        h.log().await.last(),
        Some(&("user.idp_link.removed".to_string(), ID_2.to_string()))
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_stale_write_model_is_a_conflict() {
    // Arrange
    let (h, store) = interleaving_harness(&[ID_1]);
    let (commands, ctx) = (&h.commands, &h.ctx);
    commands
        .add_human_user(ctx, ORG_ID, human_fixture("ada"))
        .await
        .unwrap();
    let user = AggregateRef::new(AggregateType::User, ID_1, ORG_ID, INSTANCE_ID);
    let foreign = PendingEvent::new(&user, "someone-else", &UserEvent::Deactivated(Empty {}));
    store.arm(foreign.unwrap());

    // Act
    let raced = commands.change_username(ctx, ORG_ID, ID_1, "countess").await;
    let retried = commands.change_username(ctx, ORG_ID, ID_1, "countess").await;

    // Assert
    let err = raced.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.is_retryable());
    let details = retried.unwrap();
    assert_eq!(details.sequence, 3);
    let types: Vec<String> = h
        .log()
        .await
        .into_iter()
        .map(|(event_type, _)| event_type)
        .collect();
    assert_eq!(
        types,
        vec!["user.human.added", "user.deactivated", "user.username.changed"]
    );
}
