// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for login policies and their inheritance

mod fixtures;

use pretty_assertions::assert_eq;
use std::time::Duration;

use fixtures::*;
use iam_command::domain::{IdpOwner, MultiFactorType, SecondFactorType};
use iam_command::events::login_policy::LoginPolicySettings;
use iam_command::{ErrorKind, PolicyLevel};

fn strict() -> LoginPolicySettings {
    LoginPolicySettings {
        allow_register: false,
        force_mfa: true,
        password_check_lifetime: Duration::from_secs(3600),
        ..LoginPolicySettings::default()
    }
}

#[tokio::test]
async fn test_org_without_policy_inherits_the_default() {
    let h = harness(&[]);
    h.commands
        .add_default_login_policy(&h.ctx, LoginPolicySettings::default())
        .await
        .unwrap();

    let resolved = h.commands.resolve_login_policy(&h.ctx, ORG_ID).await.unwrap();

    assert!(resolved.is_default);
    assert_eq!(resolved.level, PolicyLevel::Instance);
    assert_eq!(resolved.policy.settings, LoginPolicySettings::default());
}

#[tokio::test]
async fn test_org_policy_overrides_the_default() {
    let h = harness(&[]);
    h.commands
        .add_default_login_policy(&h.ctx, LoginPolicySettings::default())
        .await
        .unwrap();
    h.commands
        .add_login_policy(&h.ctx, ORG_ID, strict())
        .await
        .unwrap();

    let own = h.commands.resolve_login_policy(&h.ctx, ORG_ID).await.unwrap();
    let other = h
        .commands
        .resolve_login_policy(&h.ctx, OTHER_ORG_ID)
        .await
        .unwrap();

    assert!(!own.is_default);
    assert_eq!(own.policy.settings, strict());
    assert_eq!(own.details.resource_owner, ORG_ID);
    assert!(other.is_default);
}

#[tokio::test]
async fn test_removed_org_policy_falls_back_to_the_default() {
    let h = harness(&[]);
    h.commands
        .add_default_login_policy(&h.ctx, LoginPolicySettings::default())
        .await
        .unwrap();
    h.commands
        .add_login_policy(&h.ctx, ORG_ID, strict())
        .await
        .unwrap();

    h.commands.remove_login_policy(&h.ctx, ORG_ID).await.unwrap();

    let resolved = h.commands.resolve_login_policy(&h.ctx, ORG_ID).await.unwrap();
    assert!(resolved.is_default);
    assert_kind(
        h.commands.remove_login_policy(&h.ctx, ORG_ID).await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_no_policy_anywhere_is_not_found() {
    let h = harness(&[]);

    let result = h.commands.resolve_login_policy(&h.ctx, ORG_ID).await;

    assert_kind(result, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_default_policy_lifecycle() {
    let h = harness(&[]);
    let change_before_add = h
        .commands
        .change_default_login_policy(&h.ctx, strict())
        .await;
    h.commands
        .add_default_login_policy(&h.ctx, LoginPolicySettings::default())
        .await
        .unwrap();

    let added_twice = h
        .commands
        .add_default_login_policy(&h.ctx, LoginPolicySettings::default())
        .await;
    let changed = h
        .commands
        .change_default_login_policy(&h.ctx, strict())
        .await
        .unwrap();
    let unchanged = h
        .commands
        .change_default_login_policy(&h.ctx, strict())
        .await;

    assert_kind(change_before_add, ErrorKind::NotFound);
    assert_kind(added_twice, ErrorKind::AlreadyExists);
    assert_eq!(changed.sequence, 2);
    assert_kind(unchanged, ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_invalid_redirect_uri_is_rejected_before_io() {
    let h = harness(&[]);
    let settings = LoginPolicySettings {
        default_redirect_uri: "javascript:alert(1)".to_string(),
        ..LoginPolicySettings::default()
    };

    let result = h.commands.add_login_policy(&h.ctx, ORG_ID, settings).await;

    assert_kind(result, ErrorKind::InvalidArgument);
    assert_eq!(h.store.filter_calls(), 0);
}

#[tokio::test]
async fn test_org_policy_accepts_only_its_own_or_instance_idps() {
    let h = harness(&[ID_1, ID_2]);
    h.commands
        .add_login_policy(&h.ctx, ORG_ID, LoginPolicySettings::default())
        .await
        .unwrap();
    h.commands
        .add_idp_config(&h.ctx, &IdpOwner::Instance, oidc_idp_fixture("SSO"))
        .await
        .unwrap();
    let foreign = IdpOwner::Org(OTHER_ORG_ID.to_string());
    h.commands
        .add_idp_config(&h.ctx, &foreign, oidc_idp_fixture("Partner"))
        .await
        .unwrap();
    let level = PolicyLevel::org(ORG_ID);

    let instance_idp = h
        .commands
        .add_idp_to_login_policy(&h.ctx, &level, ID_1, &IdpOwner::Instance)
        .await;
    let duplicate = h
        .commands
        .add_idp_to_login_policy(&h.ctx, &level, ID_1, &IdpOwner::Instance)
        .await;
    let foreign_idp = h
        .commands
        .add_idp_to_login_policy(&h.ctx, &level, ID_2, &foreign)
        .await;

    assert!(instance_idp.is_ok());
    assert_kind(duplicate, ErrorKind::AlreadyExists);
    assert_kind(foreign_idp, ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_inactive_idp_cannot_be_added() {
    let h = harness(&[ID_1]);
    h.commands
        .add_default_login_policy(&h.ctx, LoginPolicySettings::default())
        .await
        .unwrap();
    h.commands
        .add_idp_config(&h.ctx, &IdpOwner::Instance, oidc_idp_fixture("SSO"))
        .await
        .unwrap();
    h.commands
        .deactivate_idp_config(&h.ctx, &IdpOwner::Instance, ID_1)
        .await
        .unwrap();

    let result = h
        .commands
        .add_idp_to_login_policy(&h.ctx, &PolicyLevel::Instance, ID_1, &IdpOwner::Instance)
        .await;

    assert_kind(result, ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_remove_idp_from_login_policy() {
    let h = harness(&[ID_1]);
    h.commands
        .add_default_login_policy(&h.ctx, LoginPolicySettings::default())
        .await
        .unwrap();
    h.commands
        .add_idp_config(&h.ctx, &IdpOwner::Instance, oidc_idp_fixture("SSO"))
        .await
        .unwrap();
    h.commands
        .add_idp_to_login_policy(&h.ctx, &PolicyLevel::Instance, ID_1, &IdpOwner::Instance)
        .await
        .unwrap();

    h.commands
        .remove_idp_from_login_policy(&h.ctx, &PolicyLevel::Instance, ID_1)
        .await
        .unwrap();
    let twice = h
        .commands
        .remove_idp_from_login_policy(&h.ctx, &PolicyLevel::Instance, ID_1)
        .await;

    assert_kind(twice, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_factors_are_sets() {
    let h = harness(&[]);
    h.commands
        .add_default_login_policy(&h.ctx, LoginPolicySettings::default())
        .await
        .unwrap();
    let level = PolicyLevel::Instance;

    h.commands
        .add_second_factor(&h.ctx, &level, SecondFactorType::Otp)
        .await
        .unwrap();
    h.commands
        .add_multi_factor(&h.ctx, &level, MultiFactorType::U2fWithVerification)
        .await
        .unwrap();
    let duplicate = h
        .commands
        .add_second_factor(&h.ctx, &level, SecondFactorType::Otp)
        .await;
    let missing = h
        .commands
        .remove_second_factor(&h.ctx, &level, SecondFactorType::U2f)
        .await;
    h.commands
        .remove_multi_factor(&h.ctx, &level, MultiFactorType::U2fWithVerification)
        .await
        .unwrap();

    assert_kind(duplicate, ErrorKind::AlreadyExists);
    assert_kind(missing, ErrorKind::NotFound);
    let resolved = h.commands.resolve_login_policy(&h.ctx, ORG_ID).await.unwrap();
    assert_eq!(resolved.policy.second_factors, vec![SecondFactorType::Otp]);
    assert!(resolved.policy.multi_factors.is_empty());
}

#[tokio::test]
async fn test_user_level_login_policy_is_invalid() {
    let h = harness(&[]);

    let result = h
        .commands
        .add_second_factor(&h.ctx, &PolicyLevel::user(ORG_ID, "user-1"), SecondFactorType::Otp)
        .await;

    assert_kind(result, ErrorKind::InvalidArgument);
}
