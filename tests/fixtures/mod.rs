// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for iam-command
//!
//! Provides a command harness over the in-memory event store with
//! deterministic ids, plus input builders shared by the integration suites.
//!
//! # Design Principles
//! - Ids handed to new aggregates come from a fixed list (no UUID v7)
//! - Every suite starts from an empty log
//! - Inputs are valid unless a test mutates them

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iam_command::command::{
    AddAction, AddHumanUser, AddIdpConfig, AddSmtpConfig, AddTarget, IdpProtocolConfig,
    JwtConfigInput, OidcConfigInput,
};
use iam_command::domain::{IdpStylingType, OidcMappingField, TargetType};
use iam_command::events::user::HumanProfile;
use iam_command::errors::EventStoreError;
use iam_command::event_store::{PushRequest, SearchQuery};
use iam_command::events::{Event, PendingEvent};
use iam_command::{
    Blake3DevCrypto, CommandConfig, CommandContext, CommandResult, Commands, ErrorKind,
    EventStore, InMemoryEventStore, SequenceIdGenerator,
};

pub const INSTANCE_ID: &str = "instance-1";
pub const ORG_ID: &str = "org-1";
pub const OTHER_ORG_ID: &str = "org-2";
pub const ADMIN_ID: &str = "admin-1";

pub const ID_1: &str = "01934f4a-0001-7000-8000-000000000001";
pub const ID_2: &str = "01934f4a-0002-7000-8000-000000000002";
pub const ID_3: &str = "01934f4a-0003-7000-8000-000000000003";
pub const ID_4: &str = "01934f4a-0004-7000-8000-000000000004";
pub const ID_5: &str = "01934f4a-0005-7000-8000-000000000005";

/// Commands wired to a fresh in-memory store
pub struct Harness {
    pub store: Arc<InMemoryEventStore>,
    pub commands: Commands,
    pub ctx: CommandContext,
}

impl Harness {
    /// Every event in the log, as (event type, aggregate id) pairs
    pub async fn log(&self) -> Vec<(String, String)> {
        self.store
            .events()
            .await
            .into_iter()
            .map(|event| (event.event_type, event.aggregate.id))
            .collect()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.store.events().await
    }

    pub async fn event_count(&self) -> usize {
        self.store.events().await.len()
    }
}

/// Harness with the default limits; new aggregates receive `ids` in order
pub fn harness(ids: &[&str]) -> Harness {
    harness_with_config(ids, CommandConfig::default())
}

pub fn harness_with_config(ids: &[&str], config: CommandConfig) -> Harness {
    let store = Arc::new(InMemoryEventStore::new());
    wire(store.clone(), store, ids, config)
}

/// Harness whose commands go through an [`InterleavingStore`]
///
/// `Harness::store` is the underlying log, so assertions see every write.
pub fn interleaving_harness(ids: &[&str]) -> (Harness, Arc<InterleavingStore>) {
    let inner = Arc::new(InMemoryEventStore::new());
    let interleaving = Arc::new(InterleavingStore {
        inner: inner.clone(),
        foreign: Mutex::new(None),
    });
    let h = wire(interleaving.clone(), inner, ids, CommandConfig::default());
    (h, interleaving)
}

fn wire(
    gateway: Arc<dyn EventStore>,
    store: Arc<InMemoryEventStore>,
    ids: &[&str],
    config: CommandConfig,
) -> Harness {
    let commands = Commands::new(
        gateway,
        Arc::new(SequenceIdGenerator::new(ids.iter().copied())),
        Arc::new(Blake3DevCrypto::new("test-key", b"fixture master key")),
        config,
    );
    Harness {
        store,
        commands,
        ctx: CommandContext::new(INSTANCE_ID, ADMIN_ID),
    }
}

/// Store that commits one foreign event right before the next push
///
/// Simulates a concurrent writer landing between hydration and push.
pub struct InterleavingStore {
    inner: Arc<InMemoryEventStore>,
    foreign: Mutex<Option<PendingEvent>>,
}

impl InterleavingStore {
    pub fn arm(&self, event: PendingEvent) {
        *self.foreign.lock().unwrap() = Some(event);
    }
}

#[async_trait]
impl EventStore for InterleavingStore {
    async fn filter(&self, query: &SearchQuery) -> Result<Vec<Event>, EventStoreError> {
        self.inner.filter(query).await
    }

    async fn push(&self, request: PushRequest) -> Result<Vec<Event>, EventStoreError> {
        let foreign = self.foreign.lock().unwrap().take();
        if let Some(event) = foreign {
            self.inner.seed(vec![event]).await?;
        }
        self.inner.push(request).await
    }
}

/// Assert the error kind of a failed command
pub fn assert_kind<T: std::fmt::Debug>(result: CommandResult<T>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("expected {:?}, got Ok({:?})", kind, value),
        Err(err) => assert_eq!(err.kind(), kind, "unexpected error: {}", err),
    }
}

pub fn target_fixture(name: &str) -> AddTarget {
    AddTarget {
        name: name.to_string(),
        target_type: TargetType::Webhook,
        endpoint: "https://hooks.example.com/audit".to_string(),
        timeout: Duration::from_secs(10),
        interrupt_on_error: false,
    }
}

pub fn action_fixture(name: &str) -> AddAction {
    AddAction {
        name: name.to_string(),
        script: "function enrich(ctx, api) {}".to_string(),
        timeout: Duration::from_secs(5),
        allowed_to_fail: true,
    }
}

pub fn oidc_fixture() -> OidcConfigInput {
    OidcConfigInput {
        client_id: "client-1".to_string(),
        client_secret: "s3cr3t".to_string(),
        issuer: "https://sso.example.com".to_string(),
        authorization_endpoint: None,
        token_endpoint: None,
        scopes: vec!["openid".to_string(), "email".to_string()],
        display_name_mapping: OidcMappingField::PreferredUsername,
        username_mapping: OidcMappingField::Email,
    }
}

pub fn jwt_fixture() -> JwtConfigInput {
    JwtConfigInput {
        jwt_endpoint: "https://jwt.example.com/login".to_string(),
        issuer: "https://jwt.example.com".to_string(),
        keys_endpoint: "https://jwt.example.com/keys".to_string(),
        header_name: "x-auth-token".to_string(),
    }
}

pub fn oidc_idp_fixture(name: &str) -> AddIdpConfig {
    AddIdpConfig {
        name: name.to_string(),
        styling_type: IdpStylingType::Unspecified,
        auto_register: false,
        config: IdpProtocolConfig::Oidc(oidc_fixture()),
    }
}

pub fn jwt_idp_fixture(name: &str) -> AddIdpConfig {
    AddIdpConfig {
        name: name.to_string(),
        styling_type: IdpStylingType::Unspecified,
        auto_register: true,
        config: IdpProtocolConfig::Jwt(jwt_fixture()),
    }
}

pub fn human_fixture(username: &str) -> AddHumanUser {
    AddHumanUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        profile: HumanProfile {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            ..HumanProfile::default()
        },
    }
}

pub fn smtp_fixture() -> AddSmtpConfig {
    AddSmtpConfig {
        description: "primary".to_string(),
        tls: true,
        sender_address: "noreply@example.com".to_string(),
        sender_name: "Example".to_string(),
        reply_to_address: String::new(),
        host: "smtp.example.com:587".to_string(),
        user: "mailer".to_string(),
        password: "mail-pass".to_string(),
    }
}
