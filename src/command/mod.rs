// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command Pipeline
//!
//! Every command follows the same fixed sequence:
//!
//! ```text
//! 1. validate   local checks only          → InvalidArgument, no I/O
//! 2. hydrate    filter_and_fold             (gateway call #1)
//! 3. check      lifecycle precondition      → AlreadyExists / NotFound
//! 4. build      added event | diff | removal + cascades
//!               empty diff                  → PreconditionFailed, no push
//! 5. push       atomic, expected sequence   (gateway call #2)
//! 6. fold-back  committed events into the same write model
//! 7. project    ObjectDetails or a typed projection
//! ```
//!
//! [`Commands`] holds only shared, immutable collaborators; any number of
//! commands may run concurrently on clones of it. Concurrent commands on the
//! same aggregate race in the event store; the loser receives
//! [`CommandError::Conflict`] and re-drives the whole command if it wants to.
//!
//! Each gateway call goes through [`Commands::guarded`], which aborts at the
//! call boundary once the request's [`CancellationToken`] fires or its
//! deadline passes. Pushes are atomic in the store, so an abandoned push never
//! leaves a partial batch.

use futures::future::try_join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::CommandConfig;
use crate::crypto::{CryptoValue, SecretCrypto};
use crate::errors::{CommandError, CommandResult};
use crate::event_store::{EventStore, PushRequest};
use crate::events::{Event, PendingEvent};
use crate::id::IdGenerator;
use crate::write_model::{filter_and_fold, Reducer};

pub mod action;
pub mod execution;
pub mod flow;
pub mod idp;
pub mod login_policy;
pub mod policy;
pub mod smtp;
pub mod target;
pub mod user;

pub use action::{AddAction, ChangeAction};
pub use idp::{
    AddIdpConfig, ChangeIdpConfig, ChangeJwtConfig, ChangeOidcConfig, IdpProtocolConfig,
    JwtConfigInput, OidcConfigInput,
};
pub use smtp::{AddSmtpConfig, ChangeSmtpConfig};
pub use target::{AddTarget, ChangeTarget};
pub use user::{AddHumanUser, AddIdpLink};

/// Request scope of one command invocation
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub instance_id: String,
    /// Recorded as creator of every pushed event
    pub user_id: String,
    pub cancel: CancellationToken,
    pub deadline: Option<Instant>,
}

impl CommandContext {
    pub fn new(instance_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            user_id: user_id.into(),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
}

/// Entry point for every command
#[derive(Clone)]
pub struct Commands {
    event_store: Arc<dyn EventStore>,
    id_generator: Arc<dyn IdGenerator>,
    secret_crypto: Arc<dyn SecretCrypto>,
    config: CommandConfig,
}

impl Commands {
    pub fn new(
        event_store: Arc<dyn EventStore>,
        id_generator: Arc<dyn IdGenerator>,
        secret_crypto: Arc<dyn SecretCrypto>,
        config: CommandConfig,
    ) -> Self {
        Self {
            event_store,
            id_generator,
            secret_crypto,
            config,
        }
    }

    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Run a gateway call unless cancelled or past the deadline
    pub(crate) async fn guarded<T, F>(&self, ctx: &CommandContext, operation: F) -> CommandResult<T>
    where
        F: Future<Output = CommandResult<T>>,
    {
        if ctx.cancel.is_cancelled() {
            return Err(CommandError::Cancelled);
        }

        let deadline = self.deadline(ctx);
        if deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(CommandError::DeadlineExceeded);
        }
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(CommandError::Cancelled),
            _ = expired => Err(CommandError::DeadlineExceeded),
            result = operation => result,
        }
    }

    fn deadline(&self, ctx: &CommandContext) -> Option<Instant> {
        let per_call = self
            .config
            .command_timeout
            .map(|timeout| Instant::now() + timeout);
        match (ctx.deadline, per_call) {
            (Some(request), Some(call)) => Some(request.min(call)),
            (request, call) => request.or(call),
        }
    }

    /// Step 2: hydrate one write model
    pub(crate) async fn hydrate<R: Reducer>(
        &self,
        ctx: &CommandContext,
        model: &mut R,
    ) -> CommandResult<()> {
        self.guarded(ctx, filter_and_fold(self.event_store.as_ref(), model))
            .await
    }

    /// Hydrate independent write models concurrently
    pub(crate) async fn hydrate_all<R: Reducer>(
        &self,
        ctx: &CommandContext,
        mut models: Vec<R>,
    ) -> CommandResult<Vec<R>> {
        try_join_all(models.iter_mut().map(|model| self.hydrate(ctx, model))).await?;
        Ok(models)
    }

    /// Step 5: push a batch
    pub(crate) async fn push(
        &self,
        ctx: &CommandContext,
        request: PushRequest,
    ) -> CommandResult<Vec<Event>> {
        debug!(
            events = request.events.len(),
            expectations = request.expectations.len(),
            "Pushing events"
        );
        let store = self.event_store.as_ref();
        let result = self
            .guarded(ctx, async move { store.push(request).await.map_err(CommandError::from) })
            .await;

        if let Err(err) = &result {
            warn!(error = %err, "Push rejected");
        }
        result
    }

    /// Steps 5 and 6: push expecting `model` at its processed sequence, then fold back
    ///
    /// Events on other aggregates in `events` (cascades) are appended at their
    /// current tip.
    pub(crate) async fn push_and_fold<R: Reducer>(
        &self,
        ctx: &CommandContext,
        model: &mut R,
        events: Vec<PendingEvent>,
    ) -> CommandResult<Vec<Event>> {
        let base = model.base();
        let request =
            PushRequest::new(events).expect(base.aggregate.key(), base.processed_sequence);

        let committed = self.push(ctx, request).await?;
        model.append_events(&committed);
        model.reduce()?;
        Ok(committed)
    }

    pub(crate) async fn next_id(&self) -> CommandResult<String> {
        self.id_generator.next_id().await
    }

    pub(crate) async fn encrypt(&self, secret: &str) -> CommandResult<CryptoValue> {
        self.secret_crypto.encrypt(secret.as_bytes()).await
    }

    /// Encrypt `secret` unless it is empty
    pub(crate) async fn encrypt_optional(
        &self,
        secret: &str,
    ) -> CommandResult<Option<CryptoValue>> {
        if secret.is_empty() {
            Ok(None)
        } else {
            self.encrypt(secret).await.map(Some)
        }
    }

    pub(crate) async fn generate_signing_key(&self) -> CommandResult<CryptoValue> {
        self.secret_crypto.generate_signing_key().await
    }
}

/// Trimmed value, or `InvalidArgument` if blank
pub(crate) fn required<'a>(
    value: &'a str,
    code: &'static str,
    message: &'static str,
) -> CommandResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CommandError::invalid_argument(code, message))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Blake3DevCrypto;
    use crate::event_store::InMemoryEventStore;
    use crate::id::UuidV7Generator;
    use crate::write_model::target::TargetWriteModel;

    fn commands(store: Arc<InMemoryEventStore>, config: CommandConfig) -> Commands {
        Commands::new(
            store,
            Arc::new(UuidV7Generator),
            Arc::new(Blake3DevCrypto::new("k1", b"test")),
            config,
        )
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_gateway() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let commands = commands(store.clone(), CommandConfig::default());
        let ctx = CommandContext::new("instance", "user1");
        ctx.cancel.cancel();
        let mut model = TargetWriteModel::new("id1", "instance", "instance");

        // Act
        let result = commands.hydrate(&ctx, &mut model).await;

        // Assert
        assert_eq!(result, Err(CommandError::Cancelled));
        assert_eq!(store.filter_calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_aborts() {
        let store = Arc::new(InMemoryEventStore::new());
        let commands = commands(store, CommandConfig::default());
        let ctx = CommandContext::new("instance", "user1").with_deadline(Instant::now());
        let mut model = TargetWriteModel::new("id1", "instance", "instance");

        let result = commands.hydrate(&ctx, &mut model).await;

        assert_eq!(result, Err(CommandError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_guarded_passes_result_through() {
        let store = Arc::new(InMemoryEventStore::new());
        let commands = commands(
            store,
            CommandConfig::default().with_command_timeout(Duration::from_secs(5)),
        );
        let ctx = CommandContext::new("instance", "user1");

        let result = commands.guarded(&ctx, async { Ok(42) }).await;

        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("  name ", "X-1", "Errors.Invalid"), Ok("name"));
        assert!(required("   ", "X-1", "Errors.Invalid").is_err());
    }
}
