// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for command operations
//!
//! Two layers exist:
//!
//! - [`EventStoreError`] is what the event log gateway reports (conflicts,
//!   unique constraint collisions, storage failures).
//! - [`CommandError`] is what callers of a command receive. Every variant maps
//!   to exactly one [`ErrorKind`], which is enough to decide whether to retry,
//!   fix the input, or give up.
//!
//! Gateway errors propagate unchanged in meaning: a sequence conflict stays a
//! conflict, a unique constraint collision becomes `AlreadyExists` or
//! `PreconditionFailed` depending on what the claim declared.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or missing input, detected before any I/O
    InvalidArgument,
    /// Referenced aggregate does not exist or was removed
    NotFound,
    /// Aggregate or unique claim already taken
    AlreadyExists,
    /// No-op change or unmet structural prerequisite
    PreconditionFailed,
    /// Optimistic concurrency conflict
    Conflict,
    /// The request was cancelled or ran past its deadline
    Cancelled,
    /// Everything the caller cannot act upon
    Internal,
}

/// How a unique constraint collision is reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    AlreadyExists,
    PreconditionFailed,
}

/// Errors reported by the event log gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventStoreError {
    /// Expected sequence no longer matches the aggregate tip
    #[error("Concurrent modification of {aggregate}: expected sequence {expected}, actual {actual}")]
    Conflict {
        aggregate: String,
        expected: u64,
        actual: u64,
    },

    /// A unique claim collides with a live claim
    #[error("Unique constraint {unique_type} violated by {unique_field}: {message}")]
    UniqueConstraintViolation {
        unique_type: String,
        unique_field: String,
        message: String,
        on_violation: ViolationKind,
    },

    /// Backend failure
    #[error("Event store error: {0}")]
    Storage(String),

    /// Payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors returned by commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Invalid argument [{code}]: {message}")]
    InvalidArgument { code: &'static str, message: String },

    #[error("Not found [{code}]: {message}")]
    NotFound { code: &'static str, message: String },

    #[error("Already exists [{code}]: {message}")]
    AlreadyExists { code: &'static str, message: String },

    #[error("Precondition failed [{code}]: {message}")]
    PreconditionFailed { code: &'static str, message: String },

    #[error(transparent)]
    Conflict(EventStoreError),

    #[error("Command cancelled")]
    Cancelled,

    #[error("Command deadline exceeded")]
    DeadlineExceeded,

    /// A recognised event carried a payload that does not decode
    #[error("Unable to decode event {event_type} at sequence {sequence}: {reason}")]
    Decode {
        event_type: String,
        sequence: u64,
        reason: String,
    },

    #[error("Event store error: {0}")]
    Storage(String),

    #[error("Id generation failed: {0}")]
    IdGeneration(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

impl CommandError {
    pub fn invalid_argument(code: &'static str, message: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        CommandError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn already_exists(code: &'static str, message: impl Into<String>) -> Self {
        CommandError::AlreadyExists {
            code,
            message: message.into(),
        }
    }

    pub fn precondition_failed(code: &'static str, message: impl Into<String>) -> Self {
        CommandError::PreconditionFailed {
            code,
            message: message.into(),
        }
    }

    /// Classify the error for the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            CommandError::NotFound { .. } => ErrorKind::NotFound,
            CommandError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CommandError::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            CommandError::Conflict(_) => ErrorKind::Conflict,
            CommandError::Cancelled | CommandError::DeadlineExceeded => ErrorKind::Cancelled,
            CommandError::Decode { .. }
            | CommandError::Storage(_)
            | CommandError::IdGeneration(_)
            | CommandError::Crypto(_)
            | CommandError::Configuration(_) => ErrorKind::Internal,
        }
    }

    /// Whether re-driving the whole command may succeed
    ///
    /// The core never retries on its own; this is for the calling layer.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Stable error code, if the error carries one
    pub fn code(&self) -> Option<&'static str> {
        match self {
            CommandError::InvalidArgument { code, .. }
            | CommandError::NotFound { code, .. }
            | CommandError::AlreadyExists { code, .. }
            | CommandError::PreconditionFailed { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<EventStoreError> for CommandError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::Conflict { .. } => CommandError::Conflict(err),
            EventStoreError::UniqueConstraintViolation {
                message,
                on_violation,
                ..
            } => match on_violation {
                ViolationKind::AlreadyExists => CommandError::AlreadyExists {
                    code: "EVENT-unique",
                    message,
                },
                ViolationKind::PreconditionFailed => CommandError::PreconditionFailed {
                    code: "EVENT-unique",
                    message,
                },
            },
            EventStoreError::Storage(msg) => CommandError::Storage(msg),
            EventStoreError::Serialization(msg) => CommandError::Storage(msg),
        }
    }
}

impl From<serde_json::Error> for EventStoreError {
    fn from(err: serde_json::Error) -> Self {
        EventStoreError::Serialization(err.to_string())
    }
}
