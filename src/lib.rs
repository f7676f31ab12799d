// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event-sourced command side for multi-tenant identity and access management
//!
//! Commands validate their input, rebuild the affected write models from the
//! event log, derive the minimal set of new events and push them atomically
//! with optimistic concurrency. Read models and projections live elsewhere.
//!
//! ```text
//! Commands ──► EventStore (filter / push)
//!    │
//!    ├── write_model   fold events into current state
//!    ├── diff          desired state vs current state → change list
//!    ├── policy        settings inherited instance → org → user
//!    └── crypto / id   injected collaborators
//! ```

pub mod aggregate;
pub mod command;
pub mod config;
pub mod crypto;
pub mod diff;
pub mod domain;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod id;
pub mod policy;
pub mod telemetry;
pub mod write_model;

// Re-export commonly used types
pub use command::{CommandContext, Commands};
pub use config::CommandConfig;
pub use crypto::{Blake3DevCrypto, CryptoValue, SecretCrypto};
pub use errors::{CommandError, CommandResult, ErrorKind};
pub use event_store::{EventStore, InMemoryEventStore};
pub use id::{IdGenerator, SequenceIdGenerator, UuidV7Generator};
pub use policy::{PolicyLevel, ResolvedPolicy};
pub use write_model::{EntityState, ObjectDetails};
