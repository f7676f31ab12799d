// Copyright (c) 2025 - Cowboy AI, Inc.
//! Id generation for newly created entities

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

use crate::errors::{CommandError, CommandResult};

/// Source of unique ids, injected into [`crate::command::Commands`]
#[async_trait]
pub trait IdGenerator: Send + Sync {
    async fn next_id(&self) -> CommandResult<String>;
}

/// UUID v7 ids (time ordered)
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

#[async_trait]
impl IdGenerator for UuidV7Generator {
    async fn next_id(&self) -> CommandResult<String> {
        Ok(Uuid::now_v7().to_string())
    }
}

/// Hands out a fixed list of ids in order, then fails
///
/// Used by tests and demos that need predictable ids.
#[derive(Debug, Default)]
pub struct SequenceIdGenerator {
    ids: Mutex<VecDeque<String>>,
}

impl SequenceIdGenerator {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Mutex::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl IdGenerator for SequenceIdGenerator {
    async fn next_id(&self) -> CommandResult<String> {
        let mut ids = self
            .ids
            .lock()
            .map_err(|_| CommandError::IdGeneration("generator poisoned".to_string()))?;
        ids.pop_front()
            .ok_or_else(|| CommandError::IdGeneration("no ids left".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_generator_is_exhaustible() {
        let generator = SequenceIdGenerator::new(["id1", "id2"]);

        assert_eq!(generator.next_id().await.unwrap(), "id1");
        assert_eq!(generator.next_id().await.unwrap(), "id2");
        assert!(matches!(
            generator.next_id().await,
            Err(CommandError::IdGeneration(_))
        ));
    }

    #[tokio::test]
    async fn test_uuid_v7_ids_are_distinct() {
        let generator = UuidV7Generator;

        let a = generator.next_id().await.unwrap();
        let b = generator.next_id().await.unwrap();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
