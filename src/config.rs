// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command configuration

use std::time::Duration;

use crate::errors::{CommandError, CommandResult};

pub const ENV_COMMAND_TIMEOUT_MS: &str = "IAM_COMMAND_TIMEOUT_MS";
pub const ENV_ACTION_MAX_TIMEOUT_SECS: &str = "IAM_ACTION_MAX_TIMEOUT_SECS";
pub const ENV_TARGET_MAX_TIMEOUT_SECS: &str = "IAM_TARGET_MAX_TIMEOUT_SECS";
pub const ENV_EXECUTION_MAX_INCLUDE_DEPTH: &str = "IAM_EXECUTION_MAX_INCLUDE_DEPTH";

/// Limits applied by commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConfig {
    /// Deadline for each event store call, on top of the request deadline
    pub command_timeout: Option<Duration>,
    /// Upper bound for action script timeouts
    pub action_max_timeout: Duration,
    /// Upper bound for target call timeouts
    pub target_max_timeout: Duration,
    /// Maximum depth of execution includes
    pub max_include_depth: usize,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            command_timeout: None,
            action_max_timeout: Duration::from_secs(20),
            target_max_timeout: Duration::from_secs(10 * 60),
            max_include_depth: 16,
        }
    }
}

impl CommandConfig {
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn with_action_max_timeout(mut self, timeout: Duration) -> Self {
        self.action_max_timeout = timeout;
        self
    }

    pub fn with_target_max_timeout(mut self, timeout: Duration) -> Self {
        self.target_max_timeout = timeout;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Defaults overridden by `IAM_*` environment variables
    pub fn from_env() -> CommandResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CommandResult<Self> {
        let mut config = Self::default();

        if let Some(ms) = parse(&lookup, ENV_COMMAND_TIMEOUT_MS)? {
            config.command_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(secs) = parse(&lookup, ENV_ACTION_MAX_TIMEOUT_SECS)? {
            config.action_max_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse(&lookup, ENV_TARGET_MAX_TIMEOUT_SECS)? {
            config.target_max_timeout = Duration::from_secs(secs);
        }
        if let Some(depth) = parse(&lookup, ENV_EXECUTION_MAX_INCLUDE_DEPTH)? {
            config.max_include_depth = usize::try_from(depth).map_err(|_| {
                CommandError::Configuration(format!(
                    "{} out of range: {}",
                    ENV_EXECUTION_MAX_INCLUDE_DEPTH, depth
                ))
            })?;
        }

        Ok(config)
    }
}

fn parse(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> CommandResult<Option<u64>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|err| {
            CommandError::Configuration(format!("{} must be an unsigned integer: {}", key, err))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CommandConfig::default();

        assert_eq!(config.command_timeout, None);
        assert_eq!(config.action_max_timeout, Duration::from_secs(20));
        assert_eq!(config.target_max_timeout, Duration::from_secs(600));
        assert_eq!(config.max_include_depth, 16);
    }

    #[test]
    fn test_lookup_overrides() {
        let env = HashMap::from([
            (ENV_COMMAND_TIMEOUT_MS, "1500"),
            (ENV_EXECUTION_MAX_INCLUDE_DEPTH, " 4 "),
        ]);

        let config =
            CommandConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.command_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.max_include_depth, 4);
        assert_eq!(config.action_max_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_malformed_value_is_configuration_error() {
        let result = CommandConfig::from_lookup(|key| {
            (key == ENV_TARGET_MAX_TIMEOUT_SECS).then(|| "ten".to_string())
        });

        assert!(matches!(result, Err(CommandError::Configuration(_))));
    }
}
