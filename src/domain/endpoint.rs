// Copyright (c) 2025 - Cowboy AI, Inc.
//! Endpoint Value Object with URL Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Endpoint validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Endpoint is empty")]
    Empty,

    #[error("Endpoint is not a valid URL: {0}")]
    Unparsable(String),

    #[error("Endpoint scheme must be http or https: {0}")]
    UnsupportedScheme(String),

    #[error("Endpoint has no host: {0}")]
    MissingHost(String),
}

/// Absolute http(s) URL used for webhooks, token and key endpoints
///
/// Invariants:
/// - Non-empty after trimming
/// - Parses as an absolute URL
/// - Scheme is `http` or `https`
/// - Has a host
///
/// The original input string is kept verbatim (trimmed) so that comparing a
/// stored endpoint against a resubmitted one never reports a spurious change
/// caused by URL normalisation.
///
/// # Examples
///
/// ```rust
/// use iam_command::domain::Endpoint;
///
/// assert!(Endpoint::new("https://example.com/hook").is_ok());
/// assert!(Endpoint::new("").is_err());
/// assert!(Endpoint::new("ftp://example.com").is_err());
/// assert!(Endpoint::new("not a url").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, EndpointError> {
        let endpoint = endpoint.into().trim().to_string();

        if endpoint.is_empty() {
            return Err(EndpointError::Empty);
        }

        let parsed =
            Url::parse(&endpoint).map_err(|_| EndpointError::Unparsable(endpoint.clone()))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(EndpointError::UnsupportedScheme(endpoint));
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(EndpointError::MissingHost(endpoint));
        }

        Ok(Self(endpoint))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Endpoint {
    type Error = EndpointError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
