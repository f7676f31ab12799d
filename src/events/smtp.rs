// Copyright (c) 2025 - Cowboy AI, Inc.
//! SMTP configuration events

use serde::{Deserialize, Serialize};

use super::{Changes, Empty};
use crate::crypto::CryptoValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SmtpConfigEvent {
    Added(SmtpConfigAdded),
    Changed(Changes<SmtpConfigChange>),
    Activated(Empty),
    Deactivated(Empty),
    Removed(Empty),
}

domain_event!(SmtpConfigEvent {
    Added(SmtpConfigAdded) => "smtp_config.added",
    Changed(Changes<SmtpConfigChange>) => "smtp_config.changed",
    Activated(Empty) => "smtp_config.activated",
    Deactivated(Empty) => "smtp_config.deactivated",
    Removed(Empty) => "smtp_config.removed",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpConfigAdded {
    pub description: String,
    pub tls: bool,
    pub sender_address: String,
    pub sender_name: String,
    pub reply_to_address: String,
    pub host: String,
    pub user: String,
    pub password: Option<CryptoValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SmtpConfigChange {
    Password(CryptoValue),
    Description(String),
    Tls(bool),
    SenderAddress(String),
    SenderName(String),
    ReplyToAddress(String),
    Host(String),
    User(String),
}
