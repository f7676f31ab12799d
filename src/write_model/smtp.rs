// Copyright (c) 2025 - Cowboy AI, Inc.
//! SMTP configuration write model

use super::{EntityState, ObjectDetails, Reducer, WriteModel};
use crate::aggregate::{AggregateRef, AggregateType};
use crate::crypto::CryptoValue;
use crate::event_store::SearchQuery;
use crate::events::smtp::SmtpConfigChange;
use crate::events::{DomainEvent, Event, SmtpConfigEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfigWriteModel {
    base: WriteModel,
    pub state: EntityState,
    pub description: String,
    pub tls: bool,
    pub sender_address: String,
    pub sender_name: String,
    pub reply_to_address: String,
    pub host: String,
    pub user: String,
    pub password: Option<CryptoValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub details: ObjectDetails,
    pub state: EntityState,
    pub description: String,
    pub tls: bool,
    pub sender_address: String,
    pub sender_name: String,
    pub reply_to_address: String,
    pub host: String,
    pub user: String,
}

impl SmtpConfigWriteModel {
    pub fn new(id: &str, instance_id: &str) -> Self {
        Self {
            base: WriteModel::new(AggregateRef::new(
                AggregateType::SmtpConfig,
                id,
                instance_id,
                instance_id,
            )),
            state: EntityState::Unspecified,
            description: String::new(),
            tls: false,
            sender_address: String::new(),
            sender_name: String::new(),
            reply_to_address: String::new(),
            host: String::new(),
            user: String::new(),
            password: None,
        }
    }

    pub fn to_smtp_config(&self) -> Option<SmtpConfig> {
        self.state.exists().then(|| SmtpConfig {
            details: self.base.details(),
            state: self.state,
            description: self.description.clone(),
            tls: self.tls,
            sender_address: self.sender_address.clone(),
            sender_name: self.sender_name.clone(),
            reply_to_address: self.reply_to_address.clone(),
            host: self.host.clone(),
            user: self.user.clone(),
        })
    }
}

impl Reducer for SmtpConfigWriteModel {
    type Event = SmtpConfigEvent;

    fn base(&self) -> &WriteModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WriteModel {
        &mut self.base
    }

    fn query(&self) -> SearchQuery {
        self.base.aggregate_query(SmtpConfigEvent::event_types())
    }

    fn apply(&mut self, event: &SmtpConfigEvent, _raw: &Event) {
        match event {
            SmtpConfigEvent::Added(added) => {
                self.description = added.description.clone();
                self.tls = added.tls;
                self.sender_address = added.sender_address.clone();
                self.sender_name = added.sender_name.clone();
                self.reply_to_address = added.reply_to_address.clone();
                self.host = added.host.clone();
                self.user = added.user.clone();
                self.password = added.password.clone();
                // new configurations wait for explicit activation
                self.state = EntityState::Inactive;
            }
            SmtpConfigEvent::Changed(changed) => {
                for change in &changed.changes {
                    match change {
                        SmtpConfigChange::Password(password) => {
                            self.password = Some(password.clone())
                        }
                        SmtpConfigChange::Description(v) => self.description = v.clone(),
                        SmtpConfigChange::Tls(v) => self.tls = *v,
                        SmtpConfigChange::SenderAddress(v) => self.sender_address = v.clone(),
                        SmtpConfigChange::SenderName(v) => self.sender_name = v.clone(),
                        SmtpConfigChange::ReplyToAddress(v) => self.reply_to_address = v.clone(),
                        SmtpConfigChange::Host(v) => self.host = v.clone(),
                        SmtpConfigChange::User(v) => self.user = v.clone(),
                    }
                }
            }
            SmtpConfigEvent::Activated(_) => self.state = EntityState::Active,
            SmtpConfigEvent::Deactivated(_) => self.state = EntityState::Inactive,
            SmtpConfigEvent::Removed(_) => self.state = EntityState::Removed,
        }
    }
}
