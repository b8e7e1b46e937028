//! Contact Aggregate
//!
//! Audience member owned by one account. Only contacts whose status is in
//! the eligibility policy are ever dispatched to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::value_objects::{Email, EntityId};

/// Contact lifecycle status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    Active,
    Subscribed,
    Pending,
    Unsubscribed,
    Bounced,
    Complained,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Subscribed => "subscribed",
            Self::Pending => "pending",
            Self::Unsubscribed => "unsubscribed",
            Self::Bounced => "bounced",
            Self::Complained => "complained",
        }
    }
}

/// Set of statuses that may receive a campaign
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EligibilityPolicy(HashSet<ContactStatus>);

impl EligibilityPolicy {
    pub fn new(statuses: impl IntoIterator<Item = ContactStatus>) -> Self {
        Self(statuses.into_iter().collect())
    }

    pub fn is_eligible(&self, status: ContactStatus) -> bool {
        self.0.contains(&status)
    }

    pub fn statuses(&self) -> Vec<ContactStatus> {
        self.0.iter().copied().collect()
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new([ContactStatus::Active, ContactStatus::Subscribed])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    id: EntityId,
    owner_id: EntityId,
    email: Email,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    status: ContactStatus,
    created_at: DateTime<Utc>,
}

impl Contact {
    pub fn create(
        owner_id: EntityId,
        email: Email,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            owner_id,
            email,
            first_name,
            last_name,
            status: ContactStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn with_status(mut self, status: ContactStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> &EntityId { &self.id }
    pub fn owner_id(&self) -> &EntityId { &self.owner_id }
    pub fn email(&self) -> &Email { &self.email }
    pub fn first_name(&self) -> Option<&str> { self.first_name.as_deref() }
    pub fn last_name(&self) -> Option<&str> { self.last_name.as_deref() }
    pub fn status(&self) -> ContactStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn set_status(&mut self, status: ContactStatus) {
        self.status = status;
    }

    pub fn display_name(&self) -> String {
        match (self.first_name(), self.last_name()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.email.to_string(),
        }
    }
}
