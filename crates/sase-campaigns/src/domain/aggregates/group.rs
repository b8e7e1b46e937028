//! Contact group
//!
//! `member_count` is a display value only; dispatch always reads membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EntityId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    id: EntityId,
    owner_id: EntityId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    member_count: u64,
    created_at: DateTime<Utc>,
}

impl Group {
    pub fn create(owner_id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            owner_id,
            name: name.into(),
            description: None,
            member_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &EntityId { &self.id }
    pub fn owner_id(&self) -> &EntityId { &self.owner_id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn member_count(&self) -> u64 { self.member_count }

    pub fn set_member_count(&mut self, count: u64) {
        self.member_count = count;
    }
}

/// Join row between a group and a contact
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: EntityId,
    pub contact_id: EntityId,
}
