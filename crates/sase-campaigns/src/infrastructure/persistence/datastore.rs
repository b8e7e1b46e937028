//! JSON datastore file
//!
//! A whole-file snapshot of contacts, groups, memberships and campaigns.
//! Loaded into the in-memory repositories and written back after commands
//! that change campaign state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use super::{InMemoryCampaignRepository, InMemoryContactRepository, InMemoryGroupRepository};
use crate::domain::aggregates::{Campaign, Contact, Group, GroupMembership};
use crate::ports::outbound::RepositoryError;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Datastore {
    pub contacts: Vec<Contact>,
    pub groups: Vec<Group>,
    pub memberships: Vec<GroupMembership>,
    pub campaigns: Vec<Campaign>,
}

impl Datastore {
    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RepositoryError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RepositoryError> {
        let path = path.as_ref();
        let content =
            serde_json::to_string_pretty(self).map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| RepositoryError::ConnectionError(format!("{}: {}", path.display(), e)))
    }

    pub fn into_repositories(self) -> Repositories {
        let repos = Repositories::default();
        for contact in self.contacts {
            repos.contacts.insert(contact);
        }
        for group in self.groups {
            repos.groups.insert(group);
        }
        for row in self.memberships {
            repos.groups.add_member(&row.group_id, row.contact_id);
        }
        for campaign in self.campaigns {
            repos.campaigns.insert(campaign);
        }
        repos
    }
}

/// Repositories backed by one datastore file
#[derive(Clone, Default)]
pub struct Repositories {
    pub contacts: Arc<InMemoryContactRepository>,
    pub groups: Arc<InMemoryGroupRepository>,
    pub campaigns: Arc<InMemoryCampaignRepository>,
}

impl Repositories {
    /// Current contents, ready to be written back
    pub fn snapshot(&self) -> Datastore {
        Datastore {
            contacts: self.contacts.all(),
            groups: self.groups.groups(),
            memberships: self.groups.memberships(),
            campaigns: self.campaigns.all(),
        }
    }
}
