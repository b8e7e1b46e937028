//! In-memory repository implementations
//!
//! Used by tests and, loaded from a [`Datastore`] file, by the CLI.

mod datastore;

pub use datastore::{Datastore, Repositories};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};

use crate::domain::aggregates::{Campaign, CampaignStatus, Contact, ContactStatus, Group, GroupMembership};
use crate::domain::value_objects::EntityId;
use crate::domain::DomainEvent;
use crate::ports::outbound::{CampaignRepository, ContactRepository, EventPublisher, GroupRepository, RepositoryError};

/// In-memory contact repository
#[derive(Default)]
pub struct InMemoryContactRepository {
    contacts: RwLock<HashMap<String, Contact>>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, contact: Contact) {
        self.contacts.write().insert(contact.id().to_string(), contact);
    }

    pub fn len(&self) -> usize {
        self.contacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.read().is_empty()
    }

    pub fn all(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.contacts.read().values().cloned().collect();
        contacts.sort_by(|a, b| a.id().cmp(b.id()));
        contacts
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn find_by_owner_and_status(
        &self,
        owner_id: &EntityId,
        statuses: &[ContactStatus],
    ) -> Result<Vec<Contact>, RepositoryError> {
        let contacts = self.contacts.read();
        Ok(contacts
            .values()
            .filter(|c| c.owner_id() == owner_id && statuses.contains(&c.status()))
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, owner_id: &EntityId, ids: &[EntityId]) -> Result<Vec<Contact>, RepositoryError> {
        let contacts = self.contacts.read();
        Ok(ids
            .iter()
            .filter_map(|id| contacts.get(id.as_str()))
            .filter(|c| c.owner_id() == owner_id)
            .cloned()
            .collect())
    }

    async fn save(&self, contact: &Contact) -> Result<(), RepositoryError> {
        self.insert(contact.clone());
        Ok(())
    }
}

/// In-memory groups and membership rows
#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: RwLock<HashMap<String, Group>>,
    memberships: RwLock<HashSet<GroupMembership>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, group: Group) {
        self.groups.write().insert(group.id().to_string(), group);
    }

    /// Add a membership row and refresh the group's display count
    pub fn add_member(&self, group_id: &EntityId, contact_id: EntityId) {
        let count = {
            let mut memberships = self.memberships.write();
            memberships.insert(GroupMembership { group_id: group_id.clone(), contact_id });
            memberships.iter().filter(|m| &m.group_id == group_id).count()
        };
        if let Some(group) = self.groups.write().get_mut(group_id.as_str()) {
            group.set_member_count(count as u64);
        }
    }

    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.read().values().cloned().collect();
        groups.sort_by(|a, b| a.id().cmp(b.id()));
        groups
    }

    pub fn memberships(&self) -> Vec<GroupMembership> {
        let mut rows: Vec<GroupMembership> = self.memberships.read().iter().cloned().collect();
        rows.sort_by(|a, b| (&a.group_id, &a.contact_id).cmp(&(&b.group_id, &b.contact_id)));
        rows
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn member_ids(&self, owner_id: &EntityId, group_ids: &[EntityId]) -> Result<Vec<EntityId>, RepositoryError> {
        let groups = self.groups.read();
        let owned: HashSet<&EntityId> = group_ids
            .iter()
            .filter(|id| groups.get(id.as_str()).map(|g| g.owner_id() == owner_id).unwrap_or(false))
            .collect();
        let memberships = self.memberships.read();
        Ok(memberships
            .iter()
            .filter(|m| owned.contains(&m.group_id))
            .map(|m| m.contact_id.clone())
            .collect())
    }
}

/// In-memory campaign repository
#[derive(Default)]
pub struct InMemoryCampaignRepository {
    campaigns: RwLock<HashMap<String, Campaign>>,
}

impl InMemoryCampaignRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, campaign: Campaign) {
        self.campaigns.write().insert(campaign.id().to_string(), campaign);
    }

    pub fn len(&self) -> usize {
        self.campaigns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.read().is_empty()
    }

    pub fn all(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self.campaigns.read().values().cloned().collect();
        campaigns.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
        campaigns
    }
}

#[async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn find_by_id(&self, owner_id: &EntityId, id: &EntityId) -> Result<Option<Campaign>, RepositoryError> {
        let campaigns = self.campaigns.read();
        Ok(campaigns.get(id.as_str()).filter(|c| c.owner_id() == owner_id).cloned())
    }

    async fn find_by_status(&self, status: CampaignStatus) -> Result<Vec<Campaign>, RepositoryError> {
        let campaigns = self.campaigns.read();
        Ok(campaigns.values().filter(|c| c.status() == status).cloned().collect())
    }

    async fn save(&self, campaign: &Campaign) -> Result<(), RepositoryError> {
        let mut campaigns = self.campaigns.write();
        if let Some(existing) = campaigns.get(campaign.id().as_str()) {
            if existing.owner_id() != campaign.owner_id() {
                return Err(RepositoryError::DuplicateKey(campaign.id().to_string()));
            }
        }
        // Stored copies never carry unpublished events, matching the datastore file.
        let mut stored = campaign.clone();
        stored.take_events();
        campaigns.insert(campaign.id().to_string(), stored);
        Ok(())
    }
}

/// No-op event publisher
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Keeps every published event, in order
#[derive(Default)]
pub struct InMemoryEventPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.event_type()).collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        self.events.lock().extend(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::CampaignDetails;
    use crate::domain::value_objects::Email;

    fn contact(owner: &str, id: &str) -> Contact {
        Contact::create(EntityId::from(owner), Email::new_unchecked(format!("{id}@example.com")), None, None)
            .with_id(EntityId::from(id))
    }

    #[tokio::test]
    async fn test_find_by_ids_is_owner_scoped() {
        let repo = InMemoryContactRepository::new();
        repo.insert(contact("o1", "a"));
        repo.insert(contact("o2", "b"));

        let found = repo
            .find_by_ids(&EntityId::from("o1"), &[EntityId::from("a"), EntityId::from("b"), EntityId::from("zz")])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id().as_str(), "a");
    }

    #[tokio::test]
    async fn test_member_ids_ignore_foreign_groups() {
        let repo = InMemoryGroupRepository::new();
        repo.insert(Group::create(EntityId::from("o1"), "mine").with_id(EntityId::from("g1")));
        repo.insert(Group::create(EntityId::from("o2"), "theirs").with_id(EntityId::from("g2")));
        repo.add_member(&EntityId::from("g1"), EntityId::from("a"));
        repo.add_member(&EntityId::from("g1"), EntityId::from("a"));
        repo.add_member(&EntityId::from("g2"), EntityId::from("b"));

        let ids = repo
            .member_ids(&EntityId::from("o1"), &[EntityId::from("g1"), EntityId::from("g2")])
            .await
            .unwrap();
        assert_eq!(ids, vec![EntityId::from("a")]);
        assert_eq!(repo.groups()[0].member_count(), 1);
    }

    #[tokio::test]
    async fn test_campaign_save_upserts() {
        let repo = InMemoryCampaignRepository::new();
        let owner = EntityId::from("o1");
        let mut campaign = Campaign::create(owner.clone(), CampaignDetails::default());
        repo.save(&campaign).await.unwrap();
        campaign.set_recipient_count(7);
        repo.save(&campaign).await.unwrap();

        assert_eq!(repo.len(), 1);
        let mut stored = repo.find_by_id(&owner, campaign.id()).await.unwrap().unwrap();
        assert_eq!(stored.recipient_count(), 7);
        assert!(stored.take_events().is_empty());
        assert!(repo.find_by_id(&EntityId::from("o2"), campaign.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recording_publisher() {
        let publisher = InMemoryEventPublisher::new();
        let mut campaign = Campaign::create(EntityId::from("o1"), CampaignDetails::default());
        publisher.publish(campaign.take_events()).await.unwrap();
        assert_eq!(publisher.event_types(), vec!["campaign.created"]);
    }
}
