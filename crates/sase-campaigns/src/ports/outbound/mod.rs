//! Outbound ports
//!
//! Interfaces to the datastore, the transmission endpoint and the
//! client-local ephemeral store. Infrastructure provides the adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Campaign, CampaignStatus, Contact, ContactStatus};
use crate::domain::services::PersonalizationPayload;
use crate::domain::value_objects::EntityId;
use crate::domain::DomainEvent;

/// Contact repository port. Every query is scoped by owner.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Contacts of `owner_id` whose status is one of `statuses`
    async fn find_by_owner_and_status(
        &self,
        owner_id: &EntityId,
        statuses: &[ContactStatus],
    ) -> Result<Vec<Contact>, RepositoryError>;

    /// Contacts of `owner_id` among `ids`; unknown ids are skipped
    async fn find_by_ids(&self, owner_id: &EntityId, ids: &[EntityId]) -> Result<Vec<Contact>, RepositoryError>;

    async fn save(&self, contact: &Contact) -> Result<(), RepositoryError>;
}

/// Group membership port
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Member contact ids of the given groups. May contain duplicates when
    /// a contact belongs to several of them.
    async fn member_ids(&self, owner_id: &EntityId, group_ids: &[EntityId]) -> Result<Vec<EntityId>, RepositoryError>;
}

/// Campaign repository port
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn find_by_id(&self, owner_id: &EntityId, id: &EntityId) -> Result<Option<Campaign>, RepositoryError>;

    async fn find_by_status(&self, status: CampaignStatus) -> Result<Vec<Campaign>, RepositoryError>;

    /// Insert or update, keyed by campaign id
    async fn save(&self, campaign: &Campaign) -> Result<(), RepositoryError>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError>;
}

/// One call to the transmission endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmitRequest {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub from_name: String,
    pub reply_to: Option<String>,
    pub sending_domain_id: Option<String>,
    pub campaign_id: EntityId,
    pub contact_id: EntityId,
    pub personalization: PersonalizationPayload,
}

/// Endpoint verdict. `success == false` is a delivery failure, not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmitResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl TransmitResponse {
    pub fn accepted() -> Self {
        Self { success: true, error: None }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self { success: false, error: Some(reason.into()) }
    }

    /// Reported error wins over the success flag
    pub fn failure_reason(&self) -> Option<String> {
        match (&self.error, self.success) {
            (Some(e), _) => Some(e.clone()),
            (None, false) => Some("endpoint reported failure".to_string()),
            (None, true) => None,
        }
    }
}

/// Outbound transmission endpoint. Retries are the endpoint's concern.
#[async_trait]
pub trait Transmitter: Send + Sync {
    async fn send(&self, request: TransmitRequest) -> Result<TransmitResponse, TransmitError>;
}

/// Client-local key-value store used for the editor round trip
pub trait EphemeralStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found")]
    NotFound,
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Query error: {0}")]
    QueryError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Unexpected fault while calling the endpoint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransmitError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid endpoint response: {0}")]
    InvalidResponse(String),
    #[error("endpoint timed out")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("ephemeral store I/O error: {0}")]
    Io(String),
}
