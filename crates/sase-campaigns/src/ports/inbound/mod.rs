//! Inbound ports (use case traits)
//!
//! Operations on persisted campaigns, outside the authoring wizard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::application::dispatch::{DispatchError, DispatchResult, ProgressObserver};
use crate::application::resolver::Resolution;
use crate::domain::aggregates::Campaign;
use crate::domain::value_objects::{EntityId, Targeting};

/// Campaign use cases
#[async_trait]
pub trait CampaignUseCases: Send + Sync {
    async fn get_campaign(&self, owner_id: &EntityId, campaign_id: &EntityId) -> Result<Campaign, UseCaseError>;

    /// Who would receive a campaign with this targeting
    async fn preview_recipients(&self, owner_id: &EntityId, targeting: &Targeting) -> Result<Resolution, UseCaseError>;

    /// Dispatch a stored draft or scheduled campaign immediately
    async fn send_now(
        &self,
        owner_id: &EntityId,
        campaign_id: &EntityId,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult, UseCaseError>;

    /// Dispatch every scheduled campaign due at `now`, one after another
    async fn dispatch_due(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<Vec<DueDispatch>, UseCaseError>;

    /// Render the body one contact would receive
    async fn preview_message(
        &self,
        owner_id: &EntityId,
        campaign_id: &EntityId,
        contact_id: &EntityId,
    ) -> Result<MessagePreview, UseCaseError>;
}

/// Result for one campaign picked up by `dispatch_due`
#[derive(Clone, Debug, Serialize)]
pub struct DueDispatch {
    pub campaign_id: EntityId,
    pub name: String,
    #[serde(flatten)]
    pub outcome: DueOutcome,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DueOutcome {
    Dispatched { result: DispatchResult },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessagePreview {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UseCaseError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Domain error: {0}")]
    DomainError(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
