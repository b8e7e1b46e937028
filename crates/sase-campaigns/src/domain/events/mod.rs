//! Campaign domain events

use chrono::{DateTime, Utc};

use crate::domain::value_objects::EntityId;

#[derive(Clone, Debug)]
pub enum DomainEvent {
    Campaign(CampaignEvent),
}

#[derive(Clone, Debug)]
pub enum CampaignEvent {
    Created { campaign_id: EntityId },
    DraftSaved { campaign_id: EntityId, step: u8 },
    Scheduled { campaign_id: EntityId, scheduled_at: DateTime<Utc> },
    DispatchStarted { campaign_id: EntityId, recipients: u64 },
    Sent { campaign_id: EntityId, sent: u64, failed: u64 },
    Cancelled { campaign_id: EntityId, sent: u64, failed: u64 },
}

impl DomainEvent {
    pub fn aggregate_id(&self) -> &EntityId {
        match self {
            DomainEvent::Campaign(e) => match e {
                CampaignEvent::Created { campaign_id }
                | CampaignEvent::DraftSaved { campaign_id, .. }
                | CampaignEvent::Scheduled { campaign_id, .. }
                | CampaignEvent::DispatchStarted { campaign_id, .. }
                | CampaignEvent::Sent { campaign_id, .. }
                | CampaignEvent::Cancelled { campaign_id, .. } => campaign_id,
            },
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Campaign(e) => match e {
                CampaignEvent::Created { .. } => "campaign.created",
                CampaignEvent::DraftSaved { .. } => "campaign.draft_saved",
                CampaignEvent::Scheduled { .. } => "campaign.scheduled",
                CampaignEvent::DispatchStarted { .. } => "campaign.dispatch_started",
                CampaignEvent::Sent { .. } => "campaign.sent",
                CampaignEvent::Cancelled { .. } => "campaign.cancelled",
            },
        }
    }
}
