//! Campaign Aggregate
//!
//! Lifecycle: `Draft -> Scheduled | Sending -> Sent`. A dispatch stopped by
//! the operator ends in `Cancelled`. Deletion is not handled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::events::{CampaignEvent, DomainEvent};
use crate::domain::value_objects::{BodySource, EntityId, ScheduleMode, Targeting};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    Sending,
    Sent,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub recipients: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Display and sender fields edited on the details step
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDetails {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub subject: String,
    #[serde(default)]
    pub preview_text: String,
    pub from_name: String,
    pub from_email: String,
    #[serde(default)]
    pub reply_to: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Campaign {
    id: EntityId,
    owner_id: EntityId,
    details: CampaignDetails,
    #[serde(default)]
    body: BodySource,
    #[serde(default)]
    targeting: Targeting,
    #[serde(default)]
    schedule_mode: ScheduleMode,
    #[serde(default)]
    status: CampaignStatus,
    #[serde(default)]
    recipient_count: u64,
    /// Wizard step the draft was saved from
    #[serde(default)]
    draft_step: Option<u8>,
    #[serde(default)]
    stats: CampaignStats,
    #[serde(default)]
    scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Campaign {
    pub fn create(owner_id: EntityId, details: CampaignDetails) -> Self {
        let now = Utc::now();
        let id = EntityId::new();
        let mut campaign = Self {
            id: id.clone(),
            owner_id,
            details,
            body: BodySource::default(),
            targeting: Targeting::All,
            schedule_mode: ScheduleMode::Draft,
            status: CampaignStatus::Draft,
            recipient_count: 0,
            draft_step: None,
            stats: CampaignStats::default(),
            scheduled_at: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        campaign.raise_event(DomainEvent::Campaign(CampaignEvent::Created { campaign_id: id }));
        campaign
    }

    /// Replace the generated id; the creation event follows the new id
    pub fn with_id(mut self, id: EntityId) -> Self {
        for event in &mut self.events {
            if let DomainEvent::Campaign(CampaignEvent::Created { campaign_id }) = event {
                *campaign_id = id.clone();
            }
        }
        self.id = id;
        self
    }

    pub fn id(&self) -> &EntityId { &self.id }
    pub fn owner_id(&self) -> &EntityId { &self.owner_id }
    pub fn details(&self) -> &CampaignDetails { &self.details }
    pub fn name(&self) -> &str { &self.details.name }
    pub fn subject(&self) -> &str { &self.details.subject }
    pub fn body(&self) -> &BodySource { &self.body }
    pub fn targeting(&self) -> &Targeting { &self.targeting }
    pub fn schedule_mode(&self) -> ScheduleMode { self.schedule_mode }
    pub fn status(&self) -> CampaignStatus { self.status }
    pub fn recipient_count(&self) -> u64 { self.recipient_count }
    pub fn draft_step(&self) -> Option<u8> { self.draft_step }
    pub fn stats(&self) -> &CampaignStats { &self.stats }
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> { self.scheduled_at }
    pub fn sent_at(&self) -> Option<DateTime<Utc>> { self.sent_at }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn is_editable(&self) -> bool {
        matches!(self.status, CampaignStatus::Draft | CampaignStatus::Scheduled)
    }

    /// Is a scheduled campaign due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Scheduled
            && self.scheduled_at.map(|at| at <= now).unwrap_or(false)
    }

    /// Overwrite authoring content. Only allowed before dispatch starts.
    pub fn update_content(
        &mut self,
        details: CampaignDetails,
        body: BodySource,
        targeting: Targeting,
        schedule_mode: ScheduleMode,
    ) -> Result<(), CampaignError> {
        if !self.is_editable() {
            return Err(CampaignError::NotEditable(self.status));
        }
        self.details = details;
        self.body = body;
        self.targeting = targeting;
        self.schedule_mode = schedule_mode;
        self.touch();
        Ok(())
    }

    pub fn set_recipient_count(&mut self, count: u64) {
        self.recipient_count = count;
        self.touch();
    }

    /// Persist as draft, remembering the wizard step
    pub fn save_as_draft(&mut self, step: u8) -> Result<(), CampaignError> {
        if !self.is_editable() {
            return Err(CampaignError::NotEditable(self.status));
        }
        self.status = CampaignStatus::Draft;
        self.draft_step = Some(step);
        self.scheduled_at = None;
        self.touch();
        self.raise_event(DomainEvent::Campaign(CampaignEvent::DraftSaved {
            campaign_id: self.id.clone(),
            step,
        }));
        Ok(())
    }

    pub fn schedule(&mut self, at: DateTime<Utc>) -> Result<(), CampaignError> {
        if !self.is_editable() {
            return Err(CampaignError::NotEditable(self.status));
        }
        if self.body.html().trim().is_empty() {
            return Err(CampaignError::NoContent);
        }
        self.scheduled_at = Some(at);
        self.schedule_mode = ScheduleMode::Later;
        self.status = CampaignStatus::Scheduled;
        self.draft_step = None;
        self.touch();
        self.raise_event(DomainEvent::Campaign(CampaignEvent::Scheduled {
            campaign_id: self.id.clone(),
            scheduled_at: at,
        }));
        Ok(())
    }

    /// Transition to `Sending` ahead of dispatch
    pub fn begin_sending(&mut self) -> Result<(), CampaignError> {
        if !self.is_editable() {
            return Err(CampaignError::NotEditable(self.status));
        }
        if self.body.html().trim().is_empty() {
            return Err(CampaignError::NoContent);
        }
        self.status = CampaignStatus::Sending;
        self.draft_step = None;
        self.touch();
        self.raise_event(DomainEvent::Campaign(CampaignEvent::DispatchStarted {
            campaign_id: self.id.clone(),
            recipients: self.recipient_count,
        }));
        Ok(())
    }

    /// Mark as sent. Partial failures still complete the campaign.
    pub fn complete(&mut self, stats: CampaignStats) {
        let now = Utc::now();
        self.stats = stats;
        self.status = CampaignStatus::Sent;
        self.sent_at = Some(now);
        self.updated_at = now;
        self.raise_event(DomainEvent::Campaign(CampaignEvent::Sent {
            campaign_id: self.id.clone(),
            sent: stats.sent,
            failed: stats.failed,
        }));
    }

    /// Operator stopped the dispatch part-way
    pub fn cancel(&mut self, stats: CampaignStats) {
        self.stats = stats;
        self.status = CampaignStatus::Cancelled;
        self.touch();
        self.raise_event(DomainEvent::Campaign(CampaignEvent::Cancelled {
            campaign_id: self.id.clone(),
            sent: stats.sent,
            failed: stats.failed,
        }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CampaignError {
    #[error("campaign has no content")]
    NoContent,
    #[error("campaign is {} and can no longer be edited", .0.as_str())]
    NotEditable(CampaignStatus),
}
