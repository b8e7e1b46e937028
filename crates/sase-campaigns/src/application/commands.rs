//! Command handlers
//!
//! Application service for campaigns that already exist in the datastore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::dispatch::{DispatchEngine, DispatchResult, ProgressObserver, TracingProgressObserver};
use crate::application::resolver::{RecipientResolver, Resolution};
use crate::domain::aggregates::{Campaign, CampaignStatus};
use crate::domain::services::personalize;
use crate::domain::value_objects::{EntityId, Targeting};
use crate::ports::inbound::{CampaignUseCases, DueDispatch, DueOutcome, MessagePreview, UseCaseError};
use crate::ports::outbound::{CampaignRepository, ContactRepository};

/// Campaign application service
pub struct CampaignService {
    campaign_repo: Arc<dyn CampaignRepository>,
    contact_repo: Arc<dyn ContactRepository>,
    resolver: Arc<RecipientResolver>,
    dispatcher: Arc<DispatchEngine>,
}

impl CampaignService {
    pub fn new(
        campaign_repo: Arc<dyn CampaignRepository>,
        contact_repo: Arc<dyn ContactRepository>,
        resolver: Arc<RecipientResolver>,
        dispatcher: Arc<DispatchEngine>,
    ) -> Self {
        Self {
            campaign_repo,
            contact_repo,
            resolver,
            dispatcher,
        }
    }

    async fn load(&self, owner_id: &EntityId, campaign_id: &EntityId) -> Result<Campaign, UseCaseError> {
        self.campaign_repo
            .find_by_id(owner_id, campaign_id)
            .await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))?
            .ok_or_else(|| UseCaseError::NotFound(format!("Campaign {} not found", campaign_id)))
    }

    /// Resolve and dispatch one loaded campaign
    async fn dispatch_campaign(
        &self,
        campaign: &mut Campaign,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult, UseCaseError> {
        if !campaign.is_editable() {
            return Err(UseCaseError::DomainError(format!(
                "campaign is {} and cannot be sent",
                campaign.status().as_str()
            )));
        }
        if campaign.body().html().trim().is_empty() {
            return Err(UseCaseError::ValidationError("campaign has no content".into()));
        }

        let owner_id = campaign.owner_id().clone();
        let recipients = self
            .resolver
            .resolve(campaign.targeting(), &owner_id)
            .await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))?;
        if recipients.is_empty() {
            return Err(UseCaseError::ValidationError(
                "no eligible recipients match this campaign's targeting".into(),
            ));
        }

        Ok(self.dispatcher.dispatch(campaign, &recipients, observer, cancel).await?)
    }
}

#[async_trait]
impl CampaignUseCases for CampaignService {
    async fn get_campaign(&self, owner_id: &EntityId, campaign_id: &EntityId) -> Result<Campaign, UseCaseError> {
        self.load(owner_id, campaign_id).await
    }

    async fn preview_recipients(&self, owner_id: &EntityId, targeting: &Targeting) -> Result<Resolution, UseCaseError> {
        self.resolver
            .resolve_detailed(targeting, owner_id)
            .await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))
    }

    async fn send_now(
        &self,
        owner_id: &EntityId,
        campaign_id: &EntityId,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult, UseCaseError> {
        let mut campaign = self.load(owner_id, campaign_id).await?;
        self.dispatch_campaign(&mut campaign, observer, cancel).await
    }

    async fn dispatch_due(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<Vec<DueDispatch>, UseCaseError> {
        let scheduled = self
            .campaign_repo
            .find_by_status(CampaignStatus::Scheduled)
            .await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))?;

        let mut due: Vec<Campaign> = scheduled.into_iter().filter(|c| c.is_due(now)).collect();
        due.sort_by_key(|c| c.scheduled_at());
        info!(due = due.len(), "Scheduled campaigns due for dispatch");

        let mut report = Vec::with_capacity(due.len());
        for mut campaign in due {
            if cancel.is_cancelled() {
                break;
            }
            let observer = TracingProgressObserver::new(campaign.id().clone());
            let outcome = match self.dispatch_campaign(&mut campaign, &observer, cancel).await {
                Ok(result) => DueOutcome::Dispatched { result },
                Err(e) => {
                    warn!(campaign_id = %campaign.id(), error = %e, "Scheduled dispatch failed");
                    DueOutcome::Failed { reason: e.to_string() }
                }
            };
            report.push(DueDispatch {
                campaign_id: campaign.id().clone(),
                name: campaign.name().to_string(),
                outcome,
            });
        }
        Ok(report)
    }

    async fn preview_message(
        &self,
        owner_id: &EntityId,
        campaign_id: &EntityId,
        contact_id: &EntityId,
    ) -> Result<MessagePreview, UseCaseError> {
        let campaign = self.load(owner_id, campaign_id).await?;
        let contact = self
            .contact_repo
            .find_by_ids(owner_id, std::slice::from_ref(contact_id))
            .await
            .map_err(|e| UseCaseError::RepositoryError(e.to_string()))?
            .into_iter()
            .find(|c| c.id() == contact_id)
            .ok_or_else(|| UseCaseError::NotFound(format!("Contact {} not found", contact_id)))?;

        Ok(MessagePreview {
            to: contact.email().to_string(),
            subject: campaign.subject().to_string(),
            html: personalize(campaign.body().html(), &contact),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatch::{DispatchConfig, NoopProgress};
    use crate::domain::aggregates::{CampaignDetails, Contact, ContactStatus, EligibilityPolicy};
    use crate::domain::value_objects::{BodySource, Email, ScheduleMode};
    use crate::infrastructure::persistence::{
        InMemoryCampaignRepository, InMemoryContactRepository, InMemoryGroupRepository, NoOpEventPublisher,
    };
    use crate::infrastructure::transmission::DryRunTransmitter;
    use chrono::Duration;

    struct Fixture {
        owner: EntityId,
        contacts: Arc<InMemoryContactRepository>,
        campaigns: Arc<InMemoryCampaignRepository>,
        transmitter: Arc<DryRunTransmitter>,
        service: CampaignService,
    }

    fn fixture() -> Fixture {
        let contacts = Arc::new(InMemoryContactRepository::new());
        let groups = Arc::new(InMemoryGroupRepository::new());
        let campaigns = Arc::new(InMemoryCampaignRepository::new());
        let transmitter = Arc::new(DryRunTransmitter::new());
        let resolver = Arc::new(RecipientResolver::new(contacts.clone(), groups, EligibilityPolicy::default()));
        let dispatcher = Arc::new(DispatchEngine::new(
            transmitter.clone(),
            campaigns.clone(),
            Arc::new(NoOpEventPublisher),
            DispatchConfig::default(),
        ));
        let service = CampaignService::new(campaigns.clone(), contacts.clone(), resolver, dispatcher);
        Fixture { owner: EntityId::from("owner-1"), contacts, campaigns, transmitter, service }
    }

    impl Fixture {
        fn contact(&self, id: &str, first: Option<&str>, status: ContactStatus) {
            let contact = Contact::create(
                self.owner.clone(),
                Email::new_unchecked(format!("{id}@example.com")),
                first.map(String::from),
                None,
            )
            .with_id(EntityId::from(id))
            .with_status(status);
            self.contacts.insert(contact);
        }

        fn campaign(&self, id: &str, html: &str) -> Campaign {
            let details = CampaignDetails {
                name: format!("Campaign {id}"),
                subject: "Hello {{firstname}}".into(),
                from_name: "OpenSASE".into(),
                from_email: "news@example.com".into(),
                ..Default::default()
            };
            let mut campaign = Campaign::create(self.owner.clone(), details.clone()).with_id(EntityId::from(id));
            campaign
                .update_content(details, BodySource::custom(html), Targeting::All, ScheduleMode::Now)
                .unwrap();
            campaign
        }
    }

    #[tokio::test]
    async fn test_send_now_dispatches_stored_draft() {
        let f = fixture();
        f.contact("c1", Some("Ada"), ContactStatus::Active);
        f.contact("c2", None, ContactStatus::Bounced);
        f.campaigns.insert(f.campaign("k1", "<p>Hi {{firstname}}</p>"));

        let result = f
            .service
            .send_now(&f.owner, &EntityId::from("k1"), &NoopProgress, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.success_count, 1);
        assert_eq!(f.transmitter.sent().len(), 1);
        assert_eq!(f.transmitter.sent()[0].html, "<p>Hi Ada</p>");

        let stored = f.service.get_campaign(&f.owner, &EntityId::from("k1")).await.unwrap();
        assert_eq!(stored.status(), CampaignStatus::Sent);
    }

    #[tokio::test]
    async fn test_send_now_refuses_sent_campaign() {
        let f = fixture();
        f.contact("c1", None, ContactStatus::Active);
        f.campaigns.insert(f.campaign("k1", "<p>x</p>"));
        let id = EntityId::from("k1");
        let cancel = CancellationToken::new();
        f.service.send_now(&f.owner, &id, &NoopProgress, &cancel).await.unwrap();

        let err = f.service.send_now(&f.owner, &id, &NoopProgress, &cancel).await.unwrap_err();
        assert!(matches!(err, UseCaseError::DomainError(_)));
        assert_eq!(f.transmitter.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_campaign() {
        let f = fixture();
        let err = f
            .service
            .send_now(&f.owner, &EntityId::from("nope"), &NoopProgress, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dispatch_due_only_picks_due_campaigns() {
        let f = fixture();
        f.contact("c1", None, ContactStatus::Active);
        let now = Utc::now();

        let mut due = f.campaign("due", "<p>due</p>");
        due.schedule(now - Duration::minutes(5)).unwrap();
        f.campaigns.insert(due);
        let mut future = f.campaign("future", "<p>later</p>");
        future.schedule(now + Duration::hours(3)).unwrap();
        f.campaigns.insert(future);
        f.campaigns.insert(f.campaign("draft", "<p>draft</p>"));

        let report = f.service.dispatch_due(now, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].campaign_id, EntityId::from("due"));
        assert!(matches!(report[0].outcome, DueOutcome::Dispatched { .. }));

        let future = f.service.get_campaign(&f.owner, &EntityId::from("future")).await.unwrap();
        assert_eq!(future.status(), CampaignStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_dispatch_due_failure_does_not_stop_others() {
        let f = fixture();
        let now = Utc::now();
        // No contacts for the second owner, so its campaign cannot resolve anyone.
        f.contact("c1", None, ContactStatus::Active);

        let mut ok = f.campaign("ok", "<p>ok</p>");
        ok.schedule(now - Duration::minutes(1)).unwrap();
        f.campaigns.insert(ok);

        let details = CampaignDetails { name: "Other".into(), subject: "S".into(), ..Default::default() };
        let mut empty = Campaign::create(EntityId::from("owner-2"), details.clone()).with_id(EntityId::from("empty"));
        empty
            .update_content(details, BodySource::custom("<p>x</p>"), Targeting::All, ScheduleMode::Later)
            .unwrap();
        empty.schedule(now - Duration::minutes(10)).unwrap();
        f.campaigns.insert(empty);

        let report = f.service.dispatch_due(now, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].campaign_id, EntityId::from("empty"));
        assert!(matches!(report[0].outcome, DueOutcome::Failed { .. }));
        assert!(matches!(report[1].outcome, DueOutcome::Dispatched { .. }));
    }

    #[tokio::test]
    async fn test_preview_message_personalizes_body_only() {
        let f = fixture();
        f.contact("c1", Some("Grace"), ContactStatus::Active);
        f.campaigns.insert(f.campaign("k1", "Dear {{MERGE:first_name}}"));

        let preview = f
            .service
            .preview_message(&f.owner, &EntityId::from("k1"), &EntityId::from("c1"))
            .await
            .unwrap();
        assert_eq!(preview.html, "Dear Grace");
        assert_eq!(preview.subject, "Hello {{firstname}}");
        assert_eq!(preview.to, "c1@example.com");
    }

    #[tokio::test]
    async fn test_preview_recipients_reports_exclusions() {
        let f = fixture();
        f.contact("c1", None, ContactStatus::Active);
        f.contact("c2", None, ContactStatus::Complained);

        let resolution = f
            .service
            .preview_recipients(&f.owner, &Targeting::contacts(["c1", "c2"]))
            .await
            .unwrap();
        assert_eq!(resolution.len(), 1);
        assert_eq!(resolution.excluded_ineligible, 1);
    }
}
