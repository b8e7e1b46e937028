//! Campaign wizard (draft state manager)
//!
//! Four linear steps: details, template, recipients, schedule. `next()`
//! validates the current step and never moves the step pointer on failure.
//! Picking a pre-built template on step 2 suspends the wizard for the
//! external editor; `restore_from_editor()` resumes it at step 3.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::authoring::{AuthoringState, WizardStep};
use crate::application::dispatch::{DispatchEngine, DispatchError, DispatchResult, ProgressObserver};
use crate::application::handoff::{AuthoringSnapshot, EditorHandoff, RestoreError};
use crate::application::resolver::RecipientResolver;
use crate::domain::aggregates::{Campaign, CampaignDetails, CampaignError, CampaignStatus};
use crate::domain::services::{validate_body, validate_details, validate_recipients, validate_schedule, ValidationErrors};
use crate::domain::value_objects::{EntityId, InputMode, Schedule};
use crate::ports::outbound::{CampaignRepository, EventPublisher, RepositoryError, StoreError};

/// Stand-ins stored for required display fields the user left blank
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftPlaceholders {
    pub placeholder_name: String,
    pub placeholder_subject: String,
}

impl Default for DraftPlaceholders {
    fn default() -> Self {
        Self {
            placeholder_name: "Untitled Campaign".to_string(),
            placeholder_subject: "(No subject)".to_string(),
        }
    }
}

/// Collaborators shared by wizard instances
#[derive(Clone)]
pub struct WizardContext {
    pub campaigns: Arc<dyn CampaignRepository>,
    pub event_publisher: Arc<dyn EventPublisher>,
    pub resolver: Arc<RecipientResolver>,
    pub dispatcher: Arc<DispatchEngine>,
    pub handoff: EditorHandoff,
    pub placeholders: DraftPlaceholders,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepTransition {
    Advanced(WizardStep),
    /// Snapshot written; control passes to the template editor
    LeftForEditor { template_id: String },
}

#[derive(Clone, Debug)]
pub struct FinalizeOutcome {
    pub campaign_id: EntityId,
    pub status: CampaignStatus,
    pub recipient_count: u64,
    /// Present only for send-now
    pub dispatch: Option<DispatchResult>,
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Restore(#[from] RestoreError),
    #[error("no eligible recipients match this campaign's targeting")]
    EmptyRecipients,
    #[error("datastore error: {0}")]
    DataAccess(#[from] RepositoryError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Campaign(#[from] CampaignError),
    #[error("could not save wizard state: {0}")]
    Store(#[from] StoreError),
    #[error("invalid step transition: {0}")]
    InvalidTransition(&'static str),
}

pub struct CampaignWizard {
    owner_id: EntityId,
    state: AuthoringState,
    step: WizardStep,
    campaign_id: Option<EntityId>,
    errors: ValidationErrors,
    ctx: WizardContext,
}

impl CampaignWizard {
    pub fn new(owner_id: EntityId, ctx: WizardContext) -> Self {
        Self {
            owner_id,
            state: AuthoringState::default(),
            step: WizardStep::Details,
            campaign_id: None,
            errors: ValidationErrors::new(),
            ctx,
        }
    }

    /// Reopen a saved draft at the step it was saved from
    pub fn resume(owner_id: EntityId, campaign: &Campaign, ctx: WizardContext) -> Self {
        let step = campaign
            .draft_step()
            .and_then(|n| WizardStep::try_from(n).ok())
            .unwrap_or_default();
        Self {
            owner_id,
            state: AuthoringState::from_campaign(campaign),
            step,
            campaign_id: Some(campaign.id().clone()),
            errors: ValidationErrors::new(),
            ctx,
        }
    }

    pub fn state(&self) -> &AuthoringState { &self.state }
    pub fn state_mut(&mut self) -> &mut AuthoringState { &mut self.state }
    pub fn step(&self) -> WizardStep { self.step }
    pub fn campaign_id(&self) -> Option<&EntityId> { self.campaign_id.as_ref() }
    /// Field errors from the last failed transition
    pub fn errors(&self) -> &ValidationErrors { &self.errors }

    pub fn next(&mut self) -> Result<StepTransition, WizardError> {
        let checked = match self.step {
            WizardStep::Details => validate_details(&self.state.details),
            WizardStep::Template => validate_body(&self.state.body),
            WizardStep::Recipients => validate_recipients(&self.state.targeting),
            WizardStep::Schedule => return Err(WizardError::InvalidTransition("schedule is the last step")),
        };
        if let Err(errors) = checked {
            self.errors = errors.clone();
            return Err(WizardError::Validation(errors));
        }
        self.errors = ValidationErrors::new();

        if self.step == WizardStep::Template && self.state.body.input_mode == InputMode::Template {
            let template_id = self.state.body.template_id.clone().unwrap_or_default();
            let snapshot = AuthoringSnapshot::new(self.state.clone(), self.step, self.campaign_id.clone());
            self.ctx.handoff.suspend(&snapshot)?;
            info!(template_id = %template_id, "Leaving wizard for template editor");
            return Ok(StepTransition::LeftForEditor { template_id });
        }

        if let Some(next) = self.step.next() {
            self.step = next;
        }
        debug!(step = self.step.number(), "Wizard advanced");
        Ok(StepTransition::Advanced(self.step))
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.errors = ValidationErrors::new();
        self.step
    }

    /// Resume after the editor round trip.
    ///
    /// Returns `Ok(false)` when no round trip is pending. On any restore
    /// error the wizard keeps its current state and step.
    pub fn restore_from_editor(&mut self) -> Result<bool, WizardError> {
        let (snapshot, edited) = match self.ctx.handoff.take() {
            Ok(Some(payloads)) => payloads,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!(error = %e, "Abandoning wizard restoration");
                return Err(e.into());
            }
        };

        let mut state = snapshot.state;
        state.body.apply_edited(edited.html);
        if let Some(template_id) = edited.template_id {
            state.body.template_id = Some(template_id);
        }

        self.state = state;
        self.campaign_id = snapshot.campaign_id.or_else(|| self.campaign_id.take());
        self.step = WizardStep::Recipients;
        self.errors = ValidationErrors::new();
        info!(step = self.step.number(), "Wizard restored from template editor");
        Ok(true)
    }

    /// Persist the current state as a draft without validation
    pub async fn save_draft(&mut self) -> Result<EntityId, WizardError> {
        let mut campaign = self.load_or_create().await?;
        campaign.save_as_draft(self.step.number())?;
        let id = self.persist(&mut campaign).await?;
        info!(campaign_id = %id, step = self.step.number(), "Draft saved");
        Ok(id)
    }

    /// Submit step 4.
    ///
    /// Only valid on the schedule step. Every step's rules are checked again
    /// so edits made after advancing cannot reach storage or the endpoint.
    pub async fn finalize(
        &mut self,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<FinalizeOutcome, WizardError> {
        if self.step != WizardStep::Schedule {
            return Err(WizardError::InvalidTransition("finalize is only available on the schedule step"));
        }
        let schedule = match self.validate_all(chrono::Utc::now()) {
            Ok(schedule) => schedule,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(WizardError::Validation(errors));
            }
        };
        self.errors = ValidationErrors::new();

        let recipients = match schedule {
            Schedule::Draft => None,
            Schedule::Now | Schedule::Later(_) => {
                let targeting = self.state.targeting.targeting();
                let recipients = self.ctx.resolver.resolve(&targeting, &self.owner_id).await?;
                if recipients.is_empty() {
                    return Err(WizardError::EmptyRecipients);
                }
                Some(recipients)
            }
        };

        let mut campaign = self.load_or_create().await?;
        if let Some(recipients) = &recipients {
            campaign.set_recipient_count(recipients.len() as u64);
        }

        let dispatch = match schedule {
            Schedule::Draft => {
                campaign.save_as_draft(self.step.number())?;
                self.persist(&mut campaign).await?;
                None
            }
            Schedule::Later(at) => {
                campaign.schedule(at)?;
                self.persist(&mut campaign).await?;
                info!(campaign_id = %campaign.id(), scheduled_at = %at, "Campaign scheduled");
                None
            }
            Schedule::Now => {
                campaign.begin_sending().map_err(|e| DispatchError::Fatal(e.to_string()))?;
                self.persist(&mut campaign)
                    .await
                    .map_err(|e| DispatchError::Fatal(e.to_string()))?;
                let recipients = recipients.unwrap_or_default();
                let result = self.ctx.dispatcher.dispatch(&mut campaign, &recipients, observer, cancel).await?;
                Some(result)
            }
        };

        if let Err(e) = self.ctx.handoff.clear() {
            warn!(error = %e, "Could not clear editor handoff entries");
        }

        Ok(FinalizeOutcome {
            campaign_id: campaign.id().clone(),
            status: campaign.status(),
            recipient_count: campaign.recipient_count(),
            dispatch,
        })
    }

    fn validate_all(&self, now: chrono::DateTime<chrono::Utc>) -> Result<Schedule, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let checks = [
            validate_details(&self.state.details),
            validate_body(&self.state.body),
            validate_recipients(&self.state.targeting),
        ];
        for failed in checks.into_iter().filter_map(Result::err) {
            errors.merge(failed);
        }
        match validate_schedule(&self.state.schedule, now) {
            Ok(schedule) if errors.is_empty() => Ok(schedule),
            Ok(_) => Err(errors),
            Err(failed) => {
                errors.merge(failed);
                Err(errors)
            }
        }
    }

    /// Details with placeholders for blank required display fields.
    /// Only drafts can reach storage with blanks.
    fn stored_details(&self) -> CampaignDetails {
        let mut details = self.state.details.clone();
        if details.name.trim().is_empty() {
            details.name = self.ctx.placeholders.placeholder_name.clone();
        }
        if details.subject.trim().is_empty() {
            details.subject = self.ctx.placeholders.placeholder_subject.clone();
        }
        details
    }

    async fn load_or_create(&self) -> Result<Campaign, WizardError> {
        let details = self.stored_details();
        let existing = match &self.campaign_id {
            Some(id) => self.ctx.campaigns.find_by_id(&self.owner_id, id).await?,
            None => None,
        };
        let mut campaign = match (existing, &self.campaign_id) {
            (Some(campaign), _) => campaign,
            (None, Some(id)) => Campaign::create(self.owner_id.clone(), details.clone()).with_id(id.clone()),
            (None, None) => Campaign::create(self.owner_id.clone(), details.clone()),
        };
        campaign.update_content(
            details,
            self.state.body.clone(),
            self.state.targeting.targeting(),
            self.state.schedule.mode,
        )?;
        Ok(campaign)
    }

    /// Upsert, confirm by reading back, then publish events
    async fn persist(&mut self, campaign: &mut Campaign) -> Result<EntityId, RepositoryError> {
        self.ctx.campaigns.save(campaign).await?;
        self.ctx
            .campaigns
            .find_by_id(&self.owner_id, campaign.id())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let id = campaign.id().clone();
        self.campaign_id = Some(id.clone());

        let events = campaign.take_events();
        if let Err(e) = self.ctx.event_publisher.publish(events).await {
            warn!(campaign_id = %id, error = %e, "Failed to publish campaign events");
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatch::{DispatchConfig, NoopProgress};
    use crate::application::handoff::EditedTemplate;
    use crate::domain::aggregates::{Contact, ContactStatus, EligibilityPolicy};
    use crate::domain::value_objects::{BodySource, Email, ScheduleDraft, TargetingMode};
    use crate::infrastructure::ephemeral::InMemoryEphemeralStore;
    use crate::infrastructure::persistence::{
        InMemoryCampaignRepository, InMemoryContactRepository, InMemoryEventPublisher, InMemoryGroupRepository,
    };
    use crate::infrastructure::transmission::DryRunTransmitter;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    /// Reads succeed; every save fails
    struct UnwritableCampaigns;

    #[async_trait]
    impl CampaignRepository for UnwritableCampaigns {
        async fn find_by_id(&self, _owner_id: &EntityId, _id: &EntityId) -> Result<Option<Campaign>, RepositoryError> {
            Ok(None)
        }

        async fn find_by_status(&self, _status: CampaignStatus) -> Result<Vec<Campaign>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn save(&self, _campaign: &Campaign) -> Result<(), RepositoryError> {
            Err(RepositoryError::ConnectionError("datastore offline".into()))
        }
    }

    struct Harness {
        owner: EntityId,
        contacts: Arc<InMemoryContactRepository>,
        campaigns: Arc<InMemoryCampaignRepository>,
        events: Arc<InMemoryEventPublisher>,
        transmitter: Arc<DryRunTransmitter>,
        handoff: EditorHandoff,
        ctx: WizardContext,
    }

    impl Harness {
        fn new() -> Self {
            let campaigns = Arc::new(InMemoryCampaignRepository::new());
            Self::with_campaigns(campaigns.clone(), campaigns)
        }

        /// Wizard and dispatcher write through `store`
        fn with_campaigns(campaigns: Arc<InMemoryCampaignRepository>, store: Arc<dyn CampaignRepository>) -> Self {
            let owner = EntityId::from("owner-1");
            let contacts = Arc::new(InMemoryContactRepository::new());
            let groups = Arc::new(InMemoryGroupRepository::new());
            let events = Arc::new(InMemoryEventPublisher::new());
            let transmitter = Arc::new(DryRunTransmitter::new());
            let handoff = EditorHandoff::new(Arc::new(InMemoryEphemeralStore::new()));
            let resolver = Arc::new(RecipientResolver::new(contacts.clone(), groups, EligibilityPolicy::default()));
            let dispatcher = Arc::new(DispatchEngine::new(
                transmitter.clone(),
                store.clone(),
                events.clone(),
                DispatchConfig::default(),
            ));
            let ctx = WizardContext {
                campaigns: store,
                event_publisher: events.clone(),
                resolver,
                dispatcher,
                handoff: handoff.clone(),
                placeholders: DraftPlaceholders::default(),
            };
            Self { owner, contacts, campaigns, events, transmitter, handoff, ctx }
        }

        fn unwritable() -> Self {
            Self::with_campaigns(Arc::new(InMemoryCampaignRepository::new()), Arc::new(UnwritableCampaigns))
        }

        fn wizard(&self) -> CampaignWizard {
            CampaignWizard::new(self.owner.clone(), self.ctx.clone())
        }

        fn contact(&self, id: &str, status: ContactStatus) {
            let contact = Contact::create(self.owner.clone(), Email::new_unchecked(format!("{id}@example.com")), None, None)
                .with_id(EntityId::from(id))
                .with_status(status);
            self.contacts.insert(contact);
        }
    }

    fn fill_details(wizard: &mut CampaignWizard) {
        let details = &mut wizard.state_mut().details;
        details.name = "Spring Launch".into();
        details.subject = "Something new".into();
        details.from_name = "OpenSASE".into();
        details.from_email = "news@example.com".into();
    }

    /// Wizard parked on step 4 with a custom body
    fn ready_wizard(h: &Harness) -> CampaignWizard {
        let mut wizard = h.wizard();
        fill_details(&mut wizard);
        wizard.next().unwrap();
        wizard.state_mut().body = BodySource::custom("<p>Hi {{firstname}}</p>");
        wizard.next().unwrap();
        wizard.next().unwrap();
        assert_eq!(wizard.step(), WizardStep::Schedule);
        wizard
    }

    #[test]
    fn test_invalid_details_block_step_one() {
        let h = Harness::new();
        let mut wizard = h.wizard();
        wizard.state_mut().details.name = "ab".into();

        let err = wizard.next().unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(wizard.step(), WizardStep::Details);
        assert!(wizard.errors().contains("name"));
        assert!(wizard.errors().contains("from_email"));

        fill_details(&mut wizard);
        assert_eq!(wizard.next().unwrap(), StepTransition::Advanced(WizardStep::Template));
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn test_template_round_trip_resumes_on_recipients() {
        let h = Harness::new();
        let mut wizard = h.wizard();
        fill_details(&mut wizard);
        wizard.next().unwrap();
        wizard.state_mut().body = BodySource::template("welcome");
        wizard.state_mut().targeting.mode = TargetingMode::Groups;
        wizard.state_mut().targeting.toggle_group(EntityId::from("g1"));
        wizard.state_mut().targeting.toggle_group(EntityId::from("g2"));

        let transition = wizard.next().unwrap();
        assert_eq!(transition, StepTransition::LeftForEditor { template_id: "welcome".into() });
        assert!(h.handoff.pending().unwrap());

        // The wizard is dropped while the user edits; a fresh one picks up.
        drop(wizard);
        h.handoff.submit_edit(&EditedTemplate::new("<h1>Edited</h1>")).unwrap();

        let mut resumed = h.wizard();
        assert!(resumed.restore_from_editor().unwrap());
        assert_eq!(resumed.step(), WizardStep::Recipients);
        assert_eq!(resumed.state().body.input_mode, InputMode::Custom);
        assert_eq!(resumed.state().body.custom_html, "<h1>Edited</h1>");
        assert_eq!(resumed.state().details.name, "Spring Launch");
        assert_eq!(resumed.state().targeting.selected_groups.len(), 2);
        assert!(!h.handoff.pending().unwrap());
    }

    #[test]
    fn test_restore_without_edited_body_changes_nothing() {
        let h = Harness::new();
        let mut wizard = h.wizard();
        fill_details(&mut wizard);
        wizard.next().unwrap();
        wizard.state_mut().body = BodySource::template("welcome");
        wizard.next().unwrap();

        let mut resumed = h.wizard();
        let err = resumed.restore_from_editor().unwrap_err();
        assert!(matches!(err, WizardError::Restore(RestoreError::MissingEditedBody)));
        assert_eq!(resumed.step(), WizardStep::Details);
        assert_eq!(resumed.state(), &AuthoringState::default());
    }

    #[test]
    fn test_restore_with_nothing_pending() {
        let h = Harness::new();
        let mut wizard = h.wizard();
        assert!(!wizard.restore_from_editor().unwrap());
        assert_eq!(wizard.step(), WizardStep::Details);
    }

    #[test]
    fn test_back_never_passes_step_one() {
        let h = Harness::new();
        let mut wizard = ready_wizard(&h);
        assert_eq!(wizard.back(), WizardStep::Recipients);
        assert_eq!(wizard.back(), WizardStep::Template);
        assert_eq!(wizard.back(), WizardStep::Details);
        assert_eq!(wizard.back(), WizardStep::Details);
    }

    #[tokio::test]
    async fn test_save_draft_twice_keeps_one_record() {
        let h = Harness::new();
        let mut wizard = h.wizard();

        let first = wizard.save_draft().await.unwrap();
        wizard.state_mut().details.description = "second pass".into();
        let second = wizard.save_draft().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.campaigns.len(), 1);
        let stored = h.campaigns.find_by_id(&h.owner, &first).await.unwrap().unwrap();
        assert_eq!(stored.status(), CampaignStatus::Draft);
        assert_eq!(stored.name(), "Untitled Campaign");
        assert_eq!(stored.subject(), "(No subject)");
        assert_eq!(stored.details().description, "second pass");
        assert_eq!(stored.draft_step(), Some(1));
        assert_eq!(
            h.events.event_types(),
            vec!["campaign.created", "campaign.draft_saved", "campaign.draft_saved"]
        );
    }

    #[tokio::test]
    async fn test_save_draft_surfaces_datastore_failure() {
        let h = Harness::unwritable();
        let mut wizard = h.wizard();
        fill_details(&mut wizard);

        let err = wizard.save_draft().await.unwrap_err();
        assert!(matches!(err, WizardError::DataAccess(RepositoryError::ConnectionError(_))));
        assert!(wizard.campaign_id().is_none());
        assert!(h.events.events().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_outside_schedule_step_rejected() {
        let h = Harness::new();
        h.contact("c1", ContactStatus::Active);
        let mut wizard = h.wizard();
        wizard.state_mut().body = BodySource::custom("<p>Hi</p>");
        wizard.state_mut().schedule = ScheduleDraft::now();

        let err = wizard.finalize(&NoopProgress, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, WizardError::InvalidTransition(_)));
        assert_eq!(wizard.step(), WizardStep::Details);
        assert!(h.transmitter.sent().is_empty());
        assert_eq!(h.campaigns.len(), 0);
        assert!(h.events.events().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_revalidates_earlier_steps() {
        let h = Harness::new();
        h.contact("c1", ContactStatus::Active);
        let mut wizard = ready_wizard(&h);
        wizard.state_mut().details.from_name = String::new();
        wizard.state_mut().body = BodySource::custom("  ");

        let err = wizard.finalize(&NoopProgress, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert!(wizard.errors().contains("from_name"));
        assert!(wizard.errors().contains("custom_html"));
        assert_eq!(wizard.step(), WizardStep::Schedule);
        assert!(h.transmitter.sent().is_empty());
        assert_eq!(h.campaigns.len(), 0);
    }

    #[tokio::test]
    async fn test_send_now_fails_fatally_when_campaign_cannot_be_stored() {
        let h = Harness::unwritable();
        h.contact("c1", ContactStatus::Active);
        let mut wizard = ready_wizard(&h);

        let err = wizard.finalize(&NoopProgress, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, WizardError::Dispatch(DispatchError::Fatal(_))));
        assert!(h.transmitter.sent().is_empty());
        assert!(wizard.campaign_id().is_none());
    }

    #[tokio::test]
    async fn test_resume_draft_at_saved_step() {
        let h = Harness::new();
        let mut wizard = ready_wizard(&h);
        let id = wizard.save_draft().await.unwrap();

        let stored = h.campaigns.find_by_id(&h.owner, &id).await.unwrap().unwrap();
        let resumed = CampaignWizard::resume(h.owner.clone(), &stored, h.ctx.clone());
        assert_eq!(resumed.step(), WizardStep::Schedule);
        assert_eq!(resumed.state().body.custom_html, "<p>Hi {{firstname}}</p>");
        assert_eq!(resumed.campaign_id(), Some(&id));
    }

    #[tokio::test]
    async fn test_past_schedule_rejected() {
        let h = Harness::new();
        h.contact("c1", ContactStatus::Active);
        let mut wizard = ready_wizard(&h);
        let id = wizard.save_draft().await.unwrap();

        let past = Utc::now() - Duration::hours(1);
        wizard.state_mut().schedule = ScheduleDraft::later(past.date_naive(), past.time());
        let err = wizard.finalize(&NoopProgress, &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, WizardError::Validation(ref e) if e.contains("schedule_date")));
        let stored = h.campaigns.find_by_id(&h.owner, &id).await.unwrap().unwrap();
        assert_eq!(stored.status(), CampaignStatus::Draft);
    }

    #[tokio::test]
    async fn test_future_schedule_records_count() {
        let h = Harness::new();
        h.contact("c1", ContactStatus::Active);
        h.contact("c2", ContactStatus::Subscribed);
        h.contact("c3", ContactStatus::Bounced);
        let mut wizard = ready_wizard(&h);

        let at = Utc::now() + Duration::days(2);
        wizard.state_mut().schedule = ScheduleDraft::later(at.date_naive(), at.time());
        let outcome = wizard.finalize(&NoopProgress, &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, CampaignStatus::Scheduled);
        assert_eq!(outcome.recipient_count, 2);
        assert!(outcome.dispatch.is_none());
        let stored = h.campaigns.find_by_id(&h.owner, &outcome.campaign_id).await.unwrap().unwrap();
        assert!(stored.scheduled_at().is_some());
    }

    #[tokio::test]
    async fn test_empty_recipients_rejected() {
        let h = Harness::new();
        h.contact("gone", ContactStatus::Unsubscribed);
        let mut wizard = ready_wizard(&h);

        let err = wizard.finalize(&NoopProgress, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, WizardError::EmptyRecipients));
        assert_eq!(h.campaigns.len(), 0);
    }

    #[tokio::test]
    async fn test_send_now_marks_sent() {
        let h = Harness::new();
        for i in 0..3 {
            h.contact(&format!("c{i}"), ContactStatus::Active);
        }
        let mut wizard = ready_wizard(&h);

        let outcome = wizard.finalize(&NoopProgress, &CancellationToken::new()).await.unwrap();
        let result = outcome.dispatch.expect("send-now dispatches");
        assert_eq!(result.success_count, 3);
        assert_eq!(outcome.status, CampaignStatus::Sent);

        let stored = h.campaigns.find_by_id(&h.owner, &outcome.campaign_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), CampaignStatus::Sent);
        assert_eq!(stored.stats().sent, 3);
        assert!(stored.sent_at().is_some());
    }

    #[tokio::test]
    async fn test_draft_mode_skips_resolution() {
        let h = Harness::new();
        let mut wizard = ready_wizard(&h);
        wizard.state_mut().schedule = ScheduleDraft::draft();

        let outcome = wizard.finalize(&NoopProgress, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.status, CampaignStatus::Draft);
        assert_eq!(outcome.recipient_count, 0);
    }
}
