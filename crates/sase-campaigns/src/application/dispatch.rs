//! Bulk dispatch engine
//!
//! Sends one personalized message per recipient through the transmission
//! port. At most `concurrency` calls are in flight; `concurrency = 1`
//! processes recipients strictly in order. A single aggregator loop owns
//! the tally, so counts are exact and progress never goes backwards no
//! matter which call finishes first.
//!
//! Per-recipient failures, whether reported by the endpoint or raised as
//! transport faults, are counted and never stop the loop.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::aggregates::{Campaign, CampaignStats, CampaignStatus, Contact};
use crate::domain::services::{personalize, PersonalizationPayload};
use crate::domain::value_objects::EntityId;
use crate::ports::outbound::{CampaignRepository, EventPublisher, RepositoryError, TransmitRequest, Transmitter};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum concurrent endpoint calls
    pub concurrency: usize,
    /// Emit progress every N completed recipients (and on the last one)
    pub progress_interval: usize,
    pub sending_domain_id: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { concurrency: 4, progress_interval: 5, sending_domain_id: None }
    }
}

impl DispatchConfig {
    pub fn sequential() -> Self {
        Self { concurrency: 1, ..Self::default() }
    }
}

/// Running totals reported to observers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchProgress {
    pub processed: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub total: usize,
}

/// Receives progress from the aggregator. Called from one task only.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: DispatchProgress);
}

#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _progress: DispatchProgress) {}
}

/// Logs progress through `tracing`
#[derive(Debug)]
pub struct TracingProgressObserver {
    campaign_id: EntityId,
}

impl TracingProgressObserver {
    pub fn new(campaign_id: EntityId) -> Self {
        Self { campaign_id }
    }
}

impl ProgressObserver for TracingProgressObserver {
    fn on_progress(&self, p: DispatchProgress) {
        info!(
            campaign_id = %self.campaign_id,
            processed = p.processed,
            total = p.total,
            sent = p.success_count,
            failed = p.fail_count,
            "Dispatch progress"
        );
    }
}

impl ProgressObserver for watch::Sender<DispatchProgress> {
    fn on_progress(&self, progress: DispatchProgress) {
        self.send_replace(progress);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
    pub contact_id: EntityId,
    pub email: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl RecipientOutcome {
    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Outcome of one dispatch run. Not persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub outcomes: Vec<RecipientOutcome>,
    pub success_count: usize,
    pub fail_count: usize,
    /// Recipients processed; `success_count + fail_count`
    pub total_count: usize,
    /// Recipients never attempted because the run was cancelled
    pub skipped_count: usize,
    pub cancelled: bool,
}

impl DispatchResult {
    pub fn stats(&self) -> CampaignStats {
        CampaignStats {
            recipients: (self.total_count + self.skipped_count) as u64,
            sent: self.success_count as u64,
            failed: self.fail_count as u64,
        }
    }

    pub fn summary(&self) -> DispatchSummary {
        if self.cancelled {
            DispatchSummary::Cancelled {
                sent: self.success_count,
                failed: self.fail_count,
                skipped: self.skipped_count,
            }
        } else if self.fail_count == 0 {
            DispatchSummary::FullSuccess { sent: self.success_count }
        } else {
            DispatchSummary::PartialSuccess { sent: self.success_count, failed: self.fail_count }
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecipientOutcome> {
        self.outcomes.iter().filter(|o| !o.is_sent())
    }
}

/// Terminal report for the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchSummary {
    FullSuccess { sent: usize },
    PartialSuccess { sent: usize, failed: usize },
    Cancelled { sent: usize, failed: usize, skipped: usize },
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullSuccess { sent } => write!(f, "Campaign sent to {} recipients", sent),
            Self::PartialSuccess { sent, failed } => {
                write!(f, "Campaign sent: {} delivered, {} failed", sent, failed)
            }
            Self::Cancelled { sent, failed, skipped } => write!(
                f,
                "Dispatch cancelled: {} delivered, {} failed, {} not attempted",
                sent, failed, skipped
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("campaign has no recipients")]
    NoRecipients,
    /// Nothing was sent; campaign was not marked sent
    #[error("dispatch failed before sending: {0}")]
    Fatal(String),
    /// Recipients were processed but the final status could not be stored
    #[error("dispatch finished but campaign status could not be saved: {source}")]
    StatusUpdate {
        result: Box<DispatchResult>,
        #[source]
        source: RepositoryError,
    },
}

/// Fields shared by every request of one run
struct SendContext {
    campaign_id: EntityId,
    subject: String,
    html: String,
    from_name: String,
    reply_to: Option<String>,
    sending_domain_id: Option<String>,
}

pub struct DispatchEngine {
    transmitter: Arc<dyn Transmitter>,
    campaigns: Arc<dyn CampaignRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    config: DispatchConfig,
}

impl DispatchEngine {
    pub fn new(
        transmitter: Arc<dyn Transmitter>,
        campaigns: Arc<dyn CampaignRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        config: DispatchConfig,
    ) -> Self {
        Self { transmitter, campaigns, event_publisher, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch `campaign` to `recipients` and record the terminal status.
    ///
    /// A `Draft` or `Scheduled` campaign is moved to `Sending` and saved
    /// first; if that fails nothing is sent. A campaign already `Sending`
    /// is dispatched as is.
    pub async fn dispatch(
        &self,
        campaign: &mut Campaign,
        recipients: &[Contact],
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult, DispatchError> {
        let recipients = dedup(recipients);
        if recipients.is_empty() {
            return Err(DispatchError::NoRecipients);
        }

        if campaign.status() != CampaignStatus::Sending {
            campaign.set_recipient_count(recipients.len() as u64);
            campaign.begin_sending().map_err(|e| DispatchError::Fatal(e.to_string()))?;
            if let Err(e) = self.campaigns.save(campaign).await {
                error!(campaign_id = %campaign.id(), error = %e, "Could not persist campaign before dispatch");
                return Err(DispatchError::Fatal(e.to_string()));
            }
        }

        let context = Arc::new(SendContext {
            campaign_id: campaign.id().clone(),
            subject: campaign.subject().to_string(),
            html: campaign.body().html().to_string(),
            from_name: campaign.details().from_name.clone(),
            reply_to: campaign.details().reply_to.clone().filter(|r| !r.trim().is_empty()),
            sending_domain_id: self.config.sending_domain_id.clone(),
        });

        info!(
            campaign_id = %campaign.id(),
            recipients = recipients.len(),
            concurrency = self.config.concurrency.max(1),
            "Dispatch started"
        );

        let result = self.run(context, recipients, observer, cancel).await;

        if result.cancelled {
            campaign.cancel(result.stats());
        } else {
            campaign.complete(result.stats());
        }
        info!(
            campaign_id = %campaign.id(),
            sent = result.success_count,
            failed = result.fail_count,
            skipped = result.skipped_count,
            status = campaign.status().as_str(),
            "Dispatch finished"
        );

        if let Err(source) = self.campaigns.save(campaign).await {
            error!(campaign_id = %campaign.id(), error = %source, "Could not persist campaign status");
            return Err(DispatchError::StatusUpdate { result: Box::new(result), source });
        }

        let events = campaign.take_events();
        if let Err(e) = self.event_publisher.publish(events).await {
            warn!(campaign_id = %campaign.id(), error = %e, "Failed to publish campaign events");
        }

        Ok(result)
    }

    async fn run(
        &self,
        context: Arc<SendContext>,
        recipients: Vec<Contact>,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> DispatchResult {
        let total = recipients.len();
        let limit = self.config.concurrency.max(1);
        let mut tally = Tally::new(total, self.config.progress_interval);
        let mut slots: Vec<Option<RecipientOutcome>> = vec![None; total];
        let mut in_flight: HashSet<usize> = HashSet::new();
        let mut tasks: JoinSet<(usize, RecipientOutcome)> = JoinSet::new();
        let mut queue = recipients.iter().enumerate();
        let mut exhausted = false;
        let mut cancelled = false;

        loop {
            while !exhausted && !cancelled && tasks.len() < limit {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                match queue.next() {
                    Some((index, contact)) => {
                        in_flight.insert(index);
                        let transmitter = self.transmitter.clone();
                        let context = context.clone();
                        let contact = contact.clone();
                        tasks.spawn(async move { (index, send_one(transmitter, context, contact).await) });
                    }
                    None => exhausted = true,
                }
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, outcome))) => {
                        in_flight.remove(&index);
                        tally.record(outcome.is_sent(), observer);
                        slots[index] = Some(outcome);
                    }
                    Some(Err(e)) => {
                        // The panicked recipient is whichever index never came back.
                        warn!(error = %e, "Dispatch worker failed");
                        tally.record(false, observer);
                    }
                    None => break,
                },
                _ = cancel.cancelled(), if !cancelled && !exhausted => {
                    info!(campaign_id = %context.campaign_id, in_flight = in_flight.len(), "Dispatch cancellation requested");
                    cancelled = true;
                }
            }
        }

        for index in in_flight {
            let contact = &recipients[index];
            slots[index] = Some(RecipientOutcome {
                contact_id: contact.id().clone(),
                email: contact.email().to_string(),
                status: DeliveryStatus::Failed { reason: "dispatch worker panicked".to_string() },
            });
        }

        tally.finish(observer);
        let outcomes: Vec<RecipientOutcome> = slots.into_iter().flatten().collect();
        DispatchResult {
            success_count: tally.success,
            fail_count: tally.failed,
            total_count: tally.processed,
            skipped_count: total - tally.processed,
            cancelled: cancelled && tally.processed < total,
            outcomes,
        }
    }
}

/// Keep the first occurrence of each contact id
fn dedup(recipients: &[Contact]) -> Vec<Contact> {
    let mut seen = HashSet::new();
    recipients
        .iter()
        .filter(|c| seen.insert(c.id().clone()))
        .cloned()
        .collect()
}

async fn send_one(transmitter: Arc<dyn Transmitter>, context: Arc<SendContext>, contact: Contact) -> RecipientOutcome {
    let request = TransmitRequest {
        to: contact.email().to_string(),
        subject: context.subject.clone(),
        html: personalize(&context.html, &contact),
        from_name: context.from_name.clone(),
        reply_to: context.reply_to.clone(),
        sending_domain_id: context.sending_domain_id.clone(),
        campaign_id: context.campaign_id.clone(),
        contact_id: contact.id().clone(),
        personalization: PersonalizationPayload::from(&contact),
    };

    let status = match transmitter.send(request).await {
        Ok(response) => match response.failure_reason() {
            None => DeliveryStatus::Sent,
            Some(reason) => {
                warn!(contact_id = %contact.id(), reason = %reason, "Endpoint rejected message");
                DeliveryStatus::Failed { reason }
            }
        },
        Err(e) => {
            warn!(contact_id = %contact.id(), error = %e, "Transmission call failed");
            DeliveryStatus::Failed { reason: e.to_string() }
        }
    };
    debug!(contact_id = %contact.id(), sent = matches!(status, DeliveryStatus::Sent), "Recipient processed");

    RecipientOutcome {
        contact_id: contact.id().clone(),
        email: contact.email().to_string(),
        status,
    }
}

struct Tally {
    total: usize,
    interval: usize,
    processed: usize,
    success: usize,
    failed: usize,
    last_reported: Option<usize>,
}

impl Tally {
    fn new(total: usize, interval: usize) -> Self {
        Self { total, interval: interval.max(1), processed: 0, success: 0, failed: 0, last_reported: None }
    }

    fn record(&mut self, sent: bool, observer: &dyn ProgressObserver) {
        self.processed += 1;
        if sent {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        if self.processed % self.interval == 0 || self.processed == self.total {
            self.report(observer);
        }
    }

    /// Final report for runs that stopped short of `total`
    fn finish(&mut self, observer: &dyn ProgressObserver) {
        if self.last_reported != Some(self.processed) {
            self.report(observer);
        }
    }

    fn report(&mut self, observer: &dyn ProgressObserver) {
        self.last_reported = Some(self.processed);
        observer.on_progress(DispatchProgress {
            processed: self.processed,
            success_count: self.success,
            fail_count: self.failed,
            total: self.total,
        });
    }
}
