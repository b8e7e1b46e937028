//! CLI Commands

pub mod preview;
pub mod resolve;
pub mod scheduled;
pub mod send;

use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use sase_campaigns::infrastructure::{Datastore, DryRunTransmitter, HttpTransmitter, Repositories};
use sase_campaigns::ports::outbound::EventPublisher;
use sase_campaigns::{
    CampaignService, CampaignsConfig, DispatchEngine, DomainEvent, RecipientResolver, RepositoryError, Transmitter,
};

/// How messages leave the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Send through the configured HTTP endpoint
    Endpoint,
    /// Accept every message locally
    DryRun,
}

/// Logs each published campaign event
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        for event in events {
            tracing::info!(event = event.event_type(), campaign_id = %event.aggregate_id(), "Campaign event");
        }
        Ok(())
    }
}

/// A loaded datastore file wired to the campaign service
pub struct Workspace {
    data_path: PathBuf,
    repos: Repositories,
    pub service: CampaignService,
}

impl Workspace {
    pub fn open(data_path: &Path, config: &CampaignsConfig, delivery: Delivery) -> anyhow::Result<Self> {
        let repos = Datastore::load(data_path)
            .with_context(|| format!("loading datastore {}", data_path.display()))?
            .into_repositories();

        let transmitter: Arc<dyn Transmitter> = match delivery {
            Delivery::DryRun => Arc::new(DryRunTransmitter::new()),
            Delivery::Endpoint => match HttpTransmitter::from_config(&config.transmission)? {
                Some(http) => Arc::new(http),
                None => bail!("no transmission endpoint configured; pass --transmit-url or --dry-run"),
            },
        };

        let resolver = Arc::new(RecipientResolver::new(
            repos.contacts.clone(),
            repos.groups.clone(),
            config.eligibility.policy(),
        ));
        let dispatcher = Arc::new(DispatchEngine::new(
            transmitter,
            repos.campaigns.clone(),
            Arc::new(LogEventPublisher),
            config.dispatch.clone(),
        ));
        let service = CampaignService::new(repos.campaigns.clone(), repos.contacts.clone(), resolver, dispatcher);

        Ok(Self { data_path: data_path.to_path_buf(), repos, service })
    }

    /// Write campaign state back to the datastore file
    pub fn persist(&self) -> anyhow::Result<()> {
        self.repos
            .snapshot()
            .save(&self.data_path)
            .with_context(|| format!("writing datastore {}", self.data_path.display()))
    }
}

/// Token cancelled on the first Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight sends");
            trigger.cancel();
        }
    });
    token
}
