//! Send command

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use super::{cancel_on_ctrl_c, Delivery, Workspace};
use crate::{output::OutputFormat, SendArgs};
use sase_campaigns::application::{DeliveryStatus, RecipientOutcome, TracingProgressObserver};
use sase_campaigns::{CampaignUseCases, CampaignsConfig, DispatchResult, DispatchSummary, EntityId};

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct OutcomeRow {
    pub contact: String,
    pub email: String,
    pub status: String,
    pub reason: String,
}

impl From<&RecipientOutcome> for OutcomeRow {
    fn from(o: &RecipientOutcome) -> Self {
        let (status, reason) = match &o.status {
            DeliveryStatus::Sent => ("sent", String::new()),
            DeliveryStatus::Failed { reason } => ("failed", reason.clone()),
        };
        Self {
            contact: o.contact_id.to_string(),
            email: o.email.clone(),
            status: status.to_string(),
            reason,
        }
    }
}

pub fn summary_line(result: &DispatchResult) -> String {
    let summary = result.summary();
    let line = summary.to_string();
    match summary {
        DispatchSummary::FullSuccess { .. } => line.green().to_string(),
        DispatchSummary::PartialSuccess { .. } => line.yellow().to_string(),
        DispatchSummary::Cancelled { .. } => line.red().to_string(),
    }
}

pub async fn handle(args: SendArgs, config: &CampaignsConfig, format: OutputFormat) -> anyhow::Result<()> {
    let delivery = if args.dry_run { Delivery::DryRun } else { Delivery::Endpoint };
    let workspace = Workspace::open(&args.data.data, config, delivery)?;
    let owner = EntityId::from_string(args.owner);
    let campaign_id = EntityId::from_string(args.campaign);
    let observer = TracingProgressObserver::new(campaign_id.clone());
    let cancel = cancel_on_ctrl_c();

    let sent = workspace.service.send_now(&owner, &campaign_id, &observer, &cancel).await;
    workspace.persist()?;
    let result = sent?;

    let rows: Vec<OutcomeRow> = result.failures().map(OutcomeRow::from).collect();
    if format.is_table() {
        if !rows.is_empty() {
            format.print(&result, rows)?;
        }
        println!("{}", summary_line(&result));
        Ok(())
    } else {
        format.print(&result, rows)
    }
}
