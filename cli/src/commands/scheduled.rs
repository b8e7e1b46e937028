//! Run-scheduled command

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;

use super::{cancel_on_ctrl_c, Delivery, Workspace};
use crate::{output::OutputFormat, RunScheduledArgs};
use sase_campaigns::{CampaignUseCases, CampaignsConfig, DueDispatch, DueOutcome};

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct DueRow {
    pub campaign: String,
    pub name: String,
    pub sent: usize,
    pub failed: usize,
    pub result: String,
}

impl From<&DueDispatch> for DueRow {
    fn from(d: &DueDispatch) -> Self {
        let (sent, failed, result) = match &d.outcome {
            DueOutcome::Dispatched { result } => (result.success_count, result.fail_count, result.summary().to_string()),
            DueOutcome::Failed { reason } => (0, 0, reason.clone()),
        };
        Self { campaign: d.campaign_id.to_string(), name: d.name.clone(), sent, failed, result }
    }
}

pub async fn handle(args: RunScheduledArgs, config: &CampaignsConfig, format: OutputFormat) -> anyhow::Result<()> {
    let delivery = if args.dry_run { Delivery::DryRun } else { Delivery::Endpoint };
    let workspace = Workspace::open(&args.data.data, config, delivery)?;
    let cancel = cancel_on_ctrl_c();

    let report = workspace.service.dispatch_due(Utc::now(), &cancel).await;
    workspace.persist()?;
    let report = report?;

    if report.is_empty() && format.is_table() {
        println!("No scheduled campaigns are due");
        return Ok(());
    }
    format.print(&report, report.iter().map(DueRow::from))
}
