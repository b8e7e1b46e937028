//! Preview command

use tabled::Tabled;

use super::{Delivery, Workspace};
use crate::{output::OutputFormat, PreviewArgs};
use sase_campaigns::{CampaignUseCases, CampaignsConfig, EntityId};

#[derive(Debug, Tabled)]
struct PreviewRow {
    field: &'static str,
    value: String,
}

pub async fn handle(args: PreviewArgs, config: &CampaignsConfig, format: OutputFormat) -> anyhow::Result<()> {
    let workspace = Workspace::open(&args.data.data, config, Delivery::DryRun)?;
    let preview = workspace
        .service
        .preview_message(
            &EntityId::from_string(args.owner),
            &EntityId::from_string(args.campaign),
            &EntityId::from_string(args.contact),
        )
        .await?;

    let rows = vec![
        PreviewRow { field: "to", value: preview.to.clone() },
        PreviewRow { field: "subject", value: preview.subject.clone() },
        PreviewRow { field: "html", value: preview.html.clone() },
    ];
    format.print(&preview, rows)
}
