//! Resolve command

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use super::{Delivery, Workspace};
use crate::{output::OutputFormat, ResolveArgs};
use sase_campaigns::{CampaignUseCases, CampaignsConfig, Contact, EntityId, Targeting};

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct RecipientRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub status: String,
}

impl From<&Contact> for RecipientRow {
    fn from(c: &Contact) -> Self {
        Self {
            id: c.id().to_string(),
            email: c.email().to_string(),
            name: c.display_name(),
            status: c.status().as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    mode: &'static str,
    recipients: Vec<RecipientRow>,
    requested: usize,
    excluded_ineligible: usize,
    empty_selection: bool,
}

pub fn targeting(groups: Option<Vec<String>>, contacts: Option<Vec<String>>) -> Targeting {
    match (groups, contacts) {
        (Some(groups), _) => Targeting::Groups(groups.into_iter().map(EntityId::from_string).collect()),
        (None, Some(contacts)) => Targeting::Contacts(contacts.into_iter().map(EntityId::from_string).collect()),
        (None, None) => Targeting::All,
    }
}

pub async fn handle(args: ResolveArgs, config: &CampaignsConfig, format: OutputFormat) -> anyhow::Result<()> {
    let workspace = Workspace::open(&args.data.data, config, Delivery::DryRun)?;
    let targeting = targeting(args.groups, args.contacts);
    let owner = EntityId::from_string(args.owner);

    let resolution = workspace.service.preview_recipients(&owner, &targeting).await?;
    let mut rows: Vec<RecipientRow> = resolution.recipients.iter().map(RecipientRow::from).collect();
    rows.sort_by(|a, b| a.id.cmp(&b.id));

    let report = ResolveReport {
        mode: targeting.mode().as_str(),
        recipients: rows,
        requested: resolution.requested,
        excluded_ineligible: resolution.excluded_ineligible,
        empty_selection: resolution.empty_selection,
    };

    if format.is_table() {
        format.print(&report, report.recipients.iter().cloned())?;
        if report.empty_selection {
            println!("{}", "Selection is empty".yellow());
        } else {
            println!(
                "{} recipients ({} excluded as ineligible)",
                report.recipients.len().to_string().green(),
                report.excluded_ineligible
            );
        }
        Ok(())
    } else {
        format.print(&report, std::iter::empty::<RecipientRow>())
    }
}
