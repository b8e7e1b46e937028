//! In-progress authoring state edited by the campaign wizard

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::aggregates::{Campaign, CampaignDetails};
use crate::domain::value_objects::{BodySource, ScheduleDraft, TargetingDraft};

/// Wizard steps, strictly linear
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WizardStep {
    #[default]
    Details = 1,
    Template = 2,
    Recipients = 3,
    Schedule = 4,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Details => Some(Self::Template),
            Self::Template => Some(Self::Recipients),
            Self::Recipients => Some(Self::Schedule),
            Self::Schedule => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Details => None,
            Self::Template => Some(Self::Details),
            Self::Recipients => Some(Self::Template),
            Self::Schedule => Some(Self::Recipients),
        }
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Details),
            2 => Ok(Self::Template),
            3 => Ok(Self::Recipients),
            4 => Ok(Self::Schedule),
            other => Err(format!("invalid wizard step {}", other)),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Details => "details",
            Self::Template => "template",
            Self::Recipients => "recipients",
            Self::Schedule => "schedule",
        };
        write!(f, "{} ({})", label, self.number())
    }
}

/// Everything the user has entered so far, serializable as a whole
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoringState {
    pub details: CampaignDetails,
    pub body: BodySource,
    pub targeting: TargetingDraft,
    pub schedule: ScheduleDraft,
}

impl AuthoringState {
    /// Rebuild authoring state from a persisted campaign
    pub fn from_campaign(campaign: &Campaign) -> Self {
        Self {
            details: campaign.details().clone(),
            body: campaign.body().clone(),
            targeting: TargetingDraft::from(campaign.targeting()),
            schedule: ScheduleDraft {
                mode: campaign.schedule_mode(),
                date: campaign.scheduled_at().map(|at| at.date_naive()),
                time: campaign.scheduled_at().map(|at| at.time()),
            },
        }
    }
}
