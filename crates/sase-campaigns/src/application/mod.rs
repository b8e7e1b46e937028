//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod authoring;
pub mod commands;
pub mod dispatch;
pub mod handoff;
pub mod resolver;
pub mod wizard;

pub use authoring::{AuthoringState, WizardStep};
pub use commands::CampaignService;
pub use dispatch::{
    DeliveryStatus, DispatchConfig, DispatchEngine, DispatchError, DispatchProgress, DispatchResult, DispatchSummary,
    NoopProgress, ProgressObserver, RecipientOutcome, TracingProgressObserver,
};
pub use handoff::{AuthoringSnapshot, EditedTemplate, EditorHandoff, RestoreError, EDITED_BODY_KEY, SNAPSHOT_KEY};
pub use resolver::{RecipientResolver, Resolution};
pub use wizard::{CampaignWizard, DraftPlaceholders, FinalizeOutcome, StepTransition, WizardContext, WizardError};
