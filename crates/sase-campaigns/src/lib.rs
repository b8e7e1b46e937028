//! OpenSASE Marketing Campaigns
//!
//! Campaign authoring and delivery core for OpenSASE Marketing.
//!
//! ## Architecture
//!
//! - **Domain Layer**: campaign, contact and group aggregates, targeting and
//!   schedule value objects, personalization and step validation
//! - **Application Layer**: recipient resolution, the four-step campaign
//!   wizard with its template editor handoff, bulk dispatch
//! - **Ports Layer**: datastore, transmission endpoint and ephemeral store
//!   interfaces
//! - **Infrastructure Layer**: in-memory and file-backed adapters, HTTP
//!   transmitter
//!
//! ## Delivery
//!
//! A campaign reaches recipients through [`DispatchEngine`], which makes at
//! most `concurrency` endpoint calls at a time and counts every recipient
//! exactly once as sent or failed.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// Re-exports for convenience
pub use application::{
    AuthoringState, CampaignService, CampaignWizard, DispatchConfig, DispatchEngine, DispatchError, DispatchProgress,
    DispatchResult, DispatchSummary, EditedTemplate, EditorHandoff, FinalizeOutcome, ProgressObserver,
    RecipientResolver, Resolution, RestoreError, StepTransition, WizardContext, WizardError, WizardStep,
};
pub use config::{CampaignsConfig, ConfigError};
pub use domain::aggregates::{Campaign, CampaignDetails, CampaignStatus, Contact, ContactStatus, EligibilityPolicy, Group};
pub use domain::events::{CampaignEvent, DomainEvent};
pub use domain::services::{personalize, ValidationErrors};
pub use domain::value_objects::{BodySource, Email, EntityId, InputMode, ScheduleDraft, ScheduleMode, Targeting};
pub use ports::inbound::{CampaignUseCases, DueDispatch, DueOutcome, MessagePreview, UseCaseError};
pub use ports::outbound::{
    CampaignRepository, ContactRepository, EphemeralStore, GroupRepository, RepositoryError, TransmitError, Transmitter,
};
