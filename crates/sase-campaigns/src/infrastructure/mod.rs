//! Infrastructure layer
//!
//! Adapters for the outbound ports.

pub mod ephemeral;
pub mod persistence;
pub mod transmission;

pub use ephemeral::{FileEphemeralStore, InMemoryEphemeralStore};
pub use persistence::{
    Datastore, InMemoryCampaignRepository, InMemoryContactRepository, InMemoryEventPublisher,
    InMemoryGroupRepository, NoOpEventPublisher, Repositories,
};
pub use transmission::{DryRunTransmitter, HttpTransmitter, TransmissionConfig};
