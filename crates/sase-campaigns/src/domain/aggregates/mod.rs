//! Aggregates
pub mod campaign;
pub mod contact;
pub mod group;
pub use campaign::{Campaign, CampaignDetails, CampaignError, CampaignStats, CampaignStatus};
pub use contact::{Contact, ContactStatus, EligibilityPolicy};
pub use group::{Group, GroupMembership};
