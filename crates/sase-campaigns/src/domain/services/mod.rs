//! Domain services
//!
//! Stateless logic that doesn't belong to a single aggregate.

pub mod personalization;
pub mod validation;

pub use personalization::{has_merge_tags, personalize, PersonalizationPayload};
pub use validation::{validate_body, validate_details, validate_recipients, validate_schedule, ValidationErrors};
