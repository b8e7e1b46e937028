//! Domain module
//!
//! Campaign, contact and group model plus the pure services that act on it.

pub mod aggregates;
pub mod value_objects;
pub mod events;
pub mod services;

pub use aggregates::*;
pub use value_objects::*;
pub use events::*;
