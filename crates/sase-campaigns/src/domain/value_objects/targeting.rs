//! Campaign targeting
//!
//! `Targeting` is what the resolver consumes. `TargetingDraft` is what the
//! wizard edits: both selection sets may be populated at once while the
//! user previews, but only the active mode's set ever reaches resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::EntityId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingMode {
    #[default]
    All,
    Groups,
    Contacts,
}

impl TargetingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Groups => "groups",
            Self::Contacts => "contacts",
        }
    }
}

/// Resolved targeting selection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "ids", rename_all = "snake_case")]
pub enum Targeting {
    #[default]
    All,
    Groups(HashSet<EntityId>),
    Contacts(HashSet<EntityId>),
}

impl Targeting {
    pub fn mode(&self) -> TargetingMode {
        match self {
            Self::All => TargetingMode::All,
            Self::Groups(_) => TargetingMode::Groups,
            Self::Contacts(_) => TargetingMode::Contacts,
        }
    }

    /// True when an explicit selection mode has nothing selected.
    pub fn is_empty_selection(&self) -> bool {
        match self {
            Self::All => false,
            Self::Groups(ids) | Self::Contacts(ids) => ids.is_empty(),
        }
    }

    pub fn groups<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        Self::Groups(ids.into_iter().map(Into::into).collect())
    }

    pub fn contacts<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        Self::Contacts(ids.into_iter().map(Into::into).collect())
    }
}

/// Wizard-side targeting state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingDraft {
    pub mode: TargetingMode,
    #[serde(default)]
    pub selected_groups: HashSet<EntityId>,
    #[serde(default)]
    pub selected_contacts: HashSet<EntityId>,
}

impl TargetingDraft {
    /// Collapse to the active branch; the inactive set is dropped.
    pub fn targeting(&self) -> Targeting {
        match self.mode {
            TargetingMode::All => Targeting::All,
            TargetingMode::Groups => Targeting::Groups(self.selected_groups.clone()),
            TargetingMode::Contacts => Targeting::Contacts(self.selected_contacts.clone()),
        }
    }

    pub fn toggle_group(&mut self, id: EntityId) {
        if !self.selected_groups.remove(&id) {
            self.selected_groups.insert(id);
        }
    }

    pub fn toggle_contact(&mut self, id: EntityId) {
        if !self.selected_contacts.remove(&id) {
            self.selected_contacts.insert(id);
        }
    }
}

impl From<&Targeting> for TargetingDraft {
    fn from(targeting: &Targeting) -> Self {
        let mut draft = Self { mode: targeting.mode(), ..Self::default() };
        match targeting {
            Targeting::All => {}
            Targeting::Groups(ids) => draft.selected_groups = ids.clone(),
            Targeting::Contacts(ids) => draft.selected_contacts = ids.clone(),
        }
        draft
    }
}
