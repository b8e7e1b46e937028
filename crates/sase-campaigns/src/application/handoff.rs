//! Template editor handoff
//!
//! Choosing a pre-built template leaves the wizard for a separate editing
//! surface. Nothing in memory survives that exit, so the full authoring
//! state is written to the ephemeral store first and read back on return.
//!
//! Two keys are used, each written once per round trip:
//! - [`SNAPSHOT_KEY`]: the versioned [`AuthoringSnapshot`]
//! - [`EDITED_BODY_KEY`]: the [`EditedTemplate`] produced by the editor
//!
//! A successful [`EditorHandoff::take`] removes both keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::authoring::{AuthoringState, WizardStep};
use crate::domain::value_objects::EntityId;
use crate::ports::outbound::{EphemeralStore, StoreError};

pub const SNAPSHOT_KEY: &str = "campaign_wizard_state";
pub const EDITED_BODY_KEY: &str = "edited_template_body";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoringSnapshot {
    pub version: u32,
    pub state: AuthoringState,
    pub step: WizardStep,
    #[serde(default)]
    pub campaign_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
}

impl AuthoringSnapshot {
    pub fn new(state: AuthoringState, step: WizardStep, campaign_id: Option<EntityId>) -> Self {
        Self { version: SNAPSHOT_VERSION, state, step, campaign_id, created_at: Utc::now() }
    }
}

/// Body returned by the template editor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditedTemplate {
    pub html: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
}

impl EditedTemplate {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into(), template_id: None, edited_at: Some(Utc::now()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("saved campaign state is missing; please start the template step again")]
    MissingSnapshot,
    #[error("edited template was not found; please reopen the template editor")]
    MissingEditedBody,
    #[error("saved campaign state is unreadable: {0}")]
    Corrupt(String),
    #[error("saved campaign state has version {found}, expected {expected}")]
    IncompatibleVersion { found: u32, expected: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct EditorHandoff {
    store: Arc<dyn EphemeralStore>,
}

impl EditorHandoff {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self { store }
    }

    /// Write the snapshot before leaving for the editor. Any edited body
    /// left over from an earlier round trip is discarded.
    pub fn suspend(&self, snapshot: &AuthoringSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot).map_err(|e| StoreError::Io(e.to_string()))?;
        self.store.remove(EDITED_BODY_KEY)?;
        self.store.set(SNAPSHOT_KEY, &json)?;
        debug!(step = snapshot.step.number(), "Authoring snapshot written");
        Ok(())
    }

    /// Editor side: hand the edited body back
    pub fn submit_edit(&self, edited: &EditedTemplate) -> Result<(), StoreError> {
        let json = serde_json::to_string(edited).map_err(|e| StoreError::Io(e.to_string()))?;
        self.store.set(EDITED_BODY_KEY, &json)
    }

    /// Is a round trip in progress
    pub fn pending(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(SNAPSHOT_KEY)?.is_some() || self.store.get(EDITED_BODY_KEY)?.is_some())
    }

    /// Read both payloads and clear them.
    ///
    /// `Ok(None)` when no round trip is in progress. If only one payload is
    /// present, or either fails to parse, the entries are left in place
    /// and an error is returned.
    pub fn take(&self) -> Result<Option<(AuthoringSnapshot, EditedTemplate)>, RestoreError> {
        let snapshot = self.store.get(SNAPSHOT_KEY)?;
        let edited = self.store.get(EDITED_BODY_KEY)?;

        let (snapshot, edited) = match (snapshot, edited) {
            (None, None) => return Ok(None),
            (None, Some(_)) => return Err(RestoreError::MissingSnapshot),
            (Some(_), None) => return Err(RestoreError::MissingEditedBody),
            (Some(s), Some(e)) => (s, e),
        };

        let snapshot = parse_snapshot(&snapshot)?;
        let edited: EditedTemplate =
            serde_json::from_str(&edited).map_err(|e| RestoreError::Corrupt(e.to_string()))?;

        self.clear()?;
        Ok(Some((snapshot, edited)))
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(SNAPSHOT_KEY)?;
        self.store.remove(EDITED_BODY_KEY)
    }
}

fn parse_snapshot(raw: &str) -> Result<AuthoringSnapshot, RestoreError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| RestoreError::Corrupt(e.to_string()))?;
    let found = value.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    if found != SNAPSHOT_VERSION {
        warn!(found, expected = SNAPSHOT_VERSION, "Discarding incompatible authoring snapshot");
        return Err(RestoreError::IncompatibleVersion { found, expected: SNAPSHOT_VERSION });
    }
    serde_json::from_value(value).map_err(|e| RestoreError::Corrupt(e.to_string()))
}
