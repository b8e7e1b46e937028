//! Campaigns configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::{DispatchConfig, DraftPlaceholders};
use crate::domain::aggregates::{ContactStatus, EligibilityPolicy};
use crate::infrastructure::TransmissionConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignsConfig {
    pub dispatch: DispatchConfig,
    pub transmission: TransmissionConfig,
    pub eligibility: EligibilityConfig,
    pub drafts: DraftPlaceholders,
    /// Directory for the file-backed ephemeral store; in-memory when unset
    pub ephemeral_dir: Option<PathBuf>,
}

/// Statuses that may receive campaign email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    pub statuses: Vec<ContactStatus>,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self { statuses: vec![ContactStatus::Active, ContactStatus::Subscribed] }
    }
}

impl EligibilityConfig {
    pub fn policy(&self) -> EligibilityPolicy {
        EligibilityPolicy::new(self.statuses.iter().copied())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl CampaignsConfig {
    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse { path: path.to_path_buf(), message: e.to_string() })
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse { path: path.to_path_buf(), message: e.to_string() })?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
    }
}
