//! CLI Configuration
//!
//! Profile values come from `~/.opensase/campaigns[.<profile>].toml`.
//! Command line flags and environment variables win over the profile, and
//! the profile wins over the campaigns config file.

use anyhow::Context;
use sase_campaigns::CampaignsConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    pub config_path: Option<PathBuf>,
    pub transmit_url: Option<String>,
    pub transmit_key: Option<String>,
    pub default_format: Option<OutputFormat>,
}

impl Profile {
    pub fn load(profile: Option<&str>) -> Result<Self, String> {
        match Self::profile_path(profile) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
            toml::from_str(&content).map_err(|e| e.to_string())
        } else {
            Ok(Self::default())
        }
    }

    fn profile_path(profile: Option<&str>) -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        let filename = match profile {
            Some(p) => format!("campaigns.{}.toml", p),
            None => "campaigns.toml".to_string(),
        };
        Some(home.join(".opensase").join(filename))
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub transmit_url: Option<String>,
    pub transmit_key: Option<String>,
    pub concurrency: Option<usize>,
}

impl Overrides {
    pub fn resolve(self) -> anyhow::Result<CampaignsConfig> {
        let mut config = match &self.config_path {
            Some(path) => CampaignsConfig::load(path)
                .with_context(|| format!("loading campaigns config {}", path.display()))?,
            None => CampaignsConfig::default(),
        };
        if let Some(url) = self.transmit_url {
            config.transmission.endpoint_url = Some(url);
        }
        if let Some(key) = self.transmit_key {
            config.transmission.api_key = Some(key);
        }
        if let Some(concurrency) = self.concurrency {
            config.dispatch.concurrency = concurrency;
        }
        Ok(config)
    }
}
