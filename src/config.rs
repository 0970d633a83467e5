//! Application configuration loaded from `~/.mrc-poche/config.yaml`.
//!
//! All fields have defaults so a missing or partial file still yields a
//! working configuration. A corrupt file is logged and replaced by the
//! defaults rather than aborting: configuration is ambient state, and the
//! app degrades instead of failing.

use crate::app_paths;
use crate::usage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Base URL of the managed backend hosting the serverless functions.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Endpoint probed to decide online/offline state.
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    /// Seconds between connectivity probes in watch mode.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Per-feature monthly quota overrides, merged over the compiled-in
    /// defaults.
    #[serde(default)]
    pub quotas: BTreeMap<String, u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            probe_url: default_probe_url(),
            probe_interval_secs: default_probe_interval_secs(),
            quotas: BTreeMap::new(),
        }
    }
}

fn default_backend_url() -> String {
    "https://api.mrcenpoche.app".to_string()
}

fn default_probe_url() -> String {
    "https://www.gstatic.com/generate_204".to_string()
}

fn default_probe_interval_secs() -> u64 {
    15
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from its default location, falling back to defaults
    /// when the file is absent or unusable.
    pub fn load_or_default() -> Self {
        let path = match app_paths::config_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "cannot resolve config path, using defaults");
                return Self::default();
            }
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "unusable config file, using defaults");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.backend_url.is_empty() {
            anyhow::bail!("backend_url must not be empty");
        }
        if self.probe_url.is_empty() {
            anyhow::bail!("probe_url must not be empty");
        }
        if self.probe_interval_secs == 0 {
            anyhow::bail!("probe_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Compiled-in quotas with this config's overrides applied.
    pub fn effective_quotas(&self) -> BTreeMap<String, u32> {
        let mut quotas = usage::default_quotas();
        for (feature, limit) in &self.quotas {
            quotas.insert(feature.clone(), *limit);
        }
        quotas
    }
}
