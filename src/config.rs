//! Configuration Management
//!
//! Handles persistent configuration storage for cloudq.

use crate::provider::Dialect;
use crate::query::executor::DEFAULT_WORKERS;
use crate::query::wait::{WaitPolicy, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Region used when nothing else names one
pub const DEFAULT_REGION: &str = "us-east-1";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Last used region
    #[serde(default)]
    pub region: Option<String>,
    /// Account number reported as keypair owner
    #[serde(default)]
    pub account: Option<String>,
    /// Base URL replacing every service endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Data center for volume creates that do not name one
    #[serde(default)]
    pub default_data_center: Option<String>,
    /// Fan-out pool size
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub wait_timeout_secs: Option<u64>,
    #[serde(default)]
    pub dialect: Dialect,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cloudq").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("writing {:?}", path))?;

        Ok(())
    }

    /// Get effective region (config > environment > default); the CLI flag
    /// is applied by the caller on top
    pub fn effective_region(&self) -> String {
        self.region
            .clone()
            .or_else(|| env_value("AWS_REGION"))
            .or_else(|| env_value("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Get effective account (config > environment)
    pub fn effective_account(&self) -> String {
        self.account
            .clone()
            .or_else(|| env_value("CLOUDQ_ACCOUNT"))
            .unwrap_or_default()
    }

    /// Validated endpoint override
    pub fn endpoint_url(&self) -> Result<Option<Url>> {
        self.endpoint
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid endpoint '{}'", raw)))
            .transpose()
    }

    pub fn workers(&self) -> usize {
        self.worker_threads.unwrap_or(DEFAULT_WORKERS)
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            self.poll_interval_secs.map(Duration::from_secs).unwrap_or(DEFAULT_POLL_INTERVAL),
            self.wait_timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_WAIT_TIMEOUT),
        )
    }

    /// Set region and save
    pub fn set_region(&mut self, region: &str) -> Result<()> {
        self.region = Some(region.to_string());
        self.save()
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
