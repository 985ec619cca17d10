use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::gate::{ChannelRule, GatePolicy};
use crate::publish::PublishOptions;

/// Default configuration file name
pub const CONFIG_FILE: &str = ".docpub.toml";

/// Get the config file path for a directory
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Complete docpub configuration.
///
/// Every key is optional; an absent file means all defaults (stable-only
/// publishing of `target/doc` from `master` to `gh-pages`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gate policy configuration
    #[serde(default)]
    gate: GateSection,
    /// Publish sequence configuration
    #[serde(default)]
    publish: PublishSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GateSection {
    /// `"stable"` or a channel name matched as a substring of the version
    /// string (e.g. `"nightly"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_pull_requests: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PublishSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hosting_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mirror_repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mirror_dir: Option<PathBuf>,
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from an explicit file path.
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file as TOML: {}", path.display()))
    }

    /// Load `.docpub.toml` from a directory; an absent file yields defaults.
    pub fn load_dir(dir: &Path) -> Result<Config> {
        let path = config_path(dir);
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load(&path)
    }

    /// The gate policy with defaults filled in.
    pub fn gate_policy(&self) -> GatePolicy {
        let mut policy = GatePolicy::default();
        match self.gate.channel.as_deref() {
            None | Some("stable") => {}
            Some(name) => policy.channel = ChannelRule::Channel(name.to_string()),
        }
        if let Some(branch) = &self.gate.branch {
            policy.branch = branch.clone();
        }
        if let Some(allow) = self.gate.allow_pull_requests {
            policy.allow_pull_requests = allow;
        }
        policy
    }

    /// The publish options with defaults filled in.
    pub fn publish_options(&self) -> PublishOptions {
        let mut opts = PublishOptions::default();
        if let Some(dir) = &self.publish.artifact_dir {
            opts.artifact_dir = dir.clone();
        }
        if let Some(branch) = &self.publish.hosting_branch {
            opts.hosting_branch = branch.clone();
        }
        if let Some(repo) = &self.publish.mirror_repo {
            opts.mirror_repo = repo.clone();
        }
        if let Some(dir) = &self.publish.mirror_dir {
            opts.mirror_dir = dir.clone();
        }
        opts
    }
}
