//! Provisioner configuration, optionally loaded from `provisioner.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Provisioner configuration (TOML).
///
/// Every field has a default matching the workshop lab, so the file only
/// needs to exist when overriding something. Missing fields fall back to
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProvisionerConfig {
    /// Lab repository name; also the directory `git clone` creates in the
    /// remote home directory.
    pub repo_name: String,

    /// Clone URL for the lab repository.
    pub repo_url: String,

    /// Install script filename, resolved under `<repo_name>/scripts/`.
    pub install_script: String,

    /// Image pull script filename, resolved under `<repo_name>/scripts/`.
    pub pull_script: String,

    /// Docker images every provisioned host must end up with.
    pub expected_images: Vec<String>,

    /// Wall-clock limit for each blocking remote command, in seconds.
    pub command_timeout_secs: u64,

    /// TCP connect limit per host, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            repo_name: "presto-iceberg-lab".to_string(),
            repo_url: "https://github.com/IBM/presto-iceberg-lab.git".to_string(),
            install_script: "docker-install.sh".to_string(),
            pull_script: "docker-images.sh".to_string(),
            expected_images: vec![
                "conf-hive-metastore".to_string(),
                "prestodb/presto".to_string(),
                "minio/minio".to_string(),
                "mysql".to_string(),
            ],
            command_timeout_secs: 15 * 60,
            connect_timeout_secs: 30,
        }
    }
}

impl ProvisionerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.repo_name.trim().is_empty() {
            return Err(anyhow!("repo_name must be non-empty"));
        }
        if self.repo_url.trim().is_empty() {
            return Err(anyhow!("repo_url must be non-empty"));
        }
        if self.install_script.trim().is_empty() || self.pull_script.trim().is_empty() {
            return Err(anyhow!("install_script and pull_script must be non-empty"));
        }
        if self.expected_images.is_empty()
            || self.expected_images.iter().any(|img| img.trim().is_empty())
        {
            return Err(anyhow!("expected_images must be a non-empty list of names"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("connect_timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ProvisionerConfig::default()`.
pub fn load_config(path: &Path) -> Result<ProvisionerConfig> {
    if !path.exists() {
        let cfg = ProvisionerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ProvisionerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
