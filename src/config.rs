use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to write settings {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Tunables shared by the commands and the agentic workflows. Everything has
/// a serde default so a partial (or absent) settings file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_time")]
    pub time: f64,
    #[serde(default = "default_budget")]
    pub budget: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_push_retries")]
    pub push_retries: u32,
    #[serde(default = "default_push_backoff_ms")]
    pub push_backoff_ms: u64,
    #[serde(default = "default_agent_timeout_seconds")]
    pub agent_timeout_seconds: u64,
    #[serde(default = "default_cloud_timeout_seconds")]
    pub cloud_timeout_seconds: u64,
}

fn default_strength() -> f64 {
    0.5
}
fn default_temperature() -> f64 {
    0.0
}
fn default_time() -> f64 {
    0.5
}
fn default_budget() -> f64 {
    5.0
}
fn default_max_retries() -> u32 {
    0
}
fn default_push_retries() -> u32 {
    3
}
fn default_push_backoff_ms() -> u64 {
    2000
}
fn default_agent_timeout_seconds() -> u64 {
    900
}
fn default_cloud_timeout_seconds() -> u64 {
    400
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strength: default_strength(),
            temperature: default_temperature(),
            time: default_time(),
            budget: default_budget(),
            max_retries: default_max_retries(),
            push_retries: default_push_retries(),
            push_backoff_ms: default_push_backoff_ms(),
            agent_timeout_seconds: default_agent_timeout_seconds(),
            cloud_timeout_seconds: default_cloud_timeout_seconds(),
        }
    }
}

pub fn state_root(cwd: &Path) -> PathBuf {
    cwd.join(".pdd")
}

/// Creates the state directory and makes it self-ignoring so reconcile
/// commits never sweep up logs, prompts, or checkpoints.
pub fn ensure_state_root(cwd: &Path) -> std::io::Result<PathBuf> {
    let root = state_root(cwd);
    fs::create_dir_all(&root)?;
    let ignore = root.join(".gitignore");
    if !ignore.exists() {
        fs::write(&ignore, "*\n")?;
    }
    Ok(root)
}

pub fn settings_path(state_root: &Path) -> PathBuf {
    state_root.join("settings.yaml")
}

/// A missing settings file yields defaults; a malformed one is an error.
pub fn load_settings(state_root: &Path) -> Result<Settings, ConfigError> {
    let path = settings_path(state_root);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn save_settings(state_root: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let path = settings_path(state_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
    }
    let raw = serde_yaml::to_string(settings).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(&path, raw).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}
