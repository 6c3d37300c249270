//! Configuration management for contentmill.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;
use crate::pipeline::SchedulerConfig;

/// Web server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, `host:port` or just a port.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:3030".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Webhook that receives tabular rows and answers with a sheet URL.
    /// Publishing to a shared sheet fails if unset.
    #[serde(default)]
    pub sheets_webhook: Option<String>,
}

/// Top-level settings, loaded from a TOML file with env overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub pipeline: SchedulerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Settings {
    /// Apply environment overrides. Checked after file loading so the env
    /// always wins.
    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("CONTENTMILL_LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("CONTENTMILL_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(webhook) = std::env::var("CONTENTMILL_SHEETS_WEBHOOK") {
            self.export.sheets_webhook = Some(webhook);
        }
    }
}

/// Candidate config locations, in priority order.
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("contentmill.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("contentmill").join("config.toml"));
    }
    paths
}

/// Load settings from an explicit path, or the first default location that
/// exists, or built-in defaults. An explicit path that cannot be read is an
/// error; missing default locations are not.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
            toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?
        }
        None => {
            let mut found = Settings::default();
            for candidate in default_config_paths() {
                if let Ok(raw) = std::fs::read_to_string(&candidate) {
                    found = toml::from_str(&raw).map_err(|e| {
                        anyhow::anyhow!("invalid config {}: {}", candidate.display(), e)
                    })?;
                    break;
                }
            }
            found
        }
    };
    settings.apply_env();
    Ok(settings)
}
