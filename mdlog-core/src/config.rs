use crate::error::MdlogError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port. Overridden by `PORT`.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory holding `error_log.md`. Overridden by `LOG_FILE_PATH`.
    #[serde(default = "default_log_file_path")]
    pub log_file_path: PathBuf,
    /// Largest accepted request body.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// When false, `/metrics` renders nothing and no counters are allocated.
    #[serde(default)]
    pub enabled: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_port() -> u16 { 3000 }
fn default_bind() -> String { "0.0.0.0".into() }
fn default_log_file_path() -> PathBuf { PathBuf::from("./logs") }
fn default_body_limit() -> usize { 100 * 1024 }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            log_file_path: default_log_file_path(),
            body_limit_bytes: default_body_limit(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Layered sources: defaults, optional YAML file, `MDLOG_*` env, then the
    /// bare `PORT` / `LOG_FILE_PATH` variables.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(ServerConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("MDLOG_").split("__"))
            .merge(Env::raw().only(&["PORT", "LOG_FILE_PATH"]))
    }

    /// Load configuration from an optional YAML file + env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, MdlogError> {
        let config: ServerConfig = Self::figment(path).extract()?;
        Ok(config)
    }

    /// `bind:port` as passed to the TCP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
