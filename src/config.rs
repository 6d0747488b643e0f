//! Server configuration
//!
//! Loaded once at startup and shared read-only as `Arc<ServerConfig>`.
//! Sources are tried in order: an explicit file, the file named by
//! `SDD_MCP_CONFIG_PATH`, `./.sdd-mcp.config.json`, then individual
//! `SDD_MCP_*` variables on top of the defaults.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SDD_MCP_CONFIG_PATH";
pub const LOCAL_CONFIG_FILE: &str = ".sdd-mcp.config.json";
const ENV_PREFIX: &str = "SDD_MCP_";

pub const LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARNING", "ERROR"];

pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "ja", "zh-TW", "zh", "es", "pt", "de", "fr", "ru", "it", "ko", "ar",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub server_name: String,
    pub server_version: String,
    /// One of DEBUG, INFO, WARNING, ERROR
    pub log_level: String,
    /// Project root override; discovery from the working directory when unset
    pub project_dir: Option<PathBuf>,
    /// Name of the control directory under the project root
    pub kiro_dir: String,
    pub default_language: String,
    /// Bundled template root consulted after project overrides
    pub templates_dir: Option<PathBuf>,
    /// Keep resolved templates for the life of the server process. Template
    /// edits made while the server runs are not picked up when set.
    pub template_cache_enabled: bool,
    pub auto_create_steering: bool,
    pub strict_phase_gates: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "sdd-mcp".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "INFO".to_string(),
            project_dir: None,
            kiro_dir: crate::paths::DEFAULT_CONTROL_DIR.to_string(),
            default_language: "en".to_string(),
            templates_dir: None,
            template_cache_enabled: true,
            auto_create_steering: false,
            strict_phase_gates: true,
        }
    }
}

impl ServerConfig {
    /// Load using the process environment and working directory
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::load_with(explicit, &cwd, |key| std::env::var(key).ok())
    }

    /// Load with an injected environment lookup
    pub fn load_with<F>(explicit: Option<&Path>, cwd: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            return Self::from_file(path);
        }

        if let Some(path) = env(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            let path = cwd.join(path);
            if path.exists() {
                return Self::from_file(&path);
            }
            tracing::warn!(
                "{} points at missing file {}, ignoring",
                CONFIG_PATH_ENV,
                path.display()
            );
        }

        let local = cwd.join(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }

        Self::from_env(env)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in config file {}", path.display()))
    }

    /// Defaults overlaid with any `SDD_MCP_*` variables
    pub fn from_env<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |name: &str| env(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("SERVER_NAME") {
            config.server_name = v;
        }
        if let Some(v) = var("SERVER_VERSION") {
            config.server_version = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = var("PROJECT_DIR") {
            config.project_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("KIRO_DIR") {
            config.kiro_dir = v;
        }
        if let Some(v) = var("DEFAULT_LANGUAGE") {
            config.default_language = v;
        }
        if let Some(v) = var("TEMPLATES_DIR") {
            config.templates_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("TEMPLATE_CACHE_ENABLED") {
            config.template_cache_enabled = parse_bool(&v);
        }
        if let Some(v) = var("AUTO_CREATE_STEERING") {
            config.auto_create_steering = parse_bool(&v);
        }
        if let Some(v) = var("STRICT_PHASE_GATES") {
            config.strict_phase_gates = parse_bool(&v);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_uppercase().as_str()) {
            bail!(
                "Invalid log_level '{}'. Expected one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }
        if !SUPPORTED_LANGUAGES.contains(&self.default_language.as_str()) {
            bail!(
                "Unsupported default_language '{}'. Supported: {}",
                self.default_language,
                SUPPORTED_LANGUAGES.join(", ")
            );
        }
        if self.kiro_dir.trim().is_empty() {
            bail!("kiro_dir must not be empty");
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
