use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::models::plan::{deserialize_over_defaults, PlanTable};
use crate::core::policy::RefreshPolicy;

pub const APP_DIR: &str = "creditkeeper";
pub const DEFAULT_BASE_URL: &str = "https://www.aicodemirror.com";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_format() -> String {
    "text".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Overrides the default cookie file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<PathBuf>,
    /// Overrides the default history log location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            cookies_file: None,
            history_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub policy: RefreshPolicy,
    #[serde(default, deserialize_with = "deserialize_over_defaults")]
    pub plans: PlanTable,
}

fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            fallback.iter().fold(
                dirs::home_dir().unwrap_or_else(|| PathBuf::from("~")),
                |acc, part| acc.join(part),
            )
        })
        .join(APP_DIR)
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        xdg_dir("XDG_CONFIG_HOME", &[".config"]).join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn cookies_path(&self) -> PathBuf {
        self.service
            .cookies_file
            .clone()
            .unwrap_or_else(|| xdg_dir("XDG_CONFIG_HOME", &[".config"]).join("cookies.txt"))
    }

    pub fn history_path(&self) -> PathBuf {
        self.service.history_file.clone().unwrap_or_else(|| {
            xdg_dir("XDG_DATA_HOME", &[".local", "share"]).join("credits_history.ndjson")
        })
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !["text", "json"].contains(&self.settings.default_format.as_str()) {
            issues.push(format!(
                "Invalid default_format: '{}' (must be 'text' or 'json')",
                self.settings.default_format
            ));
        }
        if !["auto", "always", "never"].contains(&self.settings.color.as_str()) {
            issues.push(format!(
                "Invalid color: '{}' (must be 'auto', 'always', or 'never')",
                self.settings.color
            ));
        }
        if let Err(e) = crate::core::service::validate_endpoint(&self.service.base_url) {
            issues.push(e.to_string());
        }
        if self.policy.night_window_start_hour > 23 {
            issues.push(format!(
                "Invalid night_window_start_hour: {} (must be 0-23)",
                self.policy.night_window_start_hour
            ));
        }
        if self.policy.night_window_start_minute > 59 {
            issues.push(format!(
                "Invalid night_window_start_minute: {} (must be 0-59)",
                self.policy.night_window_start_minute
            ));
        }
        if self.plans.is_empty() {
            issues.push("No plans configured; every plan will have a ceiling of 0".to_string());
        }
        for (tag, plan) in self.plans.iter() {
            if plan.fallback_recovery_rate == 0 {
                issues.push(format!(
                    "Plan '{}': fallback_recovery_rate must be positive",
                    tag
                ));
            }
        }
        issues
    }
}
