use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dropbox::{DEFAULT_API_BASE_URL, DEFAULT_CONTENT_BASE_URL};
use crate::error::DropboxError;
use crate::transport::DEFAULT_TIMEOUT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Human,
    Summary,
    Json,
}

impl OutputMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Some(Self::Human),
            "summary" => Some(Self::Summary),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl AppConfig {
    /// Reads `~/.config/dropcli/config.toml` (if present) and applies
    /// environment overrides on top.
    pub fn load() -> Result<Self> {
        let mut cfg = match config_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = non_empty("DROPBOX_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(url) = non_empty("DROPBOX_API_BASE_URL") {
            self.api_base_url = Some(url);
        }
        if let Some(url) = non_empty("DROPBOX_CONTENT_BASE_URL") {
            self.content_base_url = Some(url);
        }
        if let Some(level) = non_empty("DROPCLI_LOG") {
            self.log_level = Some(level);
        }
    }

    pub fn access_token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                DropboxError::input(
                    "no access token: set DROPBOX_ACCESS_TOKEN or access_token in ~/.config/dropcli/config.toml",
                )
                .into()
            })
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn content_base_url(&self) -> &str {
        self.content_base_url
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(LevelFilter::Warn)
    }

    pub fn output_mode(&self) -> Option<OutputMode> {
        self.output.as_deref().and_then(OutputMode::parse)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = home_config_dir().ok_or_else(|| anyhow!("unable to locate config dir"))?;
    Ok(base.join("dropcli").join("config.toml"))
}

/// Returns ~/.config on all platforms instead of platform-specific config dirs.
fn home_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(cfg.content_base_url(), DEFAULT_CONTENT_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.log_level(), LevelFilter::Warn);
        assert!(cfg.access_token().is_err());
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
access_token = "sl.file"
api_base_url = "http://localhost:8080/2"
timeout_secs = 5
log_level = "debug"
output = "json"
"#,
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.access_token().unwrap(), "sl.file");
        assert_eq!(cfg.api_base_url(), "http://localhost:8080/2");
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.log_level(), LevelFilter::Debug);
        assert_eq!(cfg.output_mode(), Some(OutputMode::Json));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = \"soon\"").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn env_overrides_file() {
        let mut cfg = AppConfig {
            access_token: Some("sl.file".into()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [
            ("DROPBOX_ACCESS_TOKEN", "sl.env"),
            ("DROPBOX_CONTENT_BASE_URL", "http://content.local/2"),
            ("DROPBOX_API_BASE_URL", "  "),
        ]
        .into_iter()
        .collect();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.access_token().unwrap(), "sl.env");
        assert_eq!(cfg.content_base_url(), "http://content.local/2");
        assert_eq!(cfg.api_base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn missing_token_is_input_error() {
        let err = AppConfig::default().access_token().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DropboxError>(),
            Some(DropboxError::Input(_))
        ));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let cfg = AppConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn output_mode_parse() {
        assert_eq!(OutputMode::parse("Summary"), Some(OutputMode::Summary));
        assert_eq!(OutputMode::parse("xml"), None);
    }
}
