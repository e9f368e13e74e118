//! clauseguard configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main clauseguard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Endpoints of the storage, analysis and chat services
    pub service: ServiceConfig,

    /// File intake limits
    pub intake: IntakeConfig,

    /// Upload behaviour
    pub upload: UploadConfig,

    /// Cosmetic analysis progress indicator
    pub progress: ProgressConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .clauseguard.yml
        let local_config = PathBuf::from(".clauseguard.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/clauseguard/clauseguard.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".clauseguard.yml")];
                paths.extend(user_config_path());
                paths
            }
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("clauseguard").join("clauseguard.yml"))
}

/// How the document URL is sent to the analysis endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStyle {
    /// `GET {analyze-path}?fileUrl=...`
    #[default]
    Query,
    /// `POST {analyze-path}` with `{"fileUrl": ...}`
    Json,
}

/// Service endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL shared by all endpoints
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Storage upload endpoint path
    #[serde(rename = "upload-path")]
    pub upload_path: String,

    /// Analysis endpoint path
    #[serde(rename = "analyze-path")]
    pub analyze_path: String,

    /// Chat endpoint path
    #[serde(rename = "chat-path")]
    pub chat_path: String,

    /// Analysis request style
    #[serde(rename = "request-style")]
    pub request_style: RequestStyle,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            upload_path: "/api/upload".to_string(),
            analyze_path: "/analyze".to_string(),
            chat_path: "/chat".to_string(),
            request_style: RequestStyle::Query,
            timeout_ms: 300_000,
        }
    }
}

impl ServiceConfig {
    /// Join the base URL and an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn upload_url(&self) -> String {
        self.endpoint(&self.upload_path)
    }

    pub fn analyze_url(&self) -> String {
        self.endpoint(&self.analyze_path)
    }

    pub fn chat_url(&self) -> String {
        self.endpoint(&self.chat_path)
    }
}

/// File intake limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Largest accepted file in bytes
    #[serde(rename = "max-file-size-bytes")]
    pub max_file_size_bytes: u64,

    /// Write a local preview copy of each accepted file
    pub previews: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: crate::intake::MAX_FILE_SIZE_BYTES,
            previews: true,
        }
    }
}

/// Upload behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Files transferred at once (1 = strictly sequential)
    pub concurrency: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Cosmetic progress indicator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Milliseconds between increments
    #[serde(rename = "tick-ms")]
    pub tick_ms: u64,

    /// Largest single increment (percentage points)
    #[serde(rename = "max-step")]
    pub max_step: f64,

    /// Value the indicator never passes before the request settles
    pub ceiling: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_ms: 300,
            max_step: 5.0,
            ceiling: 95.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.service.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.service.request_style, RequestStyle::Query);
        assert_eq!(config.intake.max_file_size_bytes, 10_485_760);
        assert_eq!(config.upload.concurrency, 1);
        assert_eq!(config.progress.tick_ms, 300);
        assert_eq!(config.progress.ceiling, 95.0);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_endpoint_joining() {
        let mut service = ServiceConfig::default();
        service.base_url = "https://api.example.com/".to_string();
        assert_eq!(service.analyze_url(), "https://api.example.com/analyze");
        assert_eq!(service.upload_url(), "https://api.example.com/api/upload");

        service.chat_path = "chat".to_string();
        assert_eq!(service.chat_url(), "https://api.example.com/chat");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

service:
  base-url: https://analysis.example.com
  upload-path: /storage/upload
  analyze-path: /v2/analyze
  chat-path: /v2/chat
  request-style: json
  timeout-ms: 60000

intake:
  max-file-size-bytes: 1048576
  previews: false

upload:
  concurrency: 4

progress:
  tick-ms: 100
  max-step: 2.5
  ceiling: 90
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.service.base_url, "https://analysis.example.com");
        assert_eq!(config.service.request_style, RequestStyle::Json);
        assert_eq!(config.service.timeout_ms, 60_000);
        assert_eq!(config.intake.max_file_size_bytes, 1_048_576);
        assert!(!config.intake.previews);
        assert_eq!(config.upload.concurrency, 4);
        assert_eq!(config.progress.max_step, 2.5);
        assert_eq!(config.progress.ceiling, 90.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
service:
  base-url: http://localhost:9000
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.service.base_url, "http://localhost:9000");

        // Defaults for unspecified
        assert_eq!(config.service.analyze_path, "/analyze");
        assert_eq!(config.intake.max_file_size_bytes, 10_485_760);
        assert_eq!(config.progress.max_step, 5.0);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cg.yml");
        std::fs::write(&path, "log-level: warn\nupload:\n  concurrency: 2\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.upload.concurrency, 2);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }
}
