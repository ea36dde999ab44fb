// Configuration for the dashboard client
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/tickwatch/config.toml)
// 3. Built-in defaults (lowest priority)
//
// The [backend] section is the exception: those keys identify the hosted
// platform project and have no defaults. Startup fails with the list of
// missing keys when any is absent (demo mode runs without them).

use anyhow::bail;
use serde::Deserialize;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default poll interval for the live ticket query, in seconds
const DEFAULT_POLL_SECS: u64 = 3;

/// Connection settings for the hosted backend. All required.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub sender_id: String,
    pub app_id: String,
    pub api_key: String,
}

/// Log file rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Also write logs to rotating files
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_prefix: String,
    pub file_rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs"),
            file_prefix: "tickwatch".to_string(),
            file_rotation: LogRotation::Daily,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to enable the TUI (can be disabled for headless mode)
    pub enable_tui: bool,

    /// Demo mode: in-memory backend with seeded session and tickets
    pub demo_mode: bool,

    /// Live-query poll interval in seconds
    pub poll_interval_secs: u64,

    /// Where the sign-in surface leaves the session credential
    pub session_path: PathBuf,

    /// Hosted backend connection, as far as the file/env provided it.
    /// Validated by `backend()` before the gateways initialize.
    backend: PartialBackend,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialBackend {
    auth_domain: Option<String>,
    project_id: Option<String>,
    storage_bucket: Option<String>,
    sender_id: Option<String>,
    app_id: Option<String>,
    api_key: Option<String>,
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
    file_enabled: Option<bool>,
    file_dir: Option<String>,
    file_prefix: Option<String>,
    file_rotation: Option<String>,
}

/// Config file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    poll_interval_secs: Option<u64>,
    session_path: Option<String>,

    /// Optional [backend] section
    backend: Option<PartialBackend>,

    /// Optional [logging] section
    logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/tickwatch/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("tickwatch").join("config.toml"))
    }

    /// Default location of the session credential file
    fn default_session_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".config").join("tickwatch").join("session.json"))
            .unwrap_or_else(|| PathBuf::from("session.json"))
    }

    /// Create config template if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        // Create parent directory
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# tickwatch configuration
# Uncomment and modify options as needed

# Live-query poll interval in seconds (default: 3)
# poll_interval_secs = 3

# Session credential file written by the sign-in surface
# session_path = "~/.config/tickwatch/session.json"

# Hosted backend connection - all keys required (no defaults)
# Environment variables TICKWATCH_* override these
[backend]
# auth_domain = "example.backend.app"
# project_id = "my-project"
# storage_bucket = "my-project.blobs"
# sender_id = "000000000000"
# app_id = "1:000000000000:app"
# api_key = "..."

# Logging configuration
# [logging]
# level = "info"          # trace, debug, info, warn, error (RUST_LOG overrides)
# file_enabled = false    # Also write rotating log files
# file_dir = "./logs"
# file_prefix = "tickwatch"
# file_rotation = "daily" # hourly, daily, never
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# tickwatch configuration

# Live-query poll interval in seconds
poll_interval_secs = {poll}

# Session credential file written by the sign-in surface
session_path = "{session}"

# Hosted backend connection - all keys required (no defaults)
[backend]
auth_domain = "{auth_domain}"
project_id = "{project_id}"
storage_bucket = "{storage_bucket}"
sender_id = "{sender_id}"
app_id = "{app_id}"
api_key = "{api_key}"

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
file_enabled = {file_enabled}
file_dir = "{file_dir}"
file_prefix = "{file_prefix}"
file_rotation = "{file_rotation}"
"#,
            poll = self.poll_interval_secs,
            session = self.session_path.display(),
            auth_domain = self.backend.auth_domain.as_deref().unwrap_or(""),
            project_id = self.backend.project_id.as_deref().unwrap_or(""),
            storage_bucket = self.backend.storage_bucket.as_deref().unwrap_or(""),
            sender_id = self.backend.sender_id.as_deref().unwrap_or(""),
            app_id = self.backend.app_id.as_deref().unwrap_or(""),
            api_key = self.backend.api_key.as_deref().unwrap_or(""),
            log_level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display(),
            file_prefix = self.logging.file_prefix,
            file_rotation = match self.logging.file_rotation {
                LogRotation::Hourly => "hourly",
                LogRotation::Daily => "daily",
                LogRotation::Never => "never",
            },
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }

    /// Load configuration: file -> env vars -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // TUI toggle: env only (runtime flag)
        let enable_tui = std::env::var("TICKWATCH_NO_TUI")
            .map(|v| v != "1" && v.to_lowercase() != "true")
            .unwrap_or(true);

        // Demo mode: env only (runtime flag)
        let demo_mode = std::env::var("TICKWATCH_DEMO")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        // Poll interval: env > file > default
        let poll_interval_secs = std::env::var("TICKWATCH_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_SECS)
            .max(1);

        // Session path: env > file > default
        let session_path = std::env::var("TICKWATCH_SESSION_FILE")
            .ok()
            .or(file.session_path)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_session_path);

        // Backend keys: env > file, no defaults
        let file_backend = file.backend.unwrap_or_default();
        let env_or = |name: &str, from_file: Option<String>| -> Option<String> {
            std::env::var(name).ok().or(from_file)
        };
        let backend = PartialBackend {
            auth_domain: env_or("TICKWATCH_AUTH_DOMAIN", file_backend.auth_domain),
            project_id: env_or("TICKWATCH_PROJECT_ID", file_backend.project_id),
            storage_bucket: env_or("TICKWATCH_STORAGE_BUCKET", file_backend.storage_bucket),
            sender_id: env_or("TICKWATCH_SENDER_ID", file_backend.sender_id),
            app_id: env_or("TICKWATCH_APP_ID", file_backend.app_id),
            api_key: env_or("TICKWATCH_API_KEY", file_backend.api_key),
        };

        // Logging settings: file config only (RUST_LOG env var handled in main.rs)
        let file_logging = file.logging.unwrap_or_default();
        let defaults = LoggingConfig::default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or(defaults.level),
            file_enabled: file_logging.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file_logging
                .file_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.file_dir),
            file_prefix: file_logging.file_prefix.unwrap_or(defaults.file_prefix),
            file_rotation: match file_logging.file_rotation.as_deref() {
                Some("hourly") => LogRotation::Hourly,
                Some("never") => LogRotation::Never,
                Some("daily") | None => LogRotation::Daily,
                Some(other) => {
                    eprintln!("Warning: Unknown file_rotation {other:?}, using daily");
                    LogRotation::Daily
                }
            },
        };

        Self {
            enable_tui,
            demo_mode,
            poll_interval_secs,
            session_path,
            backend,
            logging,
        }
    }

    /// Validate the backend section. Errors name every missing key so a
    /// first-run failure is fixable in one pass.
    pub fn backend(&self) -> anyhow::Result<BackendConfig> {
        let mut missing = Vec::new();
        let required = |value: &Option<String>, key: &'static str, missing: &mut Vec<&str>| {
            match value {
                Some(v) if !v.trim().is_empty() => Some(v.clone()),
                _ => {
                    missing.push(key);
                    None
                }
            }
        };

        let auth_domain = required(&self.backend.auth_domain, "auth_domain", &mut missing);
        let project_id = required(&self.backend.project_id, "project_id", &mut missing);
        let storage_bucket = required(&self.backend.storage_bucket, "storage_bucket", &mut missing);
        let sender_id = required(&self.backend.sender_id, "sender_id", &mut missing);
        let app_id = required(&self.backend.app_id, "app_id", &mut missing);
        let api_key = required(&self.backend.api_key, "api_key", &mut missing);

        if !missing.is_empty() {
            bail!(
                "Backend configuration incomplete, missing: {} (set them in the [backend] \
                 section of the config file or via TICKWATCH_* environment variables)",
                missing.join(", ")
            );
        }

        Ok(BackendConfig {
            auth_domain: auth_domain.unwrap(),
            project_id: project_id.unwrap(),
            storage_bucket: storage_bucket.unwrap(),
            sender_id: sender_id.unwrap(),
            app_id: app_id.unwrap(),
            api_key: api_key.unwrap(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_tui: true,
            demo_mode: false,
            poll_interval_secs: DEFAULT_POLL_SECS,
            session_path: Self::default_session_path(),
            backend: PartialBackend::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from_toml(raw: &str) -> Config {
        let file: FileConfig = toml::from_str(raw).unwrap();
        let file_backend = file.backend.unwrap_or_default();
        Config {
            poll_interval_secs: file.poll_interval_secs.unwrap_or(DEFAULT_POLL_SECS),
            backend: file_backend,
            ..Config::default()
        }
    }

    #[test]
    fn complete_backend_section_validates() {
        let config = config_from_toml(
            r#"
            poll_interval_secs = 5

            [backend]
            auth_domain = "example.backend.app"
            project_id = "proj"
            storage_bucket = "proj.blobs"
            sender_id = "123"
            app_id = "1:123:app"
            api_key = "secret"
            "#,
        );
        let backend = config.backend().unwrap();
        assert_eq!(backend.project_id, "proj");
        assert_eq!(config.poll_interval_secs, 5);
    }

    #[test]
    fn missing_backend_keys_are_all_named() {
        let config = config_from_toml(
            r#"
            [backend]
            project_id = "proj"
            api_key = ""
            "#,
        );
        let err = config.backend().unwrap_err().to_string();
        for key in ["auth_domain", "storage_bucket", "sender_id", "app_id", "api_key"] {
            assert!(err.contains(key), "error does not name {key}: {err}");
        }
        assert!(!err.contains("project_id,"), "named a present key: {err}");
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let config = config_from_toml("");
        assert!(config.backend().is_err());
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_SECS);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn unknown_rotation_does_not_parse_as_hourly() {
        let file: FileConfig = toml::from_str(
            r#"
            [logging]
            file_rotation = "hourly"
            "#,
        )
        .unwrap();
        assert_eq!(file.logging.unwrap().file_rotation.as_deref(), Some("hourly"));
    }

    #[test]
    fn template_round_trips_through_parser() {
        let config = Config::default();
        let rendered = config.to_toml();
        let parsed: FileConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.poll_interval_secs, Some(DEFAULT_POLL_SECS));
        assert!(parsed.backend.is_some());
    }
}
