//! Configuration module for CloudSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for CloudSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub upload: UploadConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local directory whose files are mirrored to the home folder.
    pub root: PathBuf,
    /// Page size used when listing the remote folder at startup.
    pub fetch_files_per_page: u32,
    /// Maximum number of listing pages fetched concurrently.
    pub max_degree_of_parallelism: usize,
    /// Chunk size (in bytes) used when streaming file content.
    pub read_buffer_size: usize,
    /// Maximum number of watcher events dispatched concurrently.
    pub dispatch_concurrency: usize,
}

/// Upload retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Number of retries after the first failed attempt.
    pub retry_count: u32,
    /// Base of the exponential backoff; retry `n` waits `base^n` seconds.
    pub retry_base_delay_seconds: u64,
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Account name. `None` means it must be supplied on the command line.
    pub username: Option<String>,
    /// A token expiring within this many seconds is treated as expired.
    pub token_expiry_tolerance_seconds: u64,
}

/// Remote service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the service, without the `/api/v1` suffix.
    pub base_url: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/cloudsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cloudsync")
            .join("config.yaml")
    }
}

impl AuthConfig {
    /// Expiry tolerance as a [`Duration`].
    pub fn token_expiry_tolerance(&self) -> Duration {
        Duration::from_secs(self.token_expiry_tolerance_seconds)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("CloudSync"),
            fetch_files_per_page: 100,
            max_degree_of_parallelism: 5,
            read_buffer_size: 8192,
            dispatch_concurrency: 4,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_base_delay_seconds: 2,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: None,
            token_expiry_tolerance_seconds: 30,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://moveitcloud.example.com".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.read_buffer_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn positive(errors: &mut Vec<ValidationError>, field: &str, is_zero: bool) {
    if is_zero {
        errors.push(ValidationError {
            field: field.into(),
            message: "must be greater than 0".into(),
        });
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        positive(
            &mut errors,
            "sync.fetch_files_per_page",
            self.sync.fetch_files_per_page == 0,
        );
        positive(
            &mut errors,
            "sync.max_degree_of_parallelism",
            self.sync.max_degree_of_parallelism == 0,
        );
        positive(
            &mut errors,
            "sync.read_buffer_size",
            self.sync.read_buffer_size == 0,
        );
        positive(
            &mut errors,
            "sync.dispatch_concurrency",
            self.sync.dispatch_concurrency == 0,
        );

        // --- upload ---
        positive(
            &mut errors,
            "upload.retry_base_delay_seconds",
            self.upload.retry_base_delay_seconds == 0,
        );

        // --- api ---
        if self.api.base_url.trim().is_empty() {
            errors.push(ValidationError {
                field: "api.base_url".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use cloudsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .sync_root(PathBuf::from("/home/user/Outbox"))
///     .upload_retry_count(5)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn sync_fetch_files_per_page(mut self, n: u32) -> Self {
        self.config.sync.fetch_files_per_page = n;
        self
    }

    pub fn sync_max_degree_of_parallelism(mut self, n: usize) -> Self {
        self.config.sync.max_degree_of_parallelism = n;
        self
    }

    pub fn sync_read_buffer_size(mut self, bytes: usize) -> Self {
        self.config.sync.read_buffer_size = bytes;
        self
    }

    pub fn sync_dispatch_concurrency(mut self, n: usize) -> Self {
        self.config.sync.dispatch_concurrency = n;
        self
    }

    // --- upload ---

    pub fn upload_retry_count(mut self, n: u32) -> Self {
        self.config.upload.retry_count = n;
        self
    }

    pub fn upload_retry_base_delay_seconds(mut self, seconds: u64) -> Self {
        self.config.upload.retry_base_delay_seconds = seconds;
        self
    }

    // --- auth ---

    pub fn auth_username(mut self, username: impl Into<String>) -> Self {
        self.config.auth.username = Some(username.into());
        self
    }

    pub fn auth_token_expiry_tolerance_seconds(mut self, seconds: u64) -> Self {
        self.config.auth.token_expiry_tolerance_seconds = seconds;
        self
    }

    // --- api ---

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
