//! Session configuration
//!
//! [`SessionConfig`] is the resolved, strongly typed form the session runs with.
//! [`SessionOptions`] is the serializable, millisecond-based form read from files,
//! environment variables or JSON, and resolved into a [`SessionConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Case, Config, Environment, File, FileFormat, FileSourceFile};
use serde::{Deserialize, Serialize};
use turborpc_transport_traits::{LimitsConfig, close_code};
use turborpc_types::Headers;

/// Lower bound for the per-request timeout.
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
/// Upper bound for the per-request timeout.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
/// Lower bound for every periodic interval (sweep, heartbeat, heartbeat grace).
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);
/// Lower bound for the reconnect base delay.
pub const MIN_RECONNECT_DELAY: Duration = Duration::from_millis(1);
/// Upper bound for the reconnect cap.
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Default environment prefix used by [`SessionOptions::from_file`].
pub const DEFAULT_ENV_PREFIX: &str = "TURBORPC";

/// Resolved session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a correlated request may wait for its response
    pub request_timeout: Duration,

    /// Run the expiry sweep while the transport is open
    pub sweep_enabled: bool,

    /// Period of the expiry sweep
    pub sweep_interval: Duration,

    /// Period between heartbeat probes
    pub heartbeat_rate: Duration,

    /// Grace period for a heartbeat answer before the transport is dropped
    pub heartbeat_timeout: Duration,

    /// Reconnection policy
    pub reconnect: ReconnectConfig,

    /// Headers merged into every outgoing envelope
    pub global_headers: Headers,

    /// Upper bound for a single connect attempt
    pub connect_timeout: Duration,

    /// Inbound and outbound frame size limits
    pub limits: LimitsConfig,

    /// Close codes treated as a terminal rejection by the peer
    pub terminal_close_codes: Vec<u16>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            sweep_enabled: true,
            sweep_interval: Duration::from_secs(1),
            heartbeat_rate: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
            global_headers: Headers::new(),
            connect_timeout: Duration::from_secs(10),
            limits: LimitsConfig::default(),
            terminal_close_codes: vec![
                close_code::POLICY_VIOLATION,
                close_code::UNAUTHORIZED,
                close_code::FORBIDDEN,
            ],
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable the expiry sweep
    pub fn with_sweep(mut self, enabled: bool) -> Self {
        self.sweep_enabled = enabled;
        self
    }

    /// Set the expiry sweep period
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the heartbeat period
    pub fn with_heartbeat_rate(mut self, rate: Duration) -> Self {
        self.heartbeat_rate = rate;
        self
    }

    /// Set the heartbeat grace period
    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Set the reconnection policy
    pub fn with_reconnect_config(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Set the maximum number of consecutive reconnect attempts
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect.max_retries = attempts;
        self
    }

    /// Replace the session-wide headers
    pub fn with_global_headers(mut self, headers: Headers) -> Self {
        self.global_headers = headers;
        self
    }

    /// Add one session-wide header
    pub fn with_global_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.global_headers.insert(key.into(), value.into());
        self
    }

    /// Set the connect attempt timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the same inbound and outbound frame size limit
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.limits = LimitsConfig::with_max_size(size);
        self
    }

    /// Replace the terminal close codes
    pub fn with_terminal_close_codes(mut self, codes: impl Into<Vec<u16>>) -> Self {
        self.terminal_close_codes = codes.into();
        self
    }

    /// Returns `true` if a peer close with `code` must not be followed by a reconnect.
    pub fn is_terminal_close(&self, code: u16) -> bool {
        self.terminal_close_codes.contains(&code)
    }

    /// Clamp every value into its supported range.
    ///
    /// Called once when a session is created; the result is the immutable snapshot the
    /// session runs with.
    pub fn resolved(mut self) -> Self {
        self.request_timeout = self
            .request_timeout
            .clamp(MIN_REQUEST_TIMEOUT, MAX_REQUEST_TIMEOUT);
        self.sweep_interval = self.sweep_interval.max(MIN_INTERVAL);
        self.heartbeat_rate = self.heartbeat_rate.max(MIN_INTERVAL);
        self.heartbeat_timeout = self.heartbeat_timeout.max(MIN_INTERVAL);
        self.connect_timeout = self.connect_timeout.max(MIN_INTERVAL);
        self.reconnect = self.reconnect.resolved();
        self
    }
}

/// Reconnection policy
///
/// Delays grow as `initial_delay * 2^attempt` plus a jitter drawn from
/// `[0, min(jitter, initial_delay))`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Consecutive reconnect attempts before the session gives up
    pub max_retries: u32,

    /// Base delay of the exponential backoff
    pub initial_delay: Duration,

    /// Upper bound for a single delay
    pub max_delay: Duration,

    /// Upper bound for the random jitter added to each delay
    pub jitter: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_millis(250),
        }
    }
}

impl ReconnectConfig {
    /// Create new reconnection configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Never reconnect
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set maximum jitter
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn resolved(mut self) -> Self {
        self.initial_delay = self
            .initial_delay
            .clamp(MIN_RECONNECT_DELAY, MAX_RECONNECT_DELAY);
        self.max_delay = self
            .max_delay
            .clamp(self.initial_delay, MAX_RECONNECT_DELAY);
        self
    }
}

/// Serializable session options, in milliseconds
///
/// Every field is optional; unset fields keep the [`SessionConfig`] default. Keys are
/// camelCase; environment overrides are converted to the same spelling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionOptions {
    /// Per-request expiry horizon
    pub request_timeout: Option<u64>,

    /// Enables the expiry sweep
    pub que_manager: Option<bool>,

    /// Expiry sweep period
    pub que_run_timeout: Option<u64>,

    /// Heartbeat period
    pub heartbeat_rate: Option<u64>,

    /// Heartbeat grace period
    pub heartbeat_timeout_duration: Option<u64>,

    /// Reconnect budget
    pub max_reconnect_attempts: Option<u32>,

    /// Headers merged into every outgoing envelope
    pub global_headers: Option<Headers>,

    /// Backoff base delay
    pub reconnect_base_delay: Option<u64>,

    /// Backoff cap
    pub reconnect_max_delay: Option<u64>,

    /// Maximum backoff jitter
    pub reconnect_jitter: Option<u64>,

    /// Connect attempt timeout
    pub connect_timeout: Option<u64>,

    /// Inbound and outbound frame size limit, in bytes
    pub max_message_size: Option<usize>,

    /// Close codes treated as a terminal rejection
    pub terminal_close_codes: Option<Vec<u16>>,
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// Options JSON could not be decoded
    #[error("Failed to decode options: {0}")]
    Json(#[from] serde_json::Error),
}

/// `PREFIX_HEARTBEAT_RATE=5000` overrides `heartbeatRate`.
fn environment(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .convert_case(Case::Camel)
        .try_parsing(true)
}

impl SessionOptions {
    /// Load options from a file (TOML, YAML, or JSON)
    ///
    /// The format is picked from the file extension. Environment variables with the
    /// `TURBORPC_` prefix override file settings, e.g. `TURBORPC_HEARTBEAT_RATE=5000`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, has an unsupported extension, or
    /// does not describe valid options.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_with_prefix(path, DEFAULT_ENV_PREFIX)
    }

    /// Load options from a file with a custom environment prefix
    ///
    /// # Errors
    ///
    /// Same as [`SessionOptions::from_file`].
    pub fn from_file_with_prefix(
        path: impl AsRef<Path>,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml" | "yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };
        let file = path.to_str().ok_or(ConfigError::UnsupportedFormat)?;

        Self::load(File::new(file, format), environment(env_prefix))
    }

    fn load(file: File<FileSourceFile, FileFormat>, env: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder().add_source(file).add_source(env).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Decode options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is not a valid options object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overlay these options on the defaults and clamp the result.
    pub fn resolve(&self) -> SessionConfig {
        let mut config = SessionConfig::default();
        let millis = Duration::from_millis;

        if let Some(ms) = self.request_timeout {
            config.request_timeout = millis(ms);
        }
        if let Some(enabled) = self.que_manager {
            config.sweep_enabled = enabled;
        }
        if let Some(ms) = self.que_run_timeout {
            config.sweep_interval = millis(ms);
        }
        if let Some(ms) = self.heartbeat_rate {
            config.heartbeat_rate = millis(ms);
        }
        if let Some(ms) = self.heartbeat_timeout_duration {
            config.heartbeat_timeout = millis(ms);
        }
        if let Some(attempts) = self.max_reconnect_attempts {
            config.reconnect.max_retries = attempts;
        }
        if let Some(headers) = &self.global_headers {
            config.global_headers = headers.clone();
        }
        if let Some(ms) = self.reconnect_base_delay {
            config.reconnect.initial_delay = millis(ms);
        }
        if let Some(ms) = self.reconnect_max_delay {
            config.reconnect.max_delay = millis(ms);
        }
        if let Some(ms) = self.reconnect_jitter {
            config.reconnect.jitter = millis(ms);
        }
        if let Some(ms) = self.connect_timeout {
            config.connect_timeout = millis(ms);
        }
        if let Some(size) = self.max_message_size {
            config.limits = LimitsConfig::with_max_size(size);
        }
        if let Some(codes) = &self.terminal_close_codes {
            config.terminal_close_codes = codes.clone();
        }

        config.resolved()
    }
}

impl From<SessionOptions> for SessionConfig {
    fn from(options: SessionOptions) -> Self {
        options.resolve()
    }
}
