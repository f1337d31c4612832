//! Configuration file parser for `jobfeed.toml`.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::DEFAULT_USER_AGENT;
use crate::model::Source;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-request deadline in seconds (connect + headers + body). 0 = default.
    pub timeout_secs: u64,

    /// `User-Agent` header sent to every feed provider.
    pub user_agent: String,

    /// Root directory for snapshot files.
    pub snapshot_dir: String,

    /// Whether snapshot file names carry the hour of the run.
    pub snapshot_hourly: bool,

    /// Whether the HTTP gateway writes a snapshot for every successful request.
    pub snapshot_on_request: bool,

    /// Lower bound of the randomized pause between sub-feed requests.
    pub subfeed_delay_min_ms: u64,

    /// Upper bound of the randomized pause between sub-feed requests.
    pub subfeed_delay_max_ms: u64,

    /// Gateway listen port. The `PORT` environment variable takes precedence.
    pub port: u16,

    /// Endpoint overrides keyed by source name. For `jobscollider` the value
    /// is the base URL the category feed paths are joined to.
    pub endpoints: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            snapshot_dir: "data".to_string(),
            snapshot_hourly: true,
            snapshot_on_request: false,
            subfeed_delay_min_ms: 100,
            subfeed_delay_max_ms: 500,
            port: 8080,
            endpoints: HashMap::new(),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "timeout_secs",
        "user_agent",
        "snapshot_dir",
        "snapshot_hourly",
        "snapshot_on_request",
        "subfeed_delay_min_ms",
        "subfeed_delay_max_ms",
        "port",
        "endpoints",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
            if let Some(toml::Value::Table(endpoints)) = raw.get("endpoints") {
                for name in endpoints.keys() {
                    if name.parse::<Source>().is_err() {
                        tracing::warn!(source = %name, "Endpoint override for unknown source, ignoring");
                    }
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            timeout_secs = config.timeout_secs,
            overrides = config.endpoints.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Per-request deadline. Never zero.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            crate::feed::DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    /// Bounds of the pause between sub-feed requests, with min <= max.
    pub fn subfeed_delay(&self) -> RangeInclusive<Duration> {
        let min = self.subfeed_delay_min_ms.min(self.subfeed_delay_max_ms);
        let max = self.subfeed_delay_min_ms.max(self.subfeed_delay_max_ms);
        Duration::from_millis(min)..=Duration::from_millis(max)
    }

    /// Endpoint override for `source`, if one is configured.
    pub fn endpoint(&self, source: Source) -> Option<&str> {
        self.endpoints
            .iter()
            .find(|(name, _)| name.parse::<Source>().ok() == Some(source))
            .map(|(_, url)| url.as_str())
    }

    /// Listen port: a valid `PORT` value wins over the configured one.
    pub fn resolve_port(&self, env_port: Option<&str>) -> u16 {
        match env_port.map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) => port,
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "Ignoring invalid PORT value");
                    self.port
                }
            },
            None => self.port,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.snapshot_dir, "data");
        assert!(config.snapshot_hourly);
        assert!(!config.snapshot_on_request);
        assert_eq!(config.port, 8080);
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/jobfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("jobfeed_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jobfeed.toml");
        std::fs::write(&path, "   \n  ").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 8080);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("jobfeed_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jobfeed.toml");

        let content = r#"
timeout_secs = 5
user_agent = "jobfeed-test"
snapshot_dir = "/var/lib/jobfeed"
snapshot_hourly = false
snapshot_on_request = true
subfeed_delay_min_ms = 0
subfeed_delay_max_ms = 50
port = 9000

[endpoints]
remotive = "http://127.0.0.1:9999/feed"
jobscollider = "http://127.0.0.1:9999/"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.user_agent, "jobfeed-test");
        assert_eq!(config.snapshot_dir, "/var/lib/jobfeed");
        assert!(!config.snapshot_hourly);
        assert!(config.snapshot_on_request);
        assert_eq!(
            config.subfeed_delay(),
            Duration::ZERO..=Duration::from_millis(50)
        );
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.endpoint(Source::Remotive),
            Some("http://127.0.0.1:9999/feed")
        );
        assert_eq!(
            config.endpoint(Source::JobsCollider),
            Some("http://127.0.0.1:9999/")
        );
        assert_eq!(config.endpoint(Source::AiJobs), None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("jobfeed_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jobfeed.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("jobfeed_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jobfeed.toml");
        std::fs::write(&path, "port = 7000\nretries = 3\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 7000);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("jobfeed_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jobfeed.toml");
        std::fs::write(&path, "timeout_secs = \"ten\"\n").unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("jobfeed_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jobfeed.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.timeout(), crate::feed::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_inverted_delay_bounds_are_ordered() {
        let config = Config {
            subfeed_delay_min_ms: 400,
            subfeed_delay_max_ms: 100,
            ..Config::default()
        };
        assert_eq!(
            config.subfeed_delay(),
            Duration::from_millis(100)..=Duration::from_millis(400)
        );
    }

    #[test]
    fn test_resolve_port() {
        let config = Config::default();
        assert_eq!(config.resolve_port(None), 8080);
        assert_eq!(config.resolve_port(Some("3000")), 3000);
        assert_eq!(config.resolve_port(Some(" ")), 8080);
        assert_eq!(config.resolve_port(Some("not-a-port")), 8080);
    }
}
