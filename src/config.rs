//! Configuration management for stackbox
//!
//! Settings are loaded from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! - `STACKBOX_CACHE_ENABLED`: Cache remote responses (true|false) - default: "true"
//! - `STACKBOX_CACHE_DIR`: Response cache directory - default: user cache dir + "stackbox"
//! - `STACKBOX_CACHE_TTL`: Response freshness window in seconds - default: "3600"
//! - `STACKBOX_REQUEST_TIMEOUT`: HTTP timeout in seconds - default: "30"
//! - `STACKBOX_REGISTRY_URL`: Docker registry v2 endpoint
//! - `STACKBOX_REGISTRY_AUTH_URL`: Registry token endpoint
//! - `STACKBOX_GITHUB_API_URL`: GitHub REST endpoint used for tool releases
//! - `STACKBOX_NODE_DIST_URL`: Node.js distribution mirror
//! - `STACKBOX_LOG_LEVEL`: Logging level - default: "info"
//! - `GITHUB_TOKEN`: Optional token for authenticated release lookups

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CACHE_ENABLED: bool = true;
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REGISTRY_URL: &str = "https://registry-1.docker.io";
const DEFAULT_REGISTRY_AUTH_URL: &str = "https://auth.docker.io/token";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_NODE_DIST_URL: &str = "https://nodejs.org/dist";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct StackboxConfig {
    pub cache_enabled: bool,
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub registry_url: String,
    pub registry_auth_url: String,
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub node_dist_url: String,
    pub log_level: String,
}

impl Default for StackboxConfig {
    fn default() -> Self {
        let cache_enabled = env::var("STACKBOX_CACHE_ENABLED")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_CACHE_ENABLED);

        let cache_dir = env::var("STACKBOX_CACHE_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                if cache_enabled {
                    Some(
                        dirs::cache_dir()
                            .unwrap_or_else(env::temp_dir)
                            .join("stackbox"),
                    )
                } else {
                    None
                }
            });

        let cache_ttl_secs = env::var("STACKBOX_CACHE_TTL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let request_timeout_secs = env::var("STACKBOX_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let github_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

        let log_level = env::var("STACKBOX_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            cache_enabled,
            cache_dir,
            cache_ttl_secs,
            request_timeout_secs,
            registry_url: url_var("STACKBOX_REGISTRY_URL", DEFAULT_REGISTRY_URL),
            registry_auth_url: url_var("STACKBOX_REGISTRY_AUTH_URL", DEFAULT_REGISTRY_AUTH_URL),
            github_api_url: url_var("STACKBOX_GITHUB_API_URL", DEFAULT_GITHUB_API_URL),
            github_token,
            node_dist_url: url_var("STACKBOX_NODE_DIST_URL", DEFAULT_NODE_DIST_URL),
            log_level,
        }
    }
}

fn url_var(key: &str, default: &str) -> String {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

impl StackboxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.cache_enabled && self.cache_dir.is_none() {
            return Err(ConfigError::ValidationFailed(
                "Cache is enabled but no cache directory is configured".to_string(),
            ));
        }
        if self.cache_ttl_secs > 7 * 24 * 60 * 60 {
            return Err(ConfigError::ValidationFailed(
                "Cache TTL cannot exceed 7 days".to_string(),
            ));
        }

        for (field, url) in [
            ("registry_url", &self.registry_url),
            ("registry_auth_url", &self.registry_auth_url),
            ("github_api_url", &self.github_api_url),
            ("node_dist_url", &self.node_dist_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ParseError {
                    field: field.to_string(),
                    error: format!("{} is not an http(s) URL", url),
                });
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Response cache directory, `None` when caching is disabled.
    pub fn effective_cache_dir(&self) -> Option<&PathBuf> {
        if self.cache_enabled {
            self.cache_dir.as_ref()
        } else {
            None
        }
    }
}

impl fmt::Display for StackboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stackbox Configuration:")?;
        writeln!(f, "  Cache Enabled: {}", self.cache_enabled)?;
        if let Some(ref dir) = self.cache_dir {
            writeln!(f, "  Cache Dir: {}", dir.display())?;
        }
        writeln!(f, "  Cache TTL: {}s", self.cache_ttl_secs)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Registry: {}", self.registry_url)?;
        writeln!(f, "  GitHub API: {}", self.github_api_url)?;
        writeln!(
            f,
            "  GitHub Token: {}",
            if self.github_token.is_some() {
                "set"
            } else {
                "not set"
            }
        )?;
        writeln!(f, "  Node Dist: {}", self.node_dist_url)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        let _ttl = EnvGuard::unset("STACKBOX_CACHE_TTL");
        let _timeout = EnvGuard::unset("STACKBOX_REQUEST_TIMEOUT");
        let _registry = EnvGuard::unset("STACKBOX_REGISTRY_URL");
        let _level = EnvGuard::unset("STACKBOX_LOG_LEVEL");

        let config = StackboxConfig::default();
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.registry_url, "https://registry-1.docker.io");
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_github_token_optional() {
        let _guard = EnvGuard::unset("GITHUB_TOKEN");
        assert!(StackboxConfig::default().github_token.is_none());

        let _guard = EnvGuard::set("GITHUB_TOKEN", "ghp_test");
        assert_eq!(
            StackboxConfig::default().github_token.as_deref(),
            Some("ghp_test")
        );
    }

    #[test]
    #[serial]
    fn test_empty_github_token_is_ignored() {
        let _guard = EnvGuard::set("GITHUB_TOKEN", "");
        assert!(StackboxConfig::default().github_token.is_none());
    }

    #[test]
    #[serial]
    fn test_cache_disabled() {
        let _enabled = EnvGuard::set("STACKBOX_CACHE_ENABLED", "false");
        let _dir = EnvGuard::unset("STACKBOX_CACHE_DIR");

        let config = StackboxConfig::default();
        assert!(!config.cache_enabled);
        assert!(config.cache_dir.is_none());
        assert!(config.effective_cache_dir().is_none());
    }

    #[test]
    #[serial]
    fn test_url_trailing_slash_trimmed() {
        let _guard = EnvGuard::set("STACKBOX_NODE_DIST_URL", "https://mirror.example/node/");
        let config = StackboxConfig::default();
        assert_eq!(config.node_dist_url, "https://mirror.example/node");
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back() {
        let _guard = EnvGuard::set("STACKBOX_CACHE_TTL", "soon");
        assert_eq!(StackboxConfig::default().cache_ttl_secs, 3600);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = StackboxConfig {
            request_timeout_secs: 0,
            ..StackboxConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = StackboxConfig {
            github_api_url: "api.github.com".to_string(),
            ..StackboxConfig::default()
        };
        match config.validate() {
            Err(ConfigError::ParseError { field, .. }) => assert_eq!(field, "github_api_url"),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let config = StackboxConfig {
            log_level: "loud".to_string(),
            ..StackboxConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_hides_token() {
        let config = StackboxConfig {
            github_token: Some("secret".to_string()),
            ..StackboxConfig::default()
        };
        let display = format!("{}", config);
        assert!(display.contains("Stackbox Configuration:"));
        assert!(display.contains("GitHub Token: set"));
        assert!(!display.contains("secret"));
    }
}
