// SPDX-License-Identifier: Apache-2.0

//! Configuration management for ghthread.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `GHTHREAD_`)
//! 2. Config file: `~/.config/ghthread/config.toml`
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Always render the full diff, however large
//! GHTHREAD_RENDER__DIFF_THRESHOLD=100000 ghthread dump octocat/hello#42
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ThreadError;

/// Default changed-line threshold below which the full diff is rendered.
pub const DEFAULT_DIFF_THRESHOLD: u64 = 800;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rendering preferences.
    pub render: RenderConfig,
    /// GitHub API settings.
    pub github: GitHubConfig,
    /// Concurrency and retry settings.
    pub fetch: FetchConfig,
    /// Scratch directory settings.
    pub scratch: ScratchConfig,
}

/// Rendering preferences.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render the full diff only when additions + deletions is below this.
    pub diff_threshold: u64,
    /// Render timestamps in UTC instead of the local timezone.
    pub utc: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            utc: false,
        }
    }
}

/// GitHub API settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API request timeout in seconds.
    pub api_timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_timeout_seconds: 10,
        }
    }
}

/// Concurrency and retry settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of concurrent link-title and image requests.
    pub max_concurrency: usize,
    /// How many times the whole operation is retried after a rate limit.
    pub rate_limit_retries: usize,
    /// Minimum delay before the first retry, in milliseconds.
    pub retry_min_delay_ms: u64,
    /// Download attachments and external images into the scratch directory.
    pub images: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            rate_limit_retries: 3,
            retry_min_delay_ms: 1000,
            images: true,
        }
    }
}

impl FetchConfig {
    /// Minimum retry delay as a `Duration`.
    #[must_use]
    pub fn retry_min_delay(&self) -> Duration {
        Duration::from_millis(self.retry_min_delay_ms)
    }
}

/// Scratch directory settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Base directory for per-thread scratch directories.
    pub base_dir: Option<PathBuf>,
}

impl ScratchConfig {
    /// Returns the configured base directory or `<tmp>/ghthread`.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("ghthread"))
    }
}

/// Returns the ghthread configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/ghthread`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("ghthread");
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".config")
        .join("ghthread")
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration.
///
/// Loads from config file (if exists) and environment variables.
/// Environment variables use the prefix `GHTHREAD_` and double underscore
/// for nested keys (e.g., `GHTHREAD_RENDER__DIFF_THRESHOLD`).
///
/// # Errors
///
/// Returns `ThreadError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, ThreadError> {
    let config_path = config_file_path();

    let config = Config::builder()
        // Load from config file (optional - may not exist)
        .add_source(File::with_name(config_path.to_string_lossy().as_ref()).required(false))
        // Override with environment variables
        .add_source(
            Environment::with_prefix("GHTHREAD")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_config_defaults() {
        // Without any config file or env vars, should return defaults
        let config = load_config().expect("should load with defaults");

        assert_eq!(config.render.diff_threshold, 800);
        assert!(!config.render.utc);
        assert_eq!(config.github.api_timeout_seconds, 10);
        assert_eq!(config.fetch.max_concurrency, 8);
        assert_eq!(config.fetch.rate_limit_retries, 3);
        assert!(config.fetch.images);
        assert!(config.scratch.base_dir.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override_diff_threshold() {
        // SAFETY: serialised with other env-mutating tests.
        unsafe { std::env::set_var("GHTHREAD_RENDER__DIFF_THRESHOLD", "50") };
        let config = load_config();
        unsafe { std::env::remove_var("GHTHREAD_RENDER__DIFF_THRESHOLD") };

        assert_eq!(config.expect("should load").render.diff_threshold, 50);
    }

    #[test]
    fn test_config_from_toml() {
        let config_str = r#"
[render]
diff_threshold = 1200
utc = true

[fetch]
images = false
retry_min_delay_ms = 10

[scratch]
base_dir = "/var/tmp/threads"
"#;

        let config = Config::builder()
            .add_source(config::File::from_str(config_str, config::FileFormat::Toml))
            .build()
            .expect("should build config");

        let app_config: AppConfig = config.try_deserialize().expect("should deserialize");

        assert_eq!(app_config.render.diff_threshold, 1200);
        assert!(app_config.render.utc);
        assert!(!app_config.fetch.images);
        assert_eq!(app_config.fetch.retry_min_delay(), Duration::from_millis(10));
        // Untouched sections keep their defaults
        assert_eq!(app_config.fetch.max_concurrency, 8);
        assert_eq!(
            app_config.scratch.base_dir(),
            PathBuf::from("/var/tmp/threads")
        );
    }

    #[test]
    fn test_scratch_base_dir_default() {
        let scratch = ScratchConfig::default();
        assert!(scratch.base_dir().ends_with("ghthread"));
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with("config.toml"));
    }
}
