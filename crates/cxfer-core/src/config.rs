//! Transfer configuration
//!
//! Every field has a default so a partial TOML file (or none at all) is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default registry base URL
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/";

/// Completion polling policy
///
/// Delays grow geometrically: with the defaults the poller waits
/// 2, 4, 8, 16 and 32 seconds after the five unsuccessful attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay after the first unsuccessful attempt, in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum number of status fetches
    pub max_attempts: u32,
    /// Factor applied to the delay after each attempt
    pub multiplier: u32,
}

impl PollPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new(initial_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay_ms: u64::try_from(initial_delay.as_millis()).unwrap_or(u64::MAX),
            max_attempts,
            multiplier: 2,
        }
    }

    /// Delay to wait after the given 0-indexed attempt
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.multiplier).saturating_pow(attempt);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }

    /// Every delay the poller may sleep, in order
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(|attempt| self.delay_for_attempt(attempt))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2_000,
            max_attempts: 5,
            multiplier: 2,
        }
    }
}

/// Submission retry policy
///
/// Only server-side failures are retried; validation rejections never are.
/// A single attempt means no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitPolicy {
    /// Maximum number of submission attempts
    pub max_attempts: u32,
    /// Fixed delay between attempts, in milliseconds
    pub retry_delay_ms: u64,
}

impl SubmitPolicy {
    /// Policy that retries server errors up to `max_attempts` times in total
    #[inline]
    #[must_use]
    pub fn retrying(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay_ms: u64::try_from(retry_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Delay between attempts
    #[inline]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            retry_delay_ms: 1_000,
        }
    }
}

/// Transfer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Base URL of the registry service
    pub endpoint: String,
    /// Resolve only, never submit
    pub dry_run: bool,
    /// Proceed with the valid subset when duplicates or unresolved resources exist
    pub ignore_validation_errors: bool,
    /// Per-request HTTP timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Completion polling
    pub poll: PollPolicy,
    /// Submission retries
    pub submit: SubmitPolicy,
}

impl TransferConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` if the text is not valid for this schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With registry endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// With dry-run mode
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// With validation errors ignored
    #[inline]
    #[must_use]
    pub fn with_ignore_validation_errors(mut self, ignore: bool) -> Self {
        self.ignore_validation_errors = ignore;
        self
    }

    /// With polling policy
    #[inline]
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// With submission policy
    #[inline]
    #[must_use]
    pub fn with_submit_policy(mut self, submit: SubmitPolicy) -> Self {
        self.submit = submit;
        self
    }

    /// Per-request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            dry_run: false,
            ignore_validation_errors: false,
            request_timeout_ms: 30_000,
            poll: PollPolicy::default(),
            submit: SubmitPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_poll_delays_double() {
        let delays: Vec<u64> = PollPolicy::default()
            .delays()
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 32]);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TransferConfig::from_toml_str(
            r#"
            dry_run = true

            [poll]
            max_attempts = 3
            "#,
        )
        .unwrap();

        assert!(config.dry_run);
        assert!(!config.ignore_validation_errors);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.poll.max_attempts, 3);
        assert_eq!(config.poll.initial_delay_ms, 2_000);
        assert_eq!(config.submit, SubmitPolicy::default());
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let result = TransferConfig::from_toml_str("dry_run = \"maybe\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = \"http://registry:8080/\"").unwrap();

        let config = TransferConfig::load(file.path()).unwrap();
        assert_eq!(config.endpoint, "http://registry:8080/");
    }

    #[test]
    fn load_missing_file_fails() {
        let result = TransferConfig::load("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn builder_sets_flags() {
        let config = TransferConfig::new()
            .with_dry_run(true)
            .with_ignore_validation_errors(true)
            .with_submit_policy(SubmitPolicy::retrying(3, Duration::from_millis(10)));

        assert!(config.dry_run);
        assert!(config.ignore_validation_errors);
        assert_eq!(config.submit.max_attempts, 3);
        assert_eq!(config.submit.retry_delay(), Duration::from_millis(10));
    }
}
