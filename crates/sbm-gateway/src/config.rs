//! Gateway configuration

use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default attempt budget per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;

/// Whether mutating calls reach the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Compute and report, never write
    #[default]
    DryRun,
    /// Perform writes
    Execute,
}

impl RunMode {
    /// Map the `--execute` flag to a mode
    #[inline]
    #[must_use]
    pub fn from_execute_flag(execute: bool) -> Self {
        if execute {
            Self::Execute
        } else {
            Self::DryRun
        }
    }

    /// Check if writes are performed
    #[inline]
    #[must_use]
    pub fn is_execute(&self) -> bool {
        matches!(self, Self::Execute)
    }
}

/// Fixed attempt budget with a fixed pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first, at least 1
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Policy that never retries
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// With attempt budget
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// With pause between attempts
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

/// Connection settings for one remote service
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL, e.g. `https://sbm.example.org/api/v1/`
    pub base_url: String,
    /// Token sent as `Authorization: Token <token>`
    pub token: String,
    /// Per request timeout
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
    /// Run mode for mutating calls
    pub mode: RunMode,
}

impl GatewayConfig {
    /// Create configuration with defaults
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            mode: RunMode::default(),
        }
    }

    /// With run mode
    #[must_use]
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// With retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let config = GatewayConfig::new("http://sbm/api/v1/", "t0k3n");
        assert_eq!(config.mode, RunMode::DryRun);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn attempts_never_drop_below_one() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn execute_flag() {
        assert!(RunMode::from_execute_flag(true).is_execute());
        assert!(!RunMode::from_execute_flag(false).is_execute());
    }
}
