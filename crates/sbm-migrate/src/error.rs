//! Error types for migration runs
//!
//! Only usage and setup errors end a run. Everything that goes wrong for a
//! single identity is recorded as an outcome instead.

use sbm_gateway::{GatewayError, ScheduleError};
use sbm_model::ScenarioError;
use std::path::PathBuf;

/// Fatal migration error
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Batch or scenario file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Batch line is not a valid identity record
    #[error("malformed record on line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    /// Scenario file is not valid TOML or misses fields
    #[error("invalid scenario file: {0}")]
    ScenarioFile(String),

    /// Scenario parsed but is inconsistent
    #[error("invalid scenario: {0}")]
    Scenario(#[from] ScenarioError),

    /// Statically known schedule could not be fetched
    #[error("setup failed: {0}")]
    Setup(#[from] ScheduleError),

    /// Listing needed to drive the run failed
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl MigrateError {
    /// Create malformed record error
    pub fn malformed(line: usize, message: impl ToString) -> Self {
        Self::MalformedRecord {
            line,
            message: message.to_string(),
        }
    }

    /// Check if the error was caused by bad input rather than a remote service
    #[inline]
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::MalformedRecord { .. } | Self::ScenarioFile(_) | Self::Scenario(_)
        )
    }
}

/// Result type alias for migration runs
pub type MigrateResult<T> = Result<T, MigrateError>;
