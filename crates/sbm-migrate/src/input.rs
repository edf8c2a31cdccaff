//! Batch input: newline delimited identity records
//!
//! Every line is parsed before the first request is sent, so a typo on the
//! last line never leaves a batch half migrated.

use crate::error::{MigrateError, MigrateResult};
use sbm_model::Identity;
use std::path::{Path, PathBuf};

/// Where a batch comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSource {
    /// Path to a file of records
    File(PathBuf),
    /// Records passed inline
    Data(String),
}

impl BatchSource {
    /// Read and parse the whole batch
    ///
    /// # Errors
    /// [`MigrateError::Read`] or [`MigrateError::MalformedRecord`].
    pub fn load(&self) -> MigrateResult<Vec<Identity>> {
        match self {
            Self::File(path) => parse_batch(&read_file(path)?),
            Self::Data(data) => parse_batch(data),
        }
    }
}

pub(crate) fn read_file(path: &Path) -> MigrateResult<String> {
    std::fs::read_to_string(path).map_err(|source| MigrateError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse newline delimited JSON records, skipping blank lines
///
/// # Errors
/// [`MigrateError::MalformedRecord`] with the 1-based line number of the
/// first bad record.
pub fn parse_batch(text: &str) -> MigrateResult<Vec<Identity>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|error| MigrateError::malformed(index + 1, error))
        })
        .collect()
}
