//! Error types for the position model
//!
//! Scenario errors are configuration errors: they are raised while a
//! scenario is being built and never while one is being resolved.

use crate::position::MessageSetId;

/// Invalid position data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// Sequence numbers are 1-based
    #[error("sequence number must be at least 1 (message set {message_set})")]
    ZeroSequence {
        /// Message set the position refers to
        message_set: MessageSetId,
    },
}

/// Invalid scenario configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    /// Scenario defines no stages or tracks
    #[error("scenario has no stages")]
    Empty,

    /// Scenario defines stages but none of them hold an important message
    #[error("scenario has no important messages")]
    NoImportantMessages,

    /// A message set appears twice in the scenario
    #[error("message set {0} is configured more than once")]
    DuplicateMessageSet(MessageSetId),

    /// Important sequence numbers must be at least 1
    #[error("message set {0} lists sequence number 0")]
    ZeroSequence(MessageSetId),

    /// Important sequence numbers must be strictly increasing
    #[error("sequence numbers of message set {0} are not strictly increasing")]
    Unordered(MessageSetId),

    /// Track without thresholds
    #[error("track {0} has no thresholds")]
    EmptyTrack(MessageSetId),

    /// Destination table does not hold one entry per important message
    #[error("expected {expected} destination message sets, got {actual}")]
    DestinationCount {
        /// Total important messages in the scenario
        expected: usize,
        /// Destinations configured
        actual: usize,
    },
}

impl ScenarioError {
    /// Create destination count mismatch error
    pub fn destination_count(expected: usize, actual: usize) -> Self {
        Self::DestinationCount { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_error_display() {
        let err = PositionError::ZeroSequence {
            message_set: MessageSetId(7),
        };
        assert_eq!(
            err.to_string(),
            "sequence number must be at least 1 (message set 7)"
        );
    }

    #[test]
    fn destination_count_display() {
        let err = ScenarioError::destination_count(5, 4);
        assert_eq!(err.to_string(), "expected 5 destination message sets, got 4");
    }
}
