//! Positions and identities
//!
//! A [`Position`] pins an identity to a sequence number inside a message
//! set. An [`Identity`] carries the position it is at and the position it
//! is expected to be at.

use crate::error::PositionError;
use serde::{Deserialize, Serialize};

/// Remote message set identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageSetId(pub u64);

impl std::fmt::Display for MessageSetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageSetId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// (message set, sequence number) pair with a 1-based sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    message_set: MessageSetId,
    sequence: u32,
}

impl Position {
    /// Create position, rejecting sequence number 0
    pub fn new(message_set: u64, sequence: u32) -> Result<Self, PositionError> {
        let message_set = MessageSetId(message_set);
        if sequence == 0 {
            return Err(PositionError::ZeroSequence { message_set });
        }
        Ok(Self {
            message_set,
            sequence,
        })
    }

    /// Message set of this position
    #[inline]
    #[must_use]
    pub fn message_set(&self) -> MessageSetId {
        self.message_set
    }

    /// Sequence number, always >= 1
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.message_set, self.sequence)
    }
}

/// Subject of a migration, as supplied in a batch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IdentityWire")]
pub struct Identity {
    /// Opaque identity id
    pub id: String,
    /// Preferred language code
    pub language: String,
    /// Position the identity has reached
    pub current: Position,
    /// Position the identity should be at
    pub expected: Position,
}

/// Flat record shape used by batch files
#[derive(Deserialize)]
struct IdentityWire {
    identity: String,
    language: String,
    current_messageset_id: u64,
    current_sequence_number: u32,
    expected_messageset_id: u64,
    expected_sequence_number: u32,
}

impl TryFrom<IdentityWire> for Identity {
    type Error = PositionError;

    fn try_from(wire: IdentityWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.identity,
            language: wire.language,
            current: Position::new(wire.current_messageset_id, wire.current_sequence_number)?,
            expected: Position::new(wire.expected_messageset_id, wire.expected_sequence_number)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_rejects_zero() {
        assert_eq!(
            Position::new(3, 0),
            Err(PositionError::ZeroSequence {
                message_set: MessageSetId(3)
            })
        );
        assert_eq!(Position::new(3, 1).unwrap().sequence(), 1);
    }

    #[test]
    fn identity_from_batch_record() {
        let line = r#"{"identity": "abc-123", "language": "eng_ZA",
            "current_messageset_id": 3, "current_sequence_number": 10,
            "expected_messageset_id": 4, "expected_sequence_number": 2,
            "extra": "ignored"}"#;
        let identity: Identity = serde_json::from_str(line).unwrap();

        assert_eq!(identity.id, "abc-123");
        assert_eq!(identity.language, "eng_ZA");
        assert_eq!(identity.current, Position::new(3, 10).unwrap());
        assert_eq!(identity.expected, Position::new(4, 2).unwrap());
    }

    #[test]
    fn identity_with_zero_sequence_is_rejected() {
        let line = r#"{"identity": "abc", "language": "eng_ZA",
            "current_messageset_id": 3, "current_sequence_number": 0,
            "expected_messageset_id": 4, "expected_sequence_number": 2}"#;
        let err = serde_json::from_str::<Identity>(line).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn position_display() {
        assert_eq!(Position::new(8, 29).unwrap().to_string(), "8#29");
    }
}
