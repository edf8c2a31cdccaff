//! Threshold (fast-forward) scenarios
//!
//! Tracks are message sets a subscriber moves through in order. Each track
//! holds thresholds: sequence numbers whose message must be delivered when a
//! subscriber is fast-forwarded past them. Each threshold has its own
//! destination message set which is always started at sequence 1.

use crate::cumulative::validate_sequences;
use crate::error::ScenarioError;
use crate::position::{MessageSetId, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sequence number whose message must not be skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    /// Sequence number in the track
    pub sequence: u32,
    /// Message set delivering the message
    pub destination: MessageSetId,
}

impl Threshold {
    /// Create threshold
    #[must_use]
    pub fn new(sequence: u32, destination: u64) -> Self {
        Self {
            sequence,
            destination: MessageSetId(destination),
        }
    }
}

/// Message set with its thresholds, ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Message set of the track
    pub message_set: MessageSetId,
    /// Thresholds, strictly increasing by sequence
    pub thresholds: Vec<Threshold>,
}

impl Track {
    /// Create track
    #[must_use]
    pub fn new(message_set: u64, thresholds: impl IntoIterator<Item = Threshold>) -> Self {
        Self {
            message_set: MessageSetId(message_set),
            thresholds: thresholds.into_iter().collect(),
        }
    }

    fn last(&self) -> Option<&Threshold> {
        self.thresholds.last()
    }
}

/// Validated threshold scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdScenario {
    tracks: Vec<Track>,
    /// Sets a subscriber may enter a track from; `None` admits any set
    feeders: Option<HashSet<MessageSetId>>,
}

impl ThresholdScenario {
    /// Build and validate scenario
    ///
    /// Without [`Self::with_feeders`] a subscriber may enter a track from any
    /// message set.
    ///
    /// # Errors
    /// [`ScenarioError`] when there are no tracks, a track repeats or is empty,
    /// or its thresholds are not strictly increasing.
    pub fn new(tracks: Vec<Track>) -> Result<Self, ScenarioError> {
        if tracks.is_empty() {
            return Err(ScenarioError::Empty);
        }

        let mut seen = HashSet::with_capacity(tracks.len());
        for track in &tracks {
            if !seen.insert(track.message_set) {
                return Err(ScenarioError::DuplicateMessageSet(track.message_set));
            }
            if track.thresholds.is_empty() {
                return Err(ScenarioError::EmptyTrack(track.message_set));
            }
            let sequences: Vec<u32> = track.thresholds.iter().map(|t| t.sequence).collect();
            validate_sequences(track.message_set, &sequences)?;
        }

        Ok(Self {
            tracks,
            feeders: None,
        })
    }

    /// Only recognise old positions on a track or on one of `feeders`
    #[must_use]
    pub fn with_feeders(mut self, feeders: impl IntoIterator<Item = MessageSetId>) -> Self {
        let feeders = feeders
            .into_iter()
            .filter(|set| self.track_index(*set).is_none())
            .collect();
        self.feeders = Some(feeders);
        self
    }

    /// Postbirth immunisation table
    ///
    /// `destinations` are, in delivery order, the sets sending message 13,
    /// 21 and 29 of set 8 and message 36 of set 7.
    ///
    /// # Errors
    /// As [`Self::new`].
    pub fn immunisation(destinations: [MessageSetId; 4]) -> Result<Self, ScenarioError> {
        let [send_13, send_21, send_29, send_36] = destinations.map(|d| d.0);
        Self::new(vec![
            Track::new(
                8,
                [
                    Threshold::new(13, send_13),
                    Threshold::new(21, send_21),
                    Threshold::new(29, send_29),
                ],
            ),
            Track::new(7, [Threshold::new(36, send_36)]),
        ])
    }

    /// Whether the message set is a track or a feeder
    #[must_use]
    pub fn contains(&self, message_set: MessageSetId) -> bool {
        self.track_index(message_set).is_some()
            || self
                .feeders
                .as_ref()
                .map_or(true, |feeders| feeders.contains(&message_set))
    }

    fn track_index(&self, message_set: MessageSetId) -> Option<usize> {
        self.tracks.iter().position(|t| t.message_set == message_set)
    }

    /// Threshold whose message is owed, if any
    #[must_use]
    pub fn owed(&self, old: Position, expected: Position) -> Option<&Threshold> {
        if !self.contains(old.message_set()) {
            return None;
        }
        let ti = self.track_index(expected.message_set())?;
        let track = &self.tracks[ti];

        if old.message_set() == expected.message_set() {
            // fast-forwarding within the track
            return track
                .thresholds
                .iter()
                .rev()
                .find(|t| old.sequence() <= t.sequence && expected.sequence() > t.sequence);
        }

        track
            .thresholds
            .iter()
            .rev()
            .find(|t| expected.sequence() > t.sequence)
            .or_else(|| {
                // entering the track without finishing the previous one
                let previous = &self.tracks[ti.checked_sub(1)?];
                let last = previous.last()?;
                let finished =
                    old.message_set() == previous.message_set && old.sequence() > last.sequence;
                (!finished).then_some(last)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEND_13: MessageSetId = MessageSetId(113);
    const SEND_21: MessageSetId = MessageSetId(121);
    const SEND_29: MessageSetId = MessageSetId(129);
    const SEND_36: MessageSetId = MessageSetId(136);

    fn immunisation() -> ThresholdScenario {
        ThresholdScenario::immunisation([SEND_13, SEND_21, SEND_29, SEND_36])
            .unwrap()
            .with_feeders([MessageSetId(6)])
    }

    fn owed(old: (u64, u32), new: (u64, u32)) -> Option<MessageSetId> {
        immunisation()
            .owed(
                Position::new(old.0, old.1).unwrap(),
                Position::new(new.0, new.1).unwrap(),
            )
            .map(|t| t.destination)
    }

    #[test]
    fn within_track_picks_highest_crossed_threshold() {
        assert_eq!(owed((8, 29), (8, 30)), Some(SEND_29));
        assert_eq!(owed((8, 10), (8, 30)), Some(SEND_29));
        assert_eq!(owed((8, 10), (8, 22)), Some(SEND_21));
        assert_eq!(owed((8, 13), (8, 14)), Some(SEND_13));
        assert_eq!(owed((7, 36), (7, 40)), Some(SEND_36));
    }

    #[test]
    fn within_track_without_crossing_is_none() {
        assert_eq!(owed((8, 14), (8, 21)), None);
        assert_eq!(owed((8, 30), (8, 40)), None);
        assert_eq!(owed((7, 37), (7, 40)), None);
    }

    #[test]
    fn entering_first_track() {
        assert_eq!(owed((6, 40), (8, 30)), Some(SEND_29));
        assert_eq!(owed((6, 40), (8, 14)), Some(SEND_13));
        assert_eq!(owed((6, 40), (8, 13)), None);
    }

    #[test]
    fn entering_second_track_owes_last_message_of_first() {
        assert_eq!(owed((8, 20), (7, 3)), Some(SEND_29));
        assert_eq!(owed((8, 29), (7, 3)), Some(SEND_29));
        assert_eq!(owed((6, 1), (7, 3)), Some(SEND_29));
        assert_eq!(owed((8, 30), (7, 3)), None);
        assert_eq!(owed((8, 30), (7, 37)), Some(SEND_36));
    }

    #[test]
    fn unrecognized_old_set_is_none() {
        assert_eq!(owed((99, 1), (8, 30)), None);
        assert_eq!(owed((8, 1), (99, 30)), None);
    }

    #[test]
    fn without_feeders_any_set_enters_a_track() {
        let scenario =
            ThresholdScenario::immunisation([SEND_13, SEND_21, SEND_29, SEND_36]).unwrap();
        let owed = |old: (u64, u32), new: (u64, u32)| {
            scenario
                .owed(
                    Position::new(old.0, old.1).unwrap(),
                    Position::new(new.0, new.1).unwrap(),
                )
                .map(|t| t.destination)
        };

        assert!(scenario.contains(MessageSetId(99)));
        assert_eq!(owed((6, 40), (8, 30)), Some(SEND_29));
        assert_eq!(owed((5, 3), (7, 3)), Some(SEND_29));
        assert_eq!(owed((99, 1), (8, 22)), Some(SEND_21));
        assert_eq!(owed((8, 1), (99, 30)), None);
    }

    #[test]
    fn feeders_overlapping_tracks_are_ignored() {
        let scenario = ThresholdScenario::new(vec![Track::new(8, [Threshold::new(13, 1)])])
            .unwrap()
            .with_feeders([MessageSetId(8)]);
        assert!(scenario.contains(MessageSetId(8)));
        assert!(!scenario.contains(MessageSetId(6)));
    }

    #[test]
    fn rejects_invalid_tracks() {
        assert_eq!(
            ThresholdScenario::new(vec![Track::new(8, [])]).unwrap_err(),
            ScenarioError::EmptyTrack(MessageSetId(8))
        );
        assert_eq!(
            ThresholdScenario::new(vec![Track::new(
                8,
                [Threshold::new(21, 1), Threshold::new(13, 2)]
            )])
            .unwrap_err(),
            ScenarioError::Unordered(MessageSetId(8))
        );
        assert_eq!(
            ThresholdScenario::new(vec![]).unwrap_err(),
            ScenarioError::Empty
        );
    }
}
