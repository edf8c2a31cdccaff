//! Cumulative (stage chained) scenarios
//!
//! A cumulative scenario is an ordered list of [`Stage`]s. Walking the
//! stages in order and each stage's important sequence numbers in order
//! gives every important message a 1-based cumulative index. Destination
//! message set `k` delivers important messages `1..=k`, so a subscriber who
//! missed messages `start..=end` is subscribed to destination `end` at
//! sequence `start`.

use crate::error::ScenarioError;
use crate::position::{MessageSetId, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One message set's contribution of important messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Message set the important messages belong to
    pub message_set: MessageSetId,
    /// Important sequence numbers, strictly increasing
    #[serde(default)]
    pub important: Vec<u32>,
}

impl Stage {
    /// Create stage
    #[must_use]
    pub fn new(message_set: u64, important: impl IntoIterator<Item = u32>) -> Self {
        Self {
            message_set: MessageSetId(message_set),
            important: important.into_iter().collect(),
        }
    }
}

/// Validated cumulative scenario with precomputed stage offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeScenario {
    stages: Vec<Stage>,
    /// Message set → position in `stages`
    order: HashMap<MessageSetId, usize>,
    /// Number of important messages in all stages before each stage
    offsets: Vec<usize>,
    /// Destination for cumulative index `k` lives at `destinations[k - 1]`
    destinations: Vec<MessageSetId>,
}

impl CumulativeScenario {
    /// Build and validate scenario
    ///
    /// # Errors
    /// - [`ScenarioError::Empty`] / [`ScenarioError::NoImportantMessages`]
    /// - [`ScenarioError::DuplicateMessageSet`] when a stage repeats
    /// - [`ScenarioError::ZeroSequence`] / [`ScenarioError::Unordered`] for bad sequences
    /// - [`ScenarioError::DestinationCount`] unless there is one destination per important message
    pub fn new(
        stages: Vec<Stage>,
        destinations: impl IntoIterator<Item = MessageSetId>,
    ) -> Result<Self, ScenarioError> {
        if stages.is_empty() {
            return Err(ScenarioError::Empty);
        }

        let mut order = HashMap::with_capacity(stages.len());
        let mut offsets = Vec::with_capacity(stages.len());
        let mut total = 0usize;

        for (i, stage) in stages.iter().enumerate() {
            if order.insert(stage.message_set, i).is_some() {
                return Err(ScenarioError::DuplicateMessageSet(stage.message_set));
            }
            validate_sequences(stage.message_set, &stage.important)?;
            offsets.push(total);
            total += stage.important.len();
        }

        if total == 0 {
            return Err(ScenarioError::NoImportantMessages);
        }

        let destinations: Vec<MessageSetId> = destinations.into_iter().collect();
        if destinations.len() != total {
            return Err(ScenarioError::destination_count(total, destinations.len()));
        }

        Ok(Self {
            stages,
            order,
            offsets,
            destinations,
        })
    }

    /// Total important messages across all stages
    #[inline]
    #[must_use]
    pub fn total_important_count(&self) -> usize {
        self.destinations.len()
    }

    /// Whether the message set is one of the stages
    #[inline]
    #[must_use]
    pub fn contains(&self, message_set: MessageSetId) -> bool {
        self.order.contains_key(&message_set)
    }

    /// Cumulative index of an important message, `None` if not important
    #[must_use]
    pub fn cumulative_index(&self, message_set: MessageSetId, sequence: u32) -> Option<usize> {
        let i = *self.order.get(&message_set)?;
        let rank = self.stages[i].important.binary_search(&sequence).ok()?;
        Some(self.offsets[i] + rank + 1)
    }

    /// First important message still owed to a subscriber at `old`
    ///
    /// An exact hit on an important sequence is still owed.
    #[must_use]
    pub fn start_index(&self, old: Position) -> Option<usize> {
        let i = *self.order.get(&old.message_set())?;
        let before = self.stages[i]
            .important
            .partition_point(|&seq| seq < old.sequence());
        let start = self.offsets[i] + before + 1;
        (start <= self.total_important_count()).then_some(start)
    }

    /// Last important message a subscriber reaching `expected` skipped
    ///
    /// An exact hit is excluded, the expected schedule delivers it.
    #[must_use]
    pub fn end_index(&self, expected: Position) -> Option<usize> {
        let i = *self.order.get(&expected.message_set())?;
        let before = self.stages[i]
            .important
            .partition_point(|&seq| seq < expected.sequence());
        let end = self.offsets[i] + before;
        (end > 0).then_some(end)
    }

    /// Destination message set delivering important messages `1..=index`
    #[must_use]
    pub fn destination_for(&self, index: usize) -> Option<MessageSetId> {
        index
            .checked_sub(1)
            .and_then(|i| self.destinations.get(i))
            .copied()
    }
}

pub(crate) fn validate_sequences(
    message_set: MessageSetId,
    sequences: &[u32],
) -> Result<(), ScenarioError> {
    if sequences.first() == Some(&0) {
        return Err(ScenarioError::ZeroSequence(message_set));
    }
    if sequences.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(ScenarioError::Unordered(message_set));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pmtct() -> CumulativeScenario {
        CumulativeScenario::new(
            vec![
                Stage::new(3, [8, 15, 24]),
                Stage::new(4, [2]),
                Stage::new(5, [5]),
                Stage::new(1, [6, 15, 17]),
            ],
            (100..108).map(MessageSetId),
        )
        .unwrap()
    }

    fn pos(set: u64, seq: u32) -> Position {
        Position::new(set, seq).unwrap()
    }

    #[test]
    fn cumulative_index_walks_stages_in_order() {
        let scenario = pmtct();

        assert_eq!(scenario.total_important_count(), 8);
        assert_eq!(scenario.cumulative_index(MessageSetId(3), 8), Some(1));
        assert_eq!(scenario.cumulative_index(MessageSetId(3), 24), Some(3));
        assert_eq!(scenario.cumulative_index(MessageSetId(4), 2), Some(4));
        assert_eq!(scenario.cumulative_index(MessageSetId(1), 6), Some(6));
        assert_eq!(scenario.cumulative_index(MessageSetId(1), 17), Some(8));
    }

    #[test]
    fn cumulative_index_misses_are_none() {
        let scenario = pmtct();

        assert_eq!(scenario.cumulative_index(MessageSetId(3), 9), None);
        assert_eq!(scenario.cumulative_index(MessageSetId(9), 8), None);
    }

    #[test]
    fn start_exact_hit_is_still_owed() {
        let scenario = pmtct();

        assert_eq!(scenario.start_index(pos(3, 8)), Some(1));
        assert_eq!(scenario.start_index(pos(3, 9)), Some(2));
        assert_eq!(scenario.start_index(pos(3, 10)), Some(2));
    }

    #[test]
    fn start_rolls_into_next_stage() {
        let scenario = pmtct();

        // past 24 in stage 3, next owed is stage 4's first
        assert_eq!(scenario.start_index(pos(3, 30)), Some(4));
        assert_eq!(scenario.start_index(pos(1, 18)), None);
    }

    #[test]
    fn end_exact_hit_is_excluded() {
        let scenario = pmtct();

        assert_eq!(scenario.end_index(pos(4, 2)), Some(3));
        assert_eq!(scenario.end_index(pos(4, 3)), Some(4));
        assert_eq!(scenario.end_index(pos(3, 8)), None);
        assert_eq!(scenario.end_index(pos(3, 9)), Some(1));
    }

    #[test]
    fn unknown_sets_have_no_boundaries() {
        let scenario = pmtct();

        assert_eq!(scenario.start_index(pos(42, 1)), None);
        assert_eq!(scenario.end_index(pos(42, 1)), None);
    }

    #[test]
    fn stages_without_important_messages_are_passed_through() {
        let scenario = CumulativeScenario::new(
            vec![Stage::new(1, [3]), Stage::new(2, []), Stage::new(5, [4])],
            [MessageSetId(10), MessageSetId(11)],
        )
        .unwrap();

        assert_eq!(scenario.start_index(pos(2, 1)), Some(2));
        assert_eq!(scenario.end_index(pos(2, 9)), Some(1));
    }

    #[test]
    fn destination_table_is_one_based() {
        let scenario = pmtct();

        assert_eq!(scenario.destination_for(0), None);
        assert_eq!(scenario.destination_for(1), Some(MessageSetId(100)));
        assert_eq!(scenario.destination_for(8), Some(MessageSetId(107)));
        assert_eq!(scenario.destination_for(9), None);
    }

    #[test]
    fn rejects_destination_count_mismatch() {
        let err = CumulativeScenario::new(vec![Stage::new(3, [8, 15])], [MessageSetId(1)])
            .unwrap_err();
        assert_eq!(err, ScenarioError::destination_count(2, 1));
    }

    #[test]
    fn rejects_bad_stage_tables() {
        let dup = CumulativeScenario::new(
            vec![Stage::new(3, [8]), Stage::new(3, [9])],
            [MessageSetId(1), MessageSetId(2)],
        );
        assert_eq!(dup.unwrap_err(), ScenarioError::DuplicateMessageSet(MessageSetId(3)));

        let unordered = CumulativeScenario::new(
            vec![Stage::new(3, [8, 8])],
            [MessageSetId(1), MessageSetId(2)],
        );
        assert_eq!(unordered.unwrap_err(), ScenarioError::Unordered(MessageSetId(3)));

        let zero = CumulativeScenario::new(vec![Stage::new(3, [0])], [MessageSetId(1)]);
        assert_eq!(zero.unwrap_err(), ScenarioError::ZeroSequence(MessageSetId(3)));

        let empty = CumulativeScenario::new(vec![Stage::new(3, [])], []);
        assert_eq!(empty.unwrap_err(), ScenarioError::NoImportantMessages);

        assert_eq!(
            CumulativeScenario::new(vec![], []).unwrap_err(),
            ScenarioError::Empty
        );
    }
}
