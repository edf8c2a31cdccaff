//! Migration resolver
//!
//! Pure and total: every well-formed (scenario, old, expected) triple maps
//! to exactly one [`Decision`].

use crate::cumulative::CumulativeScenario;
use crate::position::{MessageSetId, Position};
use crate::scenario::{FixedScenario, Scenario};
use crate::threshold::ThresholdScenario;

/// Outcome of resolving one identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing was skipped, nothing to send
    NoMigration,
    /// Subscribe to `destination` starting at `resume_at`
    Migrate {
        /// Destination message set
        destination: MessageSetId,
        /// 1-based sequence number to resume at
        resume_at: u32,
    },
}

impl Decision {
    /// Create migrate decision
    #[inline]
    #[must_use]
    pub fn migrate(destination: MessageSetId, resume_at: u32) -> Self {
        Self::Migrate {
            destination,
            resume_at,
        }
    }
}

/// A scenario shape that can remap positions
pub trait Resolver {
    /// Whether `message_set` takes part in the scenario at all
    fn recognizes(&self, message_set: MessageSetId) -> bool;

    /// Decide the migration for a subscriber at `old` who should be at `expected`
    fn decide(&self, old: Position, expected: Position) -> Decision;
}

impl Resolver for CumulativeScenario {
    fn recognizes(&self, message_set: MessageSetId) -> bool {
        self.contains(message_set)
    }

    fn decide(&self, old: Position, expected: Position) -> Decision {
        let (Some(start), Some(end)) = (self.start_index(old), self.end_index(expected)) else {
            return Decision::NoMigration;
        };
        if start > end {
            return Decision::NoMigration;
        }
        match (self.destination_for(end), u32::try_from(start)) {
            (Some(destination), Ok(resume_at)) => Decision::migrate(destination, resume_at),
            _ => Decision::NoMigration,
        }
    }
}

impl Resolver for ThresholdScenario {
    fn recognizes(&self, message_set: MessageSetId) -> bool {
        self.contains(message_set)
    }

    fn decide(&self, old: Position, expected: Position) -> Decision {
        self.owed(old, expected)
            .map_or(Decision::NoMigration, |t| Decision::migrate(t.destination, 1))
    }
}

impl Resolver for FixedScenario {
    fn recognizes(&self, message_set: MessageSetId) -> bool {
        self.contains(message_set)
    }

    fn decide(&self, old: Position, _expected: Position) -> Decision {
        if self.contains(old.message_set()) {
            Decision::migrate(self.destination(), 1)
        } else {
            Decision::NoMigration
        }
    }
}

impl Resolver for Scenario {
    fn recognizes(&self, message_set: MessageSetId) -> bool {
        match self {
            Scenario::Cumulative(s) => s.recognizes(message_set),
            Scenario::Threshold(s) => s.recognizes(message_set),
            Scenario::Fixed(s) => s.recognizes(message_set),
        }
    }

    fn decide(&self, old: Position, expected: Position) -> Decision {
        if !self.recognizes(old.message_set()) {
            return Decision::NoMigration;
        }
        match self {
            Scenario::Cumulative(s) => s.decide(old, expected),
            Scenario::Threshold(s) => s.decide(old, expected),
            Scenario::Fixed(s) => s.decide(old, expected),
        }
    }
}

/// Resolve the migration for one identity
#[inline]
#[must_use]
pub fn resolve(scenario: &Scenario, old: Position, expected: Position) -> Decision {
    scenario.decide(old, expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cumulative::Stage;
    use proptest::prelude::*;

    fn pmtct() -> Scenario {
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
        .into()
    }

    fn pos(set: u64, seq: u32) -> Position {
        Position::new(set, seq).unwrap()
    }

    #[test]
    fn stage_three_to_stage_four() {
        assert_eq!(
            resolve(&pmtct(), pos(3, 10), pos(4, 2)),
            Decision::migrate(MessageSetId(102), 2)
        );
    }

    #[test]
    fn nothing_skipped_is_no_migration() {
        // 8 is still owed but expected exactly at 8, the expected schedule sends it
        assert_eq!(resolve(&pmtct(), pos(3, 5), pos(3, 8)), Decision::NoMigration);
        assert_eq!(resolve(&pmtct(), pos(3, 16), pos(3, 20)), Decision::NoMigration);
    }

    #[test]
    fn spans_whole_chain() {
        assert_eq!(
            resolve(&pmtct(), pos(3, 1), pos(1, 20)),
            Decision::migrate(MessageSetId(107), 1)
        );
    }

    #[test]
    fn unknown_old_set_is_no_migration_for_every_shape() {
        let threshold: Scenario = ThresholdScenario::immunisation([1, 2, 3, 4].map(MessageSetId))
            .unwrap()
            .with_feeders([MessageSetId(6)])
            .into();
        let fixed: Scenario = FixedScenario::new(MessageSetId(44))
            .with_sources([MessageSetId(2)])
            .into();

        for scenario in [pmtct(), threshold, fixed] {
            assert_eq!(resolve(&scenario, pos(999, 3), pos(8, 30)), Decision::NoMigration);
        }
    }

    #[test]
    fn threshold_resumes_at_one() {
        let scenario: Scenario =
            ThresholdScenario::immunisation([113, 121, 129, 136].map(MessageSetId))
                .unwrap()
                .into();
        assert_eq!(
            resolve(&scenario, pos(8, 29), pos(8, 30)),
            Decision::migrate(MessageSetId(129), 1)
        );
    }

    #[test]
    fn fixed_always_starts_at_one() {
        let scenario: Scenario = FixedScenario::new(MessageSetId(44)).into();
        assert_eq!(
            resolve(&scenario, pos(7, 12), pos(7, 12)),
            Decision::migrate(MessageSetId(44), 1)
        );
    }

    fn stage_tables() -> impl Strategy<Value = Vec<Vec<u32>>> {
        proptest::collection::vec(
            proptest::collection::btree_set(1..40u32, 0..5)
                .prop_map(|set| set.into_iter().collect::<Vec<_>>()),
            1..5,
        )
        .prop_filter("needs an important message", |stages| {
            stages.iter().any(|s| !s.is_empty())
        })
    }

    proptest! {
        #[test]
        fn prop_decision_matches_boundaries(
            tables in stage_tables(),
            old_stage in 0..5usize,
            old_seq in 1..45u32,
            new_stage in 0..5usize,
            new_seq in 1..45u32,
        ) {
            let total: usize = tables.iter().map(Vec::len).sum();
            let stages: Vec<Stage> = tables
                .iter()
                .enumerate()
                .map(|(i, seqs)| Stage::new(i as u64 + 1, seqs.iter().copied()))
                .collect();
            let scenario = CumulativeScenario::new(
                stages,
                (0..total as u64).map(|i| MessageSetId(1000 + i)),
            )
            .unwrap();

            let old = pos(old_stage as u64 + 1, old_seq);
            let new = pos(new_stage as u64 + 1, new_seq);
            let decision = scenario.decide(old, new);

            match (scenario.start_index(old), scenario.end_index(new)) {
                (Some(start), Some(end)) if start <= end => {
                    prop_assert_eq!(
                        decision,
                        Decision::migrate(MessageSetId(1000 + end as u64 - 1), start as u32)
                    );
                    prop_assert!(start >= 1 && end <= total);
                }
                _ => prop_assert_eq!(decision, Decision::NoMigration),
            }
        }
    }
}
