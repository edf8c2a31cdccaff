//! Scenario shapes
//!
//! Every migration tool is driven by one [`Scenario`]. The shape decides
//! how positions are remapped; the orchestrator never branches on it.

use crate::cumulative::CumulativeScenario;
use crate::position::MessageSetId;
use crate::threshold::ThresholdScenario;
use std::collections::HashSet;

/// Subscribe every recognized identity to one message set from the start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedScenario {
    destination: MessageSetId,
    /// `None` recognizes every message set
    sources: Option<HashSet<MessageSetId>>,
}

impl FixedScenario {
    /// Scenario covering identities on any message set
    #[must_use]
    pub fn new(destination: MessageSetId) -> Self {
        Self {
            destination,
            sources: None,
        }
    }

    /// Restrict the scenario to identities currently on `sources`
    #[must_use]
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = MessageSetId>) -> Self {
        self.sources = Some(sources.into_iter().collect());
        self
    }

    /// Destination message set
    #[inline]
    #[must_use]
    pub fn destination(&self) -> MessageSetId {
        self.destination
    }

    /// Whether identities on `message_set` are covered
    #[must_use]
    pub fn contains(&self, message_set: MessageSetId) -> bool {
        self.sources
            .as_ref()
            .map_or(true, |sources| sources.contains(&message_set))
    }
}

/// Statically configured migration topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    /// Stage chained important messages (PMTCT)
    Cumulative(CumulativeScenario),
    /// Fast-forward thresholds (postbirth immunisation)
    Threshold(ThresholdScenario),
    /// Single destination (service disruption)
    Fixed(FixedScenario),
}

impl Scenario {
    /// Short name of the shape, used in logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Scenario::Cumulative(_) => "cumulative",
            Scenario::Threshold(_) => "threshold",
            Scenario::Fixed(_) => "fixed",
        }
    }

    /// Destinations known before any identity is resolved
    ///
    /// Their schedules can be fetched up front.
    #[must_use]
    pub fn static_destinations(&self) -> Vec<MessageSetId> {
        match self {
            Scenario::Fixed(fixed) => vec![fixed.destination()],
            Scenario::Cumulative(_) | Scenario::Threshold(_) => Vec::new(),
        }
    }
}

impl From<CumulativeScenario> for Scenario {
    fn from(value: CumulativeScenario) -> Self {
        Scenario::Cumulative(value)
    }
}

impl From<ThresholdScenario> for Scenario {
    fn from(value: ThresholdScenario) -> Self {
        Scenario::Threshold(value)
    }
}

impl From<FixedScenario> for Scenario {
    fn from(value: FixedScenario) -> Self {
        Scenario::Fixed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_without_sources_covers_everything() {
        let fixed = FixedScenario::new(MessageSetId(44));
        assert!(fixed.contains(MessageSetId(1)));
        assert!(fixed.contains(MessageSetId(44)));
    }

    #[test]
    fn fixed_with_sources_is_restricted() {
        let fixed = FixedScenario::new(MessageSetId(44)).with_sources([MessageSetId(2)]);
        assert!(fixed.contains(MessageSetId(2)));
        assert!(!fixed.contains(MessageSetId(3)));
    }

    #[test]
    fn only_fixed_has_static_destinations() {
        let fixed: Scenario = FixedScenario::new(MessageSetId(44)).into();
        assert_eq!(fixed.static_destinations(), vec![MessageSetId(44)]);
        assert_eq!(fixed.kind(), "fixed");
    }
}
