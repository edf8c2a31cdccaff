//! TOML scenario files
//!
//! ```toml
//! kind = "cumulative"
//! destinations = [100, 101, 102, 103]
//!
//! [[stages]]
//! message_set = 3
//! important = [8, 15, 24]
//!
//! [[stages]]
//! message_set = 4
//! important = [2]
//! ```
//!
//! `kind` selects the shape: `cumulative`, `threshold` (with `[[tracks]]`
//! and optional `feeders`) or `fixed` (with `destination` and optional
//! `sources`).

use crate::error::{MigrateError, MigrateResult};
use crate::input::read_file;
use sbm_model::{
    CumulativeScenario, FixedScenario, MessageSetId, Scenario, ScenarioError, Stage,
    ThresholdScenario, Track,
};
use serde::Deserialize;
use std::path::Path;

/// Raw scenario file contents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioFile {
    Cumulative {
        stages: Vec<Stage>,
        destinations: Vec<MessageSetId>,
    },
    Threshold {
        tracks: Vec<Track>,
        #[serde(default)]
        feeders: Option<Vec<MessageSetId>>,
    },
    Fixed {
        destination: MessageSetId,
        #[serde(default)]
        sources: Option<Vec<MessageSetId>>,
    },
}

impl ScenarioFile {
    /// Parse TOML text
    ///
    /// # Errors
    /// [`MigrateError::ScenarioFile`] when the text is not a scenario.
    pub fn parse(text: &str) -> MigrateResult<Self> {
        toml::from_str(text).map_err(|error| MigrateError::ScenarioFile(error.to_string()))
    }

    /// Validate into a scenario
    ///
    /// # Errors
    /// [`ScenarioError`] when the topology is inconsistent.
    pub fn into_scenario(self) -> Result<Scenario, ScenarioError> {
        Ok(match self {
            Self::Cumulative {
                stages,
                destinations,
            } => CumulativeScenario::new(stages, destinations)?.into(),
            Self::Threshold { tracks, feeders } => {
                let threshold = ThresholdScenario::new(tracks)?;
                match feeders {
                    Some(feeders) => threshold.with_feeders(feeders),
                    None => threshold,
                }
                .into()
            }
            Self::Fixed {
                destination,
                sources,
            } => {
                let fixed = FixedScenario::new(destination);
                match sources {
                    Some(sources) => fixed.with_sources(sources),
                    None => fixed,
                }
                .into()
            }
        })
    }
}

/// Read, parse and validate a scenario file
///
/// # Errors
/// Any usage error: unreadable file, bad TOML or inconsistent scenario.
pub fn load_scenario(path: &Path) -> MigrateResult<Scenario> {
    let scenario = ScenarioFile::parse(&read_file(path)?)?.into_scenario()?;
    tracing::debug!(path = %path.display(), kind = scenario.kind(), "scenario loaded");
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbm_model::{resolve, Decision, Position};

    #[test]
    fn parses_cumulative() {
        let file = ScenarioFile::parse(
            r#"
            kind = "cumulative"
            destinations = [100, 101, 102, 103]

            [[stages]]
            message_set = 3
            important = [8, 15, 24]

            [[stages]]
            message_set = 4
            important = [2]
            "#,
        )
        .unwrap();
        let scenario = file.into_scenario().unwrap();

        assert_eq!(
            resolve(
                &scenario,
                Position::new(3, 10).unwrap(),
                Position::new(4, 2).unwrap()
            ),
            Decision::migrate(MessageSetId(102), 2)
        );
    }

    #[test]
    fn parses_threshold_with_feeders() {
        let scenario = ScenarioFile::parse(
            r#"
            kind = "threshold"
            feeders = [12]

            [[tracks]]
            message_set = 8
            thresholds = [
                { sequence = 13, destination = 200 },
                { sequence = 29, destination = 202 },
            ]
            "#,
        )
        .unwrap()
        .into_scenario()
        .unwrap();

        assert_eq!(scenario.kind(), "threshold");
        assert_eq!(
            resolve(
                &scenario,
                Position::new(12, 4).unwrap(),
                Position::new(8, 14).unwrap()
            ),
            Decision::migrate(MessageSetId(200), 1)
        );
        assert_eq!(
            resolve(
                &scenario,
                Position::new(99, 4).unwrap(),
                Position::new(8, 14).unwrap()
            ),
            Decision::NoMigration
        );
    }

    #[test]
    fn parses_fixed_without_sources() {
        let scenario = ScenarioFile::parse("kind = \"fixed\"\ndestination = 55\n")
            .unwrap()
            .into_scenario()
            .unwrap();
        assert_eq!(scenario.static_destinations(), vec![MessageSetId(55)]);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = ScenarioFile::parse("kind = \"graph\"\n").unwrap_err();
        assert!(matches!(err, MigrateError::ScenarioFile(_)));
    }

    #[test]
    fn destination_count_is_validated() {
        let err = ScenarioFile::parse(
            r#"
            kind = "cumulative"
            destinations = [100]

            [[stages]]
            message_set = 3
            important = [8, 15]
            "#,
        )
        .unwrap()
        .into_scenario()
        .unwrap_err();
        assert_eq!(err, ScenarioError::destination_count(2, 1));
    }
}
