//! Per identity outcomes and the run report
//!
//! Each outcome renders as the single progress line printed for its
//! identity; [`RunReport::summary`] is the last line of a run.

use sbm_model::MessageSetId;
use std::fmt;

/// What happened to one identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Old set not in the scenario, or nothing owed
    NoMigration,
    /// Active subscription to the destination already exists
    AlreadySubscribed { message_set: MessageSetId },
    /// Still receiving messages from the set being replaced
    StillActive { message_set: MessageSetId },
    /// Opted out on every address
    OptedOut,
    /// Identity store does not know the identity
    UnknownIdentity,
    /// Subscription created
    Created {
        message_set: MessageSetId,
        resume_at: u32,
    },
    /// Dry run, subscription would have been created
    WouldCreate {
        message_set: MessageSetId,
        resume_at: u32,
    },
    /// Destination schedule could not be fetched
    ScheduleFailed {
        message_set: MessageSetId,
        status: Option<u16>,
    },
    /// Existence or identity lookup failed
    LookupFailed { status: Option<u16> },
    /// Service rejected the subscription
    CreateFailed { status: Option<u16> },
}

impl Outcome {
    /// Check if the outcome is a per identity failure
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ScheduleFailed { .. } | Self::LookupFailed { .. } | Self::CreateFailed { .. }
        )
    }
}

/// Outcome for one identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityOutcome {
    pub identity: String,
    pub outcome: Outcome,
}

impl IdentityOutcome {
    pub fn new(identity: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            identity: identity.into(),
            outcome,
        }
    }
}

struct Code(Option<u16>);

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(status) => write!(f, "{status}"),
            None => f.write_str("none"),
        }
    }
}

impl fmt::Display for IdentityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.identity;
        match &self.outcome {
            Outcome::NoMigration => write!(f, "No migration - Identity: {id}"),
            Outcome::AlreadySubscribed { message_set } => write!(
                f,
                "Subscription creation skipped - Identity: {id} already subscribed to messageset {message_set}"
            ),
            Outcome::StillActive { message_set } => write!(
                f,
                "Subscription creation skipped - Identity: {id} still subscribed to old messageset {message_set}"
            ),
            Outcome::OptedOut => {
                write!(f, "Subscription creation skipped - Identity: {id} optedout")
            }
            Outcome::UnknownIdentity => write!(
                f,
                "Subscription creation skipped - Identity: {id} not found"
            ),
            Outcome::Created {
                message_set,
                resume_at,
            } => write!(
                f,
                "Subscription created - Identity: {id} Messageset: {message_set} Sequence: {resume_at}"
            ),
            Outcome::WouldCreate {
                message_set,
                resume_at,
            } => write!(
                f,
                "Would create subscription - Identity: {id} Messageset: {message_set} Sequence: {resume_at}"
            ),
            Outcome::ScheduleFailed {
                message_set,
                status,
            } => write!(
                f,
                "Schedule lookup failed - Identity: {id} Messageset: {message_set} Error code: {}",
                Code(*status)
            ),
            Outcome::LookupFailed { status } => write!(
                f,
                "Problem retrieving identity or subscriptions - Identity: {id} Error code: {}",
                Code(*status)
            ),
            Outcome::CreateFailed { status } => write!(
                f,
                "Subscription creation failed - Identity: {id} Error code: {}",
                Code(*status)
            ),
        }
    }
}

/// Outcomes of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    outcomes: Vec<IdentityOutcome>,
    created: usize,
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome
    pub fn record(&mut self, outcome: IdentityOutcome) {
        if matches!(outcome.outcome, Outcome::Created { .. }) {
            self.created += 1;
        }
        self.outcomes.push(outcome);
    }

    #[must_use]
    pub fn outcomes(&self) -> &[IdentityOutcome] {
        &self.outcomes
    }

    /// Subscriptions actually created
    #[inline]
    #[must_use]
    pub fn created(&self) -> usize {
        self.created
    }

    /// Per identity failures
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_failure()).count()
    }

    /// Final line of a run
    #[must_use]
    pub fn summary(&self) -> String {
        format!("Operation complete. {} Subscriptions created.", self.created)
    }
}
