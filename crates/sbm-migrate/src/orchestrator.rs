//! Batch migration driver
//!
//! Identities are processed one at a time through five steps:
//!
//! 1. skip identities whose current set is not part of the scenario
//! 2. resolve the decision
//! 3. skip when an active subscription to the destination exists
//! 4. look up the destination schedule through the run's cache
//! 5. create the subscription (honouring dry run)
//!
//! Failures in steps 3-5 are recorded against the identity and the run
//! moves on. Re-running a batch is safe: step 3 skips everything a
//! previous run created.

use crate::error::MigrateResult;
use crate::outcome::{IdentityOutcome, Outcome, RunReport};
use sbm_gateway::{Applied, MessagingApi, NewSubscription, ScheduleCache, SubscriptionFilter};
use sbm_model::{resolve, Decision, Identity, Resolver, Scenario};
use std::sync::Arc;

/// Orchestrator switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigratorOptions {
    /// Check for an existing active subscription before creating one
    pub check_duplicates: bool,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            check_duplicates: true,
        }
    }
}

/// Applies one scenario to batches of identities
pub struct Migrator {
    gateway: Arc<dyn MessagingApi>,
    schedules: ScheduleCache,
    scenario: Scenario,
    options: MigratorOptions,
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("mode", &self.gateway.mode())
            .field("scenario", &self.scenario.kind())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Migrator {
    /// Create migrator with a fresh schedule cache
    #[must_use]
    pub fn new(gateway: Arc<dyn MessagingApi>, scenario: Scenario) -> Self {
        Self {
            schedules: ScheduleCache::new(Arc::clone(&gateway)),
            gateway,
            scenario,
            options: MigratorOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: MigratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetch schedules of destinations known up front
    ///
    /// # Errors
    /// [`crate::MigrateError::Setup`] when any of them is unavailable.
    pub async fn prepare(&self) -> MigrateResult<()> {
        self.schedules
            .prefetch(self.scenario.static_destinations())
            .await?;
        Ok(())
    }

    /// Run a batch, reporting each outcome as soon as it is known
    ///
    /// # Errors
    /// Only setup errors from [`Migrator::prepare`]; nothing fails after the
    /// first identity is processed.
    pub async fn run<F>(&self, batch: &[Identity], mut on_outcome: F) -> MigrateResult<RunReport>
    where
        F: FnMut(&IdentityOutcome),
    {
        self.prepare().await?;
        tracing::info!(
            kind = self.scenario.kind(),
            identities = batch.len(),
            mode = ?self.gateway.mode(),
            "starting migration"
        );

        let mut report = RunReport::new();
        for identity in batch {
            let outcome = IdentityOutcome::new(identity.id.clone(), self.migrate(identity).await);
            on_outcome(&outcome);
            report.record(outcome);
        }

        tracing::info!(
            created = report.created(),
            failures = report.failures(),
            "migration finished"
        );
        Ok(report)
    }

    /// Migrate a single identity
    pub async fn migrate(&self, identity: &Identity) -> Outcome {
        if !self.scenario.recognizes(identity.current.message_set()) {
            tracing::debug!(identity = %identity.id, current = %identity.current, "set not in scenario");
            return Outcome::NoMigration;
        }

        let (destination, resume_at) =
            match resolve(&self.scenario, identity.current, identity.expected) {
                Decision::NoMigration => return Outcome::NoMigration,
                Decision::Migrate {
                    destination,
                    resume_at,
                } => (destination, resume_at),
            };

        if self.options.check_duplicates {
            let filter = SubscriptionFilter::for_identity(identity.id.clone(), destination).active(true);
            match self.gateway.subscription_exists(&filter).await {
                Ok(true) => {
                    return Outcome::AlreadySubscribed {
                        message_set: destination,
                    }
                }
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(identity = %identity.id, %error, "existence check failed");
                    return Outcome::LookupFailed {
                        status: error.status_code(),
                    };
                }
            }
        }

        let schedule = match self.schedules.get_schedule(destination).await {
            Ok(schedule) => schedule,
            Err(error) => {
                tracing::warn!(identity = %identity.id, %error, "schedule lookup failed");
                return Outcome::ScheduleFailed {
                    message_set: destination,
                    status: error.status_code(),
                };
            }
        };

        let request = NewSubscription {
            identity: identity.id.clone(),
            lang: identity.language.clone(),
            next_sequence_number: resume_at,
            messageset: destination,
            schedule,
        };
        match self.gateway.create_subscription(&request).await {
            Ok(Applied::Done(())) => {
                tracing::info!(identity = %identity.id, %destination, resume_at, "subscription created");
                Outcome::Created {
                    message_set: destination,
                    resume_at,
                }
            }
            Ok(Applied::DryRun) => Outcome::WouldCreate {
                message_set: destination,
                resume_at,
            },
            Err(error) => {
                tracing::warn!(identity = %identity.id, %error, "subscription creation failed");
                Outcome::CreateFailed {
                    status: error.status_code(),
                }
            }
        }
    }
}
