//! Re-subscription of identities whose message set ran out
//!
//! Every completed subscription to the old set is a candidate. A candidate
//! is moved to the new set from sequence 1 unless it is already there, is
//! still receiving the old set, or has opted out everywhere.

use crate::error::MigrateResult;
use crate::outcome::{IdentityOutcome, Outcome, RunReport};
use futures::TryStreamExt;
use sbm_gateway::{
    Applied, GatewayResult, IdentityStore, MessagingApi, NewSubscription, ScheduleCache,
    Subscription, SubscriptionFilter,
};
use sbm_model::MessageSetId;
use std::sync::Arc;

/// Address type checked for opt-outs
const OPT_OUT_ADDRESS: &str = "msisdn";

/// Moves lapsed subscribers from one message set to another
pub struct Resubscriber {
    gateway: Arc<dyn MessagingApi>,
    identities: Arc<dyn IdentityStore>,
    schedules: ScheduleCache,
    old: MessageSetId,
    new: MessageSetId,
}

impl std::fmt::Debug for Resubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resubscriber")
            .field("old", &self.old)
            .field("new", &self.new)
            .finish_non_exhaustive()
    }
}

impl Resubscriber {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn MessagingApi>,
        identities: Arc<dyn IdentityStore>,
        old: MessageSetId,
        new: MessageSetId,
    ) -> Self {
        Self {
            schedules: ScheduleCache::new(Arc::clone(&gateway)),
            gateway,
            identities,
            old,
            new,
        }
    }

    /// Walk every completed subscription to the old set
    ///
    /// # Errors
    /// - [`crate::MigrateError::Setup`] when the new set's schedule is unavailable
    /// - [`crate::MigrateError::Gateway`] when the subscription listing fails
    pub async fn run<F>(&self, mut on_outcome: F) -> MigrateResult<RunReport>
    where
        F: FnMut(&IdentityOutcome),
    {
        self.schedules.prefetch([self.new]).await?;

        let filter = SubscriptionFilter::for_message_set(self.old).completed(true);
        let mut candidates = self.gateway.list_subscriptions(filter);
        let mut report = RunReport::new();

        while let Some(subscription) = candidates.try_next().await? {
            let outcome = IdentityOutcome::new(
                subscription.identity.clone(),
                self.resubscribe(&subscription).await,
            );
            on_outcome(&outcome);
            report.record(outcome);
        }

        tracing::info!(
            old = %self.old,
            new = %self.new,
            created = report.created(),
            "resubscription finished"
        );
        Ok(report)
    }

    /// Handle one lapsed subscription
    pub async fn resubscribe(&self, subscription: &Subscription) -> Outcome {
        match self.check(subscription).await {
            Ok(None) => {}
            Ok(Some(skip)) => return skip,
            Err(error) => {
                tracing::warn!(subscription = %subscription.id, %error, "candidate lookup failed");
                return Outcome::LookupFailed {
                    status: error.status_code(),
                };
            }
        }

        let schedule = match self.schedules.get_schedule(self.new).await {
            Ok(schedule) => schedule,
            Err(error) => {
                return Outcome::ScheduleFailed {
                    message_set: self.new,
                    status: error.status_code(),
                }
            }
        };

        let request = NewSubscription {
            identity: subscription.identity.clone(),
            lang: subscription.lang.clone(),
            next_sequence_number: 1,
            messageset: self.new,
            schedule,
        };
        match self.gateway.create_subscription(&request).await {
            Ok(Applied::Done(())) => Outcome::Created {
                message_set: self.new,
                resume_at: 1,
            },
            Ok(Applied::DryRun) => Outcome::WouldCreate {
                message_set: self.new,
                resume_at: 1,
            },
            Err(error) => {
                tracing::warn!(identity = %subscription.identity, %error, "subscription creation failed");
                Outcome::CreateFailed {
                    status: error.status_code(),
                }
            }
        }
    }

    /// Reason to leave the candidate alone, if any
    async fn check(&self, subscription: &Subscription) -> GatewayResult<Option<Outcome>> {
        let identity = subscription.identity.as_str();

        let on_new = SubscriptionFilter::for_identity(identity, self.new);
        if self.gateway.subscription_exists(&on_new).await? {
            return Ok(Some(Outcome::AlreadySubscribed {
                message_set: self.new,
            }));
        }

        let on_old = SubscriptionFilter::for_identity(identity, self.old).active(true);
        if self.gateway.subscription_exists(&on_old).await? {
            return Ok(Some(Outcome::StillActive {
                message_set: self.old,
            }));
        }

        Ok(match self.identities.get_identity(identity).await? {
            None => Some(Outcome::UnknownIdentity),
            Some(record) if record.opted_out(OPT_OUT_ADDRESS) => Some(Outcome::OptedOut),
            Some(_) => None,
        })
    }
}
