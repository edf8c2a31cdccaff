//! Gateway traits
//!
//! The orchestrator only talks to these traits. [`crate::SbmClient`] and
//! [`crate::IdentityStoreClient`] implement them over HTTP; tests use an
//! in-memory implementation.

use crate::config::RunMode;
use crate::error::GatewayResult;
use crate::types::{
    Applied, IdentityRecord, Message, MessageSetSummary, NewMessageSet, NewSubscription,
    ScheduleId, Subscription, SubscriptionFilter,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use sbm_model::MessageSetId;

/// Stage based messaging service
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Run mode applied to mutating calls
    fn mode(&self) -> RunMode;

    /// All message sets
    async fn list_message_sets(&self) -> GatewayResult<Vec<MessageSetSummary>>;

    /// Id of the set with `spec.short_name`, creating it when absent
    ///
    /// Dry run still looks the set up but never creates it; a missing set
    /// comes back as [`Applied::DryRun`].
    async fn find_or_create_message_set(
        &self,
        spec: &NewMessageSet,
    ) -> GatewayResult<Applied<MessageSetId>>;

    /// Messages of a set
    async fn list_messages(&self, message_set: MessageSetId) -> GatewayResult<Vec<Message>>;

    /// Default schedule of a set
    async fn get_schedule(&self, message_set: MessageSetId) -> GatewayResult<ScheduleId>;

    /// Whether any subscription matches `filter`
    async fn subscription_exists(&self, filter: &SubscriptionFilter) -> GatewayResult<bool>;

    /// Create subscription
    ///
    /// Dry run sends nothing and returns [`Applied::DryRun`].
    async fn create_subscription(&self, request: &NewSubscription) -> GatewayResult<Applied<()>>;

    /// Lazily page through subscriptions matching `filter`
    ///
    /// Each call starts from the first page.
    fn list_subscriptions(
        &self,
        filter: SubscriptionFilter,
    ) -> BoxStream<'_, GatewayResult<Subscription>>;
}

/// Identity store
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Identity record, `None` when the store does not know it
    async fn get_identity(&self, identity: &str) -> GatewayResult<Option<IdentityRecord>>;
}
