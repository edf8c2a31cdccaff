//! HTTP client for the stage based messaging service

use crate::api::MessagingApi;
use crate::config::{GatewayConfig, RunMode};
use crate::error::{GatewayError, GatewayResult};
use crate::transport::{HttpTransport, NO_QUERY};
use crate::types::{
    Applied, Created, Message, MessageList, MessageSetDetail, MessageSetSummary, NewMessageSet,
    NewSubscription, Page, ScheduleId, Subscription, SubscriptionFilter,
};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sbm_model::MessageSetId;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Stage based messaging gateway over HTTP
#[derive(Debug, Clone)]
pub struct SbmClient {
    http: HttpTransport,
    mode: RunMode,
}

/// Where the next page comes from
enum Cursor<Q> {
    First(Q),
    Next(String),
}

impl SbmClient {
    /// Create client
    ///
    /// # Errors
    /// [`GatewayError::Config`] when the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        Ok(Self {
            http: HttpTransport::new(config)?,
            mode: config.mode,
        })
    }

    /// Stream every result of a paginated listing, following `next` links
    fn paginate<T, Q>(&self, path: &str, query: Q) -> BoxStream<'_, GatewayResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
        Q: Serialize + Send + Sync + 'static,
    {
        let first = self.http.endpoint(path);
        stream::try_unfold(Some(Cursor::First(query)), move |cursor: Option<Cursor<Q>>| {
            let first = first.clone();
            async move {
                let Some(cursor) = cursor else {
                    return GatewayResult::Ok(None);
                };
                let page: Page<T> = match cursor {
                    Cursor::First(query) => self.http.get_json(&first, &query).await?,
                    Cursor::Next(url) => self.http.get_json(&url, NO_QUERY).await?,
                };
                tracing::debug!(results = page.results.len(), next = ?page.next, "fetched page");
                let next = page
                    .next
                    .filter(|url| !url.is_empty())
                    .map(Cursor::Next);
                Ok(Some((page.results, next)))
            }
        })
        .map_ok(|results| stream::iter(results.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    async fn lookup_message_set(&self, short_name: &str) -> GatewayResult<Option<MessageSetId>> {
        let url = self.http.endpoint("messageset/");
        let page: Page<MessageSetSummary> = self
            .http
            .get_json(&url, &[("short_name", short_name)])
            .await?;
        Ok(page.results.first().map(|set| set.id))
    }
}

#[async_trait]
impl MessagingApi for SbmClient {
    fn mode(&self) -> RunMode {
        self.mode
    }

    async fn list_message_sets(&self) -> GatewayResult<Vec<MessageSetSummary>> {
        self.paginate("messageset/", Vec::<(String, String)>::new())
            .try_collect()
            .await
    }

    async fn find_or_create_message_set(
        &self,
        spec: &NewMessageSet,
    ) -> GatewayResult<Applied<MessageSetId>> {
        if let Some(id) = self.lookup_message_set(&spec.short_name).await? {
            tracing::debug!(short_name = %spec.short_name, %id, "message set exists");
            return Ok(Applied::Done(id));
        }

        if !self.mode.is_execute() {
            tracing::info!(short_name = %spec.short_name, "dry run, message set not created");
            return Ok(Applied::DryRun);
        }

        let url = self.http.endpoint("messageset/");
        let created: Created = self.http.post_json(&url, spec).await?;
        tracing::info!(short_name = %spec.short_name, id = %created.id, "message set created");
        Ok(Applied::Done(created.id))
    }

    async fn list_messages(&self, message_set: MessageSetId) -> GatewayResult<Vec<Message>> {
        let url = self.http.endpoint(&format!("messageset/{message_set}/messages"));
        let list: MessageList = self.http.get_json(&url, NO_QUERY).await?;
        Ok(list.messages)
    }

    async fn get_schedule(&self, message_set: MessageSetId) -> GatewayResult<ScheduleId> {
        let url = self.http.endpoint(&format!("messageset/{message_set}"));
        let detail: MessageSetDetail = self.http.get_json(&url, NO_QUERY).await?;
        detail
            .default_schedule
            .ok_or_else(|| GatewayError::decode(url, "message set has no default_schedule"))
    }

    async fn subscription_exists(&self, filter: &SubscriptionFilter) -> GatewayResult<bool> {
        let url = self.http.endpoint("subscriptions/");
        let page: Page<Subscription> = self.http.get_json(&url, filter).await?;
        Ok(page
            .count
            .map_or(!page.results.is_empty(), |count| count > 0))
    }

    async fn create_subscription(&self, request: &NewSubscription) -> GatewayResult<Applied<()>> {
        if !self.mode.is_execute() {
            tracing::debug!(identity = %request.identity, messageset = %request.messageset, "dry run, subscription not created");
            return Ok(Applied::DryRun);
        }
        let url = self.http.endpoint("subscriptions/");
        self.http.post(&url, request).await?;
        Ok(Applied::Done(()))
    }

    fn list_subscriptions(
        &self,
        filter: SubscriptionFilter,
    ) -> BoxStream<'_, GatewayResult<Subscription>> {
        self.paginate("subscriptions/", filter)
    }
}
