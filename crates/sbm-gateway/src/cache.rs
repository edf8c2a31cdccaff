//! Per run schedule cache using moka
//!
//! Many identities migrate to the same destination set; its schedule is
//! fetched once and reused for the rest of the run. Failed fetches are not
//! cached, the next lookup tries again.

use crate::api::MessagingApi;
use crate::error::ScheduleError;
use crate::types::ScheduleId;
use moka::future::Cache;
use sbm_model::MessageSetId;
use std::sync::Arc;

/// Default capacity, far above the number of sets in any scenario
const DEFAULT_CAPACITY: u64 = 10_000;

/// Message set → schedule memo for one run
#[derive(Clone)]
pub struct ScheduleCache {
    gateway: Arc<dyn MessagingApi>,
    inner: Cache<MessageSetId, ScheduleId>,
}

impl std::fmt::Debug for ScheduleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleCache")
            .field("entry_count", &self.inner.entry_count())
            .finish_non_exhaustive()
    }
}

impl ScheduleCache {
    /// Create empty cache backed by `gateway`
    #[must_use]
    pub fn new(gateway: Arc<dyn MessagingApi>) -> Self {
        Self {
            gateway,
            inner: Cache::new(DEFAULT_CAPACITY),
        }
    }

    /// Schedule of `message_set`, fetched on first use
    ///
    /// # Errors
    /// [`ScheduleError`] when the gateway lookup fails.
    pub async fn get_schedule(&self, message_set: MessageSetId) -> Result<ScheduleId, ScheduleError> {
        let gateway = Arc::clone(&self.gateway);
        self.inner
            .try_get_with(message_set, async move {
                tracing::debug!(%message_set, "fetching schedule");
                gateway.get_schedule(message_set).await
            })
            .await
            .map_err(|source| ScheduleError {
                message_set,
                source,
            })
    }

    /// Fetch every schedule up front, stopping at the first failure
    ///
    /// # Errors
    /// The first [`ScheduleError`] encountered.
    pub async fn prefetch(
        &self,
        message_sets: impl IntoIterator<Item = MessageSetId>,
    ) -> Result<(), ScheduleError> {
        for message_set in message_sets {
            let schedule = self.get_schedule(message_set).await?;
            tracing::info!(%message_set, %schedule, "schedule prefetched");
        }
        Ok(())
    }

    /// Whether the schedule of `message_set` is cached
    #[must_use]
    pub fn contains(&self, message_set: MessageSetId) -> bool {
        self.inner.contains_key(&message_set)
    }
}
