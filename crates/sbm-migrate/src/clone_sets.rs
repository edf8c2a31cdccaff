//! Evening (6-8pm) copies of the 9-11am audio message sets
//!
//! Copies reuse the source set's schedule, content type and channel and are
//! found by short name, so running the clone twice creates nothing new.

use crate::error::MigrateResult;
use sbm_gateway::{Applied, MessageSetSummary, MessagingApi, NewMessageSet};
use sbm_model::MessageSetId;
use std::fmt;

const SOURCE_SLOT: &str = "9_11";
const TARGET_SLOT: &str = "6_8";
const AUDIO: &str = "audio";

/// One source set and its evening copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedSet {
    pub source: MessageSetId,
    pub source_name: String,
    pub target_name: String,
    /// Messages in the source set
    pub messages: usize,
    pub target: Applied<MessageSetId>,
}

impl fmt::Display for ClonedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Messageset {} ({} messages) -> {}",
            self.source_name, self.messages, self.target_name
        )?;
        match self.target {
            Applied::Done(id) => write!(f, " id: {id}"),
            Applied::DryRun => f.write_str(" (dry run)"),
        }
    }
}

/// Whether `set` is a morning audio set with an evening counterpart
#[must_use]
pub fn is_clone_source(set: &MessageSetSummary) -> bool {
    set.short_name.contains(AUDIO) && set.short_name.contains(SOURCE_SLOT)
}

/// Evening copy of `set`
#[must_use]
pub fn evening_copy(set: &MessageSetSummary) -> NewMessageSet {
    NewMessageSet {
        short_name: set.short_name.replace(SOURCE_SLOT, TARGET_SLOT),
        default_schedule: set.default_schedule,
        content_type: set.content_type.clone(),
        channel: set.channel.clone(),
        next_set: None,
    }
}

/// Find or create the evening copy of every morning audio set
///
/// # Errors
/// [`crate::MigrateError::Gateway`] on the first failed call; sets handled
/// before it keep their copies.
pub async fn clone_evening_sets<F>(
    gateway: &dyn MessagingApi,
    mut on_cloned: F,
) -> MigrateResult<Vec<ClonedSet>>
where
    F: FnMut(&ClonedSet),
{
    let sets = gateway.list_message_sets().await?;
    let mut cloned = Vec::new();

    for set in sets.iter().filter(|set| is_clone_source(set)) {
        let messages = gateway.list_messages(set.id).await?.len();
        let copy = evening_copy(set);
        let target = gateway.find_or_create_message_set(&copy).await?;
        tracing::info!(source = %set.short_name, target = %copy.short_name, messages, "evening set handled");

        let entry = ClonedSet {
            source: set.id,
            source_name: set.short_name.clone(),
            target_name: copy.short_name,
            messages,
            target,
        };
        on_cloned(&entry);
        cloned.push(entry);
    }
    Ok(cloned)
}
