//! Wire types for the stage based messaging service and identity store

use sbm_model::MessageSetId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Remote schedule identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub u64);

impl std::fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a mutating call that honours the run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied<T> {
    /// The call was sent and succeeded
    Done(T),
    /// Dry run, nothing was sent
    DryRun,
}

/// Paginated list envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Total results across all pages, when reported
    #[serde(default)]
    pub count: Option<u64>,
    /// Absolute URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// Results on this page
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Message set as listed by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSetSummary {
    pub id: MessageSetId,
    pub short_name: String,
    #[serde(default)]
    pub default_schedule: Option<ScheduleId>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_set: Option<MessageSetId>,
}

/// Message set to find or create, keyed by `short_name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessageSet {
    pub short_name: String,
    pub default_schedule: Option<ScheduleId>,
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_set: Option<MessageSetId>,
}

/// Single message of a message set
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub id: u64,
    pub sequence_number: u32,
    pub lang: String,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub binary_content: Option<serde_json::Value>,
}

/// Envelope of `messageset/{id}/messages`
#[derive(Debug, Deserialize)]
pub(crate) struct MessageList {
    pub(crate) messages: Vec<Message>,
}

/// Single message set detail, only the schedule is read
#[derive(Debug, Deserialize)]
pub(crate) struct MessageSetDetail {
    pub(crate) default_schedule: Option<ScheduleId>,
}

/// Created entity, only the id is read
#[derive(Debug, Deserialize)]
pub(crate) struct Created {
    pub(crate) id: MessageSetId,
}

/// Remote subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub identity: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub next_sequence_number: u32,
    pub messageset: MessageSetId,
    #[serde(default)]
    pub schedule: Option<ScheduleId>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub completed: bool,
}

/// Subscription creation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub identity: String,
    pub lang: String,
    pub next_sequence_number: u32,
    pub messageset: MessageSetId,
    pub schedule: ScheduleId,
}

/// Query filters for `subscriptions/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messageset: Option<MessageSetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl SubscriptionFilter {
    /// Filter on identity and message set
    #[must_use]
    pub fn for_identity(identity: impl Into<String>, messageset: MessageSetId) -> Self {
        Self {
            identity: Some(identity.into()),
            messageset: Some(messageset),
            ..Self::default()
        }
    }

    /// Filter on message set only
    #[must_use]
    pub fn for_message_set(messageset: MessageSetId) -> Self {
        Self {
            messageset: Some(messageset),
            ..Self::default()
        }
    }

    /// With active flag
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// With completed flag
    #[must_use]
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Whether a subscription satisfies every set filter
    #[must_use]
    pub fn matches(&self, sub: &Subscription) -> bool {
        self.identity.as_ref().map_or(true, |id| *id == sub.identity)
            && self.messageset.map_or(true, |set| set == sub.messageset)
            && self.active.map_or(true, |active| active == sub.active)
            && self.completed.map_or(true, |completed| completed == sub.completed)
    }
}

/// Identity store record, only opt-out data is read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: String,
    #[serde(default)]
    pub details: IdentityDetails,
}

/// `details` of an identity record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDetails {
    /// Address type (`msisdn`, `email`, ...) → address → flags
    #[serde(default)]
    pub addresses: HashMap<String, HashMap<String, AddressFlags>>,
}

/// Flags stored against one contact address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFlags {
    #[serde(default)]
    pub optedout: bool,
}

impl IdentityRecord {
    /// True when every address of `address_type` is opted out
    ///
    /// An identity without such addresses cannot be reached and counts as
    /// opted out.
    #[must_use]
    pub fn opted_out(&self, address_type: &str) -> bool {
        self.details
            .addresses
            .get(address_type)
            .map_or(true, |addresses| addresses.values().all(|a| a.optedout))
    }
}
