//! Testing utilities for the SBM workspace
//!
//! In-memory gateways with call counters and injectable failures, plus
//! fixtures for identities and scenarios.

#![allow(missing_docs)]

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use sbm_gateway::{
    Applied, GatewayError, GatewayResult, IdentityRecord, IdentityStore, Message,
    MessageSetSummary, MessagingApi, NewMessageSet, NewSubscription, RunMode, ScheduleId,
    Subscription, SubscriptionFilter,
};
use sbm_model::{CumulativeScenario, Identity, MessageSetId, Position, Scenario, Stage};
use std::collections::HashMap;

/// Calls that reached the fake service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    pub schedule_fetches: HashMap<MessageSetId, usize>,
    pub existence_checks: Vec<SubscriptionFilter>,
    pub subscriptions_created: Vec<NewSubscription>,
    pub message_set_lookups: Vec<String>,
    pub message_sets_created: Vec<NewMessageSet>,
    pub message_listings: Vec<MessageSetId>,
}

impl CallLog {
    /// Schedule fetches for one set
    #[must_use]
    pub fn schedule_fetches_for(&self, message_set: MessageSetId) -> usize {
        self.schedule_fetches.get(&message_set).copied().unwrap_or(0)
    }

    /// Writes of any kind that reached the service
    #[must_use]
    pub fn writes(&self) -> usize {
        self.subscriptions_created.len() + self.message_sets_created.len()
    }
}

#[derive(Debug, Default)]
struct FakeState {
    message_sets: Vec<MessageSetSummary>,
    messages: HashMap<MessageSetId, Vec<Message>>,
    schedules: HashMap<MessageSetId, ScheduleId>,
    subscriptions: Vec<Subscription>,
    create_failures: HashMap<String, u16>,
    schedule_failures: HashMap<MessageSetId, u16>,
    existence_failures: HashMap<String, u16>,
    calls: CallLog,
}

/// In-memory stage based messaging service
#[derive(Debug)]
pub struct FakeGateway {
    mode: RunMode,
    state: Mutex<FakeState>,
}

impl FakeGateway {
    #[must_use]
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            state: Mutex::new(FakeState::default()),
        }
    }

    #[must_use]
    pub fn executing() -> Self {
        Self::new(RunMode::Execute)
    }

    #[must_use]
    pub fn dry_run() -> Self {
        Self::new(RunMode::DryRun)
    }

    #[must_use]
    pub fn with_schedule(self, message_set: u64, schedule: u64) -> Self {
        self.state
            .lock()
            .schedules
            .insert(MessageSetId(message_set), ScheduleId(schedule));
        self
    }

    #[must_use]
    pub fn with_subscription(self, subscription: Subscription) -> Self {
        self.state.lock().subscriptions.push(subscription);
        self
    }

    #[must_use]
    pub fn with_message_set(self, set: MessageSetSummary, messages: Vec<Message>) -> Self {
        {
            let mut state = self.state.lock();
            state.messages.insert(set.id, messages);
            state.message_sets.push(set);
        }
        self
    }

    /// Creating a subscription for `identity` answers `status`
    #[must_use]
    pub fn fail_create_for(self, identity: &str, status: u16) -> Self {
        self.state
            .lock()
            .create_failures
            .insert(identity.to_string(), status);
        self
    }

    /// Fetching the schedule of `message_set` answers `status`
    #[must_use]
    pub fn fail_schedule_for(self, message_set: u64, status: u16) -> Self {
        self.state
            .lock()
            .schedule_failures
            .insert(MessageSetId(message_set), status);
        self
    }

    /// Existence checks for `identity` answer `status`
    #[must_use]
    pub fn fail_existence_for(self, identity: &str, status: u16) -> Self {
        self.state
            .lock()
            .existence_failures
            .insert(identity.to_string(), status);
        self
    }

    /// Stop failing schedule fetches for `message_set`
    pub fn heal_schedule(&self, message_set: u64) {
        self.state
            .lock()
            .schedule_failures
            .remove(&MessageSetId(message_set));
    }

    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.state.lock().calls.clone()
    }

    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.state.lock().subscriptions.clone()
    }
}

#[async_trait]
impl MessagingApi for FakeGateway {
    fn mode(&self) -> RunMode {
        self.mode
    }

    async fn list_message_sets(&self) -> GatewayResult<Vec<MessageSetSummary>> {
        Ok(self.state.lock().message_sets.clone())
    }

    async fn find_or_create_message_set(
        &self,
        spec: &NewMessageSet,
    ) -> GatewayResult<Applied<MessageSetId>> {
        let mut state = self.state.lock();
        state.calls.message_set_lookups.push(spec.short_name.clone());
        if let Some(existing) = state
            .message_sets
            .iter()
            .find(|set| set.short_name == spec.short_name)
        {
            return Ok(Applied::Done(existing.id));
        }
        if !self.mode.is_execute() {
            return Ok(Applied::DryRun);
        }

        let id = MessageSetId(state.message_sets.iter().map(|s| s.id.0).max().unwrap_or(0) + 1);
        state.message_sets.push(MessageSetSummary {
            id,
            short_name: spec.short_name.clone(),
            default_schedule: spec.default_schedule,
            content_type: spec.content_type.clone(),
            channel: spec.channel.clone(),
            next_set: spec.next_set,
        });
        state.calls.message_sets_created.push(spec.clone());
        Ok(Applied::Done(id))
    }

    async fn list_messages(&self, message_set: MessageSetId) -> GatewayResult<Vec<Message>> {
        let mut state = self.state.lock();
        state.calls.message_listings.push(message_set);
        state
            .messages
            .get(&message_set)
            .cloned()
            .ok_or_else(|| GatewayError::status(404, "not found"))
    }

    async fn get_schedule(&self, message_set: MessageSetId) -> GatewayResult<ScheduleId> {
        let mut state = self.state.lock();
        *state.calls.schedule_fetches.entry(message_set).or_default() += 1;
        if let Some(status) = state.schedule_failures.get(&message_set) {
            return Err(GatewayError::status(*status, "schedule unavailable"));
        }
        state
            .schedules
            .get(&message_set)
            .copied()
            .ok_or_else(|| GatewayError::status(404, "not found"))
    }

    async fn subscription_exists(&self, filter: &SubscriptionFilter) -> GatewayResult<bool> {
        let mut state = self.state.lock();
        state.calls.existence_checks.push(filter.clone());
        if let Some(status) = filter
            .identity
            .as_ref()
            .and_then(|id| state.existence_failures.get(id))
        {
            return Err(GatewayError::status(*status, "lookup failed"));
        }
        Ok(state.subscriptions.iter().any(|sub| filter.matches(sub)))
    }

    async fn create_subscription(&self, request: &NewSubscription) -> GatewayResult<Applied<()>> {
        if !self.mode.is_execute() {
            return Ok(Applied::DryRun);
        }
        let mut state = self.state.lock();
        if let Some(status) = state.create_failures.get(&request.identity) {
            return Err(GatewayError::status(*status, "rejected"));
        }
        let id = format!("sub-{}", state.subscriptions.len() + 1);
        state.subscriptions.push(Subscription {
            id,
            identity: request.identity.clone(),
            lang: request.lang.clone(),
            next_sequence_number: request.next_sequence_number,
            messageset: request.messageset,
            schedule: Some(request.schedule),
            active: true,
            completed: false,
        });
        state.calls.subscriptions_created.push(request.clone());
        Ok(Applied::Done(()))
    }

    fn list_subscriptions(
        &self,
        filter: SubscriptionFilter,
    ) -> BoxStream<'_, GatewayResult<Subscription>> {
        let matching: Vec<_> = self
            .state
            .lock()
            .subscriptions
            .iter()
            .filter(|sub| filter.matches(sub))
            .cloned()
            .map(Ok)
            .collect();
        stream::iter(matching).boxed()
    }
}

/// In-memory identity store
#[derive(Debug, Default)]
pub struct FakeIdentityStore {
    records: Mutex<HashMap<String, IdentityRecord>>,
    failures: Mutex<HashMap<String, u16>>,
}

impl FakeIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an identity whose msisdn addresses carry the given opt-out flags
    #[must_use]
    pub fn with_identity(self, id: &str, msisdn_opt_outs: &[bool]) -> Self {
        let msisdns = msisdn_opt_outs
            .iter()
            .enumerate()
            .map(|(i, optedout)| {
                (
                    format!("+2782000000{i}"),
                    sbm_gateway::AddressFlags { optedout: *optedout },
                )
            })
            .collect();
        let mut record = IdentityRecord {
            id: id.to_string(),
            ..IdentityRecord::default()
        };
        record
            .details
            .addresses
            .insert("msisdn".to_string(), msisdns);
        self.records.lock().insert(id.to_string(), record);
        self
    }

    #[must_use]
    pub fn fail_for(self, id: &str, status: u16) -> Self {
        self.failures.lock().insert(id.to_string(), status);
        self
    }
}

#[async_trait]
impl IdentityStore for FakeIdentityStore {
    async fn get_identity(&self, identity: &str) -> GatewayResult<Option<IdentityRecord>> {
        if let Some(status) = self.failures.lock().get(identity) {
            return Err(GatewayError::status(*status, "identity store error"));
        }
        Ok(self.records.lock().get(identity).cloned())
    }
}

pub fn position(message_set: u64, sequence: u32) -> Position {
    Position::new(message_set, sequence).unwrap()
}

pub fn identity(id: &str, current: (u64, u32), expected: (u64, u32)) -> Identity {
    Identity {
        id: id.to_string(),
        language: "eng_ZA".to_string(),
        current: position(current.0, current.1),
        expected: position(expected.0, expected.1),
    }
}

/// Completed subscription, as left behind by an expired message set
pub fn completed_subscription(id: &str, identity: &str, message_set: u64) -> Subscription {
    Subscription {
        id: id.to_string(),
        identity: identity.to_string(),
        lang: "eng_ZA".to_string(),
        next_sequence_number: 1,
        messageset: MessageSetId(message_set),
        schedule: None,
        active: false,
        completed: true,
    }
}

/// Active subscription
pub fn active_subscription(id: &str, identity: &str, message_set: u64) -> Subscription {
    Subscription {
        active: true,
        completed: false,
        ..completed_subscription(id, identity, message_set)
    }
}

/// PMTCT chain: stage 3 [8, 15, 24], 4 [2], 5 [5], 1 [6, 15, 17];
/// destination for cumulative index `k` is `100 + k - 1`
pub fn pmtct_scenario() -> Scenario {
    CumulativeScenario::new(
        vec![
            Stage::new(3, [8, 15, 24]),
            Stage::new(4, [2]),
            Stage::new(5, [5]),
            Stage::new(1, [6, 15, 17]),
        ],
        (100..108).map(MessageSetId),
    )
    .unwrap()
    .into()
}

/// Gateway with schedules for every PMTCT destination
pub fn pmtct_gateway(mode: RunMode) -> FakeGateway {
    (100..108).fold(FakeGateway::new(mode), |gateway, set| {
        gateway.with_schedule(set, set + 1000)
    })
}
