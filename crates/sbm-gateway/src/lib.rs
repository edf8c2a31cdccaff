//! SBM Gateway - remote services used by the migration tools
//!
//! - [`MessagingApi`]: the stage based messaging service (message sets,
//!   schedules, subscriptions)
//! - [`IdentityStore`]: identity records and opt-out flags
//! - [`ScheduleCache`]: per run memo of message set schedules
//!
//! # Failure semantics
//!
//! Reads are retried on transport failures and gateway statuses up to the
//! configured attempt budget. Writes are retried only when the connection
//! could not be established. Any other non-success answer surfaces as
//! [`GatewayError::Status`] carrying the HTTP status code.
//!
//! # Example
//!
//! ```rust,ignore
//! use sbm_gateway::{GatewayConfig, MessagingApi, RunMode, SbmClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::new("https://sbm.example.org/api/v1/", "token")
//!     .with_mode(RunMode::Execute);
//! let client = SbmClient::new(&config)?;
//!
//! let schedule = client.get_schedule(sbm_model::MessageSetId(12)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
mod transport;
pub mod types;

pub use api::{IdentityStore, MessagingApi};
pub use cache::ScheduleCache;
pub use client::SbmClient;
pub use config::{GatewayConfig, RetryPolicy, RunMode};
pub use error::{GatewayError, GatewayResult, ScheduleError};
pub use identity::IdentityStoreClient;
pub use types::{
    AddressFlags, Applied, IdentityDetails, IdentityRecord, Message, MessageSetSummary,
    NewMessageSet, NewSubscription, Page, ScheduleId, Subscription, SubscriptionFilter,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
