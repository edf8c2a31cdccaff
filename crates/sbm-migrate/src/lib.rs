//! SBM Migrate - subscription migrations for stage based messaging
//!
//! Drives [`sbm_model`] decisions against the remote service through
//! [`sbm_gateway`]:
//! - [`Migrator`]: resolve, de-duplicate and subscribe a batch of identities
//! - [`Resubscriber`]: move lapsed subscribers of one set to another
//! - [`clone_sets`]: evening copies of the morning audio sets
//!
//! Runs are dry unless the gateway is built with
//! [`sbm_gateway::RunMode::Execute`], and safe to repeat.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod clone_sets;
pub mod error;
pub mod input;
pub mod logging;
pub mod orchestrator;
pub mod outcome;
pub mod resubscribe;
pub mod scenario_file;

pub use error::{MigrateError, MigrateResult};
pub use input::{parse_batch, BatchSource};
pub use orchestrator::{Migrator, MigratorOptions};
pub use outcome::{IdentityOutcome, Outcome, RunReport};
pub use resubscribe::Resubscriber;
pub use scenario_file::{load_scenario, ScenarioFile};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
