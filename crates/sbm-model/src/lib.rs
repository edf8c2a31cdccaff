//! SBM Model - positions, scenarios and the migration resolver
//!
//! Pure, I/O free core of the migration tooling:
//! - [`Position`]: where an identity is in a message set
//! - [`Scenario`]: the statically configured topology of a migration
//! - [`resolve`]: old position + expected position → [`Decision`]
//!
//! # Example
//!
//! ```rust
//! use sbm_model::{CumulativeScenario, Decision, MessageSetId, Position, Scenario, Stage};
//!
//! let scenario = Scenario::Cumulative(
//!     CumulativeScenario::new(
//!         vec![Stage::new(3, [8, 15, 24]), Stage::new(4, [2])],
//!         [100, 101, 102, 103].map(MessageSetId),
//!     )
//!     .unwrap(),
//! );
//!
//! let old = Position::new(3, 10).unwrap();
//! let expected = Position::new(4, 2).unwrap();
//!
//! assert_eq!(
//!     sbm_model::resolve(&scenario, old, expected),
//!     Decision::migrate(MessageSetId(102), 2)
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cumulative;
pub mod error;
pub mod position;
pub mod resolver;
pub mod scenario;
pub mod threshold;

pub use cumulative::{CumulativeScenario, Stage};
pub use error::{PositionError, ScenarioError};
pub use position::{Identity, MessageSetId, Position};
pub use resolver::{resolve, Decision, Resolver};
pub use scenario::{FixedScenario, Scenario};
pub use threshold::{Threshold, ThresholdScenario, Track};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with scenarios and decisions
    pub use crate::{
        resolve, CumulativeScenario, Decision, FixedScenario, Identity, MessageSetId, Position,
        Resolver, Scenario, Stage, Threshold, ThresholdScenario, Track,
    };
}
