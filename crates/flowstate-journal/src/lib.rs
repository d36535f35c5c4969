//! Flowstate Journal - Recording, time travel, and auditing
//!
//! This crate builds on `flowstate-core`'s action event log to provide:
//!
//! - **EventLogMiddleware**: Records every trigger into the shared log
//! - **TimeTraveler**: Replays a prefix of the log against the live stores
//! - **Auditor**: Summaries and queries over recorded actions
//! - **Exporter**: Export the log to RON, JSON, CSV, or text
//! - **Devtools**: Installs all of the above into a `Registry`
//!
//! # Example
//!
//! ```rust
//! use flowstate_core::{ActionMetadata, Registry, Store};
//! use flowstate_journal::{register_replayable, Devtools, DevtoolsConfig};
//! use std::rc::Rc;
//!
//! let registry = Rc::new(Registry::new());
//! let devtools = Devtools::install(&registry, &DevtoolsConfig::default()).unwrap();
//!
//! let store = Store::with_factory(0i64, devtools.factory());
//! register_replayable(&registry, &store);
//! let increment = store.create_action_and_subscribe(
//!     Some(ActionMetadata::new("increment")),
//!     |store, n: &i64| store.update_state(|count| count + n),
//! );
//!
//! increment.trigger(1);
//! increment.trigger(2);
//! increment.trigger(3);
//!
//! devtools.time_traveler().replay_to(1).unwrap();
//! assert_eq!(store.state(), 3);
//! ```

mod auditor;
mod devtools;
mod error;
mod exporter;
mod recorder;
mod time_traveler;

pub use auditor::{ActionCounts, AuditQuery, AuditReport, Auditor};
pub use devtools::{register_replayable, Devtools, DevtoolsConfig};
pub use error::{Error, Result};
pub use exporter::{ExportFormat, Exporter};
pub use recorder::EventLogMiddleware;
pub use time_traveler::{ReplayState, TimeTraveler};

// Re-export core event log types for convenience
pub use flowstate_core::{ActionEvent, ActionEventLog, EventLogStats, SharedEventLog};
