//! Flowstate Core - Flux-style observable stores
//!
//! This crate provides the core types for centrally owned, observable state:
//! - Observable primitives (`Observable`, `EventStream`, `Subscription`)
//! - Typed actions (`Action`) and their type-erased form (`DynAction`)
//! - Action factories, optionally threading actions through middleware
//! - Stores that own state and wire actions to reducers
//! - A typed registry acting as the composition root
//! - Replay capabilities consumed by time-travel tooling
//!
//! Everything is single-threaded and synchronous: triggering an action runs
//! every subscriber, in registration order, before returning.
//!
//! ## Journal Feature
//!
//! Enable the `journal` feature for the action event log used by replay:
//! ```toml
//! flowstate-core = { version = "0.1", features = ["journal"] }
//! ```

pub mod action;
mod error;
pub mod factory;
pub mod middleware;
pub mod observable;
pub mod registry;
pub mod replay;
mod store;

#[cfg(feature = "journal")]
pub mod journal;

pub use action::{
    Action, ActionMetadata, ActionPayload, DynAction, ErasedPayload, Payload, WeakDynAction,
};
pub use error::{Error, Result};
pub use factory::{ActionFactory, MiddlewareActionFactory, SimpleActionFactory};
pub use middleware::{ConsoleLoggingMiddleware, LogLevel, LogLine, LogSink, Middleware};
pub use observable::{EventStream, Observable, Subscription, SubscriptionGuard};
pub use registry::{Provider, Registry};
pub use replay::{ReplayListener, ReplayPositionListener, ResetState};
pub use store::Store;

#[cfg(feature = "journal")]
pub use journal::{ActionEvent, ActionEventLog, EventLogStats, ReplayFn, SharedEventLog};
