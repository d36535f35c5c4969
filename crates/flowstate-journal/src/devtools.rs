//! Devtools composition: logging, recording, and time travel in one call
//!
//! [`Devtools::install`] registers everything a store needs to be logged and
//! replayed, then hands back a handle for inspection from debugging tools.

use crate::{
    AuditReport, Auditor, Error, EventLogMiddleware, ExportFormat, Exporter, Result,
    TimeTraveler,
};
use flowstate_core::{
    ActionEventLog, ActionFactory, ConsoleLoggingMiddleware, LogLevel, Middleware,
    MiddlewareActionFactory, Registry, ReplayListener, ReplayPositionListener, ResetState,
    SharedEventLog, Store,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Which devtools to install
///
/// # Example
///
/// ```
/// use flowstate_journal::DevtoolsConfig;
///
/// let config = DevtoolsConfig::from_ron("(console_logging: false)").unwrap();
/// assert!(!config.console_logging);
/// assert!(config.record_events);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevtoolsConfig {
    /// Log every trigger through `tracing`
    pub console_logging: bool,
    /// Level used for action log lines
    pub log_level: LogLevel,
    /// Record triggers into the event log for time travel
    pub record_events: bool,
}

impl DevtoolsConfig {
    /// Parse a configuration from RON text; missing fields use defaults
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl Default for DevtoolsConfig {
    fn default() -> Self {
        Self {
            console_logging: true,
            log_level: LogLevel::Info,
            record_events: true,
        }
    }
}

/// Handle to the installed devtools
pub struct Devtools {
    log: SharedEventLog,
    factory: Rc<dyn ActionFactory>,
    time_traveler: Rc<TimeTraveler>,
    recording: bool,
}

impl Devtools {
    /// Register the event log, middleware, action factory, and time traveler.
    ///
    /// Middleware order is console logging first, then recording. Stores
    /// built afterwards should take their factory from
    /// `registry.resolve::<dyn ActionFactory>()` or [`Devtools::factory`].
    pub fn install(registry: &Rc<Registry>, config: &DevtoolsConfig) -> Result<Self> {
        let log = ActionEventLog::shared();
        registry.register::<RefCell<ActionEventLog>>(Rc::clone(&log));

        if config.console_logging {
            registry.add::<dyn Middleware>(Rc::new(ConsoleLoggingMiddleware::with_level(
                config.log_level,
            )));
        }

        if config.record_events {
            let recorder = Rc::new(EventLogMiddleware::new(Rc::clone(&log)));
            registry.add::<dyn Middleware>(recorder.clone());
            registry.add::<dyn ReplayListener>(recorder.clone());
            registry.add::<dyn ReplayPositionListener>(recorder);
        }

        let factory: Rc<dyn ActionFactory> =
            Rc::new(MiddlewareActionFactory::from_registry(registry));
        registry.register::<dyn ActionFactory>(Rc::clone(&factory));

        let time_traveler = Rc::new(TimeTraveler::from_registry(registry)?);
        registry.register(Rc::clone(&time_traveler));

        tracing::debug!(
            console_logging = config.console_logging,
            record_events = config.record_events,
            "devtools installed"
        );

        Ok(Self {
            log,
            factory,
            time_traveler,
            recording: config.record_events,
        })
    }

    /// The shared event log
    pub fn log(&self) -> &SharedEventLog {
        &self.log
    }

    /// Factory threading actions through the installed middleware
    pub fn factory(&self) -> Rc<dyn ActionFactory> {
        Rc::clone(&self.factory)
    }

    pub fn time_traveler(&self) -> &Rc<TimeTraveler> {
        &self.time_traveler
    }

    /// Whether triggers are being recorded
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Audit summary of the log
    pub fn report(&self) -> AuditReport {
        Auditor::new(&self.log.borrow()).generate_report()
    }

    /// Export the log
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        Exporter::new(&self.log.borrow()).export(format)
    }
}

impl std::fmt::Debug for Devtools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Devtools")
            .field("events", &self.log.borrow().len())
            .field("time_traveler", &self.time_traveler)
            .field("recording", &self.recording)
            .finish()
    }
}

/// Make `store` part of replay: it is reset before every replay pass
pub fn register_replayable<S: Clone + 'static>(registry: &Registry, store: &Store<S>) {
    registry.add::<dyn ResetState>(Rc::new(store.clone()));
}
