//! Action event log for replay and time travel
//!
//! The log is append-only: entries are never reordered or removed
//! (except by [`ActionEventLog::clear`]), so a sequence number is also the
//! entry's position.
//!
//! # Example
//!
//! ```rust,ignore
//! use flowstate_core::{ActionEvent, ActionEventLog};
//!
//! let mut log = ActionEventLog::new();
//! let seq = log.add_event(ActionEvent::new("increment", "1", replay));
//! log.set_active(seq, false)?;
//! ```

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Re-triggers the recorded action with its recorded payload
pub type ReplayFn = Rc<dyn Fn()>;

/// The log as shared between middleware and the time traveler
pub type SharedEventLog = Rc<RefCell<ActionEventLog>>;

/// A recorded action invocation
#[derive(Clone, Serialize)]
pub struct ActionEvent {
    /// Position in the log, assigned on append
    pub sequence_number: usize,
    /// When the event was recorded
    pub first_time: DateTime<Utc>,
    /// When the event was last applied (recorded or replayed)
    pub last_time: DateTime<Utc>,
    /// Inactive events are skipped by replay
    pub is_active: bool,
    /// Action metadata name
    pub name: String,
    /// RON-serialized payload
    pub payload: String,
    #[serde(skip)]
    replay: ReplayFn,
}

impl ActionEvent {
    /// Create an event to be appended with [`ActionEventLog::add_event`]
    pub fn new(name: impl Into<String>, payload: impl Into<String>, replay: ReplayFn) -> Self {
        let now = Utc::now();
        Self {
            sequence_number: 0,
            first_time: now,
            last_time: now,
            is_active: true,
            name: name.into(),
            payload: payload.into(),
            replay,
        }
    }

    /// Handle that re-triggers the original action
    pub fn replay_fn(&self) -> ReplayFn {
        Rc::clone(&self.replay)
    }
}

impl fmt::Debug for ActionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEvent")
            .field("sequence_number", &self.sequence_number)
            .field("first_time", &self.first_time)
            .field("last_time", &self.last_time)
            .field("is_active", &self.is_active)
            .field("name", &self.name)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Ordered, append-only record of action invocations
#[derive(Debug, Clone, Default)]
pub struct ActionEventLog {
    events: Vec<ActionEvent>,
}

impl ActionEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log ready to be shared
    pub fn shared() -> SharedEventLog {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Append `event`, returning its sequence number.
    ///
    /// Overwrites the sequence number, both timestamps, and the active flag.
    pub fn add_event(&mut self, mut event: ActionEvent) -> usize {
        let now = Utc::now();
        event.sequence_number = self.events.len();
        event.first_time = now;
        event.last_time = now;
        event.is_active = true;
        self.events.push(event);
        self.events.len() - 1
    }

    /// Mark an event active or inactive
    pub fn set_active(&mut self, sequence_number: usize, is_active: bool) -> Result<()> {
        self.find_mut(sequence_number)?.is_active = is_active;
        Ok(())
    }

    /// Mark every event after `sequence_number` inactive; returns how many changed
    pub fn deactivate_after(&mut self, sequence_number: usize) -> usize {
        let mut changed = 0;
        for event in self
            .events
            .iter_mut()
            .filter(|e| e.sequence_number > sequence_number && e.is_active)
        {
            event.is_active = false;
            changed += 1;
        }
        changed
    }

    /// Stamp `last_time` with the current time
    pub fn touch(&mut self, sequence_number: usize) -> Result<()> {
        self.find_mut(sequence_number)?.last_time = Utc::now();
        Ok(())
    }

    /// Look up an event by sequence number
    pub fn get(&self, sequence_number: usize) -> Option<&ActionEvent> {
        match self.events.get(sequence_number) {
            Some(event) if event.sequence_number == sequence_number => Some(event),
            _ => self
                .events
                .iter()
                .find(|e| e.sequence_number == sequence_number),
        }
    }

    /// Active events up to and including `sequence_number`, ascending
    pub fn active_through(&self, sequence_number: usize) -> Vec<(usize, ReplayFn)> {
        self.events
            .iter()
            .filter(|e| e.is_active && e.sequence_number <= sequence_number)
            .map(|e| (e.sequence_number, e.replay_fn()))
            .collect()
    }

    /// Sequence number of the closest active event before `sequence_number`
    pub fn previous_active(&self, sequence_number: usize) -> Option<usize> {
        self.events
            .iter()
            .rev()
            .find(|e| e.is_active && e.sequence_number < sequence_number)
            .map(|e| e.sequence_number)
    }

    /// Sequence number of the closest active event after `sequence_number`
    pub fn next_active(&self, sequence_number: usize) -> Option<usize> {
        self.events
            .iter()
            .find(|e| e.is_active && e.sequence_number > sequence_number)
            .map(|e| e.sequence_number)
    }

    pub fn last_active(&self) -> Option<usize> {
        self.events
            .iter()
            .rev()
            .find(|e| e.is_active)
            .map(|e| e.sequence_number)
    }

    /// All events in sequence order
    pub fn events(&self) -> &[ActionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove every event; sequence numbers restart at zero
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Summary counts
    pub fn stats(&self) -> EventLogStats {
        let active = self.events.iter().filter(|e| e.is_active).count();
        EventLogStats {
            total_events: self.events.len(),
            active_events: active,
            inactive_events: self.events.len() - active,
            first_time: self.events.first().map(|e| e.first_time),
            last_time: self.events.iter().map(|e| e.last_time).max(),
        }
    }

    /// Positional lookup, falling back to a scan by stored sequence number
    fn find_mut(&mut self, sequence_number: usize) -> Result<&mut ActionEvent> {
        let index = match self.events.get(sequence_number) {
            Some(event) if event.sequence_number == sequence_number => Some(sequence_number),
            _ => self
                .events
                .iter()
                .position(|e| e.sequence_number == sequence_number),
        };
        index
            .and_then(|i| self.events.get_mut(i))
            .ok_or(Error::EventNotFound(sequence_number))
    }
}

/// Statistics about the event log
#[derive(Debug, Clone, PartialEq)]
pub struct EventLogStats {
    pub total_events: usize,
    pub active_events: usize,
    pub inactive_events: usize,
    /// When the oldest event was recorded
    pub first_time: Option<DateTime<Utc>>,
    /// Most recent application of any event
    pub last_time: Option<DateTime<Utc>>,
}
