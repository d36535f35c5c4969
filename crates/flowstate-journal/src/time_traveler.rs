//! Time travel over the action event log
//!
//! Replaying to position `n` resets every [`ResetState`] collaborator and
//! re-triggers each active event with a sequence number `<= n`, in order.
//! Collaborators are resolved through [`Provider`]s on every pass because
//! the registry may gain new ones after the traveler was built.

use crate::{Error, Result};
use flowstate_core::{
    ActionEventLog, Provider, Registry, ReplayListener, ReplayPositionListener, ResetState,
    SharedEventLog,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Where the application currently is relative to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    /// Showing the result of every active event
    Live,
    /// Showing the state after event `position`
    Replaying { position: usize },
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    position: usize,
    log_len: usize,
}

/// Replays a prefix of the event log against the live stores
pub struct TimeTraveler {
    log: SharedEventLog,
    resets: Provider<dyn ResetState>,
    listeners: Provider<dyn ReplayListener>,
    positions: Provider<dyn ReplayPositionListener>,
    cursor: Cell<Option<Cursor>>,
}

impl TimeTraveler {
    pub fn new(
        log: SharedEventLog,
        resets: Provider<dyn ResetState>,
        listeners: Provider<dyn ReplayListener>,
        positions: Provider<dyn ReplayPositionListener>,
    ) -> Self {
        Self {
            log,
            resets,
            listeners,
            positions,
            cursor: Cell::new(None),
        }
    }

    /// Resolve the shared log and wire collaborator providers to `registry`
    pub fn from_registry(registry: &Rc<Registry>) -> Result<Self> {
        let log = registry.resolve::<RefCell<ActionEventLog>>()?;
        Ok(Self::new(
            log,
            registry.provider::<dyn ResetState>(),
            registry.provider::<dyn ReplayListener>(),
            registry.provider::<dyn ReplayPositionListener>(),
        ))
    }

    /// The log being replayed
    pub fn log(&self) -> &SharedEventLog {
        &self.log
    }

    /// Current replay state.
    ///
    /// An event recorded after the last replay pass (a new action taken
    /// while in the past) means the application is live again.
    pub fn state(&self) -> ReplayState {
        match self.cursor.get() {
            Some(cursor) if self.log.borrow().len() == cursor.log_len => ReplayState::Replaying {
                position: cursor.position,
            },
            _ => ReplayState::Live,
        }
    }

    /// Replay position, or `None` when live
    pub fn position(&self) -> Option<usize> {
        match self.state() {
            ReplayState::Replaying { position } => Some(position),
            ReplayState::Live => None,
        }
    }

    /// Rebuild application state from events `0..=target`
    pub fn replay_to(&self, target: usize) -> Result<()> {
        let len = self.log.borrow().len();
        if target >= len {
            return Err(Error::ReplayOutOfRange { target, len });
        }

        tracing::debug!(position = target, len, "replaying to position");
        self.replay_through(Some(target))?;
        self.notify_position(Some(target));
        self.cursor.set(Some(Cursor {
            position: target,
            log_len: len,
        }));
        Ok(())
    }

    /// Re-apply the whole log and leave the past
    pub fn return_to_live(&self) -> Result<()> {
        let len = self.log.borrow().len();

        tracing::debug!(len, "returning to live");
        self.replay_through(len.checked_sub(1))?;
        self.notify_position(None);
        self.cursor.set(None);
        Ok(())
    }

    /// Move to the previous active event, skipping abandoned ones.
    /// Returns `false` when already at the first active event.
    pub fn step_back(&self) -> Result<bool> {
        let previous = {
            let log = self.log.borrow();
            if log.is_empty() {
                return Err(Error::EmptyLog);
            }
            self.position()
                .or_else(|| log.last_active())
                .and_then(|current| log.previous_active(current))
        };

        match previous {
            Some(previous) => {
                self.replay_to(previous)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move to the next active event, returning to live at the last one.
    /// Returns `false` when already live.
    pub fn step_forward(&self) -> Result<bool> {
        let Some(current) = self.position() else {
            return Ok(false);
        };

        let next = {
            let log = self.log.borrow();
            log.next_active(current)
                .filter(|next| log.next_active(*next).is_some())
        };
        match next {
            Some(next) => self.replay_to(next)?,
            None => self.return_to_live()?,
        }
        Ok(true)
    }

    fn replay_through(&self, through: Option<usize>) -> Result<()> {
        let _pass = ReplayPass::begin((self.listeners)());

        for store in (self.resets)() {
            store.reset_state();
        }

        let plan = match through {
            Some(through) => self.log.borrow().active_through(through),
            None => Vec::new(),
        };
        for (sequence_number, replay) in plan {
            replay();
            self.log.borrow_mut().touch(sequence_number)?;
        }
        Ok(())
    }

    fn notify_position(&self, position: Option<usize>) {
        for listener in (self.positions)() {
            listener.set_replay_position(position);
        }
    }
}

/// One replay pass. Listeners are told the pass ended when this is dropped,
/// including while unwinding from a panicking reducer.
struct ReplayPass {
    listeners: Vec<Rc<dyn ReplayListener>>,
}

impl ReplayPass {
    fn begin(listeners: Vec<Rc<dyn ReplayListener>>) -> Self {
        for listener in &listeners {
            listener.before_replay();
        }
        Self { listeners }
    }
}

impl Drop for ReplayPass {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.after_replay();
        }
    }
}

impl std::fmt::Debug for TimeTraveler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeTraveler")
            .field("state", &self.state())
            .field("events", &self.log.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventLogMiddleware;
    use flowstate_core::{ActionFactory, ActionMetadata, Middleware, MiddlewareActionFactory, Store};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    struct Fixture {
        registry: Rc<Registry>,
        store: Store<i64>,
        increment: flowstate_core::Action<i64>,
        traveler: TimeTraveler,
    }

    fn fixture() -> Fixture {
        let registry = Rc::new(Registry::new());
        let log = ActionEventLog::shared();
        registry.register::<RefCell<ActionEventLog>>(Rc::clone(&log));

        let recorder = Rc::new(EventLogMiddleware::new(log));
        registry.add::<dyn Middleware>(recorder.clone());
        registry.add::<dyn ReplayListener>(recorder.clone());
        registry.add::<dyn ReplayPositionListener>(recorder);

        let factory: Rc<dyn ActionFactory> =
            Rc::new(MiddlewareActionFactory::from_registry(&registry));
        let store = Store::with_factory(0i64, factory);
        let increment = store.create_action_and_subscribe(
            Some(ActionMetadata::new("increment")),
            |store, n: &i64| store.update_state(|count| count + n),
        );
        registry.add::<dyn ResetState>(Rc::new(store.clone()));

        let traveler = TimeTraveler::from_registry(&registry).unwrap();
        Fixture {
            registry,
            store,
            increment,
            traveler,
        }
    }

    #[test]
    fn test_replay_prefix() {
        let f = fixture();
        for n in 1..=3 {
            f.increment.trigger(n);
        }
        assert_eq!(f.store.state(), 6);

        f.traveler.replay_to(1).unwrap();

        assert_eq!(f.store.state(), 3);
        assert_eq!(f.traveler.state(), ReplayState::Replaying { position: 1 });
        assert_eq!(f.traveler.log().borrow().len(), 3);
    }

    #[test]
    fn test_return_to_live_reapplies_everything() {
        let f = fixture();
        for n in 1..=3 {
            f.increment.trigger(n);
        }

        f.traveler.replay_to(0).unwrap();
        assert_eq!(f.store.state(), 1);
        f.traveler.return_to_live().unwrap();

        assert_eq!(f.store.state(), 6);
        assert_eq!(f.traveler.state(), ReplayState::Live);
        assert_eq!(f.traveler.log().borrow().len(), 3);
    }

    #[test]
    fn test_out_of_range_target() {
        let f = fixture();
        f.increment.trigger(1);

        let err = f.traveler.replay_to(1).unwrap_err();
        assert!(matches!(err, Error::ReplayOutOfRange { target: 1, len: 1 }));
        assert_eq!(f.store.state(), 1);
    }

    #[test]
    fn test_inactive_events_are_skipped() {
        let f = fixture();
        for n in [1, 10, 100] {
            f.increment.trigger(n);
        }
        f.traveler.log().borrow_mut().set_active(1, false).unwrap();

        f.traveler.return_to_live().unwrap();

        assert_eq!(f.store.state(), 101);
    }

    #[test]
    fn test_steps() {
        let f = fixture();
        for n in 1..=3 {
            f.increment.trigger(n);
        }

        assert!(f.traveler.step_back().unwrap());
        assert_eq!(f.traveler.position(), Some(1));
        assert!(f.traveler.step_back().unwrap());
        assert!(!f.traveler.step_back().unwrap());
        assert_eq!(f.store.state(), 1);

        assert!(f.traveler.step_forward().unwrap());
        assert_eq!(f.store.state(), 3);
        assert!(f.traveler.step_forward().unwrap());
        assert_eq!(f.traveler.state(), ReplayState::Live);
        assert_eq!(f.store.state(), 6);
        assert!(!f.traveler.step_forward().unwrap());
    }

    #[test]
    fn test_steps_skip_abandoned_events() {
        let f = fixture();
        for n in 1..=3 {
            f.increment.trigger(n);
        }
        f.traveler.replay_to(1).unwrap();
        f.increment.trigger(10);
        assert_eq!(f.store.state(), 13);

        assert!(f.traveler.step_back().unwrap());
        assert_eq!(f.traveler.position(), Some(1));
        assert_eq!(f.store.state(), 3);
        assert!(f.traveler.step_back().unwrap());
        assert_eq!(f.traveler.position(), Some(0));
        assert!(!f.traveler.step_back().unwrap());

        assert!(f.traveler.step_forward().unwrap());
        assert_eq!(f.traveler.position(), Some(1));
        assert!(f.traveler.step_forward().unwrap());
        assert_eq!(f.traveler.state(), ReplayState::Live);
        assert_eq!(f.store.state(), 13);
    }

    #[test]
    fn test_panicking_reducer_still_ends_replay() {
        let f = fixture();
        let fragile = f.store.create_action_and_subscribe(
            Some(ActionMetadata::new("fragile")),
            |store, n: &i64| {
                if *n == 13 {
                    panic!("reducer rejects 13");
                }
                store.update_state(|count| count + n)
            },
        );

        f.increment.trigger(1);
        assert!(catch_unwind(AssertUnwindSafe(|| fragile.trigger(13))).is_err());
        assert_eq!(f.traveler.log().borrow().len(), 2);

        assert!(catch_unwind(AssertUnwindSafe(|| f.traveler.return_to_live())).is_err());

        f.increment.trigger(5);
        assert_eq!(f.traveler.log().borrow().len(), 3);
        assert_eq!(f.store.state(), 6);
    }

    #[test]
    fn test_step_back_on_empty_log() {
        let f = fixture();
        assert!(matches!(f.traveler.step_back(), Err(Error::EmptyLog)));
    }

    #[test]
    fn test_late_registered_store_is_reset() {
        let f = fixture();
        f.increment.trigger(2);

        let late = Store::new(String::from("initial"));
        late.set_state(String::from("changed"));
        f.registry.add::<dyn ResetState>(Rc::new(late.clone()));

        f.traveler.replay_to(0).unwrap();

        assert_eq!(late.state(), "initial");
        assert_eq!(f.store.state(), 2);
    }

    #[test]
    fn test_missing_log_is_config_error() {
        let registry = Rc::new(Registry::new());
        assert!(matches!(
            TimeTraveler::from_registry(&registry),
            Err(Error::Core(flowstate_core::Error::Unresolved { .. }))
        ));
    }
}
