//! Middleware that records every trigger into the shared event log

use flowstate_core::{
    ActionEvent, ActionMetadata, ActionPayload, DynAction, Middleware, ReplayFn,
    ReplayListener, ReplayPositionListener, SharedEventLog,
};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct RecorderState {
    replaying: Cell<bool>,
    position: Cell<Option<usize>>,
}

/// Appends an [`ActionEvent`] to the shared log on every trigger.
///
/// Recording is suppressed while a replay pass runs. When the application
/// is in the past (replay position `n`), the next live trigger deactivates
/// every event after `n` before appending, so abandoned history is never
/// replayed again.
pub struct EventLogMiddleware {
    log: SharedEventLog,
    state: Rc<RecorderState>,
}

impl EventLogMiddleware {
    pub fn new(log: SharedEventLog) -> Self {
        Self {
            log,
            state: Rc::new(RecorderState::default()),
        }
    }

    /// The log this middleware appends to
    pub fn log(&self) -> &SharedEventLog {
        &self.log
    }

    /// Whether a replay pass is running
    pub fn is_replaying(&self) -> bool {
        self.state.replaying.get()
    }

    /// Replay position, or `None` when live
    pub fn position(&self) -> Option<usize> {
        self.state.position.get()
    }
}

impl Middleware for EventLogMiddleware {
    fn apply(&self, action: DynAction, metadata: &ActionMetadata) -> DynAction {
        let log = Rc::clone(&self.log);
        let state = Rc::clone(&self.state);
        let name = metadata.name.clone();
        let target = action.downgrade();

        let _subscription = action.subscribe(move |payload: &dyn ActionPayload| {
            if state.replaying.get() {
                return;
            }

            let serialized = payload
                .to_ron()
                .unwrap_or_else(|_| format!("{:?}", payload));
            let recorded = payload.clone_erased();
            let target = target.clone();
            let replay: ReplayFn = Rc::new(move || {
                if let Some(action) = target.upgrade() {
                    action.trigger(Rc::clone(&recorded));
                }
            });

            let mut log = log.borrow_mut();
            if let Some(position) = state.position.take() {
                let abandoned = log.deactivate_after(position);
                tracing::debug!(position, abandoned, "branching from the past");
            }
            let sequence_number = log.add_event(ActionEvent::new(name.clone(), serialized, replay));
            tracing::trace!(sequence_number, action = %name, "action event recorded");
        });

        action
    }
}

impl ReplayListener for EventLogMiddleware {
    fn before_replay(&self) {
        self.state.replaying.set(true);
    }

    fn after_replay(&self) {
        self.state.replaying.set(false);
    }
}

impl ReplayPositionListener for EventLogMiddleware {
    fn set_replay_position(&self, position: Option<usize>) {
        self.state.position.set(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowstate_core::ActionEventLog;

    fn recorded_action() -> (SharedEventLog, EventLogMiddleware, DynAction) {
        let log = ActionEventLog::shared();
        let middleware = EventLogMiddleware::new(Rc::clone(&log));
        let action = middleware.apply(DynAction::new(), &ActionMetadata::new("increment"));
        (log, middleware, action)
    }

    #[test]
    fn test_records_each_trigger() {
        let (log, _middleware, action) = recorded_action();
        let action = action.typed::<i64>();

        action.trigger(1);
        action.trigger(2);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].name, "increment");
        assert_eq!(log.events()[1].payload, "2");
        assert_eq!(log.events()[1].sequence_number, 1);
    }

    #[test]
    fn test_suppressed_while_replaying() {
        let (log, middleware, action) = recorded_action();
        let action = action.typed::<i64>();

        middleware.before_replay();
        action.trigger(1);
        assert!(middleware.is_replaying());
        middleware.after_replay();
        action.trigger(2);

        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_replay_fn_retriggers_original_payload() {
        let (log, middleware, action) = recorded_action();
        let typed = action.clone().typed::<i64>();
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = typed.subscribe(move |v| s.set(s.get() + v));

        typed.trigger(5);
        let replay = log.borrow().events()[0].replay_fn();
        middleware.before_replay();
        replay();
        middleware.after_replay();

        assert_eq!(seen.get(), 10);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_trigger_in_the_past_abandons_later_events() {
        let (log, middleware, action) = recorded_action();
        let action = action.typed::<i64>();
        for n in 0..3 {
            action.trigger(n);
        }

        middleware.set_replay_position(Some(0));
        action.trigger(10);

        let flags: Vec<bool> = log.borrow().events().iter().map(|e| e.is_active).collect();
        assert_eq!(flags, vec![true, false, false, true]);
        assert_eq!(middleware.position(), None);
    }

    #[test]
    fn test_replay_after_action_dropped_is_noop() {
        let (log, _middleware, action) = recorded_action();
        action.clone().typed::<i64>().trigger(1);
        let replay = log.borrow().events()[0].replay_fn();

        drop(action);
        replay();

        assert_eq!(log.borrow().len(), 1);
    }
}
