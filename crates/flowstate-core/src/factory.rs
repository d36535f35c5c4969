//! Action factories

use crate::action::{Action, ActionMetadata, DynAction, Payload};
use crate::middleware::Middleware;
use crate::registry::Registry;
use std::rc::Rc;

/// Creates actions for stores
pub trait ActionFactory {
    /// Create a type-erased action
    fn create_dyn(&self, metadata: Option<ActionMetadata>) -> DynAction;
}

impl<'a> dyn ActionFactory + 'a {
    /// Create a typed action
    pub fn create<T: Payload>(&self, metadata: Option<ActionMetadata>) -> Action<T> {
        self.create_dyn(metadata).typed()
    }
}

/// Returns bare actions; metadata is ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleActionFactory;

impl ActionFactory for SimpleActionFactory {
    fn create_dyn(&self, _metadata: Option<ActionMetadata>) -> DynAction {
        DynAction::new()
    }
}

/// Threads each new action through an ordered middleware chain
pub struct MiddlewareActionFactory {
    middleware: Vec<Rc<dyn Middleware>>,
}

impl MiddlewareActionFactory {
    pub fn new(middleware: Vec<Rc<dyn Middleware>>) -> Self {
        Self { middleware }
    }

    /// Build from every `dyn Middleware` added to the registry so far
    pub fn from_registry(registry: &Registry) -> Self {
        Self::new(registry.resolve_all::<dyn Middleware>())
    }

    /// Number of middleware in the chain
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

impl ActionFactory for MiddlewareActionFactory {
    fn create_dyn(&self, metadata: Option<ActionMetadata>) -> DynAction {
        let metadata = metadata.unwrap_or_default();
        self.middleware
            .iter()
            .fold(DynAction::new(), |action, middleware| {
                middleware.apply(action, &metadata)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording {
        label: &'static str,
        calls: Rc<RefCell<Vec<String>>>,
        wrap: bool,
    }

    impl Middleware for Recording {
        fn apply(&self, action: DynAction, metadata: &ActionMetadata) -> DynAction {
            self.calls
                .borrow_mut()
                .push(format!("{}:{}", self.label, metadata.name));
            if self.wrap {
                let calls = Rc::clone(&self.calls);
                let label = self.label;
                DynAction::wrap(action, move |_| calls.borrow_mut().push(format!("{label}:trigger")))
            } else {
                action
            }
        }
    }

    fn recording(label: &'static str, calls: &Rc<RefCell<Vec<String>>>, wrap: bool) -> Rc<dyn Middleware> {
        Rc::new(Recording {
            label,
            calls: Rc::clone(calls),
            wrap,
        })
    }

    #[test]
    fn test_simple_factory_ignores_metadata() {
        let factory: Rc<dyn ActionFactory> = Rc::new(SimpleActionFactory);
        let action = factory.create::<u8>(Some(ActionMetadata::new("ignored")));
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        let _sub = action.subscribe(move |v| *s.borrow_mut() = Some(*v));

        action.trigger(9);
        assert_eq!(*seen.borrow(), Some(9));
    }

    #[test]
    fn test_middleware_applied_in_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let factory = MiddlewareActionFactory::new(vec![
            recording("a", &calls, false),
            recording("b", &calls, false),
        ]);

        factory.create_dyn(Some(ActionMetadata::new("load")));

        assert_eq!(*calls.borrow(), vec!["a:load", "b:load"]);
    }

    #[test]
    fn test_metadata_defaults_to_none() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let factory = MiddlewareActionFactory::new(vec![recording("a", &calls, false)]);

        factory.create_dyn(None);

        assert_eq!(*calls.borrow(), vec!["a:none"]);
    }

    #[test]
    fn test_outer_wrapper_runs_first_on_trigger() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let factory = MiddlewareActionFactory::new(vec![
            recording("a", &calls, true),
            recording("b", &calls, true),
        ]);
        let factory: &dyn ActionFactory = &factory;
        let action = factory.create::<i32>(None);
        calls.borrow_mut().clear();

        let c = Rc::clone(&calls);
        let _sub = action.subscribe(move |v| c.borrow_mut().push(format!("store:{v}")));
        action.trigger(1);

        assert_eq!(*calls.borrow(), vec!["b:trigger", "a:trigger", "store:1"]);
    }

    #[test]
    fn test_empty_chain_yields_bare_action() {
        let factory = MiddlewareActionFactory::new(Vec::new());
        assert!(factory.is_empty());
        assert_eq!(factory.create_dyn(None).subscriber_count(), 0);
    }
}
