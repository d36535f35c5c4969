//! Observable state containers

use crate::action::{Action, ActionMetadata, Payload};
use crate::factory::{ActionFactory, SimpleActionFactory};
use crate::observable::{Observable, Subscription};
use crate::replay::ResetState;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type InitHook<S> = Box<dyn FnOnce(&Store<S>)>;

struct StoreInner<S: Clone + 'static> {
    initial: S,
    state: Observable<S>,
    factory: Rc<dyn ActionFactory>,
    on_init: RefCell<Option<InitHook<S>>>,
    initialized: Cell<bool>,
}

/// Owns one slice of application state.
///
/// State is replaced wholesale on every change and published to every
/// subscriber synchronously. `Store` is a cheap handle; clones share state.
///
/// # Example
///
/// ```
/// use flowstate_core::{ActionMetadata, Store};
///
/// let store = Store::new(0i64);
/// let increment = store.create_action_and_subscribe(
///     Some(ActionMetadata::new("increment")),
///     |store, n: &i64| store.update_state(|count| count + n),
/// );
///
/// increment.trigger(1);
/// increment.trigger(4);
/// assert_eq!(store.state(), 5);
/// ```
pub struct Store<S: Clone + 'static> {
    inner: Rc<StoreInner<S>>,
}

impl<S: Clone + 'static> Store<S> {
    /// Create a store whose actions come from a [`SimpleActionFactory`]
    pub fn new(initial: S) -> Self {
        Self::with_factory(initial, Rc::new(SimpleActionFactory))
    }

    /// Create a store with an injected action factory
    pub fn with_factory(initial: S, factory: Rc<dyn ActionFactory>) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: Observable::new(initial.clone()),
                initial,
                factory,
                on_init: RefCell::new(None),
                initialized: Cell::new(false),
            }),
        }
    }

    /// Register a hook run once, on the first call to [`observe`](Store::observe)
    pub fn on_init(&self, hook: impl FnOnce(&Store<S>) + 'static) {
        *self.inner.on_init.borrow_mut() = Some(Box::new(hook));
    }

    /// The underlying observable state
    pub fn observe(&self) -> Observable<S> {
        if !self.inner.initialized.replace(true) {
            let hook = self.inner.on_init.borrow_mut().take();
            if let Some(hook) = hook {
                hook(self);
            }
        }
        self.inner.state.clone()
    }

    /// Receive the current state now and every later state
    pub fn subscribe(&self, handler: impl Fn(&S) + 'static) -> Subscription {
        self.observe().subscribe(handler)
    }

    /// Clone of the current state
    pub fn state(&self) -> S {
        self.inner.state.get()
    }

    /// The state this store was created with
    pub fn initial_state(&self) -> &S {
        &self.inner.initial
    }

    /// Replace the state. `None` is ignored and notifies nobody.
    pub fn set_state(&self, next: impl Into<Option<S>>) {
        if let Some(next) = next.into() {
            self.inner.state.next(next);
        }
    }

    /// Compute the next state from the current one
    pub fn update_state<R: Into<Option<S>>>(&self, f: impl FnOnce(&S) -> R) {
        let current = self.state();
        self.set_state(f(&current));
    }

    /// Create an action through this store's factory
    pub fn create_action<T: Payload>(&self, metadata: Option<ActionMetadata>) -> Action<T> {
        self.inner.factory.create(metadata)
    }

    /// Create an action and wire its payloads to `handler`.
    ///
    /// The handler holds only a weak reference to the store, so an action
    /// outliving its store becomes inert.
    pub fn create_action_and_subscribe<T: Payload>(
        &self,
        metadata: Option<ActionMetadata>,
        handler: impl Fn(&Store<S>, &T) + 'static,
    ) -> Action<T> {
        let action = self.create_action::<T>(metadata);
        let store: Weak<StoreInner<S>> = Rc::downgrade(&self.inner);
        let _subscription = action.subscribe(move |payload| {
            if let Some(inner) = store.upgrade() {
                handler(&Store { inner }, payload);
            }
        });
        action
    }

    /// Whether both handles share the same state
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: Clone + 'static> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Clone + 'static> ResetState for Store<S> {
    fn reset_state(&self) {
        self.set_state(self.inner.initial.clone());
    }
}

impl<S: Clone + fmt::Debug + 'static> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state())
            .field("initialized", &self.inner.initialized.get())
            .finish()
    }
}
