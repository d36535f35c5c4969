//! Synchronous publish/subscribe primitives
//!
//! - [`EventStream`]: a multicast stream with no held value. Events emitted
//!   while nobody listens are dropped.
//! - [`Observable`]: holds a current value; new subscribers receive it
//!   immediately, then every later value.
//! - [`Subscription`]: handle returned by `subscribe`, used to stop delivery.
//!
//! Delivery is single-threaded and runs handlers in registration order.
//! No internal borrow is held while a handler runs, so handlers may emit,
//! subscribe, or unsubscribe re-entrantly.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Handler<T> = Rc<dyn Fn(&T)>;

struct Subscribers<T: 'static> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

impl<T: 'static> Subscribers<T> {
    fn new() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    fn contains(&self, id: u64) -> bool {
        self.handlers.iter().any(|(h, _)| *h == id)
    }
}

/// Type-erased removal so [`Subscription`] does not carry the payload type.
trait Unsubscribe {
    fn remove(&self, id: u64);
    fn contains(&self, id: u64) -> bool;
}

impl<T: 'static> Unsubscribe for RefCell<Subscribers<T>> {
    fn remove(&self, id: u64) {
        self.borrow_mut().handlers.retain(|(h, _)| *h != id);
    }

    fn contains(&self, id: u64) -> bool {
        self.borrow().contains(id)
    }
}

/// Handle to a registered handler.
///
/// Dropping a `Subscription` does not unsubscribe; call [`unsubscribe`]
/// or convert it with [`guard`] for drop-based cleanup.
///
/// [`unsubscribe`]: Subscription::unsubscribe
/// [`guard`]: Subscription::guard
#[derive(Clone)]
pub struct Subscription {
    source: Weak<dyn Unsubscribe>,
    id: u64,
}

impl Subscription {
    /// Stop delivering events to this handler.
    ///
    /// Idempotent, and a no-op once the source has been dropped.
    pub fn unsubscribe(&self) {
        if let Some(source) = self.source.upgrade() {
            source.remove(self.id);
        }
    }

    /// Whether the handler is still registered with a live source.
    pub fn is_active(&self) -> bool {
        self.source
            .upgrade()
            .map(|source| source.contains(self.id))
            .unwrap_or(false)
    }

    /// Convert into a guard that unsubscribes when dropped.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// RAII wrapper around a [`Subscription`].
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

/// A synchronous multicast event stream without a held value.
pub struct EventStream<T: 'static> {
    subscribers: Rc<RefCell<Subscribers<T>>>,
}

impl<T: 'static> EventStream<T> {
    /// Create a stream with no subscribers
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Subscribers::new())),
        }
    }

    /// Register a handler for every future event
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut subscribers = self.subscribers.borrow_mut();
            let id = subscribers.next_id;
            subscribers.next_id += 1;
            subscribers.handlers.push((id, Rc::new(handler)));
            id
        };
        let source: Rc<dyn Unsubscribe> = self.subscribers.clone();
        Subscription {
            source: Rc::downgrade(&source),
            id,
        }
    }

    /// Deliver `value` to every current subscriber in registration order.
    ///
    /// Handlers removed during this pass are skipped; handlers added during
    /// this pass only see later events.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Handler<T>)> = self.subscribers.borrow().handlers.clone();
        for (id, handler) in snapshot {
            if self.subscribers.borrow().contains(id) {
                handler(value);
            }
        }
    }

    /// Number of registered handlers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().handlers.len()
    }

    /// Whether two handles refer to the same stream
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.subscribers, &other.subscribers)
    }
}

impl<T: 'static> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T: 'static> Default for EventStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A value holder that replays its latest value to new subscribers.
pub struct Observable<T: 'static> {
    value: Rc<RefCell<T>>,
    stream: EventStream<T>,
}

impl<T: Clone + 'static> Observable<T> {
    /// Create an observable holding `initial`
    pub fn new(initial: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial)),
            stream: EventStream::new(),
        }
    }

    /// Clone of the current value
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Register `handler`, invoking it at once with the current value and
    /// then with every value passed to [`next`](Observable::next).
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        let handler: Handler<T> = Rc::new(handler);
        let registered = Rc::clone(&handler);
        let subscription = self.stream.subscribe(move |value| registered(value));
        let current = self.get();
        handler(&current);
        subscription
    }

    /// Replace the held value and notify every subscriber
    pub fn next(&self, value: T) {
        *self.value.borrow_mut() = value.clone();
        self.stream.emit(&value);
    }

    /// Number of registered handlers
    pub fn subscriber_count(&self) -> usize {
        self.stream.subscriber_count()
    }
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            stream: self.stream.clone(),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.value.borrow())
            .field("subscribers", &self.stream.subscriber_count())
            .finish()
    }
}
