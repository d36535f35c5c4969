//! Actions: typed, triggerable event channels
//!
//! An [`Action<T>`] is a thin typed facade over a [`DynAction`], which carries
//! type-erased payloads. Middleware works on `DynAction` so a single
//! middleware instance can decorate actions of any payload type.

use crate::observable::{EventStream, Subscription};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

/// Bound for anything that can be sent through an action.
pub trait Payload: Clone + fmt::Debug + Serialize + 'static {}

impl<T: Clone + fmt::Debug + Serialize + 'static> Payload for T {}

/// Object-safe view of a payload
pub trait ActionPayload: fmt::Debug {
    /// Access the concrete payload for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Serialize the payload to compact RON
    fn to_ron(&self) -> Result<String>;

    /// Clone into a new shared payload
    fn clone_erased(&self) -> ErasedPayload;
}

impl<T: Payload> ActionPayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_ron(&self) -> Result<String> {
        ron::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    fn clone_erased(&self) -> ErasedPayload {
        Rc::new(self.clone())
    }
}

/// A shared, type-erased payload as it travels through an action.
pub type ErasedPayload = Rc<dyn ActionPayload>;

/// Label identifying an action for logging and replay
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionMetadata {
    /// Action name (not guaranteed unique)
    pub name: String,
}

impl ActionMetadata {
    /// Create metadata with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Serialize to compact RON
    pub fn to_ron(&self) -> Result<String> {
        ron::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl Default for ActionMetadata {
    fn default() -> Self {
        Self::new("none")
    }
}

impl From<&str> for ActionMetadata {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

enum Channel {
    Source(EventStream<ErasedPayload>),
    Wrapped {
        inner: DynAction,
        before: Rc<dyn Fn(&dyn ActionPayload)>,
    },
}

/// A type-erased action.
///
/// Cloning yields another handle to the same action; identity is by
/// reference (see [`DynAction::ptr_eq`]).
#[derive(Clone)]
pub struct DynAction {
    channel: Rc<Channel>,
}

impl DynAction {
    /// Create a bare action with no subscribers
    pub fn new() -> Self {
        Self {
            channel: Rc::new(Channel::Source(EventStream::new())),
        }
    }

    /// Create a wrapper around `inner`.
    ///
    /// Triggering the wrapper runs `before` and then triggers `inner`.
    /// Subscribing to the wrapper subscribes to `inner`.
    pub fn wrap(inner: DynAction, before: impl Fn(&dyn ActionPayload) + 'static) -> Self {
        Self {
            channel: Rc::new(Channel::Wrapped {
                inner,
                before: Rc::new(before),
            }),
        }
    }

    /// Deliver `payload` to every current subscriber.
    ///
    /// Nothing is buffered: with no subscribers the payload is dropped.
    pub fn trigger(&self, payload: ErasedPayload) {
        match &*self.channel {
            Channel::Source(stream) => stream.emit(&payload),
            Channel::Wrapped { inner, before } => {
                before(&*payload);
                inner.trigger(payload);
            }
        }
    }

    /// Register a handler for every future trigger
    pub fn subscribe(&self, handler: impl Fn(&dyn ActionPayload) + 'static) -> Subscription {
        match &*self.channel {
            Channel::Source(stream) => stream.subscribe(move |payload| handler(&**payload)),
            Channel::Wrapped { inner, .. } => inner.subscribe(handler),
        }
    }

    /// Number of handlers on the underlying source action
    pub fn subscriber_count(&self) -> usize {
        match &*self.channel {
            Channel::Source(stream) => stream.subscriber_count(),
            Channel::Wrapped { inner, .. } => inner.subscriber_count(),
        }
    }

    /// Whether both handles are the same action
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.channel, &other.channel)
    }

    /// A handle that does not keep the action alive
    pub fn downgrade(&self) -> WeakDynAction {
        WeakDynAction {
            channel: Rc::downgrade(&self.channel),
        }
    }

    /// View this action with a concrete payload type
    pub fn typed<T: Payload>(self) -> Action<T> {
        Action {
            inner: self,
            _payload: PhantomData,
        }
    }
}

impl Default for DynAction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DynAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.channel {
            Channel::Source(_) => "source",
            Channel::Wrapped { .. } => "wrapped",
        };
        f.debug_struct("DynAction")
            .field("kind", &kind)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Non-owning handle to a [`DynAction`]
#[derive(Clone)]
pub struct WeakDynAction {
    channel: Weak<Channel>,
}

impl WeakDynAction {
    /// The action, if it is still alive
    pub fn upgrade(&self) -> Option<DynAction> {
        self.channel.upgrade().map(|channel| DynAction { channel })
    }
}

/// A typed action carrying payloads of type `T`.
pub struct Action<T: Payload> {
    inner: DynAction,
    _payload: PhantomData<fn(T)>,
}

impl<T: Payload> Action<T> {
    /// Create a bare action
    pub fn new() -> Self {
        DynAction::new().typed()
    }

    /// Publish `payload` to every current subscriber
    pub fn trigger(&self, payload: T) {
        self.inner.trigger(Rc::new(payload));
    }

    /// The underlying event stream, for composition with other streams
    pub fn observe(&self) -> &DynAction {
        &self.inner
    }

    /// Register a typed handler for every future trigger
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        self.inner.subscribe(move |payload| {
            if let Some(payload) = payload.as_any().downcast_ref::<T>() {
                handler(payload);
            }
        })
    }

    /// Whether both handles are the same action
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// Drop the payload type
    pub fn into_dyn(self) -> DynAction {
        self.inner
    }
}

impl<T: Payload> Clone for Action<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T: Payload> Default for Action<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Action").field(&self.inner).finish()
    }
}
