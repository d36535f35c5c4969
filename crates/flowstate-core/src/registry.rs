//! Typed dependency registry
//!
//! Capabilities are keyed by Rust type rather than by string, including
//! trait objects: `registry.add::<dyn Middleware>(..)` and
//! `registry.resolve_all::<dyn Middleware>()` address the same collection.
//!
//! The registry can grow after collaborators were constructed. Use
//! [`Registry::provider`] to hand out a closure that resolves a collection
//! at call time instead of caching it.

use crate::{Error, Result};
use indexmap::IndexMap;
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Lazily resolves every registered implementation of `T`
pub type Provider<T> = Rc<dyn Fn() -> Vec<Rc<T>>>;

struct Slot {
    name: &'static str,
    values: Vec<Box<dyn Any>>,
}

impl Slot {
    fn new<T: ?Sized + 'static>() -> Self {
        Self {
            name: type_name::<T>(),
            values: Vec::new(),
        }
    }
}

/// Composition root for stores, factories, and replay collaborators
#[derive(Default)]
pub struct Registry {
    singles: RefCell<IndexMap<TypeId, Slot>>,
    collections: RefCell<IndexMap<TypeId, Slot>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the single implementation of `T`, replacing any previous one
    pub fn register<T: ?Sized + 'static>(&self, value: Rc<T>) {
        let mut slot = Slot::new::<T>();
        slot.values.push(Box::new(value));
        self.singles.borrow_mut().insert(TypeId::of::<T>(), slot);
    }

    /// Resolve the single implementation of `T`
    pub fn resolve<T: ?Sized + 'static>(&self) -> Result<Rc<T>> {
        let resolved = self
            .singles
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.values.first())
            .and_then(|value| value.downcast_ref::<Rc<T>>())
            .cloned();
        resolved.ok_or_else(|| {
            tracing::debug!(capability = type_name::<T>(), "unresolved capability");
            Error::Unresolved {
                capability: type_name::<T>(),
            }
        })
    }

    /// Whether a single implementation of `T` is registered
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.singles.borrow().contains_key(&TypeId::of::<T>())
    }

    /// Append an implementation to the collection for `T`
    pub fn add<T: ?Sized + 'static>(&self, value: Rc<T>) {
        self.collections
            .borrow_mut()
            .entry(TypeId::of::<T>())
            .or_insert_with(Slot::new::<T>)
            .values
            .push(Box::new(value));
    }

    /// Every implementation added for `T`, in registration order
    pub fn resolve_all<T: ?Sized + 'static>(&self) -> Vec<Rc<T>> {
        self.collections
            .borrow()
            .get(&TypeId::of::<T>())
            .map(|slot| {
                slot.values
                    .iter()
                    .filter_map(|value| value.downcast_ref::<Rc<T>>())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A closure resolving the collection for `T` each time it is called.
    ///
    /// Holds a weak reference; once the registry is dropped it yields nothing.
    pub fn provider<T: ?Sized + 'static>(self: &Rc<Self>) -> Provider<T> {
        let registry: Weak<Self> = Rc::downgrade(self);
        Rc::new(move || {
            registry
                .upgrade()
                .map(|registry| registry.resolve_all::<T>())
                .unwrap_or_default()
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let singles: Vec<&str> = self.singles.borrow().values().map(|s| s.name).collect();
        let collections: Vec<(&str, usize)> = self
            .collections
            .borrow()
            .values()
            .map(|s| (s.name, s.values.len()))
            .collect();
        f.debug_struct("Registry")
            .field("singles", &singles)
            .field("collections", &collections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct English;
    struct French;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    impl Greeter for French {
        fn greet(&self) -> String {
            "bonjour".into()
        }
    }

    #[test]
    fn test_register_and_resolve_trait_object() {
        let registry = Registry::new();
        registry.register::<dyn Greeter>(Rc::new(English));

        let greeter = registry.resolve::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
        assert!(registry.contains::<dyn Greeter>());
    }

    #[test]
    fn test_missing_capability_is_config_error() {
        let registry = Registry::new();
        let err = registry.resolve::<dyn Greeter>().err().unwrap();
        match err {
            Error::Unresolved { capability } => assert!(capability.contains("Greeter")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collections_keep_order() {
        let registry = Registry::new();
        registry.add::<dyn Greeter>(Rc::new(French));
        registry.add::<dyn Greeter>(Rc::new(English));

        let greetings: Vec<String> = registry
            .resolve_all::<dyn Greeter>()
            .iter()
            .map(|g| g.greet())
            .collect();
        assert_eq!(greetings, vec!["bonjour", "hello"]);
    }

    #[test]
    fn test_singles_and_collections_are_separate() {
        let registry = Registry::new();
        registry.register::<dyn Greeter>(Rc::new(English));
        assert!(registry.resolve_all::<dyn Greeter>().is_empty());
    }

    #[test]
    fn test_provider_sees_later_registrations() {
        let registry = Rc::new(Registry::new());
        let provider = registry.provider::<dyn Greeter>();
        assert!(provider().is_empty());

        registry.add::<dyn Greeter>(Rc::new(English));
        assert_eq!(provider().len(), 1);

        drop(registry);
        assert!(provider().is_empty());
    }

    #[test]
    fn test_concrete_types_resolve() {
        let registry = Registry::new();
        registry.register(Rc::new(42u32));
        assert_eq!(*registry.resolve::<u32>().unwrap(), 42);
    }
}
