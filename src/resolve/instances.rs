use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Instance, Resolver};
use crate::message::TypeKey;

#[derive(Clone)]
enum Entry {
    /// One instance shared by every call.
    Shared(Instance),
    /// A fresh instance per call.
    Transient(Arc<dyn Fn() -> Instance + Send + Sync>),
}

/// In-memory resolver mapping a type to a shared instance or a factory.
///
/// Features:
/// - Thread-safe (immutable once built, `Clone` shares nothing mutable)
/// - Singletons via [`singleton`](Self::singleton) / [`shared`](Self::shared)
/// - Per-call instances via [`transient`](Self::transient)
///
/// ## Example
///
/// ```
/// use relay_rust::{InstanceResolver, Resolver, TypeKey};
///
/// struct PingHandler;
///
/// let resolver = InstanceResolver::new().singleton(PingHandler);
/// assert!(resolver.resolve(&TypeKey::of::<PingHandler>()).is_some());
/// ```
#[derive(Clone, Default)]
pub struct InstanceResolver {
    entries: HashMap<TypeKey, Entry>,
}

impl InstanceResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` as the single instance of `T`.
    pub fn singleton<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.shared(Arc::new(value))
    }

    /// Register an already shared instance of `T`.
    ///
    /// Useful when the test or caller keeps its own handle to the instance.
    pub fn shared<T: Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.entries
            .insert(TypeKey::of::<T>(), Entry::Shared(value as Instance));
        self
    }

    /// Register a factory producing a fresh `T` on every resolution.
    pub fn transient<T, F>(mut self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.entries.insert(
            TypeKey::of::<T>(),
            Entry::Transient(Arc::new(move || Arc::new(factory()) as Instance)),
        );
        self
    }

    /// Whether an entry for `T` exists.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeKey::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Resolver for InstanceResolver {
    fn resolve(&self, key: &TypeKey) -> Option<Instance> {
        match self.entries.get(key)? {
            Entry::Shared(instance) => Some(Arc::clone(instance)),
            Entry::Transient(factory) => Some(factory()),
        }
    }
}

impl fmt::Debug for InstanceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().map(|k| k.name()).collect();
        names.sort_unstable();
        f.debug_struct("InstanceResolver")
            .field("entries", &names)
            .finish()
    }
}
