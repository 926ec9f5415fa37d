use std::any::Any;
use std::sync::Arc;

use crate::message::TypeKey;

/// A live handler or subscriber instance, type-erased.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Supplies handler and subscriber instances by type key.
///
/// Called once per handler per `send` and once per subscriber per `publish`,
/// so per-call lifetimes (fresh instance every time) and singletons are both
/// decided here, outside the bus.
///
/// Returning `None` for a handler fails the `send` with
/// `HandlerResolutionFailed`; for a subscriber it skips that subscriber.
pub trait Resolver: Send + Sync {
    fn resolve(&self, key: &TypeKey) -> Option<Instance>;
}

impl<F> Resolver for F
where
    F: Fn(&TypeKey) -> Option<Instance> + Send + Sync,
{
    fn resolve(&self, key: &TypeKey) -> Option<Instance> {
        self(key)
    }
}
