use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::InvokeFault;
use crate::cancel::Cancellation;
use crate::error::BoxError;
use crate::message::{Event, TypeKey};
use crate::resolve::Instance;

/// One of possibly many processors for an event type.
///
/// Subscribers of the same event run concurrently; none may assume another
/// has started or finished.
#[async_trait]
pub trait Subscriber<E: Event>: Send + Sync + 'static {
    async fn on_event(&self, event: &E, cancel: Cancellation) -> Result<(), BoxError>;
}

pub(crate) type SharedEvent = Arc<dyn Any + Send + Sync>;

pub(crate) type SubscriberThunk = Arc<
    dyn Fn(Instance, SharedEvent, Cancellation) -> BoxFuture<'static, Result<(), InvokeFault>>
        + Send
        + Sync,
>;

/// Registered subscriber for one event type.
#[derive(Clone)]
pub struct SubscriberDescriptor {
    subscriber: TypeKey,
    invoke: SubscriberThunk,
}

impl SubscriberDescriptor {
    /// Descriptor delivering `E` to subscriber type `S`.
    pub fn new<E, S>() -> Self
    where
        E: Event,
        S: Subscriber<E>,
    {
        let invoke: SubscriberThunk = Arc::new(
            |instance: Instance,
             event: SharedEvent,
             cancel: Cancellation|
             -> BoxFuture<'static, Result<(), InvokeFault>> {
                Box::pin(async move {
                    let subscriber = instance
                        .downcast::<S>()
                        .map_err(|_| InvokeFault::WrongInstance)?;
                    let event = event
                        .downcast::<E>()
                        .map_err(|_| InvokeFault::WrongPayload(type_name::<E>()))?;
                    subscriber
                        .on_event(&event, cancel)
                        .await
                        .map_err(InvokeFault::Failed)
                })
            },
        );

        Self {
            subscriber: TypeKey::of::<S>(),
            invoke,
        }
    }

    /// Key the resolver is asked for.
    pub fn subscriber_type(&self) -> TypeKey {
        self.subscriber
    }

    pub(crate) fn invoke(
        &self,
        instance: Instance,
        event: SharedEvent,
        cancel: Cancellation,
    ) -> BoxFuture<'static, Result<(), InvokeFault>> {
        (self.invoke)(instance, event, cancel)
    }
}

impl fmt::Debug for SubscriberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberDescriptor")
            .field("subscriber", &self.subscriber)
            .finish()
    }
}

/// Event type -> ordered subscriber descriptors.
///
/// A subscriber key appears at most once per event type; order is insertion
/// order and only affects iteration, not delivery.
#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    subscribers: HashMap<TypeKey, Vec<SubscriberDescriptor>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `descriptor` for `event_type` unless its subscriber key is
    /// already present. Returns whether it was added.
    pub fn register(&mut self, event_type: TypeKey, descriptor: SubscriberDescriptor) -> bool {
        let list = self.subscribers.entry(event_type).or_default();
        if list
            .iter()
            .any(|existing| existing.subscriber == descriptor.subscriber)
        {
            return false;
        }
        list.push(descriptor);
        true
    }

    /// Subscribers for `event_type` in registration order. Empty if none.
    pub fn lookup(&self, event_type: &TypeKey) -> &[SubscriberDescriptor] {
        self.subscribers
            .get(event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Registered event types with their subscribers, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &[SubscriberDescriptor])> {
        self.subscribers
            .iter()
            .map(|(event_type, list)| (event_type, list.as_slice()))
    }

    /// Number of event types with at least one subscriber.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
