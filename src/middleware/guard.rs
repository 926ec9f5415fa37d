use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::debug;

use crate::cancel::Cancellation;
use crate::error::BusError;
use crate::message::{Envelope, Message};
use crate::pipeline::{DispatchResult, Middleware, Next};

/// Input validation for one message type.
///
/// Messages of type `M` for which the predicate returns `false` are rejected
/// with [`BusError::GuardRejected`] before reaching the handler. Other message
/// types pass through untouched.
///
/// ## Example
///
/// ```ignore
/// bus.use_middleware(Guard::new(|order: &PlaceOrder| !order.items.is_empty()));
/// ```
pub struct Guard<M> {
    predicate: Box<dyn Fn(&M) -> bool + Send + Sync>,
    _message: PhantomData<fn(&M)>,
}

impl<M: Message> Guard<M> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            _message: PhantomData,
        }
    }
}

#[async_trait]
impl<M: Message> Middleware for Guard<M> {
    async fn handle(&self, envelope: Envelope, cancel: Cancellation, next: Next) -> DispatchResult {
        if let Some(message) = envelope.downcast_ref::<M>() {
            if !(self.predicate)(message) {
                let message_type = envelope.message_type();
                debug!(message_type = %message_type, "guard rejected message");
                return Err(BusError::GuardRejected { message_type });
            }
        }
        next.run(envelope, cancel).await
    }
}

impl<M> fmt::Debug for Guard<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("message", &std::any::type_name::<M>())
            .finish()
    }
}
