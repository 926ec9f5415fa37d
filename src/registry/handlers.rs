use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::InvokeFault;
use crate::cancel::Cancellation;
use crate::error::BoxError;
use crate::message::{Envelope, Message, Reply, TypeKey};
use crate::resolve::Instance;

/// The single processor for a message type.
///
/// Every handler receives the cancellation token, whether it uses it or not.
/// Return `()` as the output for commands that produce no value.
///
/// ## Example
///
/// ```
/// use relay_rust::{async_trait, BoxError, Cancellation, Handler};
///
/// struct Ping;
/// struct Pong;
/// struct PingHandler;
///
/// #[async_trait]
/// impl Handler<Ping> for PingHandler {
///     type Output = Pong;
///
///     async fn handle(&self, _msg: Ping, _cancel: Cancellation) -> Result<Pong, BoxError> {
///         Ok(Pong)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<M: Message>: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn handle(&self, message: M, cancel: Cancellation) -> Result<Self::Output, BoxError>;
}

pub(crate) type HandlerThunk = Arc<
    dyn Fn(Instance, Envelope, Cancellation) -> BoxFuture<'static, Result<Reply, InvokeFault>>
        + Send
        + Sync,
>;

/// Registered handler for one message type.
#[derive(Clone)]
pub struct HandlerDescriptor {
    handler: TypeKey,
    output: &'static str,
    invoke: HandlerThunk,
}

impl HandlerDescriptor {
    /// Descriptor dispatching `M` to handler type `H`.
    pub fn new<M, H>() -> Self
    where
        M: Message,
        H: Handler<M>,
    {
        let invoke: HandlerThunk = Arc::new(
            |instance: Instance,
             envelope: Envelope,
             cancel: Cancellation|
             -> BoxFuture<'static, Result<Reply, InvokeFault>> {
                Box::pin(async move {
                    let handler = instance
                        .downcast::<H>()
                        .map_err(|_| InvokeFault::WrongInstance)?;
                    let message = envelope
                        .into_message::<M>()
                        .map_err(|_| InvokeFault::WrongPayload(type_name::<M>()))?;
                    let output = handler
                        .handle(message, cancel)
                        .await
                        .map_err(InvokeFault::Failed)?;
                    Ok(Reply::new(output))
                })
            },
        );

        Self {
            handler: TypeKey::of::<H>(),
            output: type_name::<H::Output>(),
            invoke,
        }
    }

    /// Key the resolver is asked for.
    pub fn handler_type(&self) -> TypeKey {
        self.handler
    }

    /// Name of the handler's output type.
    pub fn output_type(&self) -> &'static str {
        self.output
    }

    pub(crate) fn invoke(
        &self,
        instance: Instance,
        envelope: Envelope,
        cancel: Cancellation,
    ) -> BoxFuture<'static, Result<Reply, InvokeFault>> {
        (self.invoke)(instance, envelope, cancel)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("handler", &self.handler)
            .field("output", &self.output)
            .finish()
    }
}

/// Message type -> handler descriptor. At most one entry per message type.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TypeKey, HandlerDescriptor>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the descriptor for `message_type`.
    ///
    /// Returns the descriptor that was replaced, if any.
    pub fn register(
        &mut self,
        message_type: TypeKey,
        descriptor: HandlerDescriptor,
    ) -> Option<HandlerDescriptor> {
        self.handlers.insert(message_type, descriptor)
    }

    pub fn lookup(&self, message_type: &TypeKey) -> Option<&HandlerDescriptor> {
        self.handlers.get(message_type)
    }

    pub fn contains(&self, message_type: &TypeKey) -> bool {
        self.handlers.contains_key(message_type)
    }

    /// Registered (message type, descriptor) pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &HandlerDescriptor)> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
