use std::sync::Arc;

use tracing::{trace, warn};

use crate::cancel::Cancellation;
use crate::error::BusError;
use crate::message::Envelope;
use crate::pipeline::{DispatchResult, Pipeline};
use crate::registry::{HandlerRegistry, InvokeFault};
use crate::resolve::Resolver;

/// Resolves and invokes the single handler for a message.
#[derive(Clone)]
pub struct TerminalDispatcher {
    handlers: Arc<HandlerRegistry>,
    resolver: Arc<dyn Resolver>,
}

impl TerminalDispatcher {
    pub fn new(handlers: Arc<HandlerRegistry>, resolver: Arc<dyn Resolver>) -> Self {
        Self { handlers, resolver }
    }

    /// Dispatch one message to its handler.
    ///
    /// 1. Look up the descriptor by message type (`NoHandlerRegistered`)
    /// 2. Resolve the handler instance (`HandlerResolutionFailed`)
    /// 3. Invoke it, racing the cancellation token (`Cancelled`)
    /// 4. Wrap any handler error with context (`HandlerInvocationFailed`)
    pub async fn dispatch(&self, envelope: Envelope, cancel: Cancellation) -> DispatchResult {
        let message_type = envelope.message_type();

        let descriptor = self
            .handlers
            .lookup(&message_type)
            .ok_or(BusError::NoHandlerRegistered { message_type })?;
        let handler = descriptor.handler_type();

        let instance = self
            .resolver
            .resolve(&handler)
            .ok_or(BusError::HandlerResolutionFailed { handler })?;

        trace!(message_type = %message_type, handler = %handler, "invoking handler");
        let invocation = descriptor.invoke(instance, envelope, cancel.clone());

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BusError::Cancelled),
            outcome = invocation => outcome,
        };

        outcome.map_err(|fault| match fault {
            InvokeFault::WrongInstance => {
                warn!(handler = %handler, "resolver returned an instance of the wrong type");
                BusError::HandlerResolutionFailed { handler }
            }
            InvokeFault::WrongPayload(expected) => BusError::HandlerInvocationFailed {
                message_type,
                handler,
                source: format!("message payload is not a {}", expected).into(),
            },
            InvokeFault::Failed(source) => BusError::HandlerInvocationFailed {
                message_type,
                handler,
                source,
            },
        })
    }

    /// This dispatcher as the innermost pipeline stage.
    pub fn into_pipeline(self) -> Pipeline {
        Pipeline::new(move |envelope, cancel| {
            let dispatcher = self.clone();
            async move { dispatcher.dispatch(envelope, cancel).await }
        })
    }
}
