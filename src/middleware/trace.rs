use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, debug_span, warn, Instrument};

use crate::cancel::Cancellation;
use crate::message::Envelope;
use crate::pipeline::{DispatchResult, Middleware, Next};

/// Opens a `send` span and logs completion time and failures.
///
/// Register it first so the span covers every other stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl TracingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn handle(&self, envelope: Envelope, cancel: Cancellation, next: Next) -> DispatchResult {
        let message_type = envelope.message_type();
        let span = debug_span!("send", message_type = %message_type.short_name());

        async move {
            let started = Instant::now();
            debug!("dispatching");

            let result = next.run(envelope, cancel).await;
            let elapsed_us = started.elapsed().as_micros() as u64;

            match &result {
                Ok(reply) => debug!(elapsed_us, reply = reply.type_name(), "dispatched"),
                Err(err) => warn!(elapsed_us, error = %err, "dispatch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}
