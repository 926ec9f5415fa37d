use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::cancel::Cancellation;
use crate::error::BusError;
use crate::message::Envelope;
use crate::pipeline::{DispatchResult, Middleware, Next};

/// Fails a `send` with [`BusError::TimedOut`] when the rest of the chain takes
/// longer than `duration`. The inner future is dropped on expiry.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[async_trait]
impl Middleware for Timeout {
    async fn handle(&self, envelope: Envelope, cancel: Cancellation, next: Next) -> DispatchResult {
        let message_type = envelope.message_type();
        match tokio::time::timeout(self.duration, next.run(envelope, cancel)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(message_type = %message_type, timeout = ?self.duration, "send timed out");
                Err(BusError::TimedOut(self.duration))
            }
        }
    }
}
