//! Bus configuration.
//!
//! ```json
//! {
//!   "duplicate_handlers": "reject",
//!   "handler_timeout_ms": 5000,
//!   "trace": true
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What `register_handler` does when the message type already has a handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateHandlerPolicy {
    /// Last registration wins; the replacement is logged.
    #[default]
    Replace,
    /// Fail setup with `BusError::DuplicateHandler`. Registering the same
    /// handler type again is still accepted.
    Reject,
}

/// Setup-time options for a [`Bus`](crate::Bus).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub duplicate_handlers: DuplicateHandlerPolicy,
    /// Installs a [`Timeout`](crate::middleware::Timeout) around the handler
    /// chain when set.
    pub handler_timeout_ms: Option<u64>,
    /// Installs [`TracingMiddleware`](crate::middleware::TracingMiddleware)
    /// when true.
    pub trace: bool,
}

impl BusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_duplicate_handlers(mut self, policy: DuplicateHandlerPolicy) -> Self {
        self.duplicate_handlers = policy;
        self
    }

    /// Sub-millisecond remainders round up, so a non-zero timeout never
    /// becomes zero.
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.handler_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }
}
