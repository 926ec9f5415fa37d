//! Bundled middleware.
//!
//! - [`TracingMiddleware`] - a `tracing` span and timing per `send`
//! - [`Guard`] - reject a message type when a predicate fails
//! - [`Timeout`] - bound how long the rest of the chain may take

mod guard;
mod timeout;
mod trace;

pub use guard::Guard;
pub use timeout::Timeout;
pub use trace::TracingMiddleware;
