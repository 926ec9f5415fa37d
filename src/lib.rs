//! In-process message router.
//!
//! - `send` routes a message to exactly one handler through a middleware
//!   pipeline and returns its reply.
//! - `publish` fans an event out to every subscriber concurrently and reports
//!   every failure, not just the first.
//!
//! Handlers and subscribers are registered by type and obtained from a
//! [`Resolver`] at dispatch time.

mod bus;
mod cancel;
mod config;
mod dispatch;
mod error;
mod message;
pub mod middleware;
mod pipeline;
mod registry;
mod resolve;

pub use bus::{Bus, HandlerRoute, SubscriberRoute, Topology};
pub use cancel::{Cancellation, CancellationSource};
pub use config::{BusConfig, DuplicateHandlerPolicy};
pub use dispatch::{EventBroadcaster, PublishReport, TerminalDispatcher};
pub use error::{
    AggregateSubscriberError, BoxError, BusError, SubscriberFailure, SubscriberFailureKind,
};
pub use message::{Envelope, Event, Message, Reply, TypeKey};
pub use middleware::{Guard, Timeout, TracingMiddleware};
pub use pipeline::{
    build, from_fn, middleware_factory, DispatchResult, Middleware, MiddlewareFactory, Next,
    Pipeline,
};
pub use registry::{
    Handler, HandlerDescriptor, HandlerRegistry, Subscriber, SubscriberDescriptor,
    SubscriberRegistry,
};
pub use resolve::{Instance, InstanceResolver, Resolver};

// Re-export so handler and subscriber impls don't need their own dependency
pub use async_trait::async_trait;
