//! Bus - owns the registries and the compiled pipeline.

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use super::topology::Topology;
use crate::cancel::Cancellation;
use crate::config::{BusConfig, DuplicateHandlerPolicy};
use crate::dispatch::{EventBroadcaster, PublishReport, TerminalDispatcher};
use crate::error::BusError;
use crate::message::{Envelope, Event, Message, Reply, TypeKey};
use crate::middleware::{Timeout, TracingMiddleware};
use crate::pipeline::{
    build, from_fn, middleware_factory, DispatchResult, Middleware, MiddlewareFactory, Next,
    Pipeline,
};
use crate::registry::{
    Handler, HandlerDescriptor, HandlerRegistry, Subscriber, SubscriberDescriptor,
    SubscriberRegistry,
};
use crate::resolve::Resolver;

/// In-process message router.
///
/// `send` delivers a message to its one handler through the middleware
/// pipeline. `publish` delivers an event to every subscriber concurrently.
///
/// ## Example
///
/// ```
/// use relay_rust::{async_trait, BoxError, Bus, Cancellation, Handler, InstanceResolver};
///
/// struct Ping;
/// #[derive(Debug, PartialEq)]
/// struct Pong;
/// struct PingHandler;
///
/// #[async_trait]
/// impl Handler<Ping> for PingHandler {
///     type Output = Pong;
///     async fn handle(&self, _msg: Ping, _cancel: Cancellation) -> Result<Pong, BoxError> {
///         Ok(Pong)
///     }
/// }
///
/// # tokio_test_block(async {
/// let mut bus = Bus::new(InstanceResolver::new().singleton(PingHandler));
/// bus.register_handler::<Ping, PingHandler>().unwrap();
///
/// let pong: Pong = bus.send_typed(Ping, Cancellation::none()).await.unwrap();
/// assert_eq!(pong, Pong);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f);
/// # }
/// ```
pub struct Bus {
    config: BusConfig,
    resolver: Arc<dyn Resolver>,
    handlers: Arc<HandlerRegistry>,
    subscribers: Arc<SubscriberRegistry>,
    middleware: Vec<MiddlewareFactory>,
    pipeline: Pipeline,
    broadcaster: EventBroadcaster,
}

impl Bus {
    /// Create a bus with default configuration.
    pub fn new<R: Resolver + 'static>(resolver: R) -> Self {
        Self::with_config(resolver, BusConfig::default())
    }

    /// Create a bus with the given configuration.
    ///
    /// Configured middleware (tracing, then timeout) is installed ahead of
    /// anything added with [`use_middleware`](Self::use_middleware).
    pub fn with_config<R: Resolver + 'static>(resolver: R, config: BusConfig) -> Self {
        let resolver: Arc<dyn Resolver> = Arc::new(resolver);
        let handlers = Arc::new(HandlerRegistry::new());
        let subscribers = Arc::new(SubscriberRegistry::new());

        let mut middleware = Vec::new();
        if config.trace {
            middleware.push(middleware_factory(TracingMiddleware));
        }
        if let Some(timeout) = config.handler_timeout() {
            middleware.push(middleware_factory(Timeout::new(timeout)));
        }

        let terminal = TerminalDispatcher::new(Arc::clone(&handlers), Arc::clone(&resolver));
        let pipeline = build(&middleware, terminal.into_pipeline());
        let broadcaster = EventBroadcaster::new(Arc::clone(&subscribers), Arc::clone(&resolver));

        Self {
            config,
            resolver,
            handlers,
            subscribers,
            middleware,
            pipeline,
            broadcaster,
        }
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Route message type `M` to handler type `H`.
    ///
    /// With [`DuplicateHandlerPolicy::Replace`] (the default) a second handler
    /// for `M` replaces the first. With [`DuplicateHandlerPolicy::Reject`] it
    /// fails with [`BusError::DuplicateHandler`].
    pub fn register_handler<M, H>(&mut self) -> Result<&mut Self, BusError>
    where
        M: Message,
        H: Handler<M>,
    {
        let message_type = TypeKey::of::<M>();
        let handler = TypeKey::of::<H>();

        let existing = self
            .handlers
            .lookup(&message_type)
            .map(|descriptor| descriptor.handler_type());
        if let Some(existing) = existing.filter(|existing| *existing != handler) {
            if self.config.duplicate_handlers == DuplicateHandlerPolicy::Reject {
                return Err(BusError::DuplicateHandler {
                    message_type,
                    existing,
                });
            }
            info!(
                message_type = %message_type,
                replaced = %existing,
                handler = %handler,
                "replacing handler"
            );
        }

        self.detach();
        Arc::make_mut(&mut self.handlers)
            .register(message_type, HandlerDescriptor::new::<M, H>());
        debug!(message_type = %message_type, handler = %handler, "handler registered");

        self.rebuild();
        Ok(self)
    }

    /// Add subscriber type `S` for event type `E`. Registering the same
    /// subscriber twice for one event is a no-op.
    pub fn register_subscriber<E, S>(&mut self) -> &mut Self
    where
        E: Event,
        S: Subscriber<E>,
    {
        let event_type = TypeKey::of::<E>();
        let subscriber = TypeKey::of::<S>();

        self.detach();
        let added = Arc::make_mut(&mut self.subscribers)
            .register(event_type, SubscriberDescriptor::new::<E, S>());
        if added {
            debug!(event_type = %event_type, subscriber = %subscriber, "subscriber registered");
        } else {
            debug!(event_type = %event_type, subscriber = %subscriber, "subscriber already registered");
        }
        self.rebuild();
        self
    }

    /// Append a middleware. Middleware run in registration order on the way
    /// in and in reverse on the way out.
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.use_middleware_factory(middleware_factory(middleware))
    }

    /// Append a middleware written as an async function.
    pub fn use_middleware_fn<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Envelope, Cancellation, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult> + Send + 'static,
    {
        self.use_middleware_factory(from_fn(f))
    }

    /// Append a raw factory: given the rest of the chain, return a stage
    /// wrapping it.
    pub fn use_middleware_factory(&mut self, factory: MiddlewareFactory) -> &mut Self {
        self.middleware.push(factory);
        debug!(middleware = self.middleware.len(), "middleware added");
        self.rebuild();
        self
    }

    /// Point the compiled pipeline and broadcaster at empty registries so the
    /// bus holds the only reference to the live ones and `Arc::make_mut`
    /// updates them in place instead of copying. Always followed by
    /// `rebuild`.
    fn detach(&mut self) {
        let resolver = Arc::clone(&self.resolver);
        self.pipeline = TerminalDispatcher::new(Arc::default(), Arc::clone(&resolver)).into_pipeline();
        self.broadcaster = EventBroadcaster::new(Arc::default(), resolver);
    }

    /// Recompile the pipeline and broadcaster from the current registries.
    fn rebuild(&mut self) {
        let terminal = TerminalDispatcher::new(Arc::clone(&self.handlers), Arc::clone(&self.resolver));
        self.pipeline = build(&self.middleware, terminal.into_pipeline());
        self.broadcaster =
            EventBroadcaster::new(Arc::clone(&self.subscribers), Arc::clone(&self.resolver));
    }

    // =========================================================================
    // Runtime
    // =========================================================================

    /// Send a message through the pipeline to its handler.
    pub async fn send<M: Message>(&self, message: M, cancel: Cancellation) -> Result<Reply, BusError> {
        self.pipeline.run(Envelope::new(message), cancel).await
    }

    /// Send a message and read the reply as a `T`.
    ///
    /// Fails with [`BusError::ResultTypeMismatch`] when the handler produced
    /// something else. Use `T = ()` for handlers without output.
    pub async fn send_typed<M, T>(&self, message: M, cancel: Cancellation) -> Result<T, BusError>
    where
        M: Message,
        T: Any,
    {
        let reply = self.send(message, cancel).await?;
        reply
            .into_value::<T>()
            .map_err(|reply| BusError::ResultTypeMismatch {
                expected: type_name::<T>(),
                actual: reply.type_name(),
            })
    }

    /// Publish an event to every subscriber.
    ///
    /// Returns `Ok(())` when every invoked subscriber succeeded (including when
    /// there are none), otherwise [`BusError::Subscribers`] naming each one
    /// that failed. Subscribers the resolver cannot supply are skipped. Fails
    /// with [`BusError::Cancelled`] without running anything if `cancel` has
    /// already fired.
    pub async fn publish<E: Event>(&self, event: E, cancel: Cancellation) -> Result<(), BusError> {
        cancel.check()?;
        self.broadcaster.broadcast(event, cancel).await.into_result()
    }

    /// Publish an event and return the full report (invoked, skipped,
    /// failures) instead of an aggregate error.
    ///
    /// If `cancel` has already fired no subscriber runs and each one is
    /// reported as a `Cancelled` failure.
    pub async fn publish_report<E: Event>(&self, event: E, cancel: Cancellation) -> PublishReport {
        self.broadcaster.broadcast(event, cancel).await
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Message types with a handler, sorted by type name.
    pub fn handlers(&self) -> Vec<TypeKey> {
        let mut types: Vec<_> = self.handlers.iter().map(|(key, _)| *key).collect();
        types.sort_by_key(|key| key.name());
        types
    }

    /// The handler type registered for `M`.
    pub fn handler_for<M: Message>(&self) -> Option<TypeKey> {
        self.handlers
            .lookup(&TypeKey::of::<M>())
            .map(|descriptor| descriptor.handler_type())
    }

    /// Subscriber types for `E`, in registration order.
    pub fn subscribers<E: Event>(&self) -> Vec<TypeKey> {
        self.subscribers
            .lookup(&TypeKey::of::<E>())
            .iter()
            .map(|descriptor| descriptor.subscriber_type())
            .collect()
    }

    /// Number of middleware in the pipeline, including configured ones.
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    /// Snapshot of the current wiring.
    pub fn topology(&self) -> Topology {
        Topology::capture(&self.handlers, &self.subscribers, self.middleware.len())
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("config", &self.config)
            .field("handlers", &self.handlers.len())
            .field("event_types", &self.subscribers.len())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
