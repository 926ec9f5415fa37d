use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::stage::{DispatchResult, Next, Pipeline};
use crate::cancel::Cancellation;
use crate::message::Envelope;

/// Cross-cutting behaviour wrapped around every `send`.
///
/// Call `next.run(envelope, cancel).await` to continue down the chain. Not
/// calling it short-circuits the chain with whatever this stage returns.
/// Errors observed from `next` should normally be returned as they are.
///
/// ## Example
///
/// ```
/// use relay_rust::{async_trait, Cancellation, DispatchResult, Envelope, Middleware, Next};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Middleware for Audit {
///     async fn handle(&self, envelope: Envelope, cancel: Cancellation, next: Next) -> DispatchResult {
///         let message_type = envelope.message_type();
///         let result = next.run(envelope, cancel).await;
///         println!("{} -> ok={}", message_type, result.is_ok());
///         result
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, envelope: Envelope, cancel: Cancellation, next: Next) -> DispatchResult;
}

/// Given the rest of the chain, produce a stage wrapping it.
pub type MiddlewareFactory = Arc<dyn Fn(Next) -> Pipeline + Send + Sync>;

/// Factory for a [`Middleware`] implementation.
///
/// The middleware value is shared by every pipeline built from the factory.
pub fn middleware_factory<M: Middleware>(middleware: M) -> MiddlewareFactory {
    let middleware = Arc::new(middleware);
    Arc::new(move |next: Next| {
        let middleware = Arc::clone(&middleware);
        Pipeline::new(move |envelope, cancel| {
            let middleware = Arc::clone(&middleware);
            let next = next.clone();
            async move { middleware.handle(envelope, cancel, next).await }
        })
    })
}

/// Factory for a plain async function `(envelope, cancel, next) -> result`.
pub fn from_fn<F, Fut>(f: F) -> MiddlewareFactory
where
    F: Fn(Envelope, Cancellation, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult> + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: Next| {
        let f = Arc::clone(&f);
        Pipeline::new(move |envelope, cancel| f(envelope, cancel, next.clone()))
    })
}
