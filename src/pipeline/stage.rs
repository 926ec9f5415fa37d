use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::cancel::Cancellation;
use crate::error::BusError;
use crate::message::{Envelope, Reply};

/// Outcome of running a message through the pipeline.
pub type DispatchResult = Result<Reply, BusError>;

type StageFn = dyn Fn(Envelope, Cancellation) -> BoxFuture<'static, DispatchResult> + Send + Sync;

/// A composed dispatch chain (or any suffix of one).
///
/// Cloning is cheap; clones share the same stage.
#[derive(Clone)]
pub struct Pipeline {
    stage: Arc<StageFn>,
}

/// The remainder of the chain as seen from inside a middleware.
pub type Next = Pipeline;

impl Pipeline {
    /// Wrap an async function as a stage.
    pub fn new<F, Fut>(stage: F) -> Self
    where
        F: Fn(Envelope, Cancellation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult> + Send + 'static,
    {
        Self {
            stage: Arc::new(
                move |envelope: Envelope, cancel: Cancellation| -> BoxFuture<'static, DispatchResult> {
                    Box::pin(stage(envelope, cancel))
                },
            ),
        }
    }

    /// Run the stage.
    ///
    /// Fails with [`BusError::Cancelled`] without entering the stage if the
    /// token has already fired.
    pub fn run(&self, envelope: Envelope, cancel: Cancellation) -> BoxFuture<'static, DispatchResult> {
        if let Err(err) = cancel.check() {
            return Box::pin(async move { Err(err) });
        }
        (self.stage)(envelope, cancel)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}
