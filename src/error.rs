use std::fmt;
use std::time::Duration;

use crate::message::TypeKey;

/// Boxed error returned by handler, subscriber, and middleware code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the bus.
///
/// A failed `send` yields exactly one of these describing one cause. A failed
/// `publish` yields [`BusError::Subscribers`], which bundles every subscriber
/// that failed.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("no handler registered for message type {message_type}")]
    NoHandlerRegistered { message_type: TypeKey },

    #[error("resolver returned no instance for handler {handler}")]
    HandlerResolutionFailed { handler: TypeKey },

    #[error("handler {handler} failed on {message_type}: {source}")]
    HandlerInvocationFailed {
        message_type: TypeKey,
        handler: TypeKey,
        #[source]
        source: BoxError,
    },

    #[error("reply of type {actual} cannot be read as {expected}")]
    ResultTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("guard rejected message type {message_type}")]
    GuardRejected { message_type: TypeKey },

    #[error("handler {existing} is already registered for message type {message_type}")]
    DuplicateHandler {
        message_type: TypeKey,
        existing: TypeKey,
    },

    #[error("dispatch cancelled")]
    Cancelled,

    #[error("dispatch timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Subscribers(#[from] AggregateSubscriberError),

    #[error("middleware error: {0}")]
    Middleware(#[source] BoxError),
}

impl BusError {
    /// Whether this error came from the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BusError::Cancelled)
    }

    /// The aggregate subscriber error, if this is a failed `publish`.
    pub fn as_subscribers(&self) -> Option<&AggregateSubscriberError> {
        match self {
            BusError::Subscribers(aggregate) => Some(aggregate),
            _ => None,
        }
    }
}

/// One subscriber's failure during a `publish`.
#[derive(Debug, thiserror::Error)]
#[error("subscriber {subscriber} failed on {event_type}: {kind}")]
pub struct SubscriberFailure {
    pub subscriber: TypeKey,
    pub event_type: TypeKey,
    #[source]
    pub kind: SubscriberFailureKind,
}

/// Why a subscriber failed.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberFailureKind {
    /// The resolver had no instance for the subscriber; it was skipped.
    #[error("resolver returned no instance")]
    ResolutionFailed,

    /// The subscriber returned an error.
    #[error("{0}")]
    InvocationFailed(#[source] BoxError),

    /// The subscriber task panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The cancellation signal fired before the subscriber finished.
    #[error("cancelled")]
    Cancelled,
}

/// Every subscriber failure from one `publish`, in registration order.
#[derive(Debug)]
pub struct AggregateSubscriberError {
    event_type: TypeKey,
    failures: Vec<SubscriberFailure>,
}

impl AggregateSubscriberError {
    pub(crate) fn new(event_type: TypeKey, failures: Vec<SubscriberFailure>) -> Self {
        Self {
            event_type,
            failures,
        }
    }

    /// The event type that was published.
    pub fn event_type(&self) -> TypeKey {
        self.event_type
    }

    /// The individual failures.
    pub fn failures(&self) -> &[SubscriberFailure] {
        &self.failures
    }

    /// Keys of the subscribers that failed.
    pub fn failed_subscribers(&self) -> Vec<TypeKey> {
        self.failures.iter().map(|f| f.subscriber).collect()
    }

    /// Whether subscriber `S` is among the failures.
    pub fn contains<S: 'static>(&self) -> bool {
        self.failures.iter().any(|f| f.subscriber.is::<S>())
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<SubscriberFailure> {
        self.failures
    }
}

impl fmt::Display for AggregateSubscriberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} subscriber(s) failed on {}",
            self.failures.len(),
            self.event_type
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.subscriber, failure.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateSubscriberError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}
