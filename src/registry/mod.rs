//! Handler and subscriber registries.
//!
//! Both registries are keyed by the message/event [`TypeKey`](crate::TypeKey)
//! and hold descriptors: the key of the type that does the work plus a thunk
//! that knows how to call it. Descriptors are built from generic registration
//! calls, so the thunk's downcasts always line up with the key it is stored
//! under.
//!
//! - [`HandlerRegistry`]: at most one handler per message type (upsert).
//! - [`SubscriberRegistry`]: an ordered, duplicate-free list per event type.

mod handlers;
mod subscribers;

pub use handlers::{Handler, HandlerDescriptor, HandlerRegistry};
pub use subscribers::{Subscriber, SubscriberDescriptor, SubscriberRegistry};

use crate::error::{BoxError, SubscriberFailureKind};

/// Why a descriptor thunk could not complete.
#[derive(Debug)]
pub(crate) enum InvokeFault {
    /// The resolver handed back an instance of the wrong type.
    WrongInstance,
    /// The payload did not match the type the descriptor was built for.
    WrongPayload(&'static str),
    /// The handler or subscriber itself failed.
    Failed(BoxError),
}

impl InvokeFault {
    pub(crate) fn into_subscriber_kind(self) -> SubscriberFailureKind {
        match self {
            InvokeFault::WrongInstance => SubscriberFailureKind::ResolutionFailed,
            InvokeFault::WrongPayload(expected) => SubscriberFailureKind::InvocationFailed(
                format!("event payload is not a {}", expected).into(),
            ),
            InvokeFault::Failed(source) => SubscriberFailureKind::InvocationFailed(source),
        }
    }
}
