//! Messages, events, and the values that travel through the pipeline.
//!
//! A message is any `'static` Rust value; its concrete type is the routing key.
//! There are no envelope fields on the wire side of things, only the
//! [`TypeKey`] derived from the type itself.
//!
//! ```text
//!   send(Ping)  ──► Envelope { TypeKey(Ping), Box<Ping> } ──► pipeline ──► Reply
//!   publish(Tick) ─► Arc<Tick> shared by every subscriber task
//! ```

mod envelope;
mod key;
mod reply;

use std::any::Any;

pub use envelope::Envelope;
pub use key::TypeKey;
pub use reply::Reply;

/// A command or query routed to exactly one handler.
///
/// Implemented for every `Send + 'static` type; there is nothing to derive.
pub trait Message: Any + Send + 'static {}

impl<T: Any + Send + 'static> Message for T {}

/// A value published to zero or more subscribers.
///
/// Events are shared between concurrently running subscribers, so they must
/// also be `Sync`.
pub trait Event: Any + Send + Sync + 'static {}

impl<T: Any + Send + Sync + 'static> Event for T {}
