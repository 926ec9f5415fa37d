use std::any::Any;
use std::fmt;

use super::{Message, TypeKey};

/// A message in flight through the pipeline.
///
/// The envelope owns the message and remembers its [`TypeKey`]. Middleware can
/// inspect the message by type via [`Envelope::downcast_ref`] without knowing
/// every message type up front.
pub struct Envelope {
    message_type: TypeKey,
    message: Box<dyn Any + Send>,
}

impl Envelope {
    /// Wrap a message.
    pub fn new<M: Message>(message: M) -> Self {
        Self {
            message_type: TypeKey::of::<M>(),
            message: Box::new(message),
        }
    }

    /// Routing key of the wrapped message.
    pub fn message_type(&self) -> TypeKey {
        self.message_type
    }

    /// Whether the wrapped message is an `M`.
    pub fn is<M: Message>(&self) -> bool {
        self.message_type.is::<M>()
    }

    /// Borrow the message as an `M`, if that is what it is.
    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        self.message.downcast_ref::<M>()
    }

    /// Mutably borrow the message as an `M`, if that is what it is.
    pub fn downcast_mut<M: Message>(&mut self) -> Option<&mut M> {
        self.message.downcast_mut::<M>()
    }

    /// Unwrap the message. Returns the envelope unchanged on a type mismatch.
    pub fn into_message<M: Message>(self) -> Result<M, Self> {
        let message_type = self.message_type;
        match self.message.downcast::<M>() {
            Ok(message) => Ok(*message),
            Err(message) => Err(Self {
                message_type,
                message,
            }),
        }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("message_type", &self.message_type)
            .finish_non_exhaustive()
    }
}
