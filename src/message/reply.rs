use std::any::{type_name, Any, TypeId};
use std::fmt;

/// The untyped result of a `send`.
///
/// A handler whose output is `()` produces an empty reply ("no value"), which
/// is not an error. [`Reply::into_value`] narrows the reply back to a concrete
/// type.
pub struct Reply {
    value: Option<Box<dyn Any + Send>>,
    type_name: &'static str,
}

impl Reply {
    /// A reply carrying no value.
    pub fn none() -> Self {
        Self {
            value: None,
            type_name: type_name::<()>(),
        }
    }

    /// A reply carrying `value`. `()` is normalized to [`Reply::none`].
    pub fn new<T: Any + Send>(value: T) -> Self {
        if TypeId::of::<T>() == TypeId::of::<()>() {
            return Self::none();
        }
        Self {
            value: Some(Box::new(value)),
            type_name: type_name::<T>(),
        }
    }

    /// Whether the handler produced no value.
    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    /// Name of the type held by this reply (`()` when empty).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the reply holds a `T`. An empty reply holds `()`.
    pub fn is<T: Any>(&self) -> bool {
        match &self.value {
            Some(value) => value.is::<T>(),
            None => TypeId::of::<T>() == TypeId::of::<()>(),
        }
    }

    /// Borrow the value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|value| value.downcast_ref::<T>())
    }

    /// Take the value as a `T`. Returns the reply unchanged on a mismatch.
    pub fn into_value<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        let value: Box<dyn Any + Send> = match self.value {
            Some(value) => value,
            None => Box::new(()),
        };
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self {
                value: if value.is::<()>() { None } else { Some(value) },
                type_name,
            }),
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("type_name", &self.type_name)
            .field("empty", &self.value.is_none())
            .finish()
    }
}
