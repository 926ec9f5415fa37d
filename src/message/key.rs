use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

/// Stable identifier for a Rust type, used as the routing key for messages,
/// events, handlers, and subscribers.
///
/// Equality and hashing use the `TypeId` only; the name is carried for logs
/// and error messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `my_app::orders::PlaceOrder`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with the module path stripped, e.g. `PlaceOrder`.
    ///
    /// Generic arguments are kept as written by the compiler. Names that do
    /// not start with a path (tuples, arrays, references) are returned whole.
    pub fn short_name(&self) -> &'static str {
        let starts_with_path = self
            .name
            .starts_with(|c: char| c.is_alphanumeric() || c == '_');
        if !starts_with_path {
            return self.name;
        }
        let base = match self.name.find('<') {
            Some(generic_start) => &self.name[..generic_start],
            None => self.name,
        };
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }

    /// Whether this key identifies `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for TypeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}
