//! Resolvers - turn a handler or subscriber [`TypeKey`](crate::TypeKey) into a
//! live instance at dispatch time.
//!
//! The bus never constructs handlers or subscribers itself. Whatever owns
//! object lifetimes in the application (a DI container, a hand-written
//! composition root, a test) implements [`Resolver`]. [`InstanceResolver`] is
//! the bundled in-memory implementation for single-process apps and tests.

mod instances;
mod resolver;

pub use instances::InstanceResolver;
pub use resolver::{Instance, Resolver};
