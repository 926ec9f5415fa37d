//! Middleware pipeline for `send`.
//!
//! ## Composition
//!
//! ```text
//!   factories: [A, B]           terminal: TerminalDispatcher
//!
//!   build():  stage = terminal
//!             stage = B(stage)
//!             stage = A(stage)
//!
//!   send ──► A ──► B ──► handler
//!   reply ◄── A ◄── B ◄──┘
//! ```
//!
//! The first registered middleware is the outermost wrapper: it runs first on
//! the way in and observes the result last on the way out. A stage may pass
//! through, short-circuit by not calling `next`, or wrap `next`'s outcome.

mod builder;
mod middleware;
mod stage;

pub use builder::build;
pub use middleware::{from_fn, middleware_factory, Middleware, MiddlewareFactory};
pub use stage::{DispatchResult, Next, Pipeline};
