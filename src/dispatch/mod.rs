//! The two places messages actually get delivered.
//!
//! - [`TerminalDispatcher`] - innermost link of the `send` pipeline: look up
//!   the one handler, resolve it, invoke it.
//! - [`EventBroadcaster`] - `publish` fan-out: resolve every subscriber, run
//!   them concurrently, join them all, aggregate the failures.

mod broadcast;
mod terminal;

pub use broadcast::{EventBroadcaster, PublishReport};
pub use terminal::TerminalDispatcher;
