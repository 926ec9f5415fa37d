//! Handlers used across the bus tests, one per file.


pub use ping::PingHandler;
pub use place_order::{CancelOrderHandler, PlaceOrderHandler};
