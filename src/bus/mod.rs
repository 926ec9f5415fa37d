//! Bus - the composition root for handlers, subscribers, and middleware.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Bus                               │
//! │  setup:   register_handler / register_subscriber /          │
//! │           use_middleware  (&mut self, rebuilds pipeline)    │
//! │  runtime: send / send_typed / publish  (&self, lock-free)   │
//! └─────────────────────────────────────────────────────────────┘
//!          │ send                              │ publish
//!          ▼                                   ▼
//! ┌──────────────────────────┐    ┌──────────────────────────────┐
//! │ Pipeline                 │    │ EventBroadcaster             │
//! │  middleware[0]           │    │  resolve each subscriber     │
//! │   middleware[1]          │    │  spawn all, join all         │
//! │    TerminalDispatcher ───┼─┐  │  aggregate failures          │
//! └──────────────────────────┘ │  └──────────────────────────────┘
//!                              ▼                 │
//!                    ┌──────────────────────────────────────┐
//!                    │ Resolver (supplied by the app)       │
//!                    └──────────────────────────────────────┘
//! ```
//!
//! Setup methods take `&mut self`, so registration cannot race a `send`.
//! Once setup is done, share the bus (`Arc<Bus>`) and call `send`/`publish`
//! from as many tasks as you like.
//!
//! Events do not pass through the middleware chain; it wraps `send` only.

mod bus;
mod topology;

pub use bus::Bus;
pub use topology::{HandlerRoute, SubscriberRoute, Topology};

/// Register several handlers at once.
///
/// Expands to one `register_handler::<Message, Handler>()` per pair and stops
/// at the first error. Evaluates to `Result<(), BusError>`.
///
/// # Example
/// ```ignore
/// relay_rust::register_handlers!(bus,
///     PlaceOrder => PlaceOrderHandler,
///     GetOrder => GetOrderHandler,
/// )?;
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($bus:expr, $( $message:ty => $handler:ty ),+ $(,)?) => {{
        let bus: &mut $crate::Bus = &mut $bus;
        let mut outcome: ::std::result::Result<(), $crate::BusError> = Ok(());
        $(
            if outcome.is_ok() {
                outcome = bus.register_handler::<$message, $handler>().map(|_| ());
            }
        )+
        outcome
    }};
}

/// Register several subscribers at once.
///
/// # Example
/// ```ignore
/// relay_rust::register_subscribers!(bus,
///     OrderPlaced => SendReceipt,
///     OrderPlaced => ReserveStock,
/// );
/// ```
#[macro_export]
macro_rules! register_subscribers {
    ($bus:expr, $( $event:ty => $subscriber:ty ),+ $(,)?) => {{
        let bus: &mut $crate::Bus = &mut $bus;
        $(
            bus.register_subscriber::<$event, $subscriber>();
        )+
    }};
}
