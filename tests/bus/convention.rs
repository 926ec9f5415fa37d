//! Bulk registration macros and the topology snapshot.

use std::sync::Arc;

use relay_rust::{Bus, BusConfig, BusError, Cancellation, DuplicateHandlerPolicy, InstanceResolver, TypeKey};

use crate::handlers::{CancelOrderHandler, PingHandler, PlaceOrderHandler};
use crate::support::{
    CancelOrder, OrderId, OrderPlaced, Ping, PlaceOrder, Pong, Receipts, Recorder, Tick, TickAudit,
    TickMetrics,
};

fn wired() -> (Bus, Arc<Recorder>) {
    let log = Recorder::new();
    let resolver = InstanceResolver::new()
        .singleton(PingHandler)
        .singleton(PlaceOrderHandler::new(Arc::clone(&log)))
        .singleton(CancelOrderHandler {
            log: Arc::clone(&log),
        })
        .singleton(TickAudit::default())
        .singleton(TickMetrics::default())
        .singleton(Receipts {
            log: Arc::clone(&log),
        });

    let mut bus = Bus::new(resolver);
    relay_rust::register_handlers!(bus,
        Ping => PingHandler,
        PlaceOrder => PlaceOrderHandler,
        CancelOrder => CancelOrderHandler,
    )
    .unwrap();
    relay_rust::register_subscribers!(bus,
        Tick => TickAudit,
        Tick => TickMetrics,
        OrderPlaced => Receipts,
    );
    (bus, log)
}

#[tokio::test]
async fn register_and_dispatch() {
    let (bus, log) = wired();

    let mut handled = bus.handlers();
    handled.sort_by_key(|key| key.short_name());
    assert_eq!(
        handled,
        vec![
            TypeKey::of::<CancelOrder>(),
            TypeKey::of::<Ping>(),
            TypeKey::of::<PlaceOrder>(),
        ]
    );

    let pong: Pong = bus.send_typed(Ping, Cancellation::none()).await.unwrap();
    assert_eq!(pong, Pong);

    let id: OrderId = bus
        .send_typed(
            PlaceOrder {
                sku: "tea".into(),
                quantity: 1,
            },
            Cancellation::none(),
        )
        .await
        .unwrap();
    bus.publish(
        OrderPlaced {
            id,
            sku: "tea".into(),
        },
        Cancellation::none(),
    )
    .await
    .unwrap();

    assert_eq!(log.entries(), vec!["handler", "receipt #1 tea"]);
}

#[test]
fn register_handlers_stops_at_first_rejection() {
    struct OtherPingHandler;

    #[relay_rust::async_trait]
    impl relay_rust::Handler<Ping> for OtherPingHandler {
        type Output = ();

        async fn handle(&self, _msg: Ping, _cancel: Cancellation) -> Result<(), relay_rust::BoxError> {
            Ok(())
        }
    }

    let config = BusConfig::new().with_duplicate_handlers(DuplicateHandlerPolicy::Reject);
    let mut bus = Bus::with_config(InstanceResolver::new(), config);

    let outcome = relay_rust::register_handlers!(bus,
        Ping => PingHandler,
        Ping => OtherPingHandler,
        CancelOrder => CancelOrderHandler,
    );

    assert!(matches!(outcome, Err(BusError::DuplicateHandler { .. })));
    assert_eq!(bus.handler_for::<Ping>(), Some(TypeKey::of::<PingHandler>()));
    assert_eq!(bus.handler_for::<CancelOrder>(), None);
}

#[test]
fn topology_lists_routes() {
    let (bus, _) = wired();
    let topology = bus.topology();

    assert_eq!(topology.handlers.len(), 3);
    assert_eq!(topology.middleware, 0);

    let ticks = topology
        .subscribers
        .iter()
        .find(|route| route.event.is::<Tick>())
        .expect("tick route");
    assert_eq!(
        ticks.subscribers,
        vec![TypeKey::of::<TickAudit>(), TypeKey::of::<TickMetrics>()]
    );

    let place = topology
        .handlers
        .iter()
        .find(|route| route.message.is::<PlaceOrder>())
        .expect("place order route");
    assert_eq!(place.handler, TypeKey::of::<PlaceOrderHandler>());
    assert!(place.output.ends_with("OrderId"));

    let json = topology.to_json().unwrap();
    assert!(json.contains("PlaceOrderHandler"), "{json}");
}
