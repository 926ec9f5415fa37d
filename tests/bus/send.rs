//! `send`: one message, one handler, one reply.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use relay_rust::{
    Bus, BusConfig, BusError, Cancellation, DuplicateHandlerPolicy, Instance, InstanceResolver,
    TypeKey,
};

use crate::handlers::{CancelOrderHandler, PingHandler, PlaceOrderHandler};
use crate::support::{
    init_tracing, CancelOrder, OrderId, Ping, PlaceOrder, Pong, Recorder, Unregistered,
};

fn order_desk() -> (Bus, Arc<Recorder>) {
    let log = Recorder::new();
    let resolver = InstanceResolver::new()
        .singleton(PingHandler)
        .singleton(PlaceOrderHandler::new(Arc::clone(&log)))
        .singleton(CancelOrderHandler {
            log: Arc::clone(&log),
        });

    let mut bus = Bus::new(resolver);
    bus.register_handler::<Ping, PingHandler>()
        .unwrap()
        .register_handler::<PlaceOrder, PlaceOrderHandler>()
        .unwrap()
        .register_handler::<CancelOrder, CancelOrderHandler>()
        .unwrap();
    (bus, log)
}

#[tokio::test]
async fn ping_returns_pong() {
    init_tracing();
    let (bus, _) = order_desk();

    let reply = bus.send(Ping, Cancellation::none()).await.unwrap();
    assert!(reply.is::<Pong>());

    let pong: Pong = bus.send_typed(Ping, Cancellation::none()).await.unwrap();
    assert_eq!(pong, Pong);
}

#[tokio::test]
async fn handler_state_persists_across_sends() {
    let (bus, _) = order_desk();

    let first: OrderId = bus
        .send_typed(
            PlaceOrder {
                sku: "tea".into(),
                quantity: 2,
            },
            Cancellation::none(),
        )
        .await
        .unwrap();
    let second: OrderId = bus
        .send_typed(
            PlaceOrder {
                sku: "cups".into(),
                quantity: 6,
            },
            Cancellation::none(),
        )
        .await
        .unwrap();

    assert_eq!(first, OrderId(1));
    assert_eq!(second, OrderId(2));
}

#[tokio::test]
async fn unit_output_is_an_empty_reply() {
    let (bus, log) = order_desk();

    let reply = bus
        .send(CancelOrder { id: OrderId(7) }, Cancellation::none())
        .await
        .unwrap();
    assert!(reply.is_none());

    bus.send_typed::<_, ()>(CancelOrder { id: OrderId(8) }, Cancellation::none())
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["cancelled #7", "cancelled #8"]);
}

#[tokio::test]
async fn unregistered_message_has_no_handler() {
    let (bus, _) = order_desk();

    let err = bus.send(Unregistered, Cancellation::none()).await.unwrap_err();
    match err {
        BusError::NoHandlerRegistered { message_type } => {
            assert_eq!(message_type, TypeKey::of::<Unregistered>());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn handler_errors_carry_context() {
    let (bus, _) = order_desk();

    let err = bus
        .send(
            PlaceOrder {
                sku: "tea".into(),
                quantity: 0,
            },
            Cancellation::none(),
        )
        .await
        .unwrap_err();

    match &err {
        BusError::HandlerInvocationFailed {
            message_type,
            handler,
            source,
        } => {
            assert!(message_type.is::<PlaceOrder>());
            assert!(handler.is::<PlaceOrderHandler>());
            assert_eq!(source.to_string(), "cannot order zero of tea");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.to_string().contains("cannot order zero of tea"));
}

#[tokio::test]
async fn resolver_miss_fails_resolution() {
    let mut bus = Bus::new(InstanceResolver::new());
    bus.register_handler::<Ping, PingHandler>().unwrap();

    let err = bus.send(Ping, Cancellation::none()).await.unwrap_err();
    assert!(matches!(
        err,
        BusError::HandlerResolutionFailed { handler } if handler.is::<PingHandler>()
    ));
}

#[tokio::test]
async fn wrong_reply_type_is_a_mismatch() {
    let (bus, _) = order_desk();

    let err = bus
        .send_typed::<_, String>(Ping, Cancellation::none())
        .await
        .unwrap_err();
    assert!(matches!(err, BusError::ResultTypeMismatch { .. }));
}

#[tokio::test]
async fn reregistering_replaces_the_handler() {
    struct LoudPingHandler;

    #[relay_rust::async_trait]
    impl relay_rust::Handler<Ping> for LoudPingHandler {
        type Output = &'static str;

        async fn handle(
            &self,
            _msg: Ping,
            _cancel: Cancellation,
        ) -> Result<&'static str, relay_rust::BoxError> {
            Ok("PONG")
        }
    }

    let mut bus = Bus::new(
        InstanceResolver::new()
            .singleton(PingHandler)
            .singleton(LoudPingHandler),
    );
    bus.register_handler::<Ping, PingHandler>().unwrap();
    bus.register_handler::<Ping, LoudPingHandler>().unwrap();

    let reply: &'static str = bus.send_typed(Ping, Cancellation::none()).await.unwrap();
    assert_eq!(reply, "PONG");
    assert_eq!(bus.handlers(), vec![TypeKey::of::<Ping>()]);
}

#[tokio::test]
async fn reject_policy_keeps_the_first_handler() {
    struct OtherPingHandler;

    #[relay_rust::async_trait]
    impl relay_rust::Handler<Ping> for OtherPingHandler {
        type Output = ();

        async fn handle(&self, _msg: Ping, _cancel: Cancellation) -> Result<(), relay_rust::BoxError> {
            Ok(())
        }
    }

    let config = BusConfig::from_json(r#"{ "duplicate_handlers": "reject" }"#).unwrap();
    assert_eq!(config.duplicate_handlers, DuplicateHandlerPolicy::Reject);

    let mut bus = Bus::with_config(
        InstanceResolver::new()
            .singleton(PingHandler)
            .singleton(OtherPingHandler),
        config,
    );
    bus.register_handler::<Ping, PingHandler>().unwrap();

    let err = bus.register_handler::<Ping, OtherPingHandler>().unwrap_err();
    assert!(matches!(err, BusError::DuplicateHandler { .. }));

    let pong: Pong = bus.send_typed(Ping, Cancellation::none()).await.unwrap();
    assert_eq!(pong, Pong);
}

#[tokio::test]
async fn transient_resolver_builds_per_send() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let resolver = InstanceResolver::new().transient(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        PingHandler
    });

    let mut bus = Bus::new(resolver);
    bus.register_handler::<Ping, PingHandler>().unwrap();

    for _ in 0..3 {
        bus.send(Ping, Cancellation::none()).await.unwrap();
    }
    assert_eq!(built.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn closure_resolver() {
    let mut bus = Bus::new(|key: &TypeKey| -> Option<Instance> {
        key.is::<PingHandler>().then(|| Arc::new(PingHandler) as Instance)
    });
    bus.register_handler::<Ping, PingHandler>().unwrap();

    let pong: Pong = bus.send_typed(Ping, Cancellation::none()).await.unwrap();
    assert_eq!(pong, Pong);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_share_one_bus() {
    let (bus, _) = order_desk();
    let bus = Arc::new(bus);

    let mut tasks = Vec::new();
    for i in 0..32 {
        let bus = Arc::clone(&bus);
        tasks.push(tokio::spawn(async move {
            bus.send_typed::<_, OrderId>(
                PlaceOrder {
                    sku: format!("sku-{i}"),
                    quantity: 1,
                },
                Cancellation::none(),
            )
            .await
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().0);
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=32).collect::<Vec<_>>());
}
