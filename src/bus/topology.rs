use serde::Serialize;

use crate::message::TypeKey;
use crate::registry::{HandlerRegistry, SubscriberRegistry};

/// Point-in-time view of how a bus is wired. Serializes to JSON for
/// startup logs and diagnostics endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    /// Sorted by message type name.
    pub handlers: Vec<HandlerRoute>,
    /// Sorted by event type name; subscribers keep registration order.
    pub subscribers: Vec<SubscriberRoute>,
    pub middleware: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerRoute {
    pub message: TypeKey,
    pub handler: TypeKey,
    pub output: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberRoute {
    pub event: TypeKey,
    pub subscribers: Vec<TypeKey>,
}

impl Topology {
    pub(crate) fn capture(
        handlers: &HandlerRegistry,
        subscribers: &SubscriberRegistry,
        middleware: usize,
    ) -> Self {
        let mut handler_routes: Vec<_> = handlers
            .iter()
            .map(|(message, descriptor)| HandlerRoute {
                message: *message,
                handler: descriptor.handler_type(),
                output: descriptor.output_type(),
            })
            .collect();
        handler_routes.sort_by_key(|route| route.message.name());

        let mut subscriber_routes: Vec<_> = subscribers
            .iter()
            .map(|(event, descriptors)| SubscriberRoute {
                event: *event,
                subscribers: descriptors.iter().map(|d| d.subscriber_type()).collect(),
            })
            .collect();
        subscriber_routes.sort_by_key(|route| route.event.name());

        Self {
            handlers: handler_routes,
            subscribers: subscriber_routes,
            middleware,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
