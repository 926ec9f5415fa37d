use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, trace, warn};

use crate::cancel::Cancellation;
use crate::error::{AggregateSubscriberError, BusError, SubscriberFailure, SubscriberFailureKind};
use crate::message::{Event, TypeKey};
use crate::registry::SubscriberRegistry;
use crate::resolve::Resolver;

/// What happened during one `publish`.
#[derive(Debug)]
pub struct PublishReport {
    event_type: TypeKey,
    invoked: Vec<TypeKey>,
    skipped: Vec<TypeKey>,
    failures: Vec<SubscriberFailure>,
}

impl PublishReport {
    fn new(event_type: TypeKey) -> Self {
        Self {
            event_type,
            invoked: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn event_type(&self) -> TypeKey {
        self.event_type
    }

    /// Subscribers that were resolved and run, in registration order.
    pub fn invoked(&self) -> &[TypeKey] {
        &self.invoked
    }

    /// Subscribers skipped because the resolver had no instance for them.
    pub fn skipped(&self) -> &[TypeKey] {
        &self.skipped
    }

    /// Failures of invoked subscribers, in registration order.
    pub fn failures(&self) -> &[SubscriberFailure] {
        &self.failures
    }

    /// Whether every invoked subscriber succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(())` when every invoked subscriber succeeded, otherwise the
    /// aggregate of all failures. Skipped subscribers do not fail the publish.
    pub fn into_result(self) -> Result<(), BusError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateSubscriberError::new(self.event_type, self.failures).into())
        }
    }
}

/// Resolves and concurrently runs every subscriber for an event.
#[derive(Clone)]
pub struct EventBroadcaster {
    subscribers: Arc<SubscriberRegistry>,
    resolver: Arc<dyn Resolver>,
}

impl EventBroadcaster {
    pub fn new(subscribers: Arc<SubscriberRegistry>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            subscribers,
            resolver,
        }
    }

    /// Deliver `event` to every registered subscriber.
    ///
    /// Each resolved subscriber runs as its own task on the tokio runtime.
    /// All tasks are joined before returning, whether they fail, panic, or
    /// are interrupted by `cancel`; one subscriber's failure never stops
    /// another, and every invoked subscriber that did not succeed shows up
    /// in the failures. If `cancel` has already fired nothing runs and every
    /// subscriber is reported as cancelled. Must be called from within a
    /// tokio runtime.
    pub async fn broadcast<E: Event>(&self, event: E, cancel: Cancellation) -> PublishReport {
        let event_type = TypeKey::of::<E>();
        let mut report = PublishReport::new(event_type);

        let descriptors = self.subscribers.lookup(&event_type);
        if descriptors.is_empty() {
            trace!(event_type = %event_type, "no subscribers");
            return report;
        }

        if cancel.is_cancelled() {
            debug!(event_type = %event_type, "token already fired, nothing runs");
            report.failures = descriptors
                .iter()
                .map(|descriptor| SubscriberFailure {
                    subscriber: descriptor.subscriber_type(),
                    event_type,
                    kind: SubscriberFailureKind::Cancelled,
                })
                .collect();
            return report;
        }

        let event: Arc<dyn Any + Send + Sync> = Arc::new(event);
        let mut tasks = JoinSet::new();
        let mut spawned: HashMap<task::Id, (usize, TypeKey)> = HashMap::new();

        for (index, descriptor) in descriptors.iter().enumerate() {
            let subscriber = descriptor.subscriber_type();
            let Some(instance) = self.resolver.resolve(&subscriber) else {
                warn!(
                    event_type = %event_type,
                    subscriber = %subscriber,
                    "resolver returned no instance, skipping subscriber"
                );
                report.skipped.push(subscriber);
                continue;
            };

            let invocation = descriptor.invoke(instance, Arc::clone(&event), cancel.clone());
            let cancel = cancel.clone();
            report.invoked.push(subscriber);

            // dropping the invocation on cancel can panic too, so the whole
            // race sits inside catch_unwind
            let race = async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(SubscriberFailureKind::Cancelled),
                    result = invocation => result.map_err(|fault| fault.into_subscriber_kind()),
                }
            };
            let handle = tasks.spawn(async move {
                match AssertUnwindSafe(race).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(SubscriberFailureKind::Panicked(panic_message(&*panic))),
                }
            });
            spawned.insert(handle.id(), (index, subscriber));
        }

        debug!(
            event_type = %event_type,
            subscribers = report.invoked.len(),
            skipped = report.skipped.len(),
            "publishing"
        );

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(join_error) => {
                    let id = join_error.id();
                    let kind = if join_error.is_panic() {
                        SubscriberFailureKind::Panicked(panic_message(&*join_error.into_panic()))
                    } else {
                        SubscriberFailureKind::Cancelled
                    };
                    (id, Err(kind))
                }
            };
            let Some(&(index, subscriber)) = spawned.get(&id) else {
                error!(event_type = %event_type, task = %id, "joined a task that was never spawned");
                continue;
            };
            if let Err(kind) = outcome {
                warn!(
                    event_type = %event_type,
                    subscriber = %subscriber,
                    error = %kind,
                    "subscriber failed"
                );
                failures.push((
                    index,
                    SubscriberFailure {
                        subscriber,
                        event_type,
                        kind,
                    },
                ));
            }
        }

        failures.sort_by_key(|(index, _)| *index);
        report.failures = failures.into_iter().map(|(_, failure)| failure).collect();
        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
