//! Test domain: a small order desk shared by the bus tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use relay_rust::{async_trait, BoxError, Cancellation, Subscriber};
use tracing_subscriber::EnvFilter;

/// Route bus logs to the test writer. Set `RUST_LOG=relay_rust=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Messages
// ============================================================================

pub struct Ping;

#[derive(Debug, PartialEq)]
pub struct Pong;

/// No handler is ever registered for this one.
pub struct Unregistered;

pub struct PlaceOrder {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderId(pub u64);

pub struct CancelOrder {
    pub id: OrderId,
}

// ============================================================================
// Events
// ============================================================================

pub struct Tick;

pub struct OrderPlaced {
    pub id: OrderId,
    pub sku: String,
}

// ============================================================================
// Recording helpers
// ============================================================================

/// Ordered log shared between middleware, handlers, and assertions.
#[derive(Default)]
pub struct Recorder {
    entries: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

// ============================================================================
// Subscribers
// ============================================================================

/// Counts every `Tick`.
#[derive(Default)]
pub struct TickAudit {
    seen: AtomicUsize,
}

impl TickAudit {
    pub fn count(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Subscriber<Tick> for TickAudit {
    async fn on_event(&self, _event: &Tick, _cancel: Cancellation) -> Result<(), BoxError> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A second, independent `Tick` counter.
#[derive(Default)]
pub struct TickMetrics {
    seen: AtomicUsize,
}

impl TickMetrics {
    pub fn count(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Subscriber<Tick> for TickMetrics {
    async fn on_event(&self, _event: &Tick, _cancel: Cancellation) -> Result<(), BoxError> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Always fails after counting the attempt.
#[derive(Default)]
pub struct TickAlarm {
    seen: AtomicUsize,
}

impl TickAlarm {
    pub fn count(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Subscriber<Tick> for TickAlarm {
    async fn on_event(&self, _event: &Tick, _cancel: Cancellation) -> Result<(), BoxError> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Err("alarm siren offline".into())
    }
}

/// Writes a receipt line for every placed order.
pub struct Receipts {
    pub log: Arc<Recorder>,
}

#[async_trait]
impl Subscriber<OrderPlaced> for Receipts {
    async fn on_event(&self, event: &OrderPlaced, _cancel: Cancellation) -> Result<(), BoxError> {
        self.log.record(format!("receipt #{} {}", event.id.0, event.sku));
        Ok(())
    }
}
