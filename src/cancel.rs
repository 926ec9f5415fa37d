//! Cancellation and deadlines for a single `send` or `publish` call.
//!
//! A [`CancellationSource`] owns the trigger; every [`Cancellation`] handed
//! out by it observes the same signal. A `Cancellation` may also carry a
//! deadline, in which case it fires at whichever comes first.
//!
//! ```ignore
//! let source = CancellationSource::new();
//! let cancel = source.token().with_timeout(Duration::from_secs(2));
//! let reply = bus.send(PlaceOrder { .. }, cancel).await?;
//! ```

use std::future::pending;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::BusError;

/// Owner of a cancellation signal.
#[derive(Debug)]
pub struct CancellationSource {
    tx: watch::Sender<bool>,
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSource {
    /// Create a source that has not fired.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A token observing this source.
    pub fn token(&self) -> Cancellation {
        Cancellation {
            rx: Some(self.tx.subscribe()),
            deadline: None,
        }
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observer side of a cancellation signal, threaded through every stage and
/// subscriber of one call.
///
/// Cheap to clone. [`Cancellation::none`] never fires.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A token that never fires.
    pub fn none() -> Self {
        Self::default()
    }

    /// Also fire at `deadline`. The earlier of two deadlines wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Also fire once `timeout` has elapsed from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the signal has fired or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        let signalled = self.rx.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        signalled || expired
    }

    /// `Err(BusError::Cancelled)` if the token has fired.
    pub fn check(&self) -> Result<(), BusError> {
        if self.is_cancelled() {
            Err(BusError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once the token fires. Pending forever for [`Cancellation::none`].
    pub async fn cancelled(&self) {
        let signal = async {
            let Some(rx) = &self.rx else {
                return pending::<()>().await;
            };
            let mut rx = rx.clone();
            loop {
                if *rx.borrow_and_update() {
                    return;
                }
                if rx.changed().await.is_err() {
                    // source dropped without firing
                    return pending::<()>().await;
                }
            }
        };
        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            _ = signal => {}
            _ = expiry => {}
        }
    }
}
