//! One-shot completion signal bridging transport events to the caller.
//!
//! # Design
//! `channel()` returns a `Completer` (the writing half, handed to the
//! transport) and a `CompletionSignal` (the reading half, returned to the
//! caller). The completer can be cloned so a transport may keep it in
//! several event handlers, but only the first `settle` call is delivered;
//! later ones are ignored and reported as `false`. If every completer is
//! dropped without settling, the signal resolves to
//! `RequestFailure::Abandoned`, which is also the slot reserved for
//! cancellation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{FailureKind, RequestFailure};
use crate::response::Success;

/// Final result of a request.
pub type Outcome = Result<Success, RequestFailure>;

/// Create a linked completer/signal pair.
pub fn channel() -> (Completer, CompletionSignal) {
    let (tx, rx) = oneshot::channel();
    (
        Completer {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        CompletionSignal { rx },
    )
}

/// Writing half of a completion signal.
#[derive(Debug, Clone)]
pub struct Completer {
    slot: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl Completer {
    /// Settle the signal. Returns `false` if it was already settled.
    pub fn settle(&self, outcome: Outcome) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            tracing::warn!("ignoring settlement of an already settled request");
            return false;
        };
        match &outcome {
            Ok(_) => tracing::debug!("request settled with success"),
            Err(e) => tracing::debug!(kind = %FailureKind(e), error = %e, "request settled with failure"),
        }
        // The caller may have dropped the signal; that is not an error here.
        let _ = tx.send(outcome);
        true
    }

    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

/// Reading half of a completion signal.
///
/// Await it from async code, or call [`CompletionSignal::wait`] from a
/// thread that is not driving an async runtime.
#[derive(Debug)]
pub struct CompletionSignal {
    rx: oneshot::Receiver<Outcome>,
}

impl CompletionSignal {
    /// Block the current thread until the request settles.
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn wait(self) -> Outcome {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(RequestFailure::Abandoned))
    }

    /// Take the outcome if the request has already settled.
    pub fn try_outcome(&mut self) -> Option<Outcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RequestFailure::Abandoned)),
        }
    }
}

impl Future for CompletionSignal {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or_else(|_| Err(RequestFailure::Abandoned)))
    }
}
