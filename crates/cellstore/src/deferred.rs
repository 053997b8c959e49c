//! Callback-to-future bridge
//!
//! Converts a single completion notification into a value retrievable by a
//! consumer on a different logical thread of control. The bridge is a
//! one-shot result channel: the producing side resolves exactly once (the
//! resolver is consumed by use), an abandoned consumer simply drops the
//! receiving half and the eventual resolution is discarded without leaking,
//! and panics inside the producing task are captured and delivered as the
//! operation's error result.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{Error, Result};

/// A handle to a result not yet available, resolved exactly once.
///
/// Awaiting the handle yields the operation's result. If the producing side
/// goes away without resolving, the handle yields [`Error::Canceled`].
///
/// Dropping the handle abandons the result but does not abort the spawned
/// operation: an in-flight attempt runs to completion and its outcome is
/// discarded. Mutations handed to the executor are therefore applied (or
/// definitively fail) even when nobody is left to observe them.
#[derive(Debug)]
pub struct Deferred<T> {
    rx: oneshot::Receiver<Result<T>>,
}

/// The producing half of a [`Deferred`]. Resolving consumes the resolver,
/// so a second resolution is unrepresentable.
#[derive(Debug)]
pub struct DeferredResolver<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Deferred<T> {
    /// Create a connected resolver/handle pair.
    pub fn channel() -> (DeferredResolver<T>, Deferred<T>) {
        let (tx, rx) = oneshot::channel();
        (DeferredResolver { tx }, Deferred { rx })
    }
}

impl<T> DeferredResolver<T> {
    /// Deliver the operation's result.
    ///
    /// If the consumer abandoned the handle, the result is dropped; that is
    /// not an error for the producer.
    pub fn resolve(self, result: Result<T>) {
        if self.tx.send(result).is_err() {
            warn!("deferred result discarded: consumer no longer interested");
        }
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(result) => result,
            Err(_) => Err(Error::Canceled(
                "operation dropped before completion".into(),
            )),
        })
    }
}

/// Run `operation` on the supplied executor and return a handle to its
/// eventual result.
///
/// A panic inside the operation is captured and surfaced as
/// [`Error::Internal`] rather than corrupting the bridge.
pub(crate) fn spawn_deferred<T, F>(executor: &Handle, operation: F) -> Deferred<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let (resolver, deferred) = Deferred::channel();
    executor.spawn(async move {
        let outcome = match AssertUnwindSafe(operation).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                warn!(detail = %detail, "operation panicked");
                Err(Error::Internal(format!("operation panicked: {detail}")))
            }
        };
        resolver.resolve(outcome);
    });
    deferred
}
