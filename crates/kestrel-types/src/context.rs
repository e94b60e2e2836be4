//! Request-scoped context: which namespace a call targets and whether the
//! caller has gone away.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Scope and cancellation for one registry call.
///
/// A context without a namespace addresses the whole cluster: cluster-scoped
/// resources, or every namespace when listing a namespaced resource.
///
/// Contexts are cheap to clone; clones share the same cancellation signal.
#[derive(Clone, Debug)]
pub struct RequestContext {
    namespace: Option<String>,
    cancelled: watch::Receiver<bool>,
}

/// Cancels every [`RequestContext`] derived from the same
/// [`RequestContext::with_cancel`] call.
///
/// Clones share one signal. A deadline set by
/// [`RequestContext::with_timeout`] lives only as long as some clone of the
/// handle does: dropping the last one stops the timer.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

#[derive(Debug)]
struct CancelInner {
    tx: watch::Sender<bool>,
    timer: OnceLock<JoinHandle<()>>,
}

impl CancelInner {
    fn fire(&self) {
        self.tx.send_replace(true);
    }
}

impl Drop for CancelInner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get() {
            timer.abort();
        }
    }
}

impl CancelHandle {
    /// Cancel now. A pending deadline timer is stopped.
    pub fn cancel(&self) {
        self.inner.fire();
        if let Some(timer) = self.inner.timer.get() {
            timer.abort();
        }
    }
}

impl RequestContext {
    /// A context scoped to one namespace.
    pub fn namespaced(namespace: impl Into<String>) -> Self {
        Self::new(Some(namespace.into()))
    }

    /// A cluster-wide context.
    pub fn cluster() -> Self {
        Self::new(None)
    }

    fn new(namespace: Option<String>) -> Self {
        // The sender is dropped right away; a context built this way is never
        // cancelled until `with_cancel` swaps in a live channel.
        let (_tx, cancelled) = watch::channel(false);
        Self {
            namespace,
            cancelled,
        }
    }

    /// Attach a fresh cancellation signal, returning the handle that fires it.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancelled = rx;
        let inner = CancelInner {
            tx,
            timer: OnceLock::new(),
        };
        (self, CancelHandle { inner: Arc::new(inner) })
    }

    /// Attach a cancellation signal that fires after `timeout`.
    ///
    /// The timer is a task owned by the returned handle: it is aborted by
    /// [`CancelHandle::cancel`] or once every clone of the handle is dropped.
    /// Must be called from within a Tokio runtime.
    pub fn with_timeout(mut self, timeout: Duration) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancelled = rx;
        let inner = Arc::new(CancelInner {
            tx,
            timer: OnceLock::new(),
        });
        // The timer holds a weak reference so it never keeps the handle alive.
        let weak = Arc::downgrade(&inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire();
            }
        });
        let _ = inner.timer.set(timer);
        (self, CancelHandle { inner })
    }

    /// The namespace this call targets, if any. Empty strings count as none.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the context is cancelled. Never resolves for a context
    /// whose cancel handle was dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::cluster()
    }
}
